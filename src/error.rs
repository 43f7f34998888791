use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Failed to create PDF: {0}")]
    PdfError(String),
    #[error("Failed to read report file: {0}")]
    ReportError(String),
    #[error("Failed to read engineer registry: {0}")]
    EngineerError(String),
    #[error("Failed to load image: {0}")]
    ImageError(String),
    #[error("Map layer request failed: {0}")]
    MapLayerError(String),
    #[error("Geocoding request failed: {0}")]
    GeocodeError(String),
    #[error("Invalid coordinates: {0}")]
    CoordinateError(String),
    #[error("Report template is missing its {0} element")]
    MissingTemplate(&'static str),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
