//! Raster layers fetched from a map export service for one bounding box.

use crate::error::AppError;
use crate::geo::BoundingBox;
use image::imageops::FilterType;
use image::RgbaImage;
use std::io::Read;
use tracing::debug;

pub const DEFAULT_STREET_URL: &str =
    "https://server.arcgisonline.com/ArcGIS/rest/services/World_Street_Map/MapServer";
pub const DEFAULT_SATELLITE_URL: &str =
    "https://server.arcgisonline.com/ArcGIS/rest/services/World_Imagery/MapServer";
pub const DEFAULT_TRANSPORTATION_URL: &str =
    "https://server.arcgisonline.com/ArcGIS/rest/services/Reference/World_Transportation/MapServer";
pub const DEFAULT_PLACES_URL: &str =
    "https://server.arcgisonline.com/ArcGIS/rest/services/Reference/World_Boundaries_and_Places/MapServer";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layer {
    Street,
    Satellite,
    Transportation,
    Places,
}

impl Layer {
    /// Reference overlays are drawn on top of imagery and need transparency.
    pub fn is_overlay(self) -> bool {
        matches!(self, Layer::Transportation | Layer::Places)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerRequest {
    pub layer: Layer,
    pub bbox: BoundingBox,
    pub width: u32,
    pub height: u32,
}

/// Source of single-layer rasters. Implementations must be shareable across
/// the threads that fetch overlays concurrently.
pub trait LayerService: Send + Sync {
    fn fetch(&self, request: &LayerRequest) -> Result<RgbaImage, AppError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerEndpoints {
    pub street: String,
    pub satellite: String,
    pub transportation: String,
    pub places: String,
}

impl Default for LayerEndpoints {
    fn default() -> Self {
        Self {
            street: DEFAULT_STREET_URL.to_string(),
            satellite: DEFAULT_SATELLITE_URL.to_string(),
            transportation: DEFAULT_TRANSPORTATION_URL.to_string(),
            places: DEFAULT_PLACES_URL.to_string(),
        }
    }
}

impl LayerEndpoints {
    fn base_for(&self, layer: Layer) -> &str {
        match layer {
            Layer::Street => &self.street,
            Layer::Satellite => &self.satellite,
            Layer::Transportation => &self.transportation,
            Layer::Places => &self.places,
        }
    }
}

/// ArcGIS REST `MapServer/export` client: one request renders the whole
/// bounding box at the requested pixel size.
pub struct ArcGisExportService {
    endpoints: LayerEndpoints,
}

impl ArcGisExportService {
    pub fn new(endpoints: LayerEndpoints) -> Self {
        Self { endpoints }
    }

    pub fn export_url(&self, request: &LayerRequest) -> String {
        let base = self.endpoints.base_for(request.layer).trim_end_matches('/');
        let format = if request.layer.is_overlay() { "png32" } else { "png" };
        format!(
            "{}/export?bbox={}&bboxSR=4326&imageSR=3857&size={},{}&format={}&transparent={}&f=image",
            base,
            request.bbox.to_query(),
            request.width,
            request.height,
            format,
            request.layer.is_overlay(),
        )
    }
}

impl LayerService for ArcGisExportService {
    fn fetch(&self, request: &LayerRequest) -> Result<RgbaImage, AppError> {
        let url = self.export_url(request);
        debug!(layer = ?request.layer, %url, "requesting map layer");

        let response = ureq::get(&url)
            .call()
            .map_err(|e| AppError::MapLayerError(format!("{:?}: {}", request.layer, e)))?;

        let mut bytes = Vec::new();
        response
            .into_reader()
            .read_to_end(&mut bytes)
            .map_err(|e| AppError::MapLayerError(format!("Failed to read response: {}", e)))?;

        decode_layer(&bytes, request.width, request.height)
    }
}

/// Decode a layer raster and bring it to the exact requested size.
pub fn decode_layer(bytes: &[u8], width: u32, height: u32) -> Result<RgbaImage, AppError> {
    let decoded = image::load_from_memory(bytes)
        .map_err(|e| AppError::MapLayerError(format!("Failed to decode image: {}", e)))?;
    let mut rgba = decoded.into_rgba8();
    if rgba.dimensions() != (width, height) {
        rgba = image::imageops::resize(&rgba, width, height, FilterType::Lanczos3);
    }
    Ok(rgba)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::GeoPoint;
    use image::{ImageFormat, Rgba};
    use std::io::Cursor;

    fn request(layer: Layer) -> LayerRequest {
        let center = GeoPoint::new(-25.4284, -49.2733).unwrap();
        LayerRequest {
            layer,
            bbox: BoundingBox::around(center, 14, 800, 500),
            width: 800,
            height: 500,
        }
    }

    #[test]
    fn export_url_carries_bbox_size_and_transparency() {
        let service = ArcGisExportService::new(LayerEndpoints::default());
        let url = service.export_url(&request(Layer::Satellite));
        assert!(url.starts_with(DEFAULT_SATELLITE_URL));
        assert!(url.contains("size=800,500"));
        assert!(url.contains("transparent=false"));
        assert!(url.contains(&format!("bbox={}", request(Layer::Satellite).bbox.to_query())));

        let overlay = service.export_url(&request(Layer::Places));
        assert!(overlay.contains("World_Boundaries_and_Places"));
        assert!(overlay.contains("format=png32&transparent=true"));
    }

    #[test]
    fn decode_resizes_to_requested_size() {
        let img = RgbaImage::from_pixel(40, 25, Rgba([10, 20, 30, 255]));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png).unwrap();

        let layer = decode_layer(&bytes, 80, 50).unwrap();
        assert_eq!(layer.dimensions(), (80, 50));
        assert!(decode_layer(b"<html>error</html>", 80, 50).is_err());
    }
}
