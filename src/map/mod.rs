pub mod compositor;
pub mod controller;
pub mod layers;
pub mod pin;

use crate::error::AppError;
use crate::geo::GeoPoint;
use image::RgbaImage;
use std::path::Path;
use std::str::FromStr;

pub use compositor::MapCompositor;
pub use controller::{HeadlessMap, MapController, MapEventKind};
pub use layers::{ArcGisExportService, LayerEndpoints, LayerService};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MapStyle {
    Street,
    Satellite,
    #[default]
    Hybrid,
}

impl FromStr for MapStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "street" | "mapa" => Ok(MapStyle::Street),
            "satellite" | "satelite" => Ok(MapStyle::Satellite),
            "hybrid" | "hibrido" => Ok(MapStyle::Hybrid),
            other => Err(format!("unknown map style '{}'", other)),
        }
    }
}

/// A one-off flattened map raster. Produced fresh for every preview.
#[derive(Debug, Clone)]
pub struct MapSnapshot {
    pub image: RgbaImage,
    pub center: GeoPoint,
    pub zoom: u8,
    pub style: MapStyle,
}

impl MapSnapshot {
    pub fn save_png(&self, path: &Path) -> Result<(), AppError> {
        self.image
            .save_with_format(path, image::ImageFormat::Png)
            .map_err(|e| AppError::ImageError(format!("{}: {}", path.display(), e)))
    }
}
