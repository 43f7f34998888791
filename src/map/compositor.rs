//! Flattened map snapshots for embedding in the printed report.

use super::layers::{Layer, LayerRequest, LayerService};
use super::pin::stamp_pin;
use super::{MapSnapshot, MapStyle};
use crate::error::AppError;
use crate::geo::{BoundingBox, GeoPoint};
use image::{imageops, RgbaImage};
use tracing::{info, warn};

pub const SNAPSHOT_WIDTH: u32 = 800;
pub const SNAPSHOT_HEIGHT: u32 = 500;

const NO_OVERLAYS: &[Layer] = &[];
const IMAGERY_OVERLAYS: &[Layer] = &[Layer::Transportation, Layer::Places];

/// Base layer plus the overlays composited on top of it, in drawing order.
fn layer_plan(style: MapStyle) -> (Layer, &'static [Layer]) {
    match style {
        MapStyle::Street => (Layer::Street, NO_OVERLAYS),
        MapStyle::Satellite | MapStyle::Hybrid => (Layer::Satellite, IMAGERY_OVERLAYS),
    }
}

pub struct MapCompositor<'a> {
    service: &'a dyn LayerService,
    width: u32,
    height: u32,
}

impl<'a> MapCompositor<'a> {
    pub fn new(service: &'a dyn LayerService) -> Self {
        Self {
            service,
            width: SNAPSHOT_WIDTH,
            height: SNAPSHOT_HEIGHT,
        }
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Fetch and flatten every layer for `center` at `zoom`, then mark the
    /// centre. Returns `None` when the base layer cannot be fetched; failed
    /// overlays are left out.
    pub fn compose(&self, center: GeoPoint, zoom: u8, style: MapStyle) -> Option<MapSnapshot> {
        let bbox = BoundingBox::around(center, zoom, self.width, self.height);
        let (width, height) = (self.width, self.height);
        let request_for = move |layer: Layer| LayerRequest {
            layer,
            bbox,
            width,
            height,
        };
        let (base_layer, overlay_layers) = layer_plan(style);
        let service = self.service;

        let (base, overlays) = std::thread::scope(|s| {
            let handles: Vec<_> = overlay_layers
                .iter()
                .map(|&layer| (layer, s.spawn(move || service.fetch(&request_for(layer)))))
                .collect();
            let base = service.fetch(&request_for(base_layer));
            let overlays: Vec<(Layer, Result<RgbaImage, AppError>)> = handles
                .into_iter()
                .map(|(layer, handle)| {
                    let result = handle.join().unwrap_or_else(|_| {
                        Err(AppError::MapLayerError(format!("{:?} fetch panicked", layer)))
                    });
                    (layer, result)
                })
                .collect();
            (base, overlays)
        });

        let mut image = match base {
            Ok(image) => image,
            Err(e) => {
                warn!(error = %e, "base map layer unavailable, snapshot skipped");
                return None;
            }
        };

        for (layer, result) in overlays {
            match result {
                Ok(overlay) => imageops::overlay(&mut image, &overlay, 0, 0),
                Err(e) => warn!(?layer, error = %e, "overlay layer dropped"),
            }
        }

        let (cx, cy) = (image.width() / 2, image.height() / 2);
        stamp_pin(&mut image, cx, cy);

        info!(
            lat = center.lat,
            lon = center.lon,
            zoom,
            ?style,
            "map snapshot composed"
        );
        Some(MapSnapshot {
            image,
            center,
            zoom,
            style,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use std::collections::HashSet;
    use std::sync::Mutex;

    struct StubService {
        failing: HashSet<Layer>,
        requests: Mutex<Vec<LayerRequest>>,
    }

    impl StubService {
        fn new(failing: &[Layer]) -> Self {
            Self {
                failing: failing.iter().copied().collect(),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn requested(&self) -> Vec<Layer> {
            self.requests.lock().unwrap().iter().map(|r| r.layer).collect()
        }
    }

    impl LayerService for StubService {
        fn fetch(&self, request: &LayerRequest) -> Result<RgbaImage, AppError> {
            self.requests.lock().unwrap().push(*request);
            if self.failing.contains(&request.layer) {
                return Err(AppError::MapLayerError("stubbed failure".to_string()));
            }
            let (w, h) = (request.width, request.height);
            Ok(match request.layer {
                Layer::Street => RgbaImage::from_pixel(w, h, Rgba([240, 235, 220, 255])),
                Layer::Satellite => RgbaImage::from_pixel(w, h, Rgba([40, 90, 40, 255])),
                // Opaque only in the top-left corner, transparent elsewhere.
                Layer::Transportation => RgbaImage::from_fn(w, h, |x, y| {
                    if x < 10 && y < 10 {
                        Rgba([250, 200, 0, 255])
                    } else {
                        Rgba([0, 0, 0, 0])
                    }
                }),
                Layer::Places => RgbaImage::from_fn(w, h, |x, y| {
                    if x < 5 && y < 5 {
                        Rgba([255, 255, 255, 255])
                    } else {
                        Rgba([0, 0, 0, 0])
                    }
                }),
            })
        }
    }

    fn curitiba() -> GeoPoint {
        GeoPoint::new(-25.4284, -49.2733).unwrap()
    }

    #[test]
    fn hybrid_requests_base_and_both_overlays_for_framed_bbox() {
        let service = StubService::new(&[]);
        let snapshot = MapCompositor::new(&service)
            .compose(curitiba(), 14, MapStyle::Hybrid)
            .expect("snapshot");

        let requested: HashSet<Layer> = service.requested().into_iter().collect();
        assert_eq!(
            requested,
            HashSet::from([Layer::Satellite, Layer::Transportation, Layer::Places])
        );
        let expected_bbox = BoundingBox::around(curitiba(), 14, SNAPSHOT_WIDTH, SNAPSHOT_HEIGHT);
        for request in service.requests.lock().unwrap().iter() {
            assert_eq!(request.bbox, expected_bbox);
            assert_eq!((request.width, request.height), (800, 500));
        }

        let image = &snapshot.image;
        assert_eq!(image.dimensions(), (800, 500));
        // Places drawn over transportation, transportation over imagery.
        assert_eq!(*image.get_pixel(2, 2), Rgba([255, 255, 255, 255]));
        assert_eq!(*image.get_pixel(7, 7), Rgba([250, 200, 0, 255]));
        assert_eq!(*image.get_pixel(100, 100), Rgba([40, 90, 40, 255]));
        // Pin head above the centre.
        let head = image.get_pixel(400, 250 - 20);
        assert!(head[0] > 180 && head[1] < 90, "{head:?}");
        assert_eq!(snapshot.zoom, 14);
        assert_eq!(snapshot.center, curitiba());
    }

    #[test]
    fn failed_overlays_are_dropped() {
        let service = StubService::new(&[Layer::Transportation, Layer::Places]);
        let snapshot = MapCompositor::new(&service)
            .compose(curitiba(), 14, MapStyle::Satellite)
            .expect("base layer still renders");
        assert_eq!(*snapshot.image.get_pixel(2, 2), Rgba([40, 90, 40, 255]));
    }

    #[test]
    fn failed_base_yields_none() {
        let service = StubService::new(&[Layer::Satellite]);
        assert!(MapCompositor::new(&service)
            .compose(curitiba(), 14, MapStyle::Hybrid)
            .is_none());
    }

    #[test]
    fn street_style_fetches_a_single_layer() {
        let service = StubService::new(&[]);
        let snapshot = MapCompositor::new(&service)
            .with_size(320, 200)
            .compose(curitiba(), 16, MapStyle::Street)
            .expect("snapshot");
        assert_eq!(service.requested(), [Layer::Street]);
        assert_eq!(snapshot.image.dimensions(), (320, 200));
    }
}
