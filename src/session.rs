//! One inspection session: the report being edited plus the side-effects
//! its edits trigger on the map and the geocoder.

use crate::engineers::{EngineerRecord, EngineerRegistry};
use crate::geo::GeoPoint;
use crate::geocode::{municipality_query, resolve_address, Geocoder};
use crate::geolocation::{GeolocationError, GeolocationOptions, LocationProvider};
use crate::map::{MapCompositor, MapController, MapSnapshot, MapStyle};
use crate::model::{ReportRecord, ScalarField};
use tracing::{debug, info};

/// Zoom used when the map is re-centred on a municipality.
pub const MUNICIPALITY_ZOOM: u8 = 14;
pub const DEFAULT_ZOOM: u8 = 17;

/// Identifies one preview request; only the most recent one may land.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct PreviewToken(u64);

#[derive(Debug, Default)]
pub struct PreviewTokens {
    latest: u64,
}

impl PreviewTokens {
    pub fn begin(&mut self) -> PreviewToken {
        self.latest += 1;
        PreviewToken(self.latest)
    }

    pub fn is_current(&self, token: PreviewToken) -> bool {
        token.0 == self.latest
    }
}

pub struct InspectionSession<M: MapController> {
    record: ReportRecord,
    engineers: EngineerRegistry,
    map: M,
    geocoder: Option<Box<dyn Geocoder>>,
    zoom: u8,
    previews: PreviewTokens,
    snapshot: Option<MapSnapshot>,
}

impl<M: MapController> InspectionSession<M> {
    pub fn new(
        record: ReportRecord,
        engineers: EngineerRegistry,
        map: M,
        geocoder: Option<Box<dyn Geocoder>>,
    ) -> Self {
        Self {
            record,
            engineers,
            map,
            geocoder,
            zoom: DEFAULT_ZOOM,
            previews: PreviewTokens::default(),
            snapshot: None,
        }
    }

    pub fn record(&self) -> &ReportRecord {
        &self.record
    }

    pub fn record_mut(&mut self) -> &mut ReportRecord {
        &mut self.record
    }

    pub fn map(&self) -> &M {
        &self.map
    }

    pub fn zoom(&self) -> u8 {
        self.zoom
    }

    pub fn set_zoom(&mut self, zoom: u8) {
        self.zoom = zoom.min(22);
    }

    pub fn engineers_mut(&mut self) -> &mut EngineerRegistry {
        &mut self.engineers
    }

    pub fn engineer(&self) -> Option<&EngineerRecord> {
        self.record.engineer_id().and_then(|id| self.engineers.find(id))
    }

    pub fn snapshot(&self) -> Option<&MapSnapshot> {
        self.snapshot.as_ref()
    }

    /// Store the municipality and re-centre on it. A failed lookup leaves the
    /// map and coordinates as they were.
    pub fn change_municipality(&mut self, name: &str) {
        self.record.set_field(ScalarField::Municipality, name);
        let Some(geocoder) = self.geocoder.as_deref() else {
            return;
        };
        match geocoder.forward(&municipality_query(name)) {
            Ok(Some(point)) => {
                self.map.set_view(point, MUNICIPALITY_ZOOM);
                self.map.set_marker(point);
                self.record.set_coordinates(point);
                self.zoom = MUNICIPALITY_ZOOM;
                info!(municipality = name, %point, "map re-centred on municipality");
            }
            Ok(None) => debug!(municipality = name, "municipality not found, map unchanged"),
            Err(e) => debug!(municipality = name, error = %e, "municipality lookup failed, map unchanged"),
        }
    }

    /// A position picked on the map, dragged to, or reported by GPS.
    pub fn pick_location(&mut self, point: GeoPoint) {
        self.record.set_coordinates(point);
        self.map.set_marker(point);
        if let Some(geocoder) = self.geocoder.as_deref() {
            let address = resolve_address(geocoder, point);
            self.record.set_field(ScalarField::Address, &address);
        }
    }

    /// Manually typed coordinates. The map and address only follow once both
    /// values parse.
    pub fn type_coordinates(&mut self, latitude: &str, longitude: &str) -> Option<GeoPoint> {
        self.record.set_coordinates_text(latitude, longitude);
        let point = self.record.coordinates().point()?;
        self.map.set_view(point, self.zoom);
        self.pick_location(point);
        Some(point)
    }

    pub fn locate_device(
        &mut self,
        provider: &dyn LocationProvider,
        options: &GeolocationOptions,
    ) -> Result<GeoPoint, GeolocationError> {
        let point = provider.current_position(options)?;
        self.map.set_view(point, self.zoom);
        self.pick_location(point);
        Ok(point)
    }

    pub fn begin_preview(&mut self) -> PreviewToken {
        self.previews.begin()
    }

    /// Accept a snapshot (or its absence) for `token`. Results of superseded
    /// requests are discarded.
    pub fn finish_preview(&mut self, token: PreviewToken, snapshot: Option<MapSnapshot>) -> bool {
        if !self.previews.is_current(token) {
            debug!(?token, "discarding stale preview result");
            return false;
        }
        self.snapshot = snapshot;
        true
    }

    /// Compose a fresh snapshot for the current coordinates. Without a
    /// compositor or valid coordinates the preview has no map.
    pub fn refresh_preview(&mut self, compositor: Option<&MapCompositor<'_>>, style: MapStyle) -> bool {
        let token = self.begin_preview();
        let snapshot = match (compositor, self.record.coordinates().point()) {
            (Some(compositor), Some(point)) => compositor.compose(point, self.zoom, style),
            _ => None,
        };
        self.finish_preview(token, snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::geocode::AddressParts;
    use crate::geolocation::FixedLocation;
    use crate::map::layers::{Layer, LayerRequest};
    use crate::map::{HeadlessMap, LayerService};
    use crate::render::{Block, Branding, Renderer, SectionKind};
    use chrono::NaiveDate;
    use image::{Rgba, RgbaImage};

    /// Serves every layer except satellite imagery.
    struct ImageryOutage;

    impl LayerService for ImageryOutage {
        fn fetch(&self, request: &LayerRequest) -> Result<RgbaImage, AppError> {
            match request.layer {
                Layer::Satellite => Err(AppError::MapLayerError("imagery offline".to_string())),
                _ => Ok(RgbaImage::from_pixel(request.width, request.height, Rgba([0, 0, 0, 0]))),
            }
        }
    }

    struct StubGeocoder {
        city: Option<GeoPoint>,
    }

    impl Geocoder for StubGeocoder {
        fn reverse(&self, _point: GeoPoint) -> Result<Option<AddressParts>, AppError> {
            Ok(Some(AddressParts {
                road: Some("Rua das Flores".to_string()),
                house_number: Some("10".to_string()),
                ..Default::default()
            }))
        }

        fn forward(&self, _query: &str) -> Result<Option<GeoPoint>, AppError> {
            self.city
                .map(Some)
                .ok_or_else(|| AppError::GeocodeError("no network".to_string()))
        }
    }

    fn session(city: Option<GeoPoint>) -> InspectionSession<HeadlessMap> {
        let record = ReportRecord::new(NaiveDate::from_ymd_opt(2025, 1, 2).unwrap());
        InspectionSession::new(
            record,
            EngineerRegistry::default(),
            HeadlessMap::new(),
            Some(Box::new(StubGeocoder { city })),
        )
    }

    fn snapshot(center: GeoPoint) -> MapSnapshot {
        MapSnapshot {
            image: RgbaImage::new(4, 4),
            center,
            zoom: 17,
            style: MapStyle::Hybrid,
        }
    }

    #[test]
    fn municipality_change_recentres_map() {
        let londrina = GeoPoint::new(-23.3045, -51.1696).unwrap();
        let mut s = session(Some(londrina));
        s.change_municipality("Londrina");
        assert_eq!(s.record().get(ScalarField::Municipality), "Londrina");
        assert_eq!(s.map().view(), Some((londrina, MUNICIPALITY_ZOOM)));
        assert_eq!(s.record().coordinates().point(), Some(londrina));
        assert_eq!(s.zoom(), MUNICIPALITY_ZOOM);
    }

    #[test]
    fn failed_municipality_lookup_is_a_no_op() {
        let mut s = session(None);
        let before = GeoPoint::new(-25.0, -49.0).unwrap();
        s.pick_location(before);
        s.change_municipality("Atlantis");
        assert_eq!(s.record().get(ScalarField::Municipality), "Atlantis");
        assert_eq!(s.map().view(), None);
        assert_eq!(s.map().marker(), Some(before));
        assert_eq!(s.record().coordinates().latitude, "-25.000000");
    }

    #[test]
    fn picking_a_location_fills_address() {
        let mut s = session(None);
        s.pick_location(GeoPoint::new(-25.4284, -49.2733).unwrap());
        assert_eq!(s.record().get(ScalarField::Address), "Rua das Flores, 10");
    }

    #[test]
    fn typed_coordinates_need_both_values() {
        let mut s = session(None);
        assert!(s.type_coordinates("-25.1", "").is_none());
        assert_eq!(s.map().marker(), None);
        assert!(s.record().get(ScalarField::Address).is_empty());

        assert!(s.type_coordinates("-25.1", "-49.3").is_some());
        assert!(s.map().marker().is_some());
    }

    #[test]
    fn device_location_errors_surface_unchanged() {
        let mut s = session(None);
        let err = s
            .locate_device(&FixedLocation::new(None), &GeolocationOptions::default())
            .unwrap_err();
        assert_eq!(err, GeolocationError::PositionUnavailable);
        assert!(s.record().coordinates().point().is_none());
    }

    #[test]
    fn stale_preview_results_are_discarded() {
        let mut s = session(None);
        let point = GeoPoint::new(-25.0, -49.0).unwrap();
        let first = s.begin_preview();
        let second = s.begin_preview();
        assert!(s.finish_preview(second, Some(snapshot(point))));
        assert!(!s.finish_preview(first, None));
        assert!(s.snapshot().is_some());
    }

    #[test]
    fn preview_without_compositor_has_no_map() {
        let mut s = session(None);
        s.pick_location(GeoPoint::new(-25.0, -49.0).unwrap());
        assert!(s.refresh_preview(None, MapStyle::Hybrid));
        assert!(s.snapshot().is_none());
    }

    #[test]
    fn base_layer_outage_prints_placeholder() {
        let mut s = session(None);
        s.pick_location(GeoPoint::new(-25.4284, -49.2733).unwrap());

        let service = ImageryOutage;
        let compositor = MapCompositor::new(&service).with_size(64, 40);
        assert!(s.refresh_preview(Some(&compositor), MapStyle::Hybrid));
        assert!(s.snapshot().is_none());

        let document = Renderer::new(&Branding::default()).render(s.record(), s.engineer(), s.snapshot());
        let map = document.section(SectionKind::Map).unwrap();
        assert!(map.blocks.iter().any(|b| matches!(
            b,
            Block::MapPlaceholder { coordinates } if coordinates.text() == "-25.428400, -49.273300"
        )));
        assert!(!map.blocks.iter().any(|b| matches!(b, Block::MapImage(_))));
    }
}
