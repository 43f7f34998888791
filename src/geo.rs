//! Coordinates and Web Mercator framing for static map requests.

use std::f64::consts::PI;
use std::fmt;

/// Ground resolution at the equator for zoom 0, metres per pixel (256px tiles).
const EQUATOR_METERS_PER_PIXEL: f64 = 156_543.033_92;

/// Metres spanned by one degree of latitude.
const METERS_PER_DEGREE: f64 = 111_320.0;

/// Latitude limit of the Web Mercator projection.
const MAX_MERCATOR_LAT: f64 = 85.051_128_78;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    /// Both components must be finite and inside the projection's range.
    pub fn new(lat: f64, lon: f64) -> Option<Self> {
        let valid = lat.is_finite()
            && lon.is_finite()
            && lat.abs() <= MAX_MERCATOR_LAT
            && lon.abs() <= 180.0;
        valid.then_some(Self { lat, lon })
    }

    /// Parse a pair of decimal-degree strings as typed in the form.
    pub fn parse(lat: &str, lon: &str) -> Option<Self> {
        let lat = lat.trim().replace(',', ".").parse::<f64>().ok()?;
        let lon = lon.trim().replace(',', ".").parse::<f64>().ok()?;
        Self::new(lat, lon)
    }

    /// Parse `"lat,lon"` as accepted on the command line.
    pub fn parse_pair(pair: &str) -> Option<Self> {
        let (lat, lon) = pair.split_once(',')?;
        Self::parse(lat, lon)
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}, {:.6}", self.lat, self.lon)
    }
}

/// Geographic extent in WGS-84: (min_lon, min_lat, max_lon, max_lat).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    /// Frame `width` x `height` pixels around `center` at `zoom`, matching what
    /// a slippy-map widget of that size shows at the same zoom.
    pub fn around(center: GeoPoint, zoom: u8, width: u32, height: u32) -> Self {
        let meters_per_pixel = ground_resolution(center.lat, zoom);
        let half_width_m = meters_per_pixel * f64::from(width) / 2.0;
        let half_height_m = meters_per_pixel * f64::from(height) / 2.0;

        let lat_delta = half_height_m / METERS_PER_DEGREE;
        let lon_delta = half_width_m / (METERS_PER_DEGREE * center.lat.to_radians().cos());

        Self {
            min_lon: center.lon - lon_delta,
            min_lat: center.lat - lat_delta,
            max_lon: center.lon + lon_delta,
            max_lat: center.lat + lat_delta,
        }
    }

    pub fn center(&self) -> GeoPoint {
        GeoPoint {
            lat: (self.min_lat + self.max_lat) / 2.0,
            lon: (self.min_lon + self.max_lon) / 2.0,
        }
    }

    /// Comma-joined form used by map export endpoints.
    pub fn to_query(&self) -> String {
        format!(
            "{},{},{},{}",
            self.min_lon, self.min_lat, self.max_lon, self.max_lat
        )
    }
}

/// Metres per pixel at `lat` for the given zoom level.
pub fn ground_resolution(lat: f64, zoom: u8) -> f64 {
    let zoom = zoom.min(22);
    EQUATOR_METERS_PER_PIXEL * (lat * PI / 180.0).cos() / f64::from(1u32 << zoom)
}
