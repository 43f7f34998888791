//! Address lookups against a Nominatim-compatible geocoder.

use crate::error::AppError;
use crate::geo::GeoPoint;
use serde::Deserialize;
use tracing::{debug, warn};

pub const DEFAULT_GEOCODER_URL: &str = "https://nominatim.openstreetmap.org";

/// Appended to municipality names for forward lookups.
const REGION_SUFFIX: &str = "PR, Brasil";

const USER_AGENT: &str = concat!("laudo-pdf/", env!("CARGO_PKG_VERSION"));

/// Structured address components as returned by the reverse lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AddressParts {
    pub road: Option<String>,
    pub pedestrian: Option<String>,
    pub house_number: Option<String>,
    pub neighbourhood: Option<String>,
    pub suburb: Option<String>,
    pub city_district: Option<String>,
    pub city: Option<String>,
    pub town: Option<String>,
    pub village: Option<String>,
    pub postcode: Option<String>,
}

pub trait Geocoder {
    /// `Ok(None)` when the service has no address for the point.
    fn reverse(&self, point: GeoPoint) -> Result<Option<AddressParts>, AppError>;

    /// First match for a free-text place query.
    fn forward(&self, query: &str) -> Result<Option<GeoPoint>, AppError>;
}

pub struct NominatimGeocoder {
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    address: Option<AddressParts>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    lat: String,
    lon: String,
}

impl NominatimGeocoder {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

impl Geocoder for NominatimGeocoder {
    fn reverse(&self, point: GeoPoint) -> Result<Option<AddressParts>, AppError> {
        let url = format!("{}/reverse", self.base_url);
        debug!(%url, lat = point.lat, lon = point.lon, "reverse geocoding");
        let response: ReverseResponse = ureq::get(&url)
            .set("User-Agent", USER_AGENT)
            .query("format", "json")
            .query("lat", &point.lat.to_string())
            .query("lon", &point.lon.to_string())
            .query("addressdetails", "1")
            .call()
            .map_err(|e| AppError::GeocodeError(e.to_string()))?
            .into_json()
            .map_err(|e| AppError::GeocodeError(format!("Invalid response: {}", e)))?;
        Ok(response.address)
    }

    fn forward(&self, query: &str) -> Result<Option<GeoPoint>, AppError> {
        let url = format!("{}/search", self.base_url);
        debug!(%url, query, "forward geocoding");
        let hits: Vec<SearchHit> = ureq::get(&url)
            .set("User-Agent", USER_AGENT)
            .query("format", "json")
            .query("q", query)
            .query("limit", "1")
            .call()
            .map_err(|e| AppError::GeocodeError(e.to_string()))?
            .into_json()
            .map_err(|e| AppError::GeocodeError(format!("Invalid response: {}", e)))?;
        Ok(hits
            .first()
            .and_then(|hit| GeoPoint::parse(&hit.lat, &hit.lon)))
    }
}

/// Query used to locate a municipality.
pub fn municipality_query(municipality: &str) -> String {
    format!("{}, {}", municipality.trim(), REGION_SUFFIX)
}

fn first_filled<'a>(candidates: &[&'a Option<String>]) -> Option<&'a str> {
    candidates
        .iter()
        .filter_map(|c| (*c).as_deref())
        .map(str::trim)
        .find(|s| !s.is_empty())
}

/// Join the components as "street, number, neighbourhood, city, CEP: code",
/// skipping absent parts. A missing house number reads "S/N".
pub fn assemble_address(parts: &AddressParts) -> String {
    let street = first_filled(&[&parts.road, &parts.pedestrian, &parts.suburb]);
    let number = first_filled(&[&parts.house_number]).unwrap_or("S/N");
    let neighbourhood = first_filled(&[&parts.neighbourhood, &parts.suburb, &parts.city_district]);
    let city = first_filled(&[&parts.city, &parts.town, &parts.village]);
    let postcode = first_filled(&[&parts.postcode]).map(|cep| format!("CEP: {}", cep));

    let mut pieces: Vec<String> = Vec::new();
    if let Some(street) = street {
        pieces.push(street.to_string());
        pieces.push(number.to_string());
    }
    if let Some(n) = neighbourhood.filter(|n| Some(*n) != street) {
        pieces.push(n.to_string());
    }
    pieces.extend(city.map(str::to_string));
    pieces.extend(postcode);
    pieces.join(", ")
}

pub fn fallback_address(point: GeoPoint) -> String {
    format!(
        "Endereço não localizado para as coordenadas {} - preencher manualmente",
        point
    )
}

/// Best-effort display address for a point. Lookup failures and empty
/// results both produce the fallback text.
pub fn resolve_address(geocoder: &dyn Geocoder, point: GeoPoint) -> String {
    match geocoder.reverse(point) {
        Ok(Some(parts)) => {
            let address = assemble_address(&parts);
            if address.is_empty() {
                fallback_address(point)
            } else {
                address
            }
        }
        Ok(None) => {
            warn!(%point, "no address found for coordinates");
            fallback_address(point)
        }
        Err(e) => {
            warn!(%point, error = %e, "reverse geocoding failed");
            fallback_address(point)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn some(s: &str) -> Option<String> {
        Some(s.to_string())
    }

    struct FailingGeocoder;

    impl Geocoder for FailingGeocoder {
        fn reverse(&self, _point: GeoPoint) -> Result<Option<AddressParts>, AppError> {
            Err(AppError::GeocodeError("offline".to_string()))
        }

        fn forward(&self, _query: &str) -> Result<Option<GeoPoint>, AppError> {
            Err(AppError::GeocodeError("offline".to_string()))
        }
    }

    #[test]
    fn assembles_in_priority_order() {
        let parts = AddressParts {
            road: some("Rua XV de Novembro"),
            house_number: some("1299"),
            neighbourhood: some("Centro"),
            city: some("Curitiba"),
            postcode: some("80060-000"),
            ..Default::default()
        };
        assert_eq!(
            assemble_address(&parts),
            "Rua XV de Novembro, 1299, Centro, Curitiba, CEP: 80060-000"
        );
    }

    #[test]
    fn falls_back_through_component_chains() {
        let parts = AddressParts {
            pedestrian: some("Calçadão"),
            city_district: some("Matriz"),
            ..Default::default()
        };
        assert_eq!(assemble_address(&parts), "Calçadão, S/N, Matriz");

        let suburb_only = AddressParts {
            suburb: some("Batel"),
            ..Default::default()
        };
        assert_eq!(assemble_address(&suburb_only), "Batel, S/N");
    }

    #[test]
    fn deserializes_nominatim_payload() {
        let json = r#"{"place_id":1,"address":{"road":"Av. Sete","postcode":"80000-000","country":"Brasil"}}"#;
        let response: ReverseResponse = serde_json::from_str(json).unwrap();
        let parts = response.address.unwrap();
        assert_eq!(assemble_address(&parts), "Av. Sete, S/N, CEP: 80000-000");

        let missing: ReverseResponse = serde_json::from_str(r#"{"error":"Unable to geocode"}"#).unwrap();
        assert!(missing.address.is_none());
    }

    #[test]
    fn failure_yields_fallback_with_coordinates() {
        let point = GeoPoint::new(-25.4284, -49.2733).unwrap();
        let text = resolve_address(&FailingGeocoder, point);
        assert!(text.contains("-25.428400, -49.273300"));
        assert!(text.contains("preencher manualmente"));
    }

    #[test]
    fn municipality_query_appends_region() {
        assert_eq!(municipality_query(" Londrina "), "Londrina, PR, Brasil");
    }
}
