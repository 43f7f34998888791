//! Device location as an external collaborator.

use crate::geo::GeoPoint;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeolocationOptions {
    pub high_accuracy: bool,
    pub timeout: Duration,
    pub max_age: Duration,
}

impl Default for GeolocationOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout: Duration::from_secs(10),
            max_age: Duration::ZERO,
        }
    }
}

/// Each failure class carries its own message for the inspector.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeolocationError {
    #[error("Permissão de localização negada. Autorize o acesso à localização e tente novamente.")]
    PermissionDenied,
    #[error("Localização indisponível. Verifique o GPS ou informe as coordenadas manualmente.")]
    PositionUnavailable,
    #[error("Tempo esgotado ao obter a localização. Tente novamente em área aberta.")]
    Timeout,
}

pub trait LocationProvider {
    fn current_position(&self, options: &GeolocationOptions) -> Result<GeoPoint, GeolocationError>;
}

/// A provider answering with a fix supplied up front, e.g. from the command line.
#[derive(Debug, Clone, Default)]
pub struct FixedLocation {
    fix: Option<GeoPoint>,
}

impl FixedLocation {
    pub fn new(fix: Option<GeoPoint>) -> Self {
        Self { fix }
    }
}

impl LocationProvider for FixedLocation {
    fn current_position(&self, options: &GeolocationOptions) -> Result<GeoPoint, GeolocationError> {
        if options.timeout.is_zero() {
            return Err(GeolocationError::Timeout);
        }
        self.fix.ok_or(GeolocationError::PositionUnavailable)
    }
}
