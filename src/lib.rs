//! laudo-pdf: damage assessment reports for properties affected by climate
//! events, with a composite map snapshot of the inspected location.

pub mod classification;
pub mod engineers;
pub mod error;
pub mod export;
pub mod geo;
pub mod geocode;
pub mod geolocation;
pub mod input;
pub mod map;
pub mod masks;
pub mod model;
pub mod raster;
pub mod render;
pub mod session;

pub use error::AppError;
