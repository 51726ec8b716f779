//! Interfaces to the external collaborators of the analysis engine.
//!
//! Network-backed implementations live in [`crate::osrm`],
//! [`crate::nominatim`] and [`crate::open_meteo`]. Implementations must be
//! shareable across worker threads.

use std::path::Path;

use chrono::NaiveDate;

use crate::artifact::ComparisonPoint;
use crate::error::Result;
use crate::polyline::{Coordinate, Polyline};
use crate::weather::WeatherObservation;

/// Resolves a free-text place query to a coordinate.
pub trait Geocoder: Send + Sync {
    /// `Ok(None)` when the service has no match for `query`.
    fn geocode(&self, query: &str) -> Result<Option<Coordinate>>;
}

/// Produces a route geometry between two points.
pub trait RouteProvider: Send + Sync {
    fn route(&self, origin: Coordinate, destination: Coordinate) -> Result<Polyline>;
}

/// Daily weather at a single point.
pub trait WeatherProvider: Send + Sync {
    /// Fields the source could not provide are left as `None`.
    fn daily_weather(&self, point: Coordinate, date: NaiveDate) -> Result<WeatherObservation>;
}

/// Turns comparison points into a static artifact at `out_path`.
pub trait ChartRenderer: Send + Sync {
    fn render(&self, points: &[ComparisonPoint], title: &str, out_path: &Path) -> Result<()>;

    /// Extension of the files this renderer writes.
    fn file_extension(&self) -> &'static str {
        "png"
    }
}
