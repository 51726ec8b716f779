//! OSRM HTTP adapter for route geometries.

use serde::Deserialize;
use tracing::debug;

use crate::error::{AnalysisError, Result};
use crate::polyline::{Coordinate, Polyline};
use crate::traits::RouteProvider;

const SERVICE: &str = "osrm";

#[derive(Debug, Clone)]
pub struct OsrmConfig {
    pub base_url: String,
    pub profile: String,
    pub timeout_secs: u64,
}

impl Default for OsrmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://router.project-osrm.org".to_string(),
            profile: "driving".to_string(),
            timeout_secs: 20,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OsrmClient {
    config: OsrmConfig,
    client: reqwest::blocking::Client,
}

impl OsrmClient {
    pub fn new(config: OsrmConfig) -> std::result::Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    fn route_url(&self, origin: Coordinate, destination: Coordinate) -> String {
        format!(
            "{}/route/v1/{}/{:.6},{:.6};{:.6},{:.6}?overview=full&geometries=geojson",
            self.config.base_url.trim_end_matches('/'),
            self.config.profile,
            origin.lon,
            origin.lat,
            destination.lon,
            destination.lat
        )
    }
}

impl RouteProvider for OsrmClient {
    fn route(&self, origin: Coordinate, destination: Coordinate) -> Result<Polyline> {
        let url = self.route_url(origin, destination);
        debug!(%url, "requesting route");

        let response = self
            .client
            .get(&url)
            .send()
            .map_err(AnalysisError::http(SERVICE))?;
        let status = response.status();

        // OSRM reports routing failures as JSON with a non-2xx status
        let body: OsrmRouteResponse = response.json().map_err(|err| {
            if status.is_success() {
                AnalysisError::Http {
                    service: SERVICE,
                    source: err,
                }
            } else {
                AnalysisError::upstream(SERVICE, format!("HTTP {status}"))
            }
        })?;

        into_polyline(body)
    }
}

fn into_polyline(body: OsrmRouteResponse) -> Result<Polyline> {
    if body.code != "Ok" {
        let message = body.message.unwrap_or(body.code);
        return Err(AnalysisError::upstream(SERVICE, message));
    }

    let route = body
        .routes
        .into_iter()
        .next()
        .ok_or_else(|| AnalysisError::upstream(SERVICE, "response contained no routes"))?;

    Ok(route
        .geometry
        .coordinates
        .into_iter()
        .map(Coordinate::from_lon_lat)
        .collect())
}

#[derive(Debug, Deserialize)]
struct OsrmRouteResponse {
    code: String,
    message: Option<String>,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    geometry: OsrmGeometry,
}

#[derive(Debug, Deserialize)]
struct OsrmGeometry {
    coordinates: Vec<[f64; 2]>,
}
