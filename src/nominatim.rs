//! Nominatim (OpenStreetMap) geocoding adapter.

use serde::Deserialize;
use tracing::debug;

use crate::error::{AnalysisError, Result};
use crate::polyline::Coordinate;
use crate::traits::Geocoder;

const SERVICE: &str = "nominatim";

#[derive(Debug, Clone)]
pub struct NominatimConfig {
    pub base_url: String,
    /// Nominatim's usage policy requires an identifying User-Agent.
    pub user_agent: String,
    pub timeout_secs: u64,
}

impl Default for NominatimConfig {
    fn default() -> Self {
        Self {
            base_url: "https://nominatim.openstreetmap.org".to_string(),
            user_agent: concat!("route-risk/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NominatimClient {
    config: NominatimConfig,
    client: reqwest::blocking::Client,
}

impl NominatimClient {
    pub fn new(config: NominatimConfig) -> std::result::Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self { config, client })
    }
}

impl Geocoder for NominatimClient {
    fn geocode(&self, query: &str) -> Result<Option<Coordinate>> {
        let url = format!("{}/search", self.config.base_url.trim_end_matches('/'));
        debug!(%query, "geocoding");

        let places: Vec<NominatimPlace> = self
            .client
            .get(&url)
            .query(&[("q", query), ("format", "json"), ("limit", "1")])
            .send()
            .and_then(|resp| resp.error_for_status())
            .and_then(|resp| resp.json())
            .map_err(AnalysisError::http(SERVICE))?;

        first_coordinate(places)
    }
}

fn first_coordinate(places: Vec<NominatimPlace>) -> Result<Option<Coordinate>> {
    let Some(place) = places.into_iter().next() else {
        return Ok(None);
    };
    // Nominatim encodes coordinates as decimal strings
    let parse = |raw: &str| {
        raw.parse::<f64>()
            .map_err(|_| AnalysisError::upstream(SERVICE, format!("invalid coordinate '{raw}'")))
    };
    Ok(Some(Coordinate::new(parse(&place.lat)?, parse(&place.lon)?)))
}

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
}
