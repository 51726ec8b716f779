//! Engine configuration.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{AnalysisError, Result};
use crate::risk::RiskCalibration;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Points sampled along each route for weather lookups.
    pub sample_count: usize,
    /// Size of the background artifact worker pool.
    pub worker_threads: usize,
    /// Size of the pool that fetches per-point weather. Separate from the
    /// artifact workers so a job waiting on its fetches never picks up
    /// another job.
    pub weather_threads: usize,
    /// Directory artifacts are written to.
    pub output_dir: PathBuf,
    /// URL prefix under which `output_dir` is served, e.g. `/static/`.
    pub static_url_prefix: String,
    pub chart_title: String,
    pub calibration: RiskCalibration,
    /// Appended to geocoding queries to disambiguate, e.g. `", United Kingdom"`.
    pub geocode_suffix: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_count: 100,
            worker_threads: 4,
            weather_threads: 8,
            output_dir: PathBuf::from("static"),
            static_url_prefix: "/static/".to_string(),
            chart_title: "Route Optimisation: Efficiency vs Risk".to_string(),
            calibration: RiskCalibration::default(),
            geocode_suffix: None,
        }
    }
}

impl EngineConfig {
    /// Defaults overlaid with `ROUTE_RISK_SAMPLES`, `ROUTE_RISK_WORKERS`,
    /// `ROUTE_RISK_WEATHER_THREADS`, `ROUTE_RISK_OUTPUT_DIR`,
    /// `ROUTE_RISK_STATIC_URL` and `ROUTE_RISK_GEOCODE_SUFFIX`.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Some(samples) = parse_var("ROUTE_RISK_SAMPLES")? {
            config.sample_count = samples;
        }
        if let Some(workers) = parse_var("ROUTE_RISK_WORKERS")? {
            config.worker_threads = workers;
        }
        if let Some(threads) = parse_var("ROUTE_RISK_WEATHER_THREADS")? {
            config.weather_threads = threads;
        }
        if let Ok(dir) = env::var("ROUTE_RISK_OUTPUT_DIR") {
            config.output_dir = PathBuf::from(dir);
        }
        if let Ok(prefix) = env::var("ROUTE_RISK_STATIC_URL") {
            config.static_url_prefix = prefix;
        }
        if let Ok(suffix) = env::var("ROUTE_RISK_GEOCODE_SUFFIX") {
            config.geocode_suffix = Some(suffix).filter(|s| !s.trim().is_empty());
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.sample_count < 1 {
            return Err(AnalysisError::InvalidArgument(
                "sample_count must be at least 1".to_string(),
            ));
        }
        if self.worker_threads < 1 {
            return Err(AnalysisError::InvalidArgument(
                "worker_threads must be at least 1".to_string(),
            ));
        }
        if self.weather_threads < 1 {
            return Err(AnalysisError::InvalidArgument(
                "weather_threads must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// The geocoding query for a user-supplied place name.
    pub fn geocode_query(&self, place: &str) -> String {
        match &self.geocode_suffix {
            Some(suffix) => format!("{place}{suffix}"),
            None => place.to_string(),
        }
    }
}

fn parse_var<T: FromStr>(name: &str) -> Result<Option<T>> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| AnalysisError::InvalidArgument(format!("{name}={raw} is not valid"))),
        Err(_) => Ok(None),
    }
}
