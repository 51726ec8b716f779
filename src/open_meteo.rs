//! Open-Meteo daily forecast adapter.
//!
//! One request per sample point, for a single day (start = end), in UTC.
//! Transient failures are retried with a linear back-off; fields the API
//! leaves empty come back as unknown.

use std::thread;
use std::time::Duration;

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{AnalysisError, Result};
use crate::polyline::Coordinate;
use crate::traits::WeatherProvider;
use crate::weather::WeatherObservation;

const SERVICE: &str = "open-meteo";

const DAILY_VARIABLES: &str = "temperature_2m_min,temperature_2m_max,precipitation_sum,\
precipitation_probability_max,snowfall_sum,wind_speed_10m_max,wind_gusts_10m_max,\
visibility_min,weathercode";

#[derive(Debug, Clone)]
pub struct OpenMeteoConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    /// Extra attempts after the first failure.
    pub retries: u32,
    /// Back-off before retry `n` is `n * retry_backoff`.
    pub retry_backoff: Duration,
}

impl Default for OpenMeteoConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.open-meteo.com/v1/forecast".to_string(),
            timeout_secs: 20,
            retries: 2,
            retry_backoff: Duration::from_millis(500),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OpenMeteoClient {
    config: OpenMeteoConfig,
    client: reqwest::blocking::Client,
}

impl OpenMeteoClient {
    pub fn new(config: OpenMeteoConfig) -> std::result::Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    fn fetch_once(&self, point: Coordinate, date: &str) -> Result<OpenMeteoResponse> {
        let response = self
            .client
            .get(&self.config.base_url)
            .query(&[
                ("latitude", point.lat.to_string()),
                ("longitude", point.lon.to_string()),
                ("daily", DAILY_VARIABLES.to_string()),
                ("start_date", date.to_string()),
                ("end_date", date.to_string()),
                ("timezone", "UTC".to_string()),
            ])
            .send()
            .map_err(AnalysisError::http(SERVICE))?;
        let status = response.status();

        let body: OpenMeteoResponse = response.json().map_err(|err| {
            if status.is_success() {
                AnalysisError::Http {
                    service: SERVICE,
                    source: err,
                }
            } else {
                AnalysisError::upstream(SERVICE, format!("HTTP {status}"))
            }
        })?;

        if body.error {
            let reason = body.reason.unwrap_or_else(|| format!("HTTP {status}"));
            return Err(AnalysisError::upstream(SERVICE, reason));
        }
        Ok(body)
    }
}

impl WeatherProvider for OpenMeteoClient {
    fn daily_weather(&self, point: Coordinate, date: NaiveDate) -> Result<WeatherObservation> {
        let date = date.format("%Y-%m-%d").to_string();
        let mut attempt = 0;
        loop {
            match self.fetch_once(point, &date) {
                Ok(body) => {
                    debug!(lat = point.lat, lon = point.lon, %date, "fetched daily weather");
                    return Ok(body.into_observation(point));
                }
                Err(err) if attempt < self.config.retries => {
                    attempt += 1;
                    warn!(lat = point.lat, lon = point.lon, attempt, error = %err, "weather request failed, retrying");
                    thread::sleep(self.config.retry_backoff * attempt);
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct OpenMeteoResponse {
    #[serde(default)]
    error: bool,
    reason: Option<String>,
    daily: Option<DailyData>,
}

type DailySeries = Option<Vec<Option<f64>>>;

#[derive(Debug, Default, Deserialize)]
struct DailyData {
    temperature_2m_min: DailySeries,
    temperature_2m_max: DailySeries,
    precipitation_sum: DailySeries,
    precipitation_probability_max: DailySeries,
    snowfall_sum: DailySeries,
    wind_speed_10m_max: DailySeries,
    wind_gusts_10m_max: DailySeries,
    visibility_min: DailySeries,
    weathercode: DailySeries,
}

impl OpenMeteoResponse {
    fn into_observation(self, point: Coordinate) -> WeatherObservation {
        let daily = self.daily.unwrap_or_default();
        // Single-day requests: the first element is the day
        let first = |series: DailySeries| series.and_then(|values| values.into_iter().next().flatten());

        WeatherObservation {
            point: Some(point),
            temp_min: first(daily.temperature_2m_min),
            temp_max: first(daily.temperature_2m_max),
            precip_mm: first(daily.precipitation_sum),
            precip_prob_max: first(daily.precipitation_probability_max),
            snowfall_mm: first(daily.snowfall_sum),
            wind_speed_max: first(daily.wind_speed_10m_max),
            wind_gusts_max: first(daily.wind_gusts_10m_max),
            visibility_min: first(daily.visibility_min),
            weathercode: first(daily.weathercode),
        }
    }
}
