//! Route analysis engine: the pipeline, its cache and the artifact jobs.
//!
//! ```text
//! analyze ──► AnalysisCache ──miss──► geocode ► route ► resample ► weather ► score
//! submit_artifact ──► ArtifactKey ──► JobScheduler ──► analyses per date ► ChartRenderer
//! ```
//!
//! Each engine owns its cache and job registry, so independent engines (and
//! tests) never share state.

use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::{Arc, mpsc};

use chrono::NaiveDate;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::artifact::{ArtifactKey, ComparisonPoint};
use crate::cache::{AnalysisCache, AnalysisKey, CachedAnalysis};
use crate::chart::JsonChartWriter;
use crate::config::EngineConfig;
use crate::error::{AnalysisError, Result};
use crate::jobs::{JobScheduler, JobStatus};
use crate::nominatim::{NominatimClient, NominatimConfig};
use crate::open_meteo::{OpenMeteoClient, OpenMeteoConfig};
use crate::osrm::{OsrmClient, OsrmConfig};
use crate::polyline::Coordinate;
use crate::resample::resample;
use crate::risk::{self, RiskLevel, RiskScore};
use crate::traits::{ChartRenderer, Geocoder, RouteProvider, WeatherProvider};
use crate::weather::{WeatherMatrix, WeatherObservation};

/// Kilometers per hour in one knot.
pub const KNOT_KMH: f64 = 1.852;

/// Speed-specific view of a cached analysis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RouteAnalysis {
    pub distance_km: f64,
    pub hours: f64,
    pub risk_score: RiskScore,
    pub risk_level: RiskLevel,
}

/// Returned by [`RouteAnalysisEngine::submit_artifact`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactTicket {
    pub status: JobStatus,
    pub key: ArtifactKey,
    pub out_path: PathBuf,
    /// Where the artifact is served once ready, under the static URL prefix.
    pub plot_url: String,
}

/// Hours to cover `distance_km` at `speed_knots`.
pub fn estimate_travel_hours(distance_km: f64, speed_knots: f64) -> Result<f64> {
    validate_speed(speed_knots)?;
    Ok(distance_km / (speed_knots * KNOT_KMH))
}

fn validate_speed(speed_knots: f64) -> Result<()> {
    if speed_knots.is_finite() && speed_knots > 0.0 {
        Ok(())
    } else {
        Err(AnalysisError::InvalidArgument(format!(
            "speed must be positive, got {speed_knots} knots"
        )))
    }
}

/// The expensive, speed-independent part of the engine. Shared with
/// background jobs.
struct Analyzer {
    geocoder: Arc<dyn Geocoder>,
    router: Arc<dyn RouteProvider>,
    weather: Arc<dyn WeatherProvider>,
    weather_pool: ThreadPool,
    cache: AnalysisCache,
    config: EngineConfig,
}

impl Analyzer {
    fn cached(&self, origin: &str, destination: &str, date: NaiveDate) -> Result<CachedAnalysis> {
        let key = AnalysisKey::new(origin, destination, date);
        self.cache.analyze(&key, || self.resolve(origin, destination, date))
    }

    fn resolve(&self, origin: &str, destination: &str, date: NaiveDate) -> Result<CachedAnalysis> {
        let start = self.locate(origin)?;
        let end = self.locate(destination)?;

        let route = self.router.route(start, end)?;
        let sampled = resample(&route, self.config.sample_count)?;

        let observations = self.fetch_weather(sampled.into_points(), date)?;
        let matrix = WeatherMatrix::from_observations(&observations);
        let risk_score = risk::score_with(&matrix, &self.config.calibration);

        let distance_km = route.length_km();
        info!(
            origin,
            destination,
            %date,
            distance_km,
            risk = risk_score.value(),
            "route analysed"
        );

        Ok(CachedAnalysis {
            distance_km,
            risk_score,
        })
    }

    /// Fetches weather for every point on the weather pool, preserving order.
    ///
    /// The caller blocks on a channel rather than joining rayon work, so an
    /// artifact worker waiting here never steals a queued job.
    fn fetch_weather(
        &self,
        points: Vec<Coordinate>,
        date: NaiveDate,
    ) -> Result<Vec<WeatherObservation>> {
        let weather = Arc::clone(&self.weather);
        let (tx, rx) = mpsc::channel();

        self.weather_pool.spawn(move || {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                points
                    .par_iter()
                    .map(|point| weather.daily_weather(*point, date))
                    .collect::<Result<Vec<_>>>()
            }));
            // The receiver only goes away if the caller itself unwound.
            let _ = tx.send(outcome);
        });

        match rx.recv() {
            Ok(Ok(observations)) => observations,
            Ok(Err(payload)) => panic::resume_unwind(payload),
            Err(_) => Err(AnalysisError::Computation(
                "weather fetch ended without a result".to_string(),
            )),
        }
    }

    fn locate(&self, place: &str) -> Result<Coordinate> {
        let query = self.config.geocode_query(place);
        self.geocoder
            .geocode(&query)?
            .ok_or(AnalysisError::GeocodeNotFound(query))
    }

    /// One point per (date, speed), dates outermost. Each date is analysed
    /// once; speeds only rescale hours.
    fn comparison_points(
        &self,
        origin: &str,
        destination: &str,
        dates: &[NaiveDate],
        speeds: &[f64],
    ) -> Result<Vec<ComparisonPoint>> {
        let mut points = Vec::with_capacity(dates.len() * speeds.len());
        for &date in dates {
            let analysis = self.cached(origin, destination, date)?;
            for &speed in speeds {
                let hours = estimate_travel_hours(analysis.distance_km, speed)?;
                points.push(ComparisonPoint::new(date, speed, hours, analysis.risk_score));
            }
        }
        Ok(points)
    }
}

pub struct RouteAnalysisEngine {
    analyzer: Arc<Analyzer>,
    renderer: Arc<dyn ChartRenderer>,
    jobs: JobScheduler<ArtifactKey>,
}

impl RouteAnalysisEngine {
    pub fn new(
        config: EngineConfig,
        geocoder: impl Geocoder + 'static,
        router: impl RouteProvider + 'static,
        weather: impl WeatherProvider + 'static,
        renderer: impl ChartRenderer + 'static,
    ) -> Result<Self> {
        config.validate()?;
        let jobs = JobScheduler::new(config.worker_threads)
            .map_err(|err| AnalysisError::Computation(format!("failed to start worker pool: {err}")))?;
        let weather_pool = ThreadPoolBuilder::new()
            .num_threads(config.weather_threads)
            .thread_name(|index| format!("route-risk-weather-{index}"))
            .build()
            .map_err(|err| AnalysisError::Computation(format!("failed to start weather pool: {err}")))?;

        Ok(Self {
            analyzer: Arc::new(Analyzer {
                geocoder: Arc::new(geocoder),
                router: Arc::new(router),
                weather: Arc::new(weather),
                weather_pool,
                cache: AnalysisCache::new(),
                config,
            }),
            renderer: Arc::new(renderer),
            jobs,
        })
    }

    /// Engine backed by the public Nominatim, OSRM and Open-Meteo services,
    /// writing JSON chart documents.
    pub fn with_default_clients(config: EngineConfig) -> Result<Self> {
        let geocoder = NominatimClient::new(NominatimConfig::default())
            .map_err(AnalysisError::http("nominatim"))?;
        let router = OsrmClient::new(OsrmConfig::default()).map_err(AnalysisError::http("osrm"))?;
        let weather = OpenMeteoClient::new(OpenMeteoConfig::default())
            .map_err(AnalysisError::http("open-meteo"))?;
        Self::new(config, geocoder, router, weather, JsonChartWriter)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.analyzer.config
    }

    /// Distance, travel time and risk for one departure date.
    ///
    /// The speed is validated before any network work and only affects
    /// `hours`; repeated calls for the same (origin, destination, date) are
    /// served from the cache at any speed.
    pub fn analyze(
        &self,
        origin: &str,
        destination: &str,
        date: NaiveDate,
        speed_knots: f64,
    ) -> Result<RouteAnalysis> {
        validate_speed(speed_knots)?;
        let cached = self.analyzer.cached(origin, destination, date)?;
        Ok(RouteAnalysis {
            distance_km: cached.distance_km,
            hours: estimate_travel_hours(cached.distance_km, speed_knots)?,
            risk_score: cached.risk_score,
            risk_level: cached.risk_score.level(),
        })
    }

    /// Comparison points for every (date, speed) pair, computed inline.
    pub fn comparison_points(
        &self,
        origin: &str,
        destination: &str,
        dates: &[NaiveDate],
        speeds: &[f64],
    ) -> Result<Vec<ComparisonPoint>> {
        validate_request(dates, speeds)?;
        self.analyzer.comparison_points(origin, destination, dates, speeds)
    }

    /// Starts background generation of the efficiency-vs-risk artifact.
    ///
    /// Returns immediately. A request identical to one still running joins
    /// it instead of starting a second run; poll with the returned key.
    pub fn submit_artifact(
        &self,
        origin: &str,
        destination: &str,
        dates: &[NaiveDate],
        speeds: &[f64],
    ) -> Result<ArtifactTicket> {
        validate_request(dates, speeds)?;

        let key = ArtifactKey::build(origin, destination, dates, speeds);
        let extension = self.renderer.file_extension();
        let out_path = key.output_path(&self.analyzer.config.output_dir, extension);
        let plot_url = format!(
            "{}{}",
            self.analyzer.config.static_url_prefix,
            key.file_name(extension)
        );
        debug!(%key, path = %out_path.display(), "artifact requested");

        let analyzer = Arc::clone(&self.analyzer);
        let renderer = Arc::clone(&self.renderer);
        let (origin, destination) = (origin.to_string(), destination.to_string());
        let (dates, speeds) = (dates.to_vec(), speeds.to_vec());
        let path = out_path.clone();

        let status = self.jobs.submit(key.clone(), move || {
            let points = analyzer.comparison_points(&origin, &destination, &dates, &speeds)?;
            renderer.render(&points, &analyzer.config.chart_title, &path)
        });

        Ok(ArtifactTicket {
            status,
            key,
            out_path,
            plot_url,
        })
    }

    pub fn poll_artifact(&self, key: &ArtifactKey) -> JobStatus {
        self.jobs.poll(key)
    }

    /// Number of memoized (origin, destination, date) analyses.
    pub fn cached_analyses(&self) -> usize {
        self.analyzer.cache.len()
    }
}

fn validate_request(dates: &[NaiveDate], speeds: &[f64]) -> Result<()> {
    if dates.is_empty() {
        return Err(AnalysisError::InvalidArgument("at least one date is required".to_string()));
    }
    if speeds.is_empty() {
        return Err(AnalysisError::InvalidArgument("at least one speed is required".to_string()));
    }
    speeds.iter().try_for_each(|speed| validate_speed(*speed))
}
