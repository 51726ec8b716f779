//! In-process collaborators for engine tests.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use chrono::NaiveDate;
use route_risk::artifact::ComparisonPoint;
use route_risk::error::{AnalysisError, Result};
use route_risk::polyline::{Coordinate, Polyline};
use route_risk::traits::{ChartRenderer, Geocoder, RouteProvider, WeatherProvider};
use route_risk::weather::WeatherObservation;

use super::ports::{LEEDS, PORTS, ROTTERDAM, leeds_rotterdam_route};

/// Shared call counter, cloned out of a mock before it is moved into an engine.
#[derive(Debug, Clone, Default)]
pub struct Calls(Arc<AtomicUsize>);

impl Calls {
    pub fn hit(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// Closed until [`Gate::open`]; every clone shares the same state.
#[derive(Debug, Clone, Default)]
pub struct Gate(Arc<(Mutex<bool>, Condvar)>);

impl Gate {
    pub fn open(&self) {
        let (lock, signal) = &*self.0;
        *lock.lock().unwrap() = true;
        signal.notify_all();
    }

    pub fn wait(&self) {
        let (lock, signal) = &*self.0;
        let mut open = lock.lock().unwrap();
        while !*open {
            open = signal.wait(open).unwrap();
        }
    }
}

/// Resolves the fixture port names (case-insensitive, ignoring any
/// ", Country" suffix); everything else is not found.
#[derive(Debug, Clone, Default)]
pub struct PortGeocoder {
    pub calls: Calls,
    pub queries: Arc<Mutex<Vec<String>>>,
}

impl Geocoder for PortGeocoder {
    fn geocode(&self, query: &str) -> Result<Option<Coordinate>> {
        self.calls.hit();
        self.queries.lock().unwrap().push(query.to_string());
        let name = query.split(',').next().unwrap_or_default().trim().to_lowercase();
        Ok(PORTS
            .iter()
            .find(|port| port.name.to_lowercase() == name)
            .map(|port| port.coordinate()))
    }
}

/// Returns the Leeds–Rotterdam fixture for that pair and a straight
/// two-point line otherwise, optionally after a delay. Routes to any of
/// `held` wait for `gate` first.
#[derive(Debug, Clone, Default)]
pub struct FixtureRouter {
    pub calls: Calls,
    pub delay: Option<Duration>,
    pub fail_with: Option<String>,
    pub held: Vec<Coordinate>,
    pub gate: Gate,
}

impl RouteProvider for FixtureRouter {
    fn route(&self, origin: Coordinate, destination: Coordinate) -> Result<Polyline> {
        self.calls.hit();
        if self.held.contains(&destination) {
            self.gate.wait();
        }
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        if let Some(message) = &self.fail_with {
            return Err(AnalysisError::Upstream {
                service: "osrm",
                message: message.clone(),
            });
        }
        if origin == LEEDS.coordinate() && destination == ROTTERDAM.coordinate() {
            Ok(leeds_rotterdam_route())
        } else {
            Ok(Polyline::new(vec![origin, destination]))
        }
    }
}

/// Same observation at every point; a per-date override models a storm day.
#[derive(Debug, Clone, Default)]
pub struct FixedWeather {
    pub calls: Calls,
    /// Names of the threads that served each request.
    pub threads: Arc<Mutex<Vec<String>>>,
    pub default: WeatherObservation,
    pub by_date: HashMap<NaiveDate, WeatherObservation>,
}

impl FixedWeather {
    pub fn clear() -> Self {
        Self {
            default: clear_day(),
            ..Self::default()
        }
    }

    pub fn with_day(mut self, date: NaiveDate, observation: WeatherObservation) -> Self {
        self.by_date.insert(date, observation);
        self
    }
}

impl WeatherProvider for FixedWeather {
    fn daily_weather(&self, point: Coordinate, date: NaiveDate) -> Result<WeatherObservation> {
        self.calls.hit();
        self.threads
            .lock()
            .unwrap()
            .push(std::thread::current().name().unwrap_or_default().to_string());
        let observation = self.by_date.get(&date).copied().unwrap_or(self.default);
        Ok(WeatherObservation {
            point: Some(point),
            ..observation
        })
    }
}

/// Records what it was asked to render instead of drawing anything.
#[derive(Debug, Clone, Default)]
pub struct RecordingRenderer {
    pub calls: Calls,
    pub rendered: Arc<Mutex<Vec<(PathBuf, Vec<ComparisonPoint>)>>>,
    pub delay: Option<Duration>,
}

impl ChartRenderer for RecordingRenderer {
    fn render(&self, points: &[ComparisonPoint], _title: &str, out_path: &Path) -> Result<()> {
        self.calls.hit();
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        self.rendered
            .lock()
            .unwrap()
            .push((out_path.to_path_buf(), points.to_vec()));
        Ok(())
    }
}

pub fn clear_day() -> WeatherObservation {
    WeatherObservation {
        temp_min: Some(10.0),
        temp_max: Some(14.0),
        precip_mm: Some(0.0),
        precip_prob_max: Some(0.0),
        snowfall_mm: Some(0.0),
        wind_speed_max: Some(12.0),
        wind_gusts_max: Some(10.0),
        visibility_min: Some(10_000.0),
        weathercode: Some(0.0),
        ..WeatherObservation::default()
    }
}

pub fn thunderstorm() -> WeatherObservation {
    WeatherObservation {
        weathercode: Some(96.0),
        wind_gusts_max: Some(85.0),
        precip_mm: Some(18.0),
        precip_prob_max: Some(95.0),
        ..clear_day()
    }
}

pub fn date(s: &str) -> NaiveDate {
    s.parse().expect("valid ISO date")
}
