//! route-risk: weather risk estimation for shipping routes.
//!
//! Resamples a routed path into evenly spaced points, scores the daily
//! weather along it, and generates efficiency-vs-risk comparisons across
//! departure dates and vessel speeds. Expensive analyses are memoized and
//! background artifact generation is deduplicated per request.

pub mod artifact;
pub mod cache;
pub mod chart;
pub mod config;
pub mod dates;
pub mod engine;
pub mod error;
pub mod haversine;
pub mod jobs;
pub mod nominatim;
pub mod open_meteo;
pub mod osrm;
pub mod polyline;
pub mod resample;
pub mod risk;
pub mod traits;
pub mod weather;

pub use error::{AnalysisError, Result};
