//! In-memory memoization of route analyses.
//!
//! Keyed by (origin, destination, date). Vessel speed is not part of the key:
//! weather risk does not depend on it, and travel hours are recomputed from
//! the cached distance for each requested speed.
//!
//! Entries live for the lifetime of the cache and are never evicted.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::risk::RiskScore;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnalysisKey {
    pub origin: String,
    pub destination: String,
    pub date: NaiveDate,
}

impl AnalysisKey {
    pub fn new(origin: impl Into<String>, destination: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            origin: origin.into(),
            destination: destination.into(),
            date,
        }
    }
}

/// The speed-independent result of the expensive pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CachedAnalysis {
    pub distance_km: f64,
    pub risk_score: RiskScore,
}

#[derive(Debug, Default)]
pub struct AnalysisCache {
    entries: Mutex<HashMap<AnalysisKey, CachedAnalysis>>,
}

impl AnalysisCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached analysis for `key`, running `resolve` on a miss.
    ///
    /// `resolve` runs without the map lock held, so a slow network round trip
    /// for one key never blocks lookups for others. Two concurrent misses on
    /// the same key may both resolve; the later insert wins. Errors from
    /// `resolve` are returned as-is and nothing is stored.
    pub fn analyze<F, E>(&self, key: &AnalysisKey, resolve: F) -> Result<CachedAnalysis, E>
    where
        F: FnOnce() -> Result<CachedAnalysis, E>,
    {
        if let Some(hit) = self.get(key) {
            debug!(origin = %key.origin, destination = %key.destination, date = %key.date, "analysis cache hit");
            return Ok(hit);
        }

        info!(origin = %key.origin, destination = %key.destination, date = %key.date, "analysis cache miss");
        let resolved = resolve()?;

        self.lock().insert(key.clone(), resolved);
        Ok(resolved)
    }

    pub fn get(&self, key: &AnalysisKey) -> Option<CachedAnalysis> {
        self.lock().get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // The map holds plain values, so a panic mid-insert cannot leave it torn.
    fn lock(&self) -> MutexGuard<'_, HashMap<AnalysisKey, CachedAnalysis>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
