//! Comparison artifacts: their identity and their data points.
//!
//! An artifact compares candidate departure dates and vessel speeds for one
//! origin/destination pair. Its [`ArtifactKey`] doubles as the dedup key for
//! background generation and as the stem of the output file name, so equal
//! requests always map to the same file and different requests never share one.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::risk::RiskScore;

const FILE_PREFIX: &str = "efficiency_vs_risk_";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactKey(String);

impl ArtifactKey {
    /// Builds `{origin}_{destination}_{dates}_{speeds}`.
    ///
    /// Endpoints are slugified, dates are joined in the given order, and
    /// speeds are truncated to whole knots. Order matters: the same dates in
    /// a different order produce a different key.
    pub fn build(origin: &str, destination: &str, dates: &[NaiveDate], speeds: &[f64]) -> Self {
        let dates = dates
            .iter()
            .map(|date| date.format("%Y-%m-%d").to_string())
            .collect::<Vec<_>>()
            .join("-");
        let speeds = speeds
            .iter()
            .map(|speed| whole_knots(*speed).to_string())
            .collect::<Vec<_>>()
            .join("-");

        Self(format!(
            "{}_{}_{}_{}",
            slugify(origin),
            slugify(destination),
            dates,
            speeds
        ))
    }

    /// Wraps an existing key, e.g. one handed back by a poller.
    pub fn from_raw(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn file_name(&self, extension: &str) -> String {
        format!("{FILE_PREFIX}{}.{extension}", self.0)
    }

    pub fn output_path(&self, dir: &Path, extension: &str) -> PathBuf {
        dir.join(self.file_name(extension))
    }
}

impl fmt::Display for ArtifactKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lowercases and collapses every run of characters outside `[a-z0-9]` into
/// a single `-`, with no leading or trailing separator.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_separator = false;
    for ch in input.chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            slug.push(ch);
        } else {
            pending_separator = true;
        }
    }
    slug
}

/// Speeds are truncated toward zero, never rounded.
pub fn whole_knots(speed_knots: f64) -> i64 {
    speed_knots.trunc() as i64
}

/// One (date, speed) candidate on the efficiency-vs-risk chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonPoint {
    pub date: NaiveDate,
    pub label: String,
    pub hours: f64,
    pub risk: RiskScore,
}

impl ComparisonPoint {
    pub fn new(date: NaiveDate, speed_knots: f64, hours: f64, risk: RiskScore) -> Self {
        Self {
            date,
            label: format!("{} @ {}kn", date.format("%Y-%m-%d"), whole_knots(speed_knots)),
            hours,
            risk,
        }
    }
}

/// Index of the best trade-off: minimum of min-max normalized hours plus
/// normalized risk. The earliest point wins ties.
pub fn recommended_index(points: &[ComparisonPoint]) -> Option<usize> {
    let (hours_lo, hours_hi) = bounds(points.iter().map(|p| p.hours))?;
    let (risk_lo, risk_hi) = bounds(points.iter().map(|p| f64::from(p.risk.value())))?;

    let mut best: Option<(usize, f64)> = None;
    for (index, point) in points.iter().enumerate() {
        let cost = normalize(point.hours, hours_lo, hours_hi)
            + normalize(f64::from(point.risk.value()), risk_lo, risk_hi);
        if best.is_none_or(|(_, best_cost)| cost < best_cost) {
            best = Some((index, cost));
        }
    }
    best.map(|(index, _)| index)
}

/// Risk for one departure date, as shown on the risk-by-date bar chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRisk {
    pub date: NaiveDate,
    pub risk: RiskScore,
}

/// One entry per distinct date, in first-seen order. Risk does not depend on
/// speed, so the first point for a date stands for all of them.
pub fn risk_by_date(points: &[ComparisonPoint]) -> Vec<DateRisk> {
    let mut series: Vec<DateRisk> = Vec::new();
    for point in points {
        if !series.iter().any(|entry| entry.date == point.date) {
            series.push(DateRisk {
                date: point.date,
                risk: point.risk,
            });
        }
    }
    series
}

fn bounds(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values.fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

fn normalize(x: f64, lo: f64, hi: f64) -> f64 {
    if hi == lo { 0.0 } else { (x - lo) / (hi - lo) }
}
