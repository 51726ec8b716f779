//! Weather-to-risk scoring heuristic.
//!
//! Each sample point gets a risk in `[0, 1]`: the larger of a baseline
//! derived from its weather code and five hazard contributions (gusts,
//! precipitation, visibility, icing, snow). The route risk is the median
//! of the per-point risks, mapped onto an integer score in `1..=100`.
//!
//! # Unknown input
//!
//! Scoring never fails. An empty matrix, or one whose rows do not match
//! its columns, scores [`RiskScore::MIN`]; missing values take benign
//! defaults. Callers that need to tell "benign" from "no data" must check
//! the matrix themselves before scoring.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::weather::{WeatherField, WeatherMatrix};

const DEFAULT_TEMP_MIN_C: f64 = 5.0;
const DEFAULT_VISIBILITY_M: f64 = 10_000.0;

/// Integer route risk in `1..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RiskScore(u8);

impl RiskScore {
    pub const MIN: RiskScore = RiskScore(1);
    pub const MAX: RiskScore = RiskScore(100);

    /// Clamps `value` into `1..=100`.
    pub fn new(value: i64) -> Self {
        Self(value.clamp(1, 100) as u8)
    }

    /// Maps a risk fraction in `[0, 1]` onto the score range, rounding
    /// halves to even.
    pub fn from_fraction(risk: f64) -> Self {
        let risk = if risk.is_nan() { 0.0 } else { risk.clamp(0.0, 1.0) };
        Self::new((1.0 + risk * 99.0).round_ties_even() as i64)
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    pub fn level(&self) -> RiskLevel {
        RiskLevel::from_score(*self)
    }
}

impl fmt::Display for RiskScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn from_score(score: RiskScore) -> Self {
        match score.value() {
            0..=33 => RiskLevel::Low,
            34..=66 => RiskLevel::Medium,
            _ => RiskLevel::High,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operational advice shown next to a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TravelAdvice {
    OkToTravel,
    DelaysLikely,
    NotSafe,
}

impl TravelAdvice {
    pub fn from_score(score: RiskScore) -> Self {
        match score.value() {
            70.. => TravelAdvice::NotSafe,
            50.. => TravelAdvice::DelaysLikely,
            _ => TravelAdvice::OkToTravel,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TravelAdvice::OkToTravel => "OK TO TRAVEL",
            TravelAdvice::DelaysLikely => "DELAYS LIKELY",
            TravelAdvice::NotSafe => "NOT SAFE TO TRAVEL",
        }
    }
}

impl fmt::Display for TravelAdvice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Post-aggregation curve: `risk.powf(gamma) * scale`, clamped to `[0, 1]`.
///
/// `gamma > 1` pulls mid-range risks down more than low ones; `scale < 1`
/// lowers everything. The default is the identity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskCalibration {
    pub gamma: f64,
    pub scale: f64,
}

impl Default for RiskCalibration {
    fn default() -> Self {
        Self {
            gamma: 1.0,
            scale: 1.0,
        }
    }
}

impl RiskCalibration {
    pub fn apply(&self, risk: f64) -> f64 {
        clamp01(risk.powf(self.gamma) * self.scale)
    }
}

/// Score a weather matrix with neutral calibration.
pub fn score(matrix: &WeatherMatrix) -> RiskScore {
    score_with(matrix, &RiskCalibration::default())
}

/// Score a weather matrix. See the module docs for the fail-open policy.
pub fn score_with(matrix: &WeatherMatrix, calibration: &RiskCalibration) -> RiskScore {
    if matrix.is_empty() {
        warn!("empty weather matrix, scoring as minimum risk");
        return RiskScore::MIN;
    }
    if !matrix.is_well_formed() {
        warn!(
            columns = matrix.columns().len(),
            rows = matrix.row_count(),
            "malformed weather matrix, scoring as minimum risk"
        );
        return RiskScore::MIN;
    }

    let point_risks: Vec<f64> = (0..matrix.row_count())
        .map(|row| point_risk(matrix, row))
        .collect();
    let route_risk = quantile(point_risks, 0.5);

    RiskScore::from_fraction(calibration.apply(route_risk))
}

/// Baseline risk for a WMO weather code.
pub fn weathercode_baseline(code: Option<f64>) -> f64 {
    let Some(code) = code.filter(|c| c.is_finite()) else {
        return 0.20;
    };
    match code.trunc() as i64 {
        // clear to overcast
        0..=3 => 0.05,
        // drizzle, light/moderate rain or snow
        51 | 53 | 55 | 61 | 63 | 71 | 73 => 0.35,
        // fog, freezing precipitation, heavy precipitation, showers
        45 | 48 | 56 | 57 | 65 | 66 | 67 | 75 | 77 | 80 | 81 | 82 | 85 | 86 => 0.70,
        // thunderstorm, hail
        95 | 96 | 99 => 0.90,
        _ => 0.30,
    }
}

fn point_risk(matrix: &WeatherMatrix, row: usize) -> f64 {
    let value = |field| matrix.value(row, field);

    let temp_min = value(WeatherField::TempMin).unwrap_or(DEFAULT_TEMP_MIN_C);
    let precip = value(WeatherField::PrecipMm).unwrap_or(0.0);
    let precip_prob = value(WeatherField::PrecipProbMax).unwrap_or(0.0);
    let snowfall = value(WeatherField::SnowfallMm).unwrap_or(0.0);
    let gusts = value(WeatherField::WindGustsMax).unwrap_or(0.0);
    let visibility = value(WeatherField::VisibilityMin).unwrap_or(DEFAULT_VISIBILITY_M);

    let baseline = weathercode_baseline(value(WeatherField::Weathercode));

    // 40 km/h mild, 70 high, 100 severe
    let gust_risk = clamp01((gusts - 40.0) / 60.0);
    // 30 mm/day is heavy; probability only nudges
    let precip_risk = clamp01(precip / 30.0) * 0.7 + clamp01(precip_prob / 100.0) * 0.3;
    // 10 km fine, 500 m severe
    let visibility_risk = clamp01((10_000.0 - visibility) / 9_500.0) * 0.9;
    let ice_risk = if temp_min <= 0.0 && (precip > 0.2 || snowfall > 0.0) {
        0.6
    } else {
        0.0
    };
    let snow_risk = clamp01(snowfall / 30.0) * 0.8;

    clamp01(
        [gust_risk * 0.8, precip_risk, visibility_risk, ice_risk, snow_risk]
            .into_iter()
            .fold(baseline, f64::max),
    )
}

/// Linearly interpolated quantile of `values`; `q` in `[0, 1]`.
fn quantile(mut values: Vec<f64>, q: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_by(f64::total_cmp);
    let position = q * (values.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let weight = position - lower as f64;
    values[lower] + (values[upper] - values[lower]) * weight
}

fn clamp01(x: f64) -> f64 {
    if x.is_nan() { 0.0 } else { x.clamp(0.0, 1.0) }
}
