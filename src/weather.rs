//! Per-point daily weather observations and the matrix handed to scoring.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::polyline::Coordinate;

/// Named columns of a [`WeatherMatrix`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherField {
    Lat,
    Lon,
    TempMin,
    TempMax,
    PrecipMm,
    PrecipProbMax,
    SnowfallMm,
    WindSpeedMax,
    WindGustsMax,
    VisibilityMin,
    Weathercode,
}

impl WeatherField {
    /// Standard column order produced by [`WeatherMatrix::from_observations`].
    pub const ALL: [WeatherField; 11] = [
        WeatherField::Lat,
        WeatherField::Lon,
        WeatherField::TempMin,
        WeatherField::TempMax,
        WeatherField::PrecipMm,
        WeatherField::PrecipProbMax,
        WeatherField::SnowfallMm,
        WeatherField::WindSpeedMax,
        WeatherField::WindGustsMax,
        WeatherField::VisibilityMin,
        WeatherField::Weathercode,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WeatherField::Lat => "lat",
            WeatherField::Lon => "lon",
            WeatherField::TempMin => "temp_min",
            WeatherField::TempMax => "temp_max",
            WeatherField::PrecipMm => "precip_mm",
            WeatherField::PrecipProbMax => "precip_prob_max",
            WeatherField::SnowfallMm => "snowfall_mm",
            WeatherField::WindSpeedMax => "wind_speed_max",
            WeatherField::WindGustsMax => "wind_gusts_max",
            WeatherField::VisibilityMin => "visibility_min",
            WeatherField::Weathercode => "weathercode",
        }
    }
}

impl fmt::Display for WeatherField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WeatherField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WeatherField::ALL
            .into_iter()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| format!("unknown weather field '{s}'"))
    }
}

/// Daily weather at one sample point. `None` means the source had no value.
///
/// Units: temperatures in °C, precipitation and snowfall in mm, probability
/// in %, wind in km/h, visibility in meters. The weather code is the WMO
/// code used by Open-Meteo.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WeatherObservation {
    pub point: Option<Coordinate>,
    pub temp_min: Option<f64>,
    pub temp_max: Option<f64>,
    pub precip_mm: Option<f64>,
    pub precip_prob_max: Option<f64>,
    pub snowfall_mm: Option<f64>,
    pub wind_speed_max: Option<f64>,
    pub wind_gusts_max: Option<f64>,
    pub visibility_min: Option<f64>,
    pub weathercode: Option<f64>,
}

impl WeatherObservation {
    pub fn at(point: Coordinate) -> Self {
        Self {
            point: Some(point),
            ..Self::default()
        }
    }

    pub fn get(&self, field: WeatherField) -> Option<f64> {
        match field {
            WeatherField::Lat => self.point.map(|p| p.lat),
            WeatherField::Lon => self.point.map(|p| p.lon),
            WeatherField::TempMin => self.temp_min,
            WeatherField::TempMax => self.temp_max,
            WeatherField::PrecipMm => self.precip_mm,
            WeatherField::PrecipProbMax => self.precip_prob_max,
            WeatherField::SnowfallMm => self.snowfall_mm,
            WeatherField::WindSpeedMax => self.wind_speed_max,
            WeatherField::WindGustsMax => self.wind_gusts_max,
            WeatherField::VisibilityMin => self.visibility_min,
            WeatherField::Weathercode => self.weathercode,
        }
    }
}

/// Weather values for a sampled route, one row per sample point.
///
/// Column semantics come from `columns`; a field that is not a column is
/// read as unknown for every row.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WeatherMatrix {
    columns: Vec<WeatherField>,
    rows: Vec<Vec<Option<f64>>>,
}

impl WeatherMatrix {
    /// Builds a matrix with caller-supplied column layout. Rows are not
    /// validated here; see [`WeatherMatrix::is_well_formed`].
    pub fn new(columns: Vec<WeatherField>, rows: Vec<Vec<Option<f64>>>) -> Self {
        Self { columns, rows }
    }

    pub fn from_observations(observations: &[WeatherObservation]) -> Self {
        let columns = WeatherField::ALL.to_vec();
        let rows = observations
            .iter()
            .map(|obs| columns.iter().map(|field| obs.get(*field)).collect())
            .collect();
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[WeatherField] {
        &self.columns
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Every row has exactly one value per column.
    pub fn is_well_formed(&self) -> bool {
        self.rows.iter().all(|row| row.len() == self.columns.len())
    }

    pub fn column_index(&self, field: WeatherField) -> Option<usize> {
        self.columns.iter().position(|c| *c == field)
    }

    /// Value at `row` for `field`. NaN and missing columns read as `None`.
    pub fn value(&self, row: usize, field: WeatherField) -> Option<f64> {
        let column = self.column_index(field)?;
        self.rows
            .get(row)?
            .get(column)
            .copied()
            .flatten()
            .filter(|v| !v.is_nan())
    }
}
