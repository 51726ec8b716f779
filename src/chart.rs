//! Headless chart output.
//!
//! Image rendering belongs to an external plotting service; this writer
//! emits the chart's data as JSON so the artifact pipeline works without one.

use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::artifact::{ComparisonPoint, DateRisk, recommended_index, risk_by_date};
use crate::error::{AnalysisError, Result};
use crate::traits::ChartRenderer;

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonChartWriter;

#[derive(Serialize)]
struct ChartDocument<'a> {
    title: &'a str,
    x_label: &'static str,
    y_label: &'static str,
    points: &'a [ComparisonPoint],
    recommended: Option<usize>,
    risk_by_date: Vec<DateRisk>,
}

impl ChartRenderer for JsonChartWriter {
    fn render(&self, points: &[ComparisonPoint], title: &str, out_path: &Path) -> Result<()> {
        if points.is_empty() {
            return Err(AnalysisError::Computation("no points to plot".to_string()));
        }
        if let Some(dir) = out_path.parent() {
            fs::create_dir_all(dir).map_err(|err| AnalysisError::ArtifactIo(dir.to_path_buf(), err))?;
        }

        let document = ChartDocument {
            title,
            x_label: "Estimated travel time (hours)",
            y_label: "Route risk score (1-100)",
            points,
            recommended: recommended_index(points),
            risk_by_date: risk_by_date(points),
        };
        let json = serde_json::to_string_pretty(&document)?;
        fs::write(out_path, json).map_err(|err| AnalysisError::ArtifactIo(out_path.to_path_buf(), err))
    }

    fn file_extension(&self) -> &'static str {
        "json"
    }
}
