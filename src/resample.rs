//! Geodesic resampling of route polylines.
//!
//! Weather is requested once per sample point, so the routed geometry
//! (often thousands of unevenly spaced vertices) is reduced to a fixed
//! number of points evenly spaced by along-track distance.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AnalysisError, Result};
use crate::haversine::cumulative_distances_m;
use crate::polyline::{Coordinate, Polyline};

/// Exactly `n` points, evenly spaced along the source polyline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampledRoute {
    points: Vec<Coordinate>,
}

impl SampledRoute {
    pub fn points(&self) -> &[Coordinate] {
        &self.points
    }

    pub fn into_points(self) -> Vec<Coordinate> {
        self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Resample `polyline` into `n` points evenly spaced by great-circle distance.
///
/// The first and last samples coincide with the polyline's endpoints. A
/// single-vertex or zero-length polyline yields its first point `n` times.
pub fn resample(polyline: &Polyline, n: usize) -> Result<SampledRoute> {
    if n < 1 {
        return Err(AnalysisError::InvalidArgument(
            "sample count must be at least 1".to_string(),
        ));
    }
    let source = polyline.points();
    let Some(&first) = source.first() else {
        return Err(AnalysisError::InvalidArgument(
            "cannot resample an empty polyline".to_string(),
        ));
    };

    if source.len() == 1 {
        return Ok(SampledRoute {
            points: vec![first; n],
        });
    }

    let cumulative = cumulative_distances_m(source);
    let total = cumulative[cumulative.len() - 1];
    if total <= 0.0 {
        return Ok(SampledRoute {
            points: vec![first; n],
        });
    }

    let last_segment = source.len() - 2;
    let mut segment = 0;
    let mut points = Vec::with_capacity(n);

    for i in 0..n {
        let target = if n == 1 {
            0.0
        } else if i == n - 1 {
            total
        } else {
            total * (i as f64) / ((n - 1) as f64)
        };

        // Targets are non-decreasing, so the scan only ever moves forward.
        while segment < last_segment && cumulative[segment + 1] < target {
            segment += 1;
        }

        let start = source[segment];
        let end = source[segment + 1];
        let segment_len = cumulative[segment + 1] - cumulative[segment];
        let fraction = if segment_len > 0.0 {
            ((target - cumulative[segment]) / segment_len).clamp(0.0, 1.0)
        } else {
            0.0
        };

        points.push(if fraction >= 1.0 {
            end
        } else {
            Coordinate::new(
                start.lat + (end.lat - start.lat) * fraction,
                start.lon + (end.lon - start.lon) * fraction,
            )
        });
    }

    debug!(
        vertices = source.len(),
        samples = n,
        length_m = total,
        "resampled route"
    );

    Ok(SampledRoute { points })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn equator_line() -> Polyline {
        Polyline::new(vec![
            Coordinate::new(0.0, 0.0),
            Coordinate::new(0.0, 1.0),
            Coordinate::new(0.0, 4.0),
        ])
    }

    #[test]
    fn test_rejects_zero_samples() {
        let result = resample(&equator_line(), 0);
        assert!(matches!(result, Err(AnalysisError::InvalidArgument(_))));
    }

    #[test]
    fn test_rejects_empty_polyline() {
        let result = resample(&Polyline::new(vec![]), 5);
        assert!(matches!(result, Err(AnalysisError::InvalidArgument(_))));
    }

    #[test]
    fn test_single_point_repeated() {
        let point = Coordinate::new(53.8, -1.55);
        let sampled = resample(&Polyline::new(vec![point]), 4).unwrap();
        assert_eq!(sampled.points(), &[point; 4]);
    }

    #[test]
    fn test_zero_length_polyline_repeats_first() {
        let point = Coordinate::new(51.92, 4.48);
        let sampled = resample(&Polyline::new(vec![point, point, point]), 3).unwrap();
        assert_eq!(sampled.points(), &[point; 3]);
    }

    #[test]
    fn test_endpoints_preserved() {
        let line = equator_line();
        let sampled = resample(&line, 7).unwrap();
        assert_eq!(sampled.len(), 7);
        assert_eq!(sampled.points()[0], line.points()[0]);
        assert_eq!(sampled.points()[6], line.points()[2]);
    }

    #[test]
    fn test_single_sample_is_start() {
        let sampled = resample(&equator_line(), 1).unwrap();
        assert_eq!(sampled.points(), &[Coordinate::new(0.0, 0.0)]);
    }

    #[test]
    fn test_even_spacing_crosses_segments() {
        // 4 degrees of equator split into 5 samples: one per degree
        let sampled = resample(&equator_line(), 5).unwrap();
        let lons: Vec<f64> = sampled.points().iter().map(|p| p.lon).collect();
        for (expected, actual) in [0.0, 1.0, 2.0, 3.0, 4.0].iter().zip(&lons) {
            assert!((expected - actual).abs() < 1e-9, "expected {expected}, got {actual}");
        }
        assert!(sampled.points().iter().all(|p| p.lat == 0.0));
    }

    #[test]
    fn test_skips_duplicate_vertices() {
        let line = Polyline::new(vec![
            Coordinate::new(0.0, 0.0),
            Coordinate::new(0.0, 0.0),
            Coordinate::new(0.0, 2.0),
        ]);
        let sampled = resample(&line, 3).unwrap();
        assert!((sampled.points()[1].lon - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_deterministic() {
        let line = Polyline::new(vec![
            Coordinate::new(53.80, -1.55),
            Coordinate::new(53.74, -0.33),
            Coordinate::new(53.62, 0.20),
            Coordinate::new(51.92, 4.48),
        ]);
        let a = resample(&line, 100).unwrap();
        let b = resample(&line, 100).unwrap();
        assert_eq!(a, b);
    }
}
