//! Great-circle distances on a spherical Earth.
//!
//! Used for along-track distances when resampling routes and for the
//! reported route length. Ignores ellipsoidal flattening, which is well
//! below the resolution of daily weather grids.

use crate::polyline::Coordinate;

/// Mean Earth radius in meters (IUGG).
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Haversine distance between two points in meters.
pub fn haversine_m(from: Coordinate, to: Coordinate) -> f64 {
    let lat1_rad = from.lat.to_radians();
    let lat2_rad = to.lat.to_radians();
    let delta_lat = (to.lat - from.lat).to_radians();
    let delta_lon = (to.lon - from.lon).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().min(1.0).asin();

    EARTH_RADIUS_M * c
}

/// Cumulative along-track distance in meters at every vertex.
///
/// The first entry is always `0.0`; the last is the total length.
pub fn cumulative_distances_m(points: &[Coordinate]) -> Vec<f64> {
    let mut cumulative = Vec::with_capacity(points.len());
    let mut total = 0.0;
    for (i, point) in points.iter().enumerate() {
        if i > 0 {
            total += haversine_m(points[i - 1], *point);
        }
        cumulative.push(total);
    }
    cumulative
}

/// Total length of a path in kilometers.
pub fn path_length_km(points: &[Coordinate]) -> f64 {
    points
        .windows(2)
        .map(|pair| haversine_m(pair[0], pair[1]))
        .sum::<f64>()
        / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_same_point() {
        let point = Coordinate::new(53.8, -1.55);
        assert!(haversine_m(point, point) < 0.001, "Same point should have ~0 distance");
    }

    #[test]
    fn test_haversine_known_distance() {
        // Leeds (53.80, -1.55) to Rotterdam (51.92, 4.48), roughly 450 km
        let km = haversine_m(Coordinate::new(53.80, -1.55), Coordinate::new(51.92, 4.48)) / 1000.0;
        assert!(km > 420.0 && km < 470.0, "Leeds to Rotterdam should be ~450km, got {}", km);
    }

    #[test]
    fn test_haversine_symmetric() {
        let a = Coordinate::new(53.74, -0.33);
        let b = Coordinate::new(51.95, 4.14);
        assert_eq!(haversine_m(a, b), haversine_m(b, a));
    }

    #[test]
    fn test_cumulative_distances() {
        let points = vec![
            Coordinate::new(0.0, 0.0),
            Coordinate::new(0.0, 1.0),
            Coordinate::new(0.0, 2.0),
        ];
        let cumulative = cumulative_distances_m(&points);
        assert_eq!(cumulative.len(), 3);
        assert_eq!(cumulative[0], 0.0);
        // One degree of longitude on the equator is ~111.2 km
        assert!((cumulative[1] - 111_195.0).abs() < 10.0);
        assert!((cumulative[2] - 2.0 * cumulative[1]).abs() < 1e-6);
    }

    #[test]
    fn test_path_length_empty_and_single() {
        assert_eq!(path_length_km(&[]), 0.0);
        assert_eq!(path_length_km(&[Coordinate::new(1.0, 2.0)]), 0.0);
    }
}
