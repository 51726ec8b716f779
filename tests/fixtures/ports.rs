//! UK and North Sea port locations for realistic test fixtures.
//!
//! Coordinates are city centres from OpenStreetMap.

use route_risk::polyline::{Coordinate, Polyline};

/// A named location with coordinates.
#[derive(Debug, Clone)]
pub struct Location {
    pub name: &'static str,
    pub lat: f64,
    pub lon: f64,
}

impl Location {
    pub const fn new(name: &'static str, lat: f64, lon: f64) -> Self {
        Self { name, lat, lon }
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lon)
    }
}

pub const LEEDS: Location = Location::new("Leeds", 53.7974185, -1.5437941);
pub const HULL: Location = Location::new("Hull", 53.7435722, -0.3394758);
pub const IMMINGHAM: Location = Location::new("Immingham", 53.6139, -0.2183);
pub const ROTTERDAM: Location = Location::new("Rotterdam", 51.9244424, 4.4777325);
pub const FELIXSTOWE: Location = Location::new("Felixstowe", 51.9631, 1.3511);
pub const ABERDEEN: Location = Location::new("Aberdeen", 57.1482, -2.0928);

pub const PORTS: &[Location] = &[LEEDS, HULL, IMMINGHAM, ROTTERDAM, FELIXSTOWE, ABERDEEN];

/// Leeds to Rotterdam via the Humber, the way a routed path would bend.
pub fn leeds_rotterdam_route() -> Polyline {
    Polyline::new(vec![
        LEEDS.coordinate(),
        Coordinate::new(53.7700, -1.1000),
        HULL.coordinate(),
        IMMINGHAM.coordinate(),
        Coordinate::new(53.4000, 1.2000),
        Coordinate::new(52.6000, 3.1000),
        ROTTERDAM.coordinate(),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ports_in_north_sea_area() {
        for port in PORTS {
            assert!(port.lat > 50.0 && port.lat < 60.0, "{} lat out of range: {}", port.name, port.lat);
            assert!(port.lon > -5.0 && port.lon < 6.0, "{} lon out of range: {}", port.name, port.lon);
        }
    }
}
