//! WGS-84 geodesy primitives.
//!
//! Thin wrapper over the `geo` crate's ellipsoidal geodesic (Karney)
//! solvers. All playback math goes through the two classical problems:
//! the inverse problem (distance and initial azimuth between two points)
//! and the direct problem (destination point from start, azimuth, and
//! distance).

use geo::{Bearing, Destination, Distance, Geodesic, Point};

/// A geographic position in decimal degrees.
///
/// Altitude present in source documents is dropped at parse time; playback
/// is purely two-dimensional.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Waypoint {
    /// Latitude in degrees (-90 to 90).
    pub latitude: f64,
    /// Longitude in degrees (-180 to 180).
    pub longitude: f64,
}

impl Waypoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    fn point(&self) -> Point {
        Point::new(self.longitude, self.latitude)
    }
}

/// Solve the inverse problem: geodesic distance in meters and initial
/// azimuth in degrees [0, 360) from `from` to `to`.
pub fn inverse(from: Waypoint, to: Waypoint) -> (f64, f64) {
    let distance = Geodesic::distance(from.point(), to.point());
    let azimuth = normalize_bearing(Geodesic::bearing(from.point(), to.point()));
    (distance, azimuth)
}

/// Solve the direct problem: the point reached by travelling `meters`
/// along the geodesic from `from` at the given initial azimuth.
pub fn destination(from: Waypoint, azimuth: f64, meters: f64) -> Waypoint {
    let reached = Geodesic::destination(from.point(), azimuth, meters);
    Waypoint::new(reached.y(), reached.x())
}

/// Normalize a bearing into [0, 360) degrees.
pub fn normalize_bearing(degrees: f64) -> f64 {
    degrees.rem_euclid(360.0)
}
