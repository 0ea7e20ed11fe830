//! Geodesic path model.
//!
//! A [`Path`] turns an ordered waypoint sequence into a continuous
//! position function over distance. Building the path solves the inverse
//! problem once per consecutive pair, recording each segment's initial
//! azimuth, its length, and a cumulative distance table; [`Path::position_at`]
//! then resolves "where am I after d meters" with a binary search plus one
//! direct-problem solve.
//!
//! Motion is piecewise-geodesic-linear: within a segment the heading is
//! the segment's initial azimuth, not re-interpolated.

use crate::geodesy::{destination, inverse, Waypoint};

/// A resolved position on a path: coordinates plus travel heading.
#[derive(Debug, Clone, Copy)]
pub struct Fix {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Heading in degrees [0, 360): the containing segment's initial azimuth.
    pub heading: f64,
}

/// One geodesic leg between two surviving waypoints.
#[derive(Debug, Clone, Copy)]
struct Segment {
    start: Waypoint,
    azimuth: f64,
    length: f64,
}

/// Error raised when a waypoint sequence cannot form a playable path.
///
/// Raised at build time; the affected track is skipped, never retried.
#[derive(Debug, thiserror::Error)]
pub enum PathError {
    /// Fewer than 2 distinct waypoints remain after collapsing duplicates.
    #[error("path needs at least 2 distinct waypoints, found {found}")]
    TooFewPoints { found: usize },

    /// A consecutive pair is numerically coincident or antipodal, leaving
    /// the segment azimuth undefined.
    #[error("segment {index} has an undefined azimuth")]
    DegenerateSegment { index: usize },
}

/// An immutable geodesic path with its derived distance table.
#[derive(Debug, Clone)]
pub struct Path {
    waypoints: Vec<Waypoint>,
    segments: Vec<Segment>,
    /// Cumulative distance to each segment start; final entry is the total.
    cumulative: Vec<f64>,
    total: f64,
}

impl Path {
    /// Build a path from an ordered waypoint sequence.
    ///
    /// Consecutive duplicate waypoints collapse so that no zero-length
    /// segment survives.
    pub fn build(waypoints: &[Waypoint]) -> Result<Self, PathError> {
        let mut distinct: Vec<Waypoint> = Vec::with_capacity(waypoints.len());
        for wp in waypoints {
            if distinct.last() != Some(wp) {
                distinct.push(*wp);
            }
        }

        if distinct.len() < 2 {
            return Err(PathError::TooFewPoints {
                found: distinct.len(),
            });
        }

        let mut segments = Vec::with_capacity(distinct.len() - 1);
        let mut cumulative = Vec::with_capacity(distinct.len());
        let mut total = 0.0;
        cumulative.push(0.0);

        for (index, pair) in distinct.windows(2).enumerate() {
            let (length, azimuth) = inverse(pair[0], pair[1]);
            if length <= 0.0 || !length.is_finite() || !azimuth.is_finite() {
                return Err(PathError::DegenerateSegment { index });
            }
            total += length;
            cumulative.push(total);
            segments.push(Segment {
                start: pair[0],
                azimuth,
                length,
            });
        }

        Ok(Self {
            waypoints: distinct,
            segments,
            cumulative,
            total,
        })
    }

    /// Total geodesic length of the path in meters.
    pub fn total_length(&self) -> f64 {
        self.total
    }

    /// The surviving (de-duplicated) waypoints.
    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    /// Initial azimuth of the first segment, in degrees [0, 360).
    pub fn initial_bearing(&self) -> f64 {
        self.segments[0].azimuth
    }

    /// Position and heading after travelling `distance` meters from the
    /// first waypoint.
    ///
    /// The caller clamps `distance` to `[0, total_length]`; values at the
    /// bounds return the endpoint waypoints exactly.
    pub fn position_at(&self, distance: f64) -> Fix {
        if distance <= 0.0 {
            let first = self.waypoints[0];
            return Fix {
                latitude: first.latitude,
                longitude: first.longitude,
                heading: self.segments[0].azimuth,
            };
        }
        if distance >= self.total {
            let last = *self.waypoints.last().expect("path has >= 2 waypoints");
            let segment = self.segments.last().expect("path has >= 1 segment");
            return Fix {
                latitude: last.latitude,
                longitude: last.longitude,
                heading: segment.azimuth,
            };
        }

        // cumulative[index] <= distance < cumulative[index + 1]
        let index = self.cumulative.partition_point(|&d| d <= distance) - 1;
        let segment = &self.segments[index];
        let offset = distance - self.cumulative[index];
        let reached = destination(segment.start, segment.azimuth, offset);

        Fix {
            latitude: reached.latitude,
            longitude: reached.longitude,
            heading: segment.azimuth,
        }
    }
}
