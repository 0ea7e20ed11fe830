//! Track descriptors and per-track configuration.

use std::fmt;
use std::time::Duration;

use tracing::warn;

use crate::geodesy::Waypoint;

/// Default playback velocity in km/h.
pub const DEFAULT_VELOCITY_KMH: f64 = 50.0;
/// Default tick interval in milliseconds.
pub const DEFAULT_INTERVAL_MS: u64 = 1000;
/// Default tick interval for `trk-container` tracks that don't set one.
pub const DEFAULT_CONTAINER_INTERVAL_MS: u64 = 60_000;
/// Default source type for trk-mode tracks.
pub const DEFAULT_SOURCE: &str = "truck";

/// Output format selected per track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackMode {
    /// NMEA 0183 sentences (GPRMC/GPGGA/GPGLL).
    Nmea,
    /// Custom `$TRK` records at the track's own cadence.
    TrkAuto,
    /// Custom `$TRK` records at container-reporting cadence (60 s default).
    TrkContainer,
}

impl TrackMode {
    /// Parse a mode token, accepting the legacy `sea`/`land` aliases.
    pub fn parse(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "nmea" | "sea" => Some(Self::Nmea),
            "trk-auto" | "land" => Some(Self::TrkAuto),
            "trk-container" => Some(Self::TrkContainer),
            _ => None,
        }
    }

    /// True for the `$TRK` record modes.
    pub fn is_trk(&self) -> bool {
        matches!(self, Self::TrkAuto | Self::TrkContainer)
    }

    /// Canonical name, also used as the topic path component.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Nmea => "nmea",
            Self::TrkAuto => "trk-auto",
            Self::TrkContainer => "trk-container",
        }
    }
}

impl fmt::Display for TrackMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-track playback parameters.
///
/// Immutable for the track's lifetime; velocity, interval, and delay are
/// not mutable at runtime.
#[derive(Debug, Clone)]
pub struct TrackConfig {
    /// Playback velocity in km/h (> 0).
    pub velocity_kmh: f64,
    /// Tick interval (> 0).
    pub interval: Duration,
    /// Delay before the first sample.
    pub initial_delay: Duration,
    /// Traverse the path back to the start after reaching the end.
    pub loop_path: bool,
    /// Restart from the first waypoint indefinitely.
    pub repeat: bool,
    /// Output format.
    pub mode: TrackMode,
    /// Source type carried by trk-mode tracks ("truck", "ship", ...).
    pub source: String,
}

impl Default for TrackConfig {
    fn default() -> Self {
        Self {
            velocity_kmh: DEFAULT_VELOCITY_KMH,
            interval: Duration::from_millis(DEFAULT_INTERVAL_MS),
            initial_delay: Duration::ZERO,
            loop_path: false,
            repeat: false,
            mode: TrackMode::Nmea,
            source: DEFAULT_SOURCE.to_string(),
        }
    }
}

impl TrackConfig {
    /// Replace out-of-range values with the documented defaults.
    ///
    /// Invalid values are never fatal: each one logs a warning naming the
    /// track and the substituted default, and playback proceeds.
    pub fn sanitized(mut self, track_id: &str) -> Self {
        if !(self.velocity_kmh.is_finite() && self.velocity_kmh > 0.0) {
            warn!(
                track = track_id,
                velocity = self.velocity_kmh,
                default = DEFAULT_VELOCITY_KMH,
                "invalid velocity, using default"
            );
            self.velocity_kmh = DEFAULT_VELOCITY_KMH;
        }
        if self.interval.is_zero() {
            warn!(
                track = track_id,
                default_ms = DEFAULT_INTERVAL_MS,
                "invalid interval, using default"
            );
            self.interval = Duration::from_millis(DEFAULT_INTERVAL_MS);
        }
        if self.mode.is_trk() && self.source.trim().is_empty() {
            warn!(
                track = track_id,
                default = DEFAULT_SOURCE,
                "trk mode requires a source type, using default"
            );
            self.source = DEFAULT_SOURCE.to_string();
        }
        self
    }

    /// Velocity converted to meters per second.
    pub fn velocity_mps(&self) -> f64 {
        self.velocity_kmh / 3.6
    }
}

/// A complete track descriptor: identity, parameters, and waypoints.
#[derive(Debug, Clone)]
pub struct Track {
    /// Non-empty track identifier.
    pub id: String,
    pub config: TrackConfig,
    /// Ordered (latitude, longitude) waypoints.
    pub waypoints: Vec<Waypoint>,
}

impl Track {
    pub fn new(id: impl Into<String>, config: TrackConfig, waypoints: Vec<Waypoint>) -> Self {
        Self {
            id: id.into(),
            config,
            waypoints,
        }
    }
}
