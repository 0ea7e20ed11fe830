//! Settings structs for all configuration sections.
//!
//! Each struct represents one `[section]` of the INI config file. These
//! are pure data types; parsing lives in `parser.rs`.

use std::path::PathBuf;
use std::time::Duration;

use crate::message::NmeaSentence;
use crate::track::{
    TrackConfig, TrackMode, DEFAULT_INTERVAL_MS, DEFAULT_SOURCE, DEFAULT_VELOCITY_KMH,
};

/// Complete application configuration.
#[derive(Debug, Clone, Default)]
pub struct AppSettings {
    /// Defaults applied to tracks that don't override inline.
    pub track: TrackDefaults,
    /// NMEA sentence selection and batching.
    pub nmea: NmeaSettings,
    /// UDP sink target, when enabled.
    pub udp: Option<UdpSettings>,
    /// MQTT sink broker, when enabled.
    pub mqtt: Option<MqttSettings>,
    /// File output, when enabled.
    pub filegen: Option<FilegenSettings>,
}

/// Default per-track parameters (`[track]` section).
#[derive(Debug, Clone)]
pub struct TrackDefaults {
    pub velocity_kmh: f64,
    pub interval_ms: u64,
    pub delay_ms: u64,
    pub loop_path: bool,
    pub repeat: bool,
    pub mode: TrackMode,
    pub source: String,
}

impl Default for TrackDefaults {
    fn default() -> Self {
        Self {
            velocity_kmh: DEFAULT_VELOCITY_KMH,
            interval_ms: DEFAULT_INTERVAL_MS,
            delay_ms: 0,
            loop_path: false,
            repeat: false,
            mode: TrackMode::Nmea,
            source: DEFAULT_SOURCE.to_string(),
        }
    }
}

impl TrackDefaults {
    /// Materialize the defaults as a per-track config.
    pub fn to_config(&self) -> TrackConfig {
        TrackConfig {
            velocity_kmh: self.velocity_kmh,
            interval: Duration::from_millis(self.interval_ms),
            initial_delay: Duration::from_millis(self.delay_ms),
            loop_path: self.loop_path,
            repeat: self.repeat,
            mode: self.mode,
            source: self.source.clone(),
        }
    }
}

/// NMEA emission settings (`[nmea]` section).
#[derive(Debug, Clone)]
pub struct NmeaSettings {
    /// Sentence types emitted per sample, in order.
    pub types: Vec<NmeaSentence>,
    /// Concatenate all sentences for a sample into one payload.
    pub batch: bool,
}

impl Default for NmeaSettings {
    fn default() -> Self {
        Self {
            types: NmeaSentence::ALL.to_vec(),
            batch: false,
        }
    }
}

/// UDP sink settings (`[udp]` section).
#[derive(Debug, Clone)]
pub struct UdpSettings {
    pub host: String,
    pub port: u16,
}

impl Default for UdpSettings {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 10110,
        }
    }
}

/// MQTT sink settings (`[mqtt]` section).
#[derive(Debug, Clone)]
pub struct MqttSettings {
    pub host: String,
    pub port: u16,
    /// Topic prefix; full topics are `<prefix>/<mode>/<trackId>`.
    pub topic: String,
}

impl Default for MqttSettings {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 1883,
            topic: "tracksim".to_string(),
        }
    }
}

/// File output layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilegenMode {
    /// One merged file for every track.
    #[default]
    Single,
    /// One file per track under an output directory.
    Multi,
}

impl FilegenMode {
    pub fn parse(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "single" => Some(Self::Single),
            "multi" => Some(Self::Multi),
            _ => None,
        }
    }
}

/// File sink settings (`[filegen]` section).
#[derive(Debug, Clone)]
pub struct FilegenSettings {
    pub mode: FilegenMode,
    /// Merged output path (single mode).
    pub outfile: PathBuf,
    /// Per-track output directory (multi mode).
    pub outdir: PathBuf,
}

impl Default for FilegenSettings {
    fn default() -> Self {
        Self {
            mode: FilegenMode::Single,
            outfile: PathBuf::from("output.trks"),
            outdir: PathBuf::from("."),
        }
    }
}
