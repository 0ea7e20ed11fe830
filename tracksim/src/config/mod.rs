//! Application configuration.
//!
//! Settings are plain data structs with built-in defaults; an INI config
//! file overlays the defaults, and CLI flags overlay the file. The merged
//! [`AppSettings`] value is immutable and passed by reference into the
//! components that need it. There is no global configuration state.

mod file;
mod parser;
mod settings;

pub use file::{load_settings, ConfigFileError, DEFAULT_CONFIG_PATH};
pub use settings::{
    AppSettings, FilegenMode, FilegenSettings, MqttSettings, NmeaSettings, TrackDefaults,
    UdpSettings,
};
