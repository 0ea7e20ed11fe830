//! Configuration file loading.
//!
//! The config file is optional: a missing file yields the built-in
//! defaults, matching the behavior of running without one. Only an
//! unreadable or syntactically invalid file is an error.

use std::path::{Path, PathBuf};

use ini::Ini;
use tracing::debug;

use super::parser::parse_ini;
use super::settings::AppSettings;

/// Config file looked up when no `--config` flag is given.
pub const DEFAULT_CONFIG_PATH: &str = "config.ini";

/// Errors from reading or parsing the config file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigFileError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ini::ParseError,
    },
}

/// Load settings from an INI file, overlaying the built-in defaults.
///
/// A missing file is not an error; it yields `AppSettings::default()`.
pub fn load_settings(path: &Path) -> Result<AppSettings, ConfigFileError> {
    if !path.exists() {
        debug!(path = %path.display(), "no config file, using defaults");
        return Ok(AppSettings::default());
    }

    let text = std::fs::read_to_string(path).map_err(|source| ConfigFileError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let ini = Ini::load_from_str(&text).map_err(|source| ConfigFileError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(parse_ini(&ini))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file_yields_defaults() {
        let settings = load_settings(Path::new("definitely/not/here.ini")).expect("defaults");
        assert!(settings.udp.is_none());
        assert_eq!(settings.track.interval_ms, 1000);
    }

    #[test]
    fn test_loads_sections_from_disk() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "[track]\nvelocity = 25\n\n[mqtt]\nhost = broker\nport = 1884\n")
            .expect("write config");

        let settings = load_settings(file.path()).expect("parse");
        assert_eq!(settings.track.velocity_kmh, 25.0);
        let mqtt = settings.mqtt.expect("mqtt enabled");
        assert_eq!(mqtt.host, "broker");
        assert_eq!(mqtt.port, 1884);
    }

    #[test]
    fn test_invalid_ini_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "[unterminated\nvelocity").expect("write config");

        let result = load_settings(file.path());
        assert!(matches!(result, Err(ConfigFileError::Parse { .. })));
    }
}
