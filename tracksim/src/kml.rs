//! KML track ingestion.
//!
//! Extracts track descriptors from map-export documents: every
//! `Placemark` carrying a `LineString` becomes one track. The placemark
//! name doubles as inline configuration: its first token (optionally
//! double-quoted) is the track id, and the remaining whitespace-separated
//! tokens override the configured defaults:
//!
//! ```text
//! <name>"Harbour Loop" velocity=12 interval=500 mode=sea loop</name>
//! ```
//!
//! Recognized tokens: `velocity=`, `interval=`, `delay=`, `mode=`,
//! `source=`, and the bare flags `loop` / `repeat`. Malformed values fall
//! back to the defaults with a warning; they are never fatal.

use std::path::{Path, PathBuf};

use roxmltree::{Document, Node};
use tracing::{debug, warn};

use crate::geodesy::Waypoint;
use crate::track::{Track, TrackConfig, TrackMode, DEFAULT_CONTAINER_INTERVAL_MS};

/// Errors from reading or parsing a KML document.
#[derive(Debug, thiserror::Error)]
pub enum KmlError {
    #[error("failed to read KML file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid KML document {path}: {source}")]
    Xml {
        path: PathBuf,
        #[source]
        source: roxmltree::Error,
    },
}

/// Expand files and directories into the list of KML files to load.
///
/// Directories contribute their immediate `*.kml` entries, sorted for a
/// stable track order.
pub fn collect_kml_paths(sources: &[PathBuf]) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    for source in sources {
        if source.is_dir() {
            let mut entries: Vec<PathBuf> = std::fs::read_dir(source)
                .map(|dir| {
                    dir.filter_map(|entry| entry.ok())
                        .map(|entry| entry.path())
                        .filter(|path| is_kml(path))
                        .collect()
                })
                .unwrap_or_default();
            entries.sort();
            paths.extend(entries);
        } else if is_kml(source) {
            paths.push(source.clone());
        }
    }
    paths
}

fn is_kml(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("kml"))
        .unwrap_or(false)
}

/// Parse every LineString placemark in a KML file into a track.
///
/// Placemarks without a name or a LineString are skipped; so are
/// coordinate tokens that fail to parse.
pub fn parse_tracks(path: &Path, defaults: &TrackConfig) -> Result<Vec<Track>, KmlError> {
    let text = std::fs::read_to_string(path).map_err(|source| KmlError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let document = Document::parse(&text).map_err(|source| KmlError::Xml {
        path: path.to_path_buf(),
        source,
    })?;

    let mut tracks = Vec::new();
    for placemark in document
        .descendants()
        .filter(|node| node.tag_name().name() == "Placemark")
    {
        let Some(name_text) = child_text(placemark, "name") else {
            continue;
        };
        let Some(coords_text) = placemark
            .descendants()
            .find(|node| node.tag_name().name() == "LineString")
            .and_then(|line| child_text(line, "coordinates"))
        else {
            continue;
        };

        let Some((id, config)) = parse_name_tokens(name_text, defaults) else {
            warn!(path = %path.display(), "placemark with empty name skipped");
            continue;
        };

        let waypoints = parse_coordinates(coords_text, &id);
        debug!(
            track = %id,
            waypoints = waypoints.len(),
            path = %path.display(),
            "parsed track"
        );
        tracks.push(Track::new(id, config, waypoints));
    }

    Ok(tracks)
}

fn child_text<'a>(node: Node<'a, 'a>, name: &str) -> Option<&'a str> {
    node.children()
        .find(|child| child.tag_name().name() == name)
        .and_then(|child| child.text())
}

/// Parse a `lon,lat[,alt]` whitespace-separated coordinate list.
/// Altitude is dropped; playback is two-dimensional.
fn parse_coordinates(text: &str, track_id: &str) -> Vec<Waypoint> {
    let mut waypoints = Vec::new();
    for token in text.split_whitespace() {
        let mut parts = token.split(',');
        let parsed = match (parts.next(), parts.next()) {
            (Some(lon), Some(lat)) => lon
                .trim()
                .parse::<f64>()
                .and_then(|lon| lat.trim().parse::<f64>().map(|lat| (lat, lon)))
                .ok(),
            _ => None,
        };
        match parsed {
            Some((latitude, longitude)) => waypoints.push(Waypoint::new(latitude, longitude)),
            None => warn!(track = track_id, token, "unparseable coordinate skipped"),
        }
    }
    waypoints
}

/// Split a placemark name into the track id and its inline config tokens.
///
/// Returns `None` when no id remains after trimming.
fn parse_name_tokens(text: &str, defaults: &TrackConfig) -> Option<(String, TrackConfig)> {
    let trimmed = text.trim();
    let (id, rest) = match trimmed.strip_prefix('"') {
        Some(stripped) => match stripped.split_once('"') {
            Some((id, rest)) => (id, rest),
            None => (stripped, ""),
        },
        None => match trimmed.split_once(char::is_whitespace) {
            Some((id, rest)) => (id, rest),
            None => (trimmed, ""),
        },
    };
    if id.is_empty() {
        return None;
    }

    let mut config = defaults.clone();
    let mut interval_set = false;

    for token in rest.split_whitespace() {
        match token.split_once('=') {
            Some(("velocity", value)) => match value.parse::<f64>() {
                Ok(velocity) if velocity > 0.0 && velocity.is_finite() => {
                    config.velocity_kmh = velocity;
                }
                _ => warn!(
                    track = id,
                    value,
                    default = config.velocity_kmh,
                    "invalid velocity token, using default"
                ),
            },
            Some(("interval", value)) => match value.parse::<u64>() {
                Ok(ms) if ms > 0 => {
                    config.interval = std::time::Duration::from_millis(ms);
                    interval_set = true;
                }
                _ => warn!(
                    track = id,
                    value,
                    default_ms = config.interval.as_millis() as u64,
                    "invalid interval token, using default"
                ),
            },
            Some(("delay", value)) => match value.parse::<u64>() {
                Ok(ms) => config.initial_delay = std::time::Duration::from_millis(ms),
                Err(_) => warn!(track = id, value, "invalid delay token, using default"),
            },
            Some(("mode", value)) => match TrackMode::parse(value) {
                Some(mode) => config.mode = mode,
                None => warn!(
                    track = id,
                    value,
                    default = %config.mode,
                    "unknown mode token, using default"
                ),
            },
            Some(("source", value)) => config.source = value.to_ascii_lowercase(),
            Some((key, _)) => debug!(track = id, key, "unrecognized config token ignored"),
            None => match token {
                "loop" => config.loop_path = true,
                "repeat" => config.repeat = true,
                _ => debug!(track = id, token, "unrecognized flag token ignored"),
            },
        }
    }

    // Container tracks report on a slow cadence unless told otherwise.
    if config.mode == TrackMode::TrkContainer && !interval_set {
        config.interval = std::time::Duration::from_millis(DEFAULT_CONTAINER_INTERVAL_MS);
    }

    Some((id.to_string(), config))
}
