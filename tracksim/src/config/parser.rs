//! INI parsing logic for converting `Ini` → `AppSettings`.
//!
//! Starts from `AppSettings::default()` and overlays any values found in
//! the INI. Out-of-range or malformed values never abort the run: each
//! one logs a warning and keeps the default for that key.

use ini::{Ini, Properties};
use std::path::PathBuf;

use tracing::warn;

use super::settings::{
    AppSettings, FilegenMode, FilegenSettings, MqttSettings, TrackDefaults, UdpSettings,
};
use crate::message::NmeaSentence;
use crate::track::TrackMode;

/// Parse an `Ini` document into `AppSettings`.
pub(super) fn parse_ini(ini: &Ini) -> AppSettings {
    let mut settings = AppSettings::default();

    if let Some(section) = ini.section(Some("track")) {
        parse_track_section(section, &mut settings.track);
    }

    if let Some(section) = ini.section(Some("nmea")) {
        if let Some(value) = section.get("types") {
            settings.nmea.types = parse_nmea_types(value);
        }
        if let Some(value) = section.get("batch") {
            settings.nmea.batch = parse_bool("nmea", "batch", value, settings.nmea.batch);
        }
    }

    if let Some(section) = ini.section(Some("udp")) {
        if section_enabled(section) {
            let mut udp = UdpSettings::default();
            if let Some(value) = section.get("host") {
                udp.host = value.to_string();
            }
            if let Some(value) = section.get("port") {
                udp.port = parse_number("udp", "port", value, udp.port);
            }
            settings.udp = Some(udp);
        }
    }

    if let Some(section) = ini.section(Some("mqtt")) {
        if section_enabled(section) {
            let mut mqtt = MqttSettings::default();
            if let Some(value) = section.get("host") {
                mqtt.host = value.to_string();
            }
            if let Some(value) = section.get("port") {
                mqtt.port = parse_number("mqtt", "port", value, mqtt.port);
            }
            if let Some(value) = section.get("topic") {
                mqtt.topic = value.to_string();
            }
            settings.mqtt = Some(mqtt);
        }
    }

    if let Some(section) = ini.section(Some("filegen")) {
        if section_enabled(section) {
            let mut filegen = FilegenSettings::default();
            if let Some(value) = section.get("mode") {
                match FilegenMode::parse(value) {
                    Some(mode) => filegen.mode = mode,
                    None => warn!(
                        value,
                        "invalid [filegen] mode (expected 'single' or 'multi'), using single"
                    ),
                }
            }
            if let Some(value) = section.get("outfile") {
                filegen.outfile = PathBuf::from(value);
            }
            if let Some(value) = section.get("outdir") {
                filegen.outdir = PathBuf::from(value);
            }
            settings.filegen = Some(filegen);
        }
    }

    settings
}

fn parse_track_section(section: &Properties, track: &mut TrackDefaults) {
    if let Some(value) = section.get("velocity") {
        let velocity = parse_number("track", "velocity", value, track.velocity_kmh);
        if velocity > 0.0 {
            track.velocity_kmh = velocity;
        } else {
            warn!(
                value,
                default = track.velocity_kmh,
                "non-positive [track] velocity, using default"
            );
        }
    }
    if let Some(value) = section.get("interval") {
        let interval = parse_number("track", "interval", value, track.interval_ms);
        if interval > 0 {
            track.interval_ms = interval;
        } else {
            warn!(
                value,
                default = track.interval_ms,
                "zero [track] interval, using default"
            );
        }
    }
    if let Some(value) = section.get("delay") {
        track.delay_ms = parse_number("track", "delay", value, track.delay_ms);
    }
    if let Some(value) = section.get("loop") {
        track.loop_path = parse_bool("track", "loop", value, track.loop_path);
    }
    if let Some(value) = section.get("repeat") {
        track.repeat = parse_bool("track", "repeat", value, track.repeat);
    }
    if let Some(value) = section.get("mode") {
        match TrackMode::parse(value) {
            Some(mode) => track.mode = mode,
            None => warn!(value, default = %track.mode, "unknown [track] mode, using default"),
        }
    }
    if let Some(value) = section.get("source") {
        track.source = value.to_ascii_lowercase();
    }
}

/// Parse a comma-separated sentence list, dropping unknown names with a
/// warning. An empty result falls back to the full set.
fn parse_nmea_types(value: &str) -> Vec<NmeaSentence> {
    let mut types = Vec::new();
    for token in value.split(',') {
        match NmeaSentence::parse(token) {
            Some(sentence) if !types.contains(&sentence) => types.push(sentence),
            Some(_) => {}
            None => warn!(token, "unknown NMEA sentence type, skipped"),
        }
    }
    if types.is_empty() {
        warn!("no valid NMEA sentence types configured, using all");
        NmeaSentence::ALL.to_vec()
    } else {
        types
    }
}

/// A sink section is enabled unless it says `enabled = false`.
fn section_enabled(section: &Properties) -> bool {
    section
        .get("enabled")
        .map(|value| parse_bool("", "enabled", value, true))
        .unwrap_or(true)
}

fn parse_number<T: std::str::FromStr + Copy + std::fmt::Display>(
    section: &str,
    key: &str,
    value: &str,
    default: T,
) -> T {
    match value.trim().parse() {
        Ok(parsed) => parsed,
        Err(_) => {
            warn!(section, key, value, %default, "malformed config value, using default");
            default
        }
    }
}

fn parse_bool(section: &str, key: &str, value: &str, default: bool) -> bool {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => true,
        "false" | "no" | "off" | "0" => false,
        _ => {
            warn!(section, key, value, default, "malformed boolean, using default");
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> AppSettings {
        parse_ini(&Ini::load_from_str(text).expect("valid ini"))
    }

    #[test]
    fn test_empty_ini_yields_defaults() {
        let settings = parse("");
        assert_eq!(settings.track.velocity_kmh, 50.0);
        assert_eq!(settings.track.interval_ms, 1000);
        assert!(settings.udp.is_none());
        assert!(settings.mqtt.is_none());
        assert!(settings.filegen.is_none());
        assert_eq!(settings.nmea.types.len(), 3);
    }

    #[test]
    fn test_track_section_overlays_defaults() {
        let settings = parse(
            "[track]\nvelocity = 30\ninterval = 500\nmode = land\nloop = true\nsource = Ship\n",
        );
        assert_eq!(settings.track.velocity_kmh, 30.0);
        assert_eq!(settings.track.interval_ms, 500);
        assert_eq!(settings.track.mode, TrackMode::TrkAuto);
        assert!(settings.track.loop_path);
        assert_eq!(settings.track.source, "ship");
    }

    #[test]
    fn test_invalid_velocity_keeps_default() {
        let settings = parse("[track]\nvelocity = -5\n");
        assert_eq!(settings.track.velocity_kmh, 50.0);

        let settings = parse("[track]\nvelocity = fast\n");
        assert_eq!(settings.track.velocity_kmh, 50.0);
    }

    #[test]
    fn test_udp_section() {
        let settings = parse("[udp]\nhost = 10.0.0.7\nport = 2000\n");
        let udp = settings.udp.expect("udp enabled");
        assert_eq!(udp.host, "10.0.0.7");
        assert_eq!(udp.port, 2000);
    }

    #[test]
    fn test_disabled_section_is_ignored() {
        let settings = parse("[udp]\nenabled = false\nhost = 10.0.0.7\n");
        assert!(settings.udp.is_none());
    }

    #[test]
    fn test_malformed_port_keeps_default() {
        let settings = parse("[udp]\nport = not-a-port\n");
        assert_eq!(settings.udp.expect("udp enabled").port, 10110);
    }

    #[test]
    fn test_nmea_types_filtered_and_deduplicated() {
        let settings = parse("[nmea]\ntypes = GPRMC, gpgll, GPXXX, GPRMC\nbatch = yes\n");
        assert_eq!(
            settings.nmea.types,
            vec![NmeaSentence::Gprmc, NmeaSentence::Gpgll]
        );
        assert!(settings.nmea.batch);
    }

    #[test]
    fn test_filegen_invalid_mode_falls_back_to_single() {
        let settings = parse("[filegen]\nmode = sharded\noutfile = out/all.trks\n");
        let filegen = settings.filegen.expect("filegen enabled");
        assert_eq!(filegen.mode, FilegenMode::Single);
        assert_eq!(filegen.outfile, PathBuf::from("out/all.trks"));
    }
}
