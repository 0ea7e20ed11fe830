//! Wire-format rendering of position samples.
//!
//! A [`Sample`] is rendered into either NMEA 0183 sentences or custom
//! `$TRK` records, selected by the track's mode. Every rendered sentence
//! is framed as `$<body>*<HH>\r\n` where `HH` is the XOR checksum over the
//! body, the bytes strictly between `$` and `*`. Nothing follows the
//! checksum field.

mod nmea;
mod trk;

pub use nmea::NmeaSentence;

use chrono::{DateTime, Utc};

use crate::track::TrackMode;

/// One position report produced by a playback tick.
///
/// Ephemeral: rendered once, then discarded.
#[derive(Debug, Clone)]
pub struct Sample {
    /// UTC instant the sample was taken.
    pub timestamp: DateTime<Utc>,
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
    /// Speed over ground in km/h.
    pub speed_kmh: f64,
    /// Heading in whole degrees, 0-359.
    pub heading: u16,
    /// Owning track identifier.
    pub track_id: String,
}

/// XOR checksum over a sentence body, as two uppercase hex digits.
pub fn checksum(body: &str) -> String {
    let acc = body.bytes().fold(0u8, |acc, b| acc ^ b);
    format!("{acc:02X}")
}

/// Frame a sentence body with `$`, the checksum field, and CRLF.
fn frame(body: &str) -> String {
    format!("${body}*{}\r\n", checksum(body))
}

/// Renders samples into transport payloads for one track.
#[derive(Debug, Clone)]
pub struct MessageEncoder {
    mode: TrackMode,
    nmea_types: Vec<NmeaSentence>,
    nmea_batch: bool,
}

impl MessageEncoder {
    /// Create an encoder for the given mode.
    ///
    /// `nmea_types` and `nmea_batch` only apply to [`TrackMode::Nmea`]
    /// tracks; trk modes always render exactly one record per sample.
    pub fn new(mode: TrackMode, nmea_types: Vec<NmeaSentence>, nmea_batch: bool) -> Self {
        Self {
            mode,
            nmea_types,
            nmea_batch,
        }
    }

    /// Render one sample into transport payloads.
    ///
    /// In NMEA batch mode the selected sentences are concatenated into a
    /// single payload, each sentence keeping its own checksum; otherwise
    /// every sentence ships as its own payload.
    pub fn render(&self, sample: &Sample) -> Vec<String> {
        match self.mode {
            TrackMode::Nmea => {
                let sentences: Vec<String> = self
                    .nmea_types
                    .iter()
                    .map(|sentence| frame(&nmea::body(*sentence, sample)))
                    .collect();
                if self.nmea_batch {
                    vec![sentences.concat()]
                } else {
                    sentences
                }
            }
            TrackMode::TrkAuto | TrackMode::TrkContainer => {
                vec![frame(&trk::body(sample))]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> Sample {
        Sample {
            timestamp: Utc.with_ymd_and_hms(2024, 5, 17, 12, 34, 56).unwrap(),
            latitude: 41.8902,
            longitude: 12.4923,
            speed_kmh: 45.0,
            heading: 17,
            track_id: "rome-1".to_string(),
        }
    }

    #[test]
    fn test_checksum_known_values() {
        // XOR of a single byte is the byte itself
        assert_eq!(checksum("A"), "41");
        // 0x41 ^ 0x42 = 0x03
        assert_eq!(checksum("AB"), "03");
        assert_eq!(checksum(""), "00");
    }

    #[test]
    fn test_checksum_round_trip_on_rendered_output() {
        let encoder = MessageEncoder::new(TrackMode::Nmea, NmeaSentence::ALL.to_vec(), false);
        for payload in encoder.render(&sample()) {
            let body = payload
                .strip_prefix('$')
                .and_then(|rest| rest.split_once('*'))
                .map(|(body, _)| body)
                .expect("framed sentence");
            let appended = &payload[payload.len() - 4..payload.len() - 2];
            assert_eq!(checksum(body), appended);
        }
    }

    #[test]
    fn test_sentence_terminates_at_checksum() {
        let encoder = MessageEncoder::new(TrackMode::TrkAuto, Vec::new(), false);
        let payload = &encoder.render(&sample())[0];
        let after_star = payload.split_once('*').unwrap().1;
        // exactly two hex digits then CRLF, nothing else
        assert_eq!(after_star.len(), 4);
        assert!(after_star.ends_with("\r\n"));
        assert!(u8::from_str_radix(&after_star[..2], 16).is_ok());
    }

    #[test]
    fn test_nmea_batch_concatenates_with_independent_checksums() {
        let encoder = MessageEncoder::new(TrackMode::Nmea, NmeaSentence::ALL.to_vec(), true);
        let payloads = encoder.render(&sample());
        assert_eq!(payloads.len(), 1);

        let lines: Vec<&str> = payloads[0].split("\r\n").filter(|l| !l.is_empty()).collect();
        assert_eq!(lines.len(), 3);
        for line in lines {
            let (body, appended) = line.strip_prefix('$').unwrap().split_once('*').unwrap();
            assert_eq!(checksum(body), appended);
        }
    }

    #[test]
    fn test_nmea_unbatched_yields_one_payload_per_sentence() {
        let encoder = MessageEncoder::new(
            TrackMode::Nmea,
            vec![NmeaSentence::Gprmc, NmeaSentence::Gpgll],
            false,
        );
        let payloads = encoder.render(&sample());
        assert_eq!(payloads.len(), 2);
        assert!(payloads[0].starts_with("$GPRMC,"));
        assert!(payloads[1].starts_with("$GPGLL,"));
    }

    #[test]
    fn test_trk_record_layout() {
        let encoder = MessageEncoder::new(TrackMode::TrkAuto, Vec::new(), false);
        let payload = &encoder.render(&sample())[0];
        let body = payload.strip_prefix('$').unwrap().split_once('*').unwrap().0;
        assert_eq!(
            body,
            "TRK,rome-1,20240517T123456Z,41.890200,12.492300,45.0,17"
        );
    }

    #[test]
    fn test_gprmc_layout() {
        let encoder = MessageEncoder::new(TrackMode::Nmea, vec![NmeaSentence::Gprmc], false);
        let payload = &encoder.render(&sample())[0];
        let body = payload.strip_prefix('$').unwrap().split_once('*').unwrap().0;
        // 45 km/h = 24.30 knots
        assert_eq!(body, "GPRMC,123456.00,A,4153.4120,N,01229.5380,E,24.30,0.0,,,");
    }

    #[test]
    fn test_gpgga_layout() {
        let encoder = MessageEncoder::new(TrackMode::Nmea, vec![NmeaSentence::Gpgga], false);
        let payload = &encoder.render(&sample())[0];
        let body = payload.strip_prefix('$').unwrap().split_once('*').unwrap().0;
        assert_eq!(
            body,
            "GPGGA,123456.00,4153.4120,N,01229.5380,E,1,8,1.0,0.0,M,0.0,M,,"
        );
    }

    #[test]
    fn test_gpgll_layout() {
        let encoder = MessageEncoder::new(TrackMode::Nmea, vec![NmeaSentence::Gpgll], false);
        let payload = &encoder.render(&sample())[0];
        let body = payload.strip_prefix('$').unwrap().split_once('*').unwrap().0;
        assert_eq!(body, "GPGLL,4153.4120,N,01229.5380,E,123456.00,A");
    }

    #[test]
    fn test_southern_western_hemispheres() {
        let mut s = sample();
        s.latitude = -33.8688;
        s.longitude = -70.6693;
        let encoder = MessageEncoder::new(TrackMode::Nmea, vec![NmeaSentence::Gpgll], false);
        let payload = &encoder.render(&s)[0];
        assert!(payload.contains(",S,"));
        assert!(payload.contains(",W,"));
    }
}
