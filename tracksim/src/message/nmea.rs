//! NMEA 0183 sentence bodies.
//!
//! Positions are encoded as degrees + decimal minutes (`DDMM.MMMM` for
//! latitude, `DDDMM.MMMM` for longitude) with a hemisphere letter. The
//! GPGGA fix quality, satellite count, and HDOP fields carry fixed
//! placeholder values: this is a simulated fix, not an acquired one.

use super::Sample;

/// Knots per km/h.
const KNOTS_PER_KMH: f64 = 0.539957;

/// The NMEA sentence types the encoder can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NmeaSentence {
    Gprmc,
    Gpgga,
    Gpgll,
}

impl NmeaSentence {
    /// Every supported sentence, in default emission order.
    pub const ALL: [NmeaSentence; 3] = [Self::Gprmc, Self::Gpgga, Self::Gpgll];

    /// Parse a sentence name, case-insensitively.
    pub fn parse(token: &str) -> Option<Self> {
        match token.trim().to_ascii_uppercase().as_str() {
            "GPRMC" => Some(Self::Gprmc),
            "GPGGA" => Some(Self::Gpgga),
            "GPGLL" => Some(Self::Gpgll),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gprmc => "GPRMC",
            Self::Gpgga => "GPGGA",
            Self::Gpgll => "GPGLL",
        }
    }
}

/// Render the unframed body for one sentence type.
pub(super) fn body(sentence: NmeaSentence, sample: &Sample) -> String {
    let time = sample.timestamp.format("%H%M%S");
    let (lat, ns) = degrees_to_dm(sample.latitude, true);
    let (lon, ew) = degrees_to_dm(sample.longitude, false);

    match sentence {
        NmeaSentence::Gprmc => {
            let knots = sample.speed_kmh * KNOTS_PER_KMH;
            format!("GPRMC,{time}.00,A,{lat},{ns},{lon},{ew},{knots:.2},0.0,,,")
        }
        NmeaSentence::Gpgga => {
            format!("GPGGA,{time}.00,{lat},{ns},{lon},{ew},1,8,1.0,0.0,M,0.0,M,,")
        }
        NmeaSentence::Gpgll => {
            format!("GPGLL,{lat},{ns},{lon},{ew},{time}.00,A")
        }
    }
}

/// Convert decimal degrees to NMEA degrees + decimal minutes and the
/// hemisphere letter. Latitude degrees are two digits, longitude three.
fn degrees_to_dm(value: f64, is_lat: bool) -> (String, char) {
    let hemisphere = match (is_lat, value >= 0.0) {
        (true, true) => 'N',
        (true, false) => 'S',
        (false, true) => 'E',
        (false, false) => 'W',
    };

    let magnitude = value.abs();
    let degrees = magnitude.trunc() as u32;
    let minutes = (magnitude - magnitude.trunc()) * 60.0;

    let encoded = if is_lat {
        format!("{degrees:02}{minutes:07.4}")
    } else {
        format!("{degrees:03}{minutes:07.4}")
    };
    (encoded, hemisphere)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degrees_to_dm_latitude() {
        let (encoded, hemisphere) = degrees_to_dm(41.8902, true);
        assert_eq!(encoded, "4153.4120");
        assert_eq!(hemisphere, 'N');

        let (encoded, hemisphere) = degrees_to_dm(-41.8902, true);
        assert_eq!(encoded, "4153.4120");
        assert_eq!(hemisphere, 'S');
    }

    #[test]
    fn test_degrees_to_dm_longitude_width() {
        let (encoded, hemisphere) = degrees_to_dm(12.4923, false);
        assert_eq!(encoded, "01229.5380");
        assert_eq!(hemisphere, 'E');

        let (encoded, hemisphere) = degrees_to_dm(-122.4194, false);
        assert_eq!(encoded, "12225.1640");
        assert_eq!(hemisphere, 'W');
    }

    #[test]
    fn test_degrees_to_dm_pads_small_minutes() {
        let (encoded, _) = degrees_to_dm(41.05, true);
        assert_eq!(encoded, "4103.0000");
    }

    #[test]
    fn test_sentence_parse() {
        assert_eq!(NmeaSentence::parse("gprmc"), Some(NmeaSentence::Gprmc));
        assert_eq!(NmeaSentence::parse(" GPGLL "), Some(NmeaSentence::Gpgll));
        assert_eq!(NmeaSentence::parse("GPVTG"), None);
    }
}
