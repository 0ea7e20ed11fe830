//! Custom `$TRK` track record body.

use super::Sample;

/// Render the unframed `TRK` body:
/// `TRK,<trackId>,<YYYYMMDDThhmmssZ>,<lat 6dp>,<lon 6dp>,<speed 1dp>,<heading>`.
pub(super) fn body(sample: &Sample) -> String {
    format!(
        "TRK,{},{},{:.6},{:.6},{:.1},{}",
        sample.track_id,
        sample.timestamp.format("%Y%m%dT%H%M%SZ"),
        sample.latitude,
        sample.longitude,
        sample.speed_kmh,
        sample.heading,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_body_fields_and_precision() {
        let sample = Sample {
            timestamp: Utc.with_ymd_and_hms(2023, 12, 1, 6, 7, 8).unwrap(),
            latitude: -33.8688197,
            longitude: 151.20929555,
            speed_kmh: 12.34,
            heading: 359,
            track_id: "harbour".to_string(),
        };
        assert_eq!(
            body(&sample),
            "TRK,harbour,20231201T060708Z,-33.868820,151.209296,12.3,359"
        );
    }
}
