//! Wire timestamp normalization.
//!
//! The service emits RFC 3339 timestamps in two shapes:
//! `YYYY-MM-DDTHH:MM:SSZ` and `YYYY-MM-DDTHH:MM:SS.<fraction>Z`, where the
//! fractional part has variable precision. The fraction is rescaled to whole
//! microseconds (multiply by 1e6 and round half away from zero); precision
//! beyond microseconds is discarded by that rounding. Results are UTC.
use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};

/// Input matched neither accepted timestamp shape.
#[derive(Debug, Clone, thiserror::Error)]
#[error("malformed RFC 3339 timestamp: '{0}'")]
pub struct TimeParseError(pub String);

/// Decodes a wire timestamp into a UTC-tagged [`DateTime`].
///
/// A fraction that rounds up to a full second carries into the seconds
/// field.
pub fn decode_timestamp(raw: &str) -> Result<DateTime<Utc>, TimeParseError> {
    let err = || TimeParseError(raw.to_string());
    let body = raw.strip_suffix('Z').ok_or_else(err)?;

    let (base, micros) = match body.split_once('.') {
        None => (body, 0i64),
        Some((base, fraction)) => {
            if fraction.is_empty() || !fraction.bytes().all(|b| b.is_ascii_digit()) {
                return Err(err());
            }
            let fraction: f64 = format!("0.{fraction}").parse().map_err(|_| err())?;
            (base, (fraction * 1e6).round() as i64)
        }
    };

    let naive = NaiveDateTime::parse_from_str(base, "%Y-%m-%dT%H:%M:%S").map_err(|_| err())?;
    Ok(Utc.from_utc_datetime(&naive) + Duration::microseconds(micros))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn whole_seconds() {
        let ts = decode_timestamp("2024-01-01T12:30:45Z").unwrap();
        assert_eq!(ts.to_rfc3339(), "2024-01-01T12:30:45+00:00");
    }

    #[test]
    fn fraction_is_rounded_to_microseconds() {
        // 0.1234567 s * 1e6 = 123456.7 -> rounds up, not truncates.
        let ts = decode_timestamp("2024-01-01T00:00:00.1234567Z").unwrap();
        assert_eq!(ts.nanosecond(), 123_457_000);
    }

    #[test]
    fn short_fractions_are_accepted() {
        let ts = decode_timestamp("2024-01-01T00:00:00.5Z").unwrap();
        assert_eq!(ts.nanosecond(), 500_000_000);
    }

    #[test]
    fn fraction_rounding_carries_into_seconds() {
        let ts = decode_timestamp("2024-01-01T00:00:59.9999999Z").unwrap();
        assert_eq!(ts.to_rfc3339(), "2024-01-01T00:01:00+00:00");
    }

    #[test]
    fn malformed_inputs() {
        assert!(decode_timestamp("2024-01-01T00:00:00").is_err());
        assert!(decode_timestamp("2024-01-01 00:00:00Z").is_err());
        assert!(decode_timestamp("2024-01-01T00:00:00.Z").is_err());
        assert!(decode_timestamp("2024-01-01T00:00:00.12a4Z").is_err());
        assert!(decode_timestamp("").is_err());
    }
}
