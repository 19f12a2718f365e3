//! Time arithmetic for relative and absolute sample clocks.
//!
//! Absolute timestamps are optional everywhere: `None` is the "not-a-time"
//! value used when the record start could not be resolved. Every helper here
//! short-circuits to `None` instead of failing.

use chrono::{DateTime, Duration, TimeZone, Utc};
use chrono_tz::Tz;
use serde_json::Value;

/// Wall-clock timestamp in the parser's configured timezone.
pub type Timestamp = DateTime<Tz>;

/// Add a relative offset to an optional start time.
pub fn offset(start: Option<Timestamp>, elapsed: Duration) -> Option<Timestamp> {
    start.and_then(|s| s.checked_add_signed(elapsed))
}

/// Duration between an optional timestamp and an optional start time.
pub fn elapsed_since(time: Option<Timestamp>, start: Option<Timestamp>) -> Option<Duration> {
    match (time, start) {
        (Some(t), Some(s)) => Some(t.signed_duration_since(s)),
        _ => None,
    }
}

/// Convert a millisecond Unix epoch value into the given timezone.
///
/// Fractional milliseconds are kept to microsecond precision.
pub fn from_unix_millis(millis: f64, tz: &Tz) -> Option<Timestamp> {
    if !millis.is_finite() {
        return None;
    }
    let micros = (millis * 1000.0).round();
    if micros < i64::MIN as f64 || micros > i64::MAX as f64 {
        return None;
    }
    let utc: DateTime<Utc> = Utc.timestamp_micros(micros as i64).single()?;
    Some(utc.with_timezone(tz))
}

/// Read a millisecond epoch out of a loosely typed JSON value.
///
/// Accepts integers, floats and numeric strings.
pub fn millis_from_json(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Serde support for `Duration` as integer milliseconds.
pub mod duration_ms {
    use chrono::Duration;
    use serde::{Serialize, Serializer};

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.num_milliseconds().serialize(serializer)
    }
}

/// Serde support for `Option<Duration>` as integer milliseconds or null.
pub mod option_duration_ms {
    use chrono::Duration;
    use serde::{Serialize, Serializer};

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.map(|d| d.num_milliseconds()).serialize(serializer)
    }
}

/// Serde support for optional zoned timestamps as RFC 3339 strings or null.
pub mod option_timestamp {
    use super::Timestamp;
    use serde::{Serialize, Serializer};

    pub fn serialize<S>(time: &Option<Timestamp>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        time.map(|t| t.to_rfc3339()).serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_unix_millis_utc() {
        let t = from_unix_millis(1_700_000_000_000.0, &Tz::UTC).unwrap();
        assert_eq!(t.to_rfc3339(), "2023-11-14T22:13:20+00:00");
    }

    #[test]
    fn test_from_unix_millis_converts_zone() {
        let t = from_unix_millis(1_700_000_000_000.0, &chrono_tz::America::Toronto).unwrap();
        assert_eq!(t.to_rfc3339(), "2023-11-14T17:13:20-05:00");
    }

    #[test]
    fn test_from_unix_millis_rejects_nan() {
        assert!(from_unix_millis(f64::NAN, &Tz::UTC).is_none());
    }

    #[test]
    fn test_offset_propagates_not_a_time() {
        assert!(offset(None, Duration::seconds(5)).is_none());

        let start = from_unix_millis(0.0, &Tz::UTC);
        let t = offset(start, Duration::seconds(5)).unwrap();
        assert_eq!(t.timestamp(), 5);
    }

    #[test]
    fn test_elapsed_since() {
        let start = from_unix_millis(1_000.0, &Tz::UTC);
        let later = from_unix_millis(3_500.0, &Tz::UTC);
        assert_eq!(elapsed_since(later, start), Some(Duration::milliseconds(2_500)));
        assert_eq!(elapsed_since(later, None), None);
    }

    #[test]
    fn test_millis_from_json() {
        assert_eq!(millis_from_json(&json!(1700000000000_i64)), Some(1.7e12));
        assert_eq!(millis_from_json(&json!("1700000000000")), Some(1.7e12));
        assert_eq!(millis_from_json(&json!(null)), None);
        assert_eq!(millis_from_json(&json!("soon")), None);
    }
}
