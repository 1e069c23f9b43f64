//! ISO-8601 timestamp codec.
//!
//! Outbound timestamps use millisecond precision with a `Z` suffix, the same
//! shape a browser produces with `Date.prototype.toISOString`.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};

/// ISO-8601 local date-time without an offset, e.g. `2025-03-01T10:15:30.250`.
const NAIVE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Formats an instant as `YYYY-MM-DDTHH:MM:SS.mmmZ`.
pub fn format(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parses an RFC 3339 / ISO-8601 string into a UTC instant.
///
/// A date-time without an offset is taken as UTC.
pub fn parse(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    let raw = raw.trim();
    match DateTime::parse_from_rfc3339(raw) {
        Ok(dt) => Ok(dt.with_timezone(&Utc)),
        Err(e) => NaiveDateTime::parse_from_str(raw, NAIVE_FORMAT)
            .map(|naive| naive.and_utc())
            .map_err(|_| e),
    }
}

/// Serde adapter for optional timestamps that never fails on input.
///
/// Strings are parsed as ISO-8601, numbers as Unix milliseconds. Anything else,
/// including an unparseable string, deserializes to `None` so that the caller
/// can substitute the receipt time.
pub mod lenient {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};
    use serde_json::Value;

    pub fn serialize<S: Serializer>(
        ts: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match ts {
            Some(ts) => serializer.serialize_str(&super::format(ts)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        let raw = Option::<Value>::deserialize(deserializer)?;
        Ok(match raw {
            Some(Value::String(s)) => super::parse(&s).ok(),
            Some(Value::Number(n)) => n.as_i64().and_then(DateTime::from_timestamp_millis),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn format_uses_millis_and_z_suffix() {
        let ts = Utc.with_ymd_and_hms(2025, 3, 1, 10, 15, 30).unwrap()
            + chrono::Duration::milliseconds(250);
        assert_eq!(format(&ts), "2025-03-01T10:15:30.250Z");
    }

    #[test]
    fn parse_accepts_offsets() {
        let ts = parse("2025-03-01T13:15:30.250+03:00").unwrap();
        assert_eq!(format(&ts), "2025-03-01T10:15:30.250Z");
    }

    #[test]
    fn roundtrip_keeps_millisecond_precision() {
        let now = Utc::now();
        let parsed = parse(&format(&now)).unwrap();
        assert_eq!(parsed.timestamp_millis(), now.timestamp_millis());
    }

    #[test]
    fn parse_without_offset_is_utc() {
        let ts = parse("2025-03-01T10:15:30.250").unwrap();
        assert_eq!(format(&ts), "2025-03-01T10:15:30.250Z");

        let whole = parse("2025-03-01T10:15:30").unwrap();
        assert_eq!(format(&whole), "2025-03-01T10:15:30.000Z");

        let micros = parse("2025-03-01T10:15:30.123456").unwrap();
        assert_eq!(micros.timestamp_subsec_micros(), 123_456);
    }

    #[test]
    fn lenient_accepts_timestamp_without_offset() {
        #[derive(serde::Deserialize)]
        struct Stamped {
            #[serde(default, with = "crate::timestamp::lenient")]
            at: Option<DateTime<Utc>>,
        }

        let parsed: Stamped = serde_json::from_str(r#"{"at":"2025-03-01T10:15:30"}"#).unwrap();
        assert_eq!(format(&parsed.at.unwrap()), "2025-03-01T10:15:30.000Z");
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(parse("yesterday-ish").is_err());
    }
}
