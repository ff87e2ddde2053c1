//! Date and time conversions used by the marshaller.
//!
//! Wire values for temporal columns are UTC. Text without an explicit
//! offset is read as UTC, never as local time.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use tracing::warn;

use crate::value::Value;

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

const DATE_FORMAT: &str = "%Y-%m-%d";

const TIME_FORMAT: &str = "%H:%M:%S%.f";

/// Whether datetime text already says it is UTC (or carries an offset).
#[must_use]
pub fn has_utc_marker(text: &str) -> bool {
    let text = text.trim_end();
    if text.ends_with(['Z', 'z']) {
        return true;
    }
    text.rfind([' ', 'T'])
        .is_some_and(|pos| text[pos + 1..].contains(['+', '-']))
}

/// Parses datetime text into a UTC instant.
///
/// Accepts RFC 3339, the MySQL `YYYY-MM-DD HH:MM:SS[.f]` form (with an
/// optional trailing `Z`) and bare dates (midnight).
#[must_use]
pub fn parse_utc(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    let naive = text.strip_suffix(['Z', 'z']).unwrap_or(text);
    NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(naive, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(naive, DATE_FORMAT)
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .map(|naive| naive.and_utc())
}

/// Converts a value into a UTC instant for persisting.
///
/// Integers are read as milliseconds since the epoch. Values that cannot
/// be interpreted are returned unchanged.
#[must_use]
pub fn to_utc_datetime(value: Value) -> Value {
    match value {
        Value::DateTime(_) => value,
        Value::Date(date) => date
            .and_hms_opt(0, 0, 0)
            .map_or(Value::Date(date), |naive| Value::DateTime(naive.and_utc())),
        Value::Int(millis) => {
            DateTime::from_timestamp_millis(millis).map_or(value, Value::DateTime)
        }
        Value::Text(ref text) => match parse_utc(text) {
            Some(dt) => Value::DateTime(dt),
            None => {
                warn!(value = %text, "unparseable datetime text, passing through");
                value
            }
        },
        other => other,
    }
}

/// Converts a datetime wire value into a UTC instant.
///
/// The server sends UTC but the client may drop the marker, so text
/// without one gets `Z` appended before parsing.
#[must_use]
pub fn hydrate_datetime(value: Value) -> Value {
    match value {
        Value::Text(text) => {
            let marked = if has_utc_marker(&text) {
                text.clone()
            } else {
                format!("{text}Z")
            };
            match parse_utc(&marked) {
                Some(dt) => Value::DateTime(dt),
                None => {
                    warn!(value = %text, "unparseable datetime wire value, passing through");
                    Value::Text(text)
                }
            }
        }
        other => to_utc_datetime(other),
    }
}

/// Renders a value as `YYYY-MM-DD` text.
#[must_use]
pub fn to_date_string(value: Value) -> Value {
    match value {
        Value::Date(date) => Value::Text(date.format(DATE_FORMAT).to_string()),
        Value::DateTime(dt) => Value::Text(dt.date_naive().format(DATE_FORMAT).to_string()),
        Value::Text(ref text) => {
            if NaiveDate::parse_from_str(text, DATE_FORMAT).is_ok() {
                value
            } else if let Some(dt) = parse_utc(text) {
                Value::Text(dt.date_naive().format(DATE_FORMAT).to_string())
            } else {
                value
            }
        }
        other => other,
    }
}

/// Renders a value as `HH:MM:SS[.fff]` text.
#[must_use]
pub fn to_time_string(value: Value) -> Value {
    match value {
        Value::Time(time) => Value::Text(time.format(TIME_FORMAT).to_string()),
        Value::DateTime(dt) => Value::Text(dt.time().format(TIME_FORMAT).to_string()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveTime, TimeZone};

    use super::*;

    #[test]
    fn utc_marker_detection() {
        assert!(has_utc_marker("2024-03-01T10:00:00Z"));
        assert!(has_utc_marker("2024-03-01T10:00:00+02:00"));
        assert!(has_utc_marker("2024-03-01 10:00:00 -0500"));
        assert!(!has_utc_marker("2024-03-01 10:00:00"));
        assert!(!has_utc_marker("2024-03-01"));
    }

    #[test]
    fn parse_utc_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
        assert_eq!(parse_utc("2024-03-01 10:00:00"), Some(expected));
        assert_eq!(parse_utc("2024-03-01 10:00:00Z"), Some(expected));
        assert_eq!(parse_utc("2024-03-01T12:00:00+02:00"), Some(expected));
        assert_eq!(
            parse_utc("2024-03-01"),
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_utc("yesterday"), None);
    }

    #[test]
    fn naive_wire_text_is_utc() {
        let hydrated = hydrate_datetime(Value::from("2024-03-01 10:00:00.250"));
        let expected = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap()
            + chrono::Duration::milliseconds(250);
        assert_eq!(hydrated, Value::DateTime(expected));
    }

    #[test]
    fn date_and_time_strings() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(to_date_string(Value::Date(date)), Value::from("2024-02-29"));
        assert_eq!(
            to_date_string(Value::from("2024-02-29T23:00:00Z")),
            Value::from("2024-02-29")
        );
        let time = NaiveTime::from_hms_milli_opt(8, 5, 3, 120).unwrap();
        assert_eq!(to_time_string(Value::Time(time)), Value::from("08:05:03.120"));
        assert_eq!(to_time_string(Value::from("08:05:03")), Value::from("08:05:03"));
    }

    #[test]
    fn epoch_millis_persist_as_datetime() {
        assert_eq!(
            to_utc_datetime(Value::Int(0)),
            Value::DateTime(Utc.with_ymd_and_hms(1970, 1, 1, 0, 0, 0).unwrap())
        );
    }
}
