//! Timestamp - Heterogeneous Document Timestamps
//!
//! Documents written by devices and by the registry carry timestamps in
//! several shapes. Every comparison goes through [`Timestamp::epoch_millis`].

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Naive formats interpreted in the local time zone
const LOCAL_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

/// A timestamp as stored in a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Timestamp {
    /// Store-native timestamp object
    Native {
        #[serde(alias = "_seconds")]
        seconds: i64,
        #[serde(alias = "_nanoseconds", default)]
        nanoseconds: u32,
    },
    /// Milliseconds since the Unix epoch
    Millis(i64),
    /// RFC 3339 date-time
    Date(DateTime<Utc>),
    /// Any other date string
    Text(String),
}

impl Timestamp {
    /// Timestamp for the current instant
    pub fn now() -> Self {
        Timestamp::Date(Utc::now())
    }

    /// Normalize to milliseconds since the Unix epoch
    ///
    /// Returns `None` when a text timestamp cannot be parsed or a native
    /// one is out of range.
    pub fn epoch_millis(&self) -> Option<i64> {
        match self {
            Timestamp::Native {
                seconds,
                nanoseconds,
            } => seconds
                .checked_mul(1000)?
                .checked_add(i64::from(*nanoseconds) / 1_000_000),
            Timestamp::Millis(ms) => Some(*ms),
            Timestamp::Date(dt) => Some(dt.timestamp_millis()),
            Timestamp::Text(text) => parse_text_millis(text),
        }
    }

    /// Normalize to a UTC date-time
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        self.epoch_millis()
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
    }

    /// Compare two timestamps by normalized value
    ///
    /// Unparseable timestamps order before every parseable one.
    pub fn cmp_normalized(&self, other: &Timestamp) -> Ordering {
        self.epoch_millis().cmp(&other.epoch_millis())
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Timestamp::Date(dt)
    }
}

fn parse_text_millis(text: &str) -> Option<i64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.timestamp_millis());
    }

    for format in LOCAL_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Local
                .from_local_datetime(&naive)
                .earliest()
                .map(|dt| dt.timestamp_millis());
        }
    }

    // Date-only strings are UTC midnight
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc().timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn native_and_millis_agree() {
        let native = Timestamp::Native {
            seconds: 1_700_000_000,
            nanoseconds: 250_000_000,
        };
        assert_eq!(native.epoch_millis(), Some(1_700_000_000_250));
        assert_eq!(
            native.cmp_normalized(&Timestamp::Millis(1_700_000_000_250)),
            Ordering::Equal
        );
    }

    #[test]
    fn rfc3339_text_with_offset() {
        let ts = Timestamp::Text("2024-05-01T10:00:00+02:00".to_string());
        let expected = Utc
            .with_ymd_and_hms(2024, 5, 1, 8, 0, 0)
            .single()
            .expect("valid date")
            .timestamp_millis();
        assert_eq!(ts.epoch_millis(), Some(expected));
    }

    #[test]
    fn date_only_text_is_utc_midnight() {
        let ts = Timestamp::Text("2024-05-01".to_string());
        let expected = Utc
            .with_ymd_and_hms(2024, 5, 1, 0, 0, 0)
            .single()
            .expect("valid date")
            .timestamp_millis();
        assert_eq!(ts.epoch_millis(), Some(expected));
    }

    #[test]
    fn naive_text_is_local_time() {
        let ts = Timestamp::Text("2024-05-01 10:30:00".to_string());
        let naive = NaiveDate::from_ymd_opt(2024, 5, 1)
            .and_then(|d| d.and_hms_opt(10, 30, 0))
            .expect("valid date");
        let expected = Local
            .from_local_datetime(&naive)
            .earliest()
            .map(|dt| dt.timestamp_millis());
        assert_eq!(ts.epoch_millis(), expected);
    }

    #[test]
    fn garbage_text_does_not_normalize() {
        assert_eq!(Timestamp::Text("yesterday-ish".into()).epoch_millis(), None);
        assert_eq!(Timestamp::Text("   ".into()).epoch_millis(), None);
        assert_eq!(
            Timestamp::Text("nope".into()).cmp_normalized(&Timestamp::Millis(0)),
            Ordering::Less
        );
    }

    #[test]
    fn out_of_range_native_does_not_normalize() {
        let huge: Timestamp =
            serde_json::from_str(r#"{"seconds": 9300000000000000, "nanoseconds": 0}"#)
                .expect("native");
        assert_eq!(huge.epoch_millis(), None);
        assert_eq!(huge.to_datetime(), None);
        assert_eq!(
            huge.cmp_normalized(&Timestamp::Millis(0)),
            Ordering::Less
        );
    }

    #[test]
    fn deserializes_every_shape() {
        let native: Timestamp =
            serde_json::from_str(r#"{"seconds": 10, "nanoseconds": 5000000}"#).expect("native");
        assert_eq!(native.epoch_millis(), Some(10_005));

        let exported: Timestamp =
            serde_json::from_str(r#"{"_seconds": 10, "_nanoseconds": 0}"#).expect("exported");
        assert_eq!(exported.epoch_millis(), Some(10_000));

        let millis: Timestamp = serde_json::from_str("1700000000000").expect("millis");
        assert_eq!(millis, Timestamp::Millis(1_700_000_000_000));

        let date: Timestamp = serde_json::from_str(r#""2024-05-01T00:00:00Z""#).expect("date");
        assert!(matches!(date, Timestamp::Date(_)));

        let text: Timestamp = serde_json::from_str(r#""2024-05-01""#).expect("text");
        assert!(matches!(text, Timestamp::Text(_)));
    }
}
