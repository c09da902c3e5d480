//! Timestamps as reported by the API.
//!
//! Date fields are decoded leniently: a string that cannot be parsed does not
//! fail the surrounding entity, it yields [`Timestamp::Invalid`] carrying the
//! original text.

use crate::helpers::parse_time;
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde::{Serialize, Serializer};
use std::fmt;

/// Format of the keys in a time-grouped metrics object, e.g. `2019-08-17 12:00:00 UTC`.
const TIME_BUCKET_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

/// A point in time decoded from a date string or epoch-millisecond number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Timestamp {
    Valid(DateTime<Utc>),
    /// The source value could not be read as a date.
    Invalid(String),
}

impl Timestamp {
    /// Parse an RFC 3339 / ISO 8601 string. A missing zone is read as UTC and a
    /// bare `YYYY-MM-DD` is midnight UTC.
    pub fn parse(s: &str) -> Self {
        if let Ok(dt) = parse_time(s) {
            return Timestamp::Valid(dt);
        }
        if let Ok(date) = NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d") {
            if let Some(dt) = date.and_hms_opt(0, 0, 0) {
                return Timestamp::Valid(dt.and_utc());
            }
        }
        if let Some(dt) = parse_time_bucket(s) {
            return Timestamp::Valid(dt);
        }
        Timestamp::Invalid(s.to_string())
    }

    /// Milliseconds since the Unix epoch. Fractions are truncated.
    pub fn from_millis(ms: f64) -> Self {
        if ms.is_finite() {
            if let Some(dt) = Utc.timestamp_millis_opt(ms.trunc() as i64).single() {
                return Timestamp::Valid(dt);
            }
        }
        Timestamp::Invalid(ms.to_string())
    }

    /// Key of a time-grouped metrics entry.
    ///
    /// The API renders these as `YYYY-MM-DD HH:MM:SS UTC`; that format is read
    /// explicitly as a UTC time. Anything else goes through [`Timestamp::parse`].
    pub fn from_time_bucket(key: &str) -> Self {
        match parse_time_bucket(key) {
            Some(dt) => Timestamp::Valid(dt),
            None => Timestamp::parse(key),
        }
    }

    pub fn as_datetime(&self) -> Option<&DateTime<Utc>> {
        match self {
            Timestamp::Valid(dt) => Some(dt),
            Timestamp::Invalid(_) => None,
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Timestamp::Valid(_))
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Timestamp::Valid(dt)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Timestamp::Valid(dt) => write!(f, "{}", dt.to_rfc3339_opts(SecondsFormat::Secs, true)),
            Timestamp::Invalid(raw) => write!(f, "{}", raw),
        }
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

fn parse_time_bucket(key: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(key.trim(), TIME_BUCKET_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}
