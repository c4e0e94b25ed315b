//! Timestamp normalization
//!
//! Accepts epoch seconds (10 digits), epoch milliseconds (13 digits) and
//! the ISO-8601 shapes identity providers emit, and yields a UTC instant.
//! Anything else becomes `None`.

use std::borrow::Cow;
use chrono::{DateTime, NaiveDate, NaiveDateTime, SubsecRound, TimeZone, Utc};
use serde_json::Value;

/// Fixed-width UTC rendering; lexicographic order equals chronological order.
const CANONICAL_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f+00:00";

const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%d %H:%M%:z",
];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Convert a raw record value to a UTC instant.
///
/// Strings and numbers are considered; every other JSON shape yields `None`.
pub fn to_utc_instant(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_timestamp(s),
        Value::Number(n) => parse_timestamp(&n.to_string()),
        _ => None,
    }
}

/// Parse timestamp text into a UTC instant.
///
/// Instants are truncated to microseconds, the precision of the canonical
/// text, so equal canonical text means equal instants.
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    parse_instant(text).map(|instant| instant.trunc_subsecs(6))
}

fn parse_instant(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if text.bytes().all(|b| b.is_ascii_digit()) {
        match text.len() {
            13 => return Utc.timestamp_millis_opt(text.parse().ok()?).single(),
            10 => return Utc.timestamp_opt(text.parse().ok()?, 0).single(),
            _ => {}
        }
    }

    parse_iso8601(text)
}

fn parse_iso8601(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }

    // A trailing literal "Z" means UTC
    let text: Cow<'_, str> = match text.strip_suffix('Z') {
        Some(head) => Cow::Owned(format!("{}+00:00", head)),
        None => Cow::Borrowed(text),
    };

    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(&text, format) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(&text, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    NaiveDate::parse_from_str(&text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Render an instant in the canonical fixed-width UTC form
pub fn canonical_timestamp(instant: DateTime<Utc>) -> String {
    instant.format(CANONICAL_FORMAT).to_string()
}
