//! Normalization of raw records into canonical events
//!
//! Each canonical field is resolved from an ordered list of candidate
//! paths; the first candidate holding a usable value wins. Resolution
//! never fails: anything it cannot read is treated as missing.

pub mod timestamp;

pub use timestamp::{canonical_timestamp, parse_timestamp, to_utc_instant};

use std::sync::Arc;
use serde_json::Value;

use crate::models::{NormalizedEvent, RawRecord};

const EVENT_TYPE_FIELDS: &[&str] = &["eventType", "type"];
const MESSAGE_FIELDS: &[&str] = &["displayMessage", "message", "msg"];
const USER_FIELDS: &[&str] = &["actor.alternateId", "user", "actor"];
const IP_FIELDS: &[&str] = &["client.ipAddress", "request.ipChain[0].ip", "ip"];
const COUNTRY_FIELDS: &[&str] = &[
    "client.geographicalContext.country",
    "request.ipChain[0].geographicalContext.country",
    "country",
];
const OUTCOME_FIELDS: &[&str] = &["outcome.result", "result"];
const TIMESTAMP_FIELDS: &[&str] = &["published", "eventTime", "time", "timestamp"];

/// Map a raw record onto the canonical event schema
pub fn normalize(raw: RawRecord) -> NormalizedEvent {
    let timestamp = TIMESTAMP_FIELDS
        .iter()
        .find_map(|path| resolve(&raw, path).filter(|v| scalar_text(v).is_some()))
        .and_then(to_utc_instant);

    NormalizedEvent {
        timestamp,
        event_type: first_text(&raw, EVENT_TYPE_FIELDS),
        message: first_text(&raw, MESSAGE_FIELDS),
        user: first_text(&raw, USER_FIELDS),
        ip: first_text(&raw, IP_FIELDS),
        country: first_text(&raw, COUNTRY_FIELDS),
        outcome: first_text(&raw, OUTCOME_FIELDS),
        raw: Arc::new(raw),
    }
}

fn first_text(record: &RawRecord, candidates: &[&str]) -> Option<String> {
    candidates
        .iter()
        .find_map(|path| resolve(record, path).and_then(scalar_text))
}

/// Usable text of a leaf value. Null, empty strings and containers count
/// as missing.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PathSegment<'a> {
    Key(&'a str),
    Index(usize),
}

/// Split `request.ipChain[0].ip` into keys and list indices.
/// Returns `None` for a malformed path.
fn parse_path(path: &str) -> Option<Vec<PathSegment<'_>>> {
    let mut segments = Vec::new();
    for part in path.split('.') {
        let (key, mut rest) = match part.find('[') {
            Some(pos) => (&part[..pos], &part[pos..]),
            None => (part, ""),
        };
        if !key.is_empty() {
            segments.push(PathSegment::Key(key));
        }
        while !rest.is_empty() {
            let close = rest.find(']')?;
            let index = rest.get(1..close)?.parse().ok()?;
            segments.push(PathSegment::Index(index));
            rest = &rest[close + 1..];
            if !rest.is_empty() && !rest.starts_with('[') {
                return None;
            }
        }
    }
    Some(segments)
}

fn step<'a>(value: &'a Value, segment: PathSegment<'_>) -> Option<&'a Value> {
    match (value, segment) {
        (Value::Object(map), PathSegment::Key(key)) => map.get(key),
        (Value::Array(items), PathSegment::Index(index)) => items.get(index),
        // dotted numeric form: ipChain.0.ip
        (Value::Array(items), PathSegment::Key(key)) => {
            key.parse::<usize>().ok().and_then(|index| items.get(index))
        }
        (Value::Object(_), PathSegment::Index(_)) => None,
        (Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_), _) => None,
    }
}

/// Look up a candidate path in a record.
///
/// The whole path is first tried as a flat key, since key=value lines
/// carry dotted keys like `client.ipAddress` without nesting. Otherwise
/// the path is walked through nested maps and lists.
pub fn resolve<'a>(record: &'a RawRecord, path: &str) -> Option<&'a Value> {
    if let Some(value) = record.get(path) {
        return Some(value);
    }

    let segments = parse_path(path)?;
    let (first, rest) = segments.split_first()?;
    let mut current = match first {
        PathSegment::Key(key) => record.get(*key)?,
        PathSegment::Index(_) => return None,
    };
    for segment in rest {
        current = step(current, *segment)?;
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> RawRecord {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {}", other),
        }
    }

    #[test]
    fn test_okta_system_log_event() {
        let raw = record(json!({
            "published": "2024-05-01T12:00:00.000Z",
            "eventType": "user.session.start",
            "displayMessage": "User login to Okta",
            "actor": {"alternateId": "alice@example.com", "type": "User"},
            "client": {
                "ipAddress": "198.51.100.23",
                "geographicalContext": {"country": "United States"}
            },
            "outcome": {"result": "FAILURE", "reason": "INVALID_CREDENTIALS"}
        }));

        let event = normalize(raw);
        assert_eq!(event.event_type.as_deref(), Some("user.session.start"));
        assert_eq!(event.message.as_deref(), Some("User login to Okta"));
        assert_eq!(event.user.as_deref(), Some("alice@example.com"));
        assert_eq!(event.ip.as_deref(), Some("198.51.100.23"));
        assert_eq!(event.country.as_deref(), Some("United States"));
        assert_eq!(event.outcome.as_deref(), Some("FAILURE"));
        assert_eq!(
            event.timestamp_text().as_deref(),
            Some("2024-05-01T12:00:00.000000+00:00")
        );
        assert_eq!(event.raw.get("eventType"), Some(&json!("user.session.start")));
    }

    #[test]
    fn test_ip_chain_fallback() {
        let raw = record(json!({
            "request": {"ipChain": [
                {"ip": "203.0.113.7", "geographicalContext": {"country": "Japan"}},
                {"ip": "10.0.0.1"}
            ]}
        }));

        let event = normalize(raw);
        assert_eq!(event.ip.as_deref(), Some("203.0.113.7"));
        assert_eq!(event.country.as_deref(), Some("Japan"));
    }

    #[test]
    fn test_candidate_order_first_present_wins() {
        let raw = record(json!({
            "type": "legacy",
            "eventType": "user.authentication.sso",
            "msg": "third",
            "message": "second",
            "result": "SUCCESS"
        }));

        let event = normalize(raw);
        assert_eq!(event.event_type.as_deref(), Some("user.authentication.sso"));
        assert_eq!(event.message.as_deref(), Some("second"));
        assert_eq!(event.outcome.as_deref(), Some("SUCCESS"));
    }

    #[test]
    fn test_missing_and_empty_values_fall_through() {
        let raw = record(json!({
            "actor": {"displayName": "No Id"},
            "user": "",
            "client": {"ipAddress": null},
            "ip": "192.0.2.1"
        }));

        let event = normalize(raw);
        // actor is a map without alternateId and cannot stand in as text
        assert_eq!(event.user, None);
        assert_eq!(event.ip.as_deref(), Some("192.0.2.1"));
        assert_eq!(event.country, None);
        assert_eq!(event.timestamp, None);
    }

    #[test]
    fn test_flat_dotted_keys_resolve() {
        let mut raw = RawRecord::new();
        raw.insert("client.ipAddress".into(), json!("10.1.1.1"));
        raw.insert("actor.alternateId".into(), json!("bob"));
        raw.insert("outcome.result".into(), json!("DENIED"));

        let event = normalize(raw);
        assert_eq!(event.ip.as_deref(), Some("10.1.1.1"));
        assert_eq!(event.user.as_deref(), Some("bob"));
        assert_eq!(event.outcome.as_deref(), Some("DENIED"));
    }

    #[test]
    fn test_traversal_never_errors() {
        let raw = record(json!({
            "request": {"ipChain": []},
            "client": "not-a-map",
            "outcome": ["FAILURE"]
        }));

        assert!(resolve(&raw, "request.ipChain[0].ip").is_none());
        assert!(resolve(&raw, "client.ipAddress").is_none());
        assert!(resolve(&raw, "outcome.result").is_none());
        assert!(resolve(&raw, "request.ipChain[x].ip").is_none());
        assert!(resolve(&raw, "request.ipChain.0.ip").is_none());

        let event = normalize(raw);
        assert_eq!(event.ip, None);
        assert_eq!(event.outcome, None);
    }

    #[test]
    fn test_numeric_and_bool_values_render_as_text() {
        let raw = record(json!({"user": 42, "result": true, "time": 1700000000}));
        let event = normalize(raw);
        assert_eq!(event.user.as_deref(), Some("42"));
        assert_eq!(event.outcome.as_deref(), Some("true"));
        assert!(event.timestamp.is_some());
    }

    #[test]
    fn test_unparseable_timestamp_does_not_fall_back() {
        let raw = record(json!({"published": "garbage", "timestamp": "1700000000"}));
        assert_eq!(normalize(raw).timestamp, None);
    }

    #[test]
    fn test_parse_path_segments() {
        assert_eq!(
            parse_path("request.ipChain[0].ip"),
            Some(vec![
                PathSegment::Key("request"),
                PathSegment::Key("ipChain"),
                PathSegment::Index(0),
                PathSegment::Key("ip"),
            ])
        );
        assert_eq!(parse_path("a[1][2]").map(|s| s.len()), Some(3));
        assert_eq!(parse_path("a[1"), None);
        assert_eq!(parse_path("a[1]b"), None);
    }
}
