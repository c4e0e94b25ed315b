use std::sync::Arc;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::normalize::timestamp::canonical_timestamp;

/// One decoded input line: a JSON object, or the flat map extracted from
/// `key=value` tokens. Dotted keys from key=value lines stay flat.
pub type RawRecord = Map<String, Value>;

/// Canonical event derived from a [`RawRecord`].
///
/// Every field is optional; absence means the source line did not carry
/// a usable value for it.
#[derive(Debug, Clone)]
pub struct NormalizedEvent {
    /// Parsed instant in UTC. `None` when the source had no timestamp or
    /// it could not be parsed.
    pub timestamp: Option<DateTime<Utc>>,
    pub event_type: Option<String>,
    pub message: Option<String>,
    pub user: Option<String>,
    pub ip: Option<String>,
    pub country: Option<String>,
    pub outcome: Option<String>,
    /// The record this event was normalized from
    pub raw: Arc<RawRecord>,
}

impl NormalizedEvent {
    /// Canonical UTC text of the timestamp, ordered lexicographically
    /// the same way as chronologically.
    pub fn timestamp_text(&self) -> Option<String> {
        self.timestamp.map(canonical_timestamp)
    }
}
