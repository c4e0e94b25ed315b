use std::collections::HashMap;
use chrono::{DateTime, Duration, Utc};

use crate::models::{Finding, Severity};

pub const RULE_IMPOSSIBLE_TRAVEL: &str = "impossible_travel";

/// Tracks the last country each user was seen in.
///
/// Any change of country within the window is flagged; no distance or
/// speed is computed.
#[derive(Debug)]
pub struct CountryChangeTracker {
    /// Maps user -> (last country, when it was seen)
    last_seen: HashMap<String, (String, DateTime<Utc>)>,
    window: Duration,
}

impl CountryChangeTracker {
    pub fn new(window: Duration) -> Self {
        CountryChangeTracker {
            last_seen: HashMap::new(),
            window,
        }
    }

    /// Compare a sighting with the user's previous one.
    ///
    /// The stored sighting is always replaced, so one change of country
    /// yields at most one finding.
    pub fn check_impossible_travel(
        &mut self,
        user: &str,
        country: &str,
        at: DateTime<Utc>,
    ) -> Option<Finding> {
        let previous = self
            .last_seen
            .insert(user.to_string(), (country.to_string(), at));

        let (last_country, last_at) = previous?;
        let elapsed = at.signed_duration_since(last_at);
        if last_country != country && elapsed <= self.window {
            Some(Finding::new(
                RULE_IMPOSSIBLE_TRAVEL,
                Severity::High,
                format!(
                    "{}: {} -> {} within {}m",
                    user,
                    last_country,
                    country,
                    elapsed.num_minutes()
                ),
            ))
        } else {
            None
        }
    }

    /// Last (country, timestamp) recorded for a user
    pub fn last_location(&self, user: &str) -> Option<(&str, DateTime<Utc>)> {
        self.last_seen
            .get(user)
            .map(|(country, at)| (country.as_str(), *at))
    }
}
