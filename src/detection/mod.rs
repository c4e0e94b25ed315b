//! Stateful rule engine
//!
//! A [`RuleDetector`] consumes normalized events one at a time, in
//! chronological order, and emits findings. Its state is private to the
//! instance and lives for a single analysis run.

pub mod failed_logins;
pub mod impossible_travel;

pub use failed_logins::{FailedLoginTracker, RULE_FAILED_LOGINS_IP, RULE_FAILED_LOGINS_USER};
pub use impossible_travel::{CountryChangeTracker, RULE_IMPOSSIBLE_TRAVEL};

use chrono::{DateTime, Utc};

use crate::config::DetectionConfig;
use crate::models::{Finding, NormalizedEvent};

const FAILURE_OUTCOMES: &[&str] = &["failure", "failed", "denied"];

/// Whether an outcome string denotes an authentication failure
pub fn is_failure(outcome: &str) -> bool {
    let outcome = outcome.to_lowercase();
    FAILURE_OUTCOMES.contains(&outcome.as_str())
}

/// Runs every detection rule over an ordered event stream.
///
/// Not meant to be shared: window pruning assumes the caller feeds
/// events with non-decreasing timestamps. An event older than one already
/// processed is rejected and counted instead of corrupting the windows.
#[derive(Debug)]
pub struct RuleDetector {
    failed_logins: FailedLoginTracker,
    travel: CountryChangeTracker,
    /// Latest timestamp processed so far
    high_water: Option<DateTime<Utc>>,
    out_of_order: usize,
}

impl RuleDetector {
    pub fn new(config: DetectionConfig) -> Self {
        RuleDetector {
            failed_logins: FailedLoginTracker::new(
                config.failed_login_window(),
                config.failed_per_user,
                config.failed_per_ip,
            ),
            travel: CountryChangeTracker::new(config.impossible_travel_window()),
            high_water: None,
            out_of_order: 0,
        }
    }

    /// Evaluate one event and return the findings it triggers, in the
    /// order user threshold, IP threshold, impossible travel.
    ///
    /// Never fails. Undated events trigger nothing.
    pub fn evaluate(&mut self, event: &NormalizedEvent) -> Vec<Finding> {
        let mut findings = Vec::new();

        let Some(at) = event.timestamp else {
            return findings;
        };

        if let Some(high_water) = self.high_water {
            if at < high_water {
                self.out_of_order += 1;
                log::warn!(
                    "Rejected out-of-order event at {} (already processed {})",
                    at,
                    high_water
                );
                return findings;
            }
        }
        self.high_water = Some(at);

        let user = event.user.as_deref().filter(|u| !u.is_empty());

        if event.outcome.as_deref().is_some_and(is_failure) {
            findings.extend(
                self.failed_logins
                    .record_failure(user, event.ip.as_deref(), at),
            );
        }

        let country = event
            .country
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty());
        if let (Some(user), Some(country)) = (user, country) {
            if let Some(finding) = self.travel.check_impossible_travel(user, country, at) {
                findings.push(finding);
            }
        }

        for finding in &findings {
            log::debug!("{}", finding);
        }

        findings
    }

    /// Number of events rejected for arriving out of order
    pub fn out_of_order_count(&self) -> usize {
        self.out_of_order
    }

    pub fn user_failure_count(&self, user: &str) -> usize {
        self.failed_logins.user_failure_count(user)
    }

    pub fn ip_failure_count(&self, ip: &str) -> usize {
        self.failed_logins.ip_failure_count(ip)
    }

    /// Last (country, timestamp) seen for a user
    pub fn last_location(&self, user: &str) -> Option<(&str, DateTime<Utc>)> {
        self.travel.last_location(user)
    }
}

impl Default for RuleDetector {
    fn default() -> Self {
        Self::new(DetectionConfig::default())
    }
}
