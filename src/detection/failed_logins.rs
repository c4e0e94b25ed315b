//! Failed-login burst detection
//!
//! Keeps a sliding window of failure timestamps per user and per IP
//! address to surface password spraying and brute force attempts.

use std::collections::{HashMap, VecDeque};
use chrono::{DateTime, Duration, Utc};

use crate::models::{Finding, Severity};

pub const RULE_FAILED_LOGINS_USER: &str = "excessive_failed_logins_user";
pub const RULE_FAILED_LOGINS_IP: &str = "excessive_failed_logins_ip";

/// Ascending failure timestamps for one user or IP.
///
/// Pruning from the front relies on timestamps arriving in
/// non-decreasing order.
#[derive(Debug, Clone, Default)]
struct FailureWindow {
    timestamps: VecDeque<DateTime<Utc>>,
}

impl FailureWindow {
    /// Add a timestamp, drop entries older than `at - window`, and return
    /// how many remain.
    fn record(&mut self, at: DateTime<Utc>, window: Duration) -> usize {
        self.timestamps.push_back(at);
        if let Some(cutoff) = at.checked_sub_signed(window) {
            while self.timestamps.front().is_some_and(|&t| t < cutoff) {
                self.timestamps.pop_front();
            }
        }
        self.timestamps.len()
    }

    fn count(&self) -> usize {
        self.timestamps.len()
    }
}

/// Counts authentication failures per user and per IP within a window
#[derive(Debug)]
pub struct FailedLoginTracker {
    per_user_failures: HashMap<String, FailureWindow>,
    per_ip_failures: HashMap<String, FailureWindow>,
    window: Duration,
    max_user_failures: usize,
    max_ip_failures: usize,
}

impl FailedLoginTracker {
    pub fn new(window: Duration, max_user_failures: usize, max_ip_failures: usize) -> Self {
        FailedLoginTracker {
            per_user_failures: HashMap::new(),
            per_ip_failures: HashMap::new(),
            window,
            max_user_failures,
            max_ip_failures,
        }
    }

    /// Record one failure at `at` and report any threshold reached.
    ///
    /// The user and IP windows are independent; a missing user or IP
    /// skips that window. The user finding, if any, comes first.
    pub fn record_failure(
        &mut self,
        user: Option<&str>,
        ip: Option<&str>,
        at: DateTime<Utc>,
    ) -> Vec<Finding> {
        let mut findings = Vec::new();

        if let Some(user) = user {
            let count = self
                .per_user_failures
                .entry(user.to_string())
                .or_default()
                .record(at, self.window);
            if count >= self.max_user_failures {
                findings.push(Finding::new(
                    RULE_FAILED_LOGINS_USER,
                    Severity::Medium,
                    format!("user {} failures={}", user, count),
                ));
            }
        }

        if let Some(ip) = ip {
            let count = self
                .per_ip_failures
                .entry(ip.to_string())
                .or_default()
                .record(at, self.window);
            if count >= self.max_ip_failures {
                findings.push(Finding::new(
                    RULE_FAILED_LOGINS_IP,
                    Severity::High,
                    format!("ip {} failures={}", ip, count),
                ));
            }
        }

        findings
    }

    /// Failures currently held in the user's window
    pub fn user_failure_count(&self, user: &str) -> usize {
        self.per_user_failures
            .get(user)
            .map(|w| w.count())
            .unwrap_or(0)
    }

    /// Failures currently held in the IP's window
    pub fn ip_failure_count(&self, ip: &str) -> usize {
        self.per_ip_failures
            .get(ip)
            .map(|w| w.count())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at_minute(minute: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap() + Duration::minutes(minute)
    }

    fn tracker(max_user: usize, max_ip: usize) -> FailedLoginTracker {
        FailedLoginTracker::new(Duration::minutes(60), max_user, max_ip)
    }

    #[test]
    fn test_user_threshold_within_window() {
        let mut tracker = tracker(8, 100);

        for i in 0..7 {
            let findings = tracker.record_failure(Some("alice"), Some("1.1.1.1"), at_minute(i * 5));
            assert!(findings.is_empty(), "failure {} should not trigger", i + 1);
        }

        let findings = tracker.record_failure(Some("alice"), Some("1.1.1.1"), at_minute(35));
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].rule_id, RULE_FAILED_LOGINS_USER);
        assert_eq!(findings[0].severity, Severity::Medium);
        assert_eq!(findings[0].description, "user alice failures=8");
    }

    #[test]
    fn test_spread_failures_do_not_trigger() {
        let mut tracker = tracker(8, 100);

        for minute in [0, 10, 20, 30, 40, 50, 60, 65] {
            let findings = tracker.record_failure(Some("alice"), None, at_minute(minute));
            assert!(findings.is_empty(), "failure at minute {} should not trigger", minute);
        }
        assert_eq!(tracker.user_failure_count("alice"), 7);
    }

    #[test]
    fn test_cutoff_is_inclusive() {
        let mut tracker = tracker(100, 100);

        tracker.record_failure(Some("alice"), None, at_minute(0));
        tracker.record_failure(Some("alice"), None, at_minute(60));
        assert_eq!(tracker.user_failure_count("alice"), 2);

        tracker.record_failure(Some("alice"), None, at_minute(61));
        assert_eq!(tracker.user_failure_count("alice"), 2);
    }

    #[test]
    fn test_keeps_firing_while_above_threshold() {
        let mut tracker = tracker(3, 100);

        let fired: Vec<usize> = (0..5)
            .map(|i| tracker.record_failure(Some("bob"), None, at_minute(i)).len())
            .collect();
        assert_eq!(fired, vec![0, 0, 1, 1, 1]);
    }

    #[test]
    fn test_ip_threshold_across_users() {
        let mut tracker = tracker(100, 3);

        for i in 0..2 {
            let user = format!("user{}", i);
            assert!(tracker.record_failure(Some(&user), Some("10.0.0.1"), at_minute(i)).is_empty());
        }

        let findings = tracker.record_failure(Some("user2"), Some("10.0.0.1"), at_minute(2));
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].rule_id, RULE_FAILED_LOGINS_IP);
        assert_eq!(findings[0].severity, Severity::High);
        assert_eq!(findings[0].description, "ip 10.0.0.1 failures=3");
    }

    #[test]
    fn test_both_thresholds_user_first() {
        let mut tracker = tracker(2, 2);

        tracker.record_failure(Some("target"), Some("5.5.5.5"), at_minute(0));
        let findings = tracker.record_failure(Some("target"), Some("5.5.5.5"), at_minute(1));

        let rules: Vec<&str> = findings.iter().map(|f| f.rule_id.as_str()).collect();
        assert_eq!(rules, vec![RULE_FAILED_LOGINS_USER, RULE_FAILED_LOGINS_IP]);
    }

    #[test]
    fn test_missing_user_or_ip_skips_that_window() {
        let mut tracker = tracker(1, 1);

        let findings = tracker.record_failure(None, Some("9.9.9.9"), at_minute(0));
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].rule_id, RULE_FAILED_LOGINS_IP);

        let findings = tracker.record_failure(Some("dave"), None, at_minute(1));
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].rule_id, RULE_FAILED_LOGINS_USER);
        assert_eq!(tracker.ip_failure_count("9.9.9.9"), 1);
    }
}
