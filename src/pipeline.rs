//! End-to-end analysis: load, normalize, sequence, detect.

use std::path::Path;

use crate::config::DetectionConfig;
use crate::detection::RuleDetector;
use crate::input::{self, IngestError};
use crate::models::{Finding, NormalizedEvent, RawRecord};
use crate::normalize::normalize;

/// Normalize records and order them chronologically.
///
/// The sort is stable: events sharing a timestamp keep their input order,
/// and undated events go last, also in input order.
pub fn sequence(records: Vec<RawRecord>) -> Vec<NormalizedEvent> {
    let mut events: Vec<NormalizedEvent> = records.into_iter().map(normalize).collect();
    events.sort_by_key(|event| (event.timestamp.is_none(), event.timestamp));
    events
}

/// Load a log file and return its events in chronological order
pub fn load_and_sequence(path: &Path) -> Result<Vec<NormalizedEvent>, IngestError> {
    Ok(sequence(input::load(path)?))
}

/// Feed ordered events through a fresh detector
pub fn run_rules(events: &[NormalizedEvent], config: DetectionConfig) -> Vec<Finding> {
    let mut detector = RuleDetector::new(config);
    let findings: Vec<Finding> = events
        .iter()
        .flat_map(|event| detector.evaluate(event))
        .collect();

    if detector.out_of_order_count() > 0 {
        log::warn!(
            "{} event(s) arrived out of order and were not evaluated",
            detector.out_of_order_count()
        );
    }
    log::info!(
        "Evaluated {} event(s), {} finding(s)",
        events.len(),
        findings.len()
    );
    findings
}

/// Analyze one log file with the given detection settings
pub fn analyze_file(path: &Path, config: DetectionConfig) -> Result<Vec<Finding>, IngestError> {
    let events = load_and_sequence(path)?;
    Ok(run_rules(&events, config))
}
