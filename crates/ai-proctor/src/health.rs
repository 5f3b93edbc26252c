//! Per-detector health tracking, adapted from `skynet-agent`'s provider
//! `HealthTracker` (rolling counts → derived status) but keyed by detector
//! name instead of provider name, and without the auth/rate-limit states
//! that don't apply to a local decision pipeline (§4.4 "health endpoint
//! reporting which detectors are present at runtime").

use chrono::{DateTime, Utc};
use dashmap::DashMap;

use crate::types::{DetectorHealthEntry, DetectorStatus};

const DOWN_AFTER_CONSECUTIVE_FAILURES: u32 = 3;

struct InternalEntry {
    consecutive_failures: u32,
    last_error: Option<String>,
    total_evaluations: u64,
    total_failures: u64,
    last_run_at: Option<DateTime<Utc>>,
}

impl InternalEntry {
    fn new() -> Self {
        Self {
            consecutive_failures: 0,
            last_error: None,
            total_evaluations: 0,
            total_failures: 0,
            last_run_at: None,
        }
    }

    fn status(&self) -> DetectorStatus {
        if self.total_evaluations == 0 {
            return DetectorStatus::Unknown;
        }
        if self.consecutive_failures >= DOWN_AFTER_CONSECUTIVE_FAILURES {
            DetectorStatus::Down
        } else if self.consecutive_failures > 0 {
            DetectorStatus::Degraded
        } else {
            DetectorStatus::Ok
        }
    }
}

/// Tracks detector health per session so a crashing model backing one
/// detector never drags another detector's reported status down with it.
pub struct DetectorHealthTracker {
    entries: DashMap<(String, String), InternalEntry>,
}

impl DetectorHealthTracker {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    pub fn record_success(&self, session_id: &str, detector: &str) {
        let mut entry = self
            .entries
            .entry((session_id.to_string(), detector.to_string()))
            .or_insert_with(InternalEntry::new);
        entry.total_evaluations += 1;
        entry.consecutive_failures = 0;
        entry.last_run_at = Some(Utc::now());
    }

    pub fn record_failure(&self, session_id: &str, detector: &str, error: &str) {
        let mut entry = self
            .entries
            .entry((session_id.to_string(), detector.to_string()))
            .or_insert_with(InternalEntry::new);
        entry.total_evaluations += 1;
        entry.total_failures += 1;
        entry.consecutive_failures += 1;
        entry.last_error = Some(error.to_string());
        entry.last_run_at = Some(Utc::now());
    }

    pub fn snapshot(&self, session_id: &str) -> Vec<DetectorHealthEntry> {
        self.entries
            .iter()
            .filter(|kv| kv.key().0 == session_id)
            .map(|kv| {
                let (_, name) = kv.key().clone();
                let entry = kv.value();
                DetectorHealthEntry {
                    name,
                    status: entry.status(),
                    consecutive_failures: entry.consecutive_failures,
                    last_error: entry.last_error.clone(),
                    total_evaluations: entry.total_evaluations,
                    total_failures: entry.total_failures,
                    last_run_at: entry.last_run_at,
                }
            })
            .collect()
    }

    pub fn clear_session(&self, session_id: &str) {
        self.entries.retain(|k, _| k.0 != session_id);
    }
}

impl Default for DetectorHealthTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_until_first_evaluation() {
        let tracker = DetectorHealthTracker::new();
        assert!(tracker.snapshot("s1").is_empty());
    }

    #[test]
    fn ok_after_success() {
        let tracker = DetectorHealthTracker::new();
        tracker.record_success("s1", "no_person");
        let snap = tracker.snapshot("s1");
        assert_eq!(snap.len(), 1);
        assert_eq!(snap[0].status, DetectorStatus::Ok);
    }

    #[test]
    fn degrades_then_goes_down() {
        let tracker = DetectorHealthTracker::new();
        tracker.record_failure("s1", "phone_detected", "boom");
        assert_eq!(
            tracker.snapshot("s1")[0].status,
            DetectorStatus::Degraded
        );
        tracker.record_failure("s1", "phone_detected", "boom");
        tracker.record_failure("s1", "phone_detected", "boom");
        assert_eq!(tracker.snapshot("s1")[0].status, DetectorStatus::Down);
    }

    #[test]
    fn success_resets_consecutive_failures() {
        let tracker = DetectorHealthTracker::new();
        tracker.record_failure("s1", "phone_detected", "boom");
        tracker.record_success("s1", "phone_detected");
        assert_eq!(tracker.snapshot("s1")[0].status, DetectorStatus::Ok);
    }

    #[test]
    fn sessions_are_isolated() {
        let tracker = DetectorHealthTracker::new();
        tracker.record_success("s1", "no_person");
        assert!(tracker.snapshot("s2").is_empty());
    }
}
