//! Pure conflict-detection over a snapshot of scheduled windows, unit-testable
//! the same way `compute_next_run` is a pure function of its inputs.

use ai_core::ids::{CandidateId, InterviewId};
use chrono::{DateTime, Utc};

use crate::types::ConflictRecord;

/// Half-open `[start, end)` window for one interview's scheduled slot.
#[derive(Debug, Clone)]
pub struct ScheduledWindow {
    pub interview_id: InterviewId,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

fn overlaps(a: &ScheduledWindow, b: &ScheduledWindow) -> bool {
    a.start < b.end && b.start < a.end
}

/// Two Schedules conflict iff their slots' `[start, end)` windows overlap and
/// their interviews share the same candidate (§4.2). `windows` must already
/// be restricted to a single candidate's active (non-cancelled) schedules.
pub fn detect_conflicts(
    candidate_id: &CandidateId,
    windows: &[ScheduledWindow],
) -> Vec<ConflictRecord> {
    let mut conflicts = Vec::new();
    for i in 0..windows.len() {
        for j in (i + 1)..windows.len() {
            if overlaps(&windows[i], &windows[j]) {
                conflicts.push(ConflictRecord {
                    interview_id: windows[i].interview_id.clone(),
                    other_interview_id: windows[j].interview_id.clone(),
                    candidate_id: candidate_id.clone(),
                });
            }
        }
    }
    conflicts
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn window(id: &str, start_h: u32, end_h: u32) -> ScheduledWindow {
        ScheduledWindow {
            interview_id: InterviewId::from(id),
            start: Utc.with_ymd_and_hms(2025, 6, 15, start_h, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2025, 6, 15, end_h, 0, 0).unwrap(),
        }
    }

    #[test]
    fn non_overlapping_windows_have_no_conflict() {
        let candidate = CandidateId::from("c1");
        let windows = vec![window("i1", 4, 5), window("i2", 5, 6)];
        assert!(detect_conflicts(&candidate, &windows).is_empty());
    }

    #[test]
    fn overlapping_windows_conflict() {
        let candidate = CandidateId::from("c1");
        let windows = vec![window("i1", 4, 6), window("i2", 5, 7)];
        let conflicts = detect_conflicts(&candidate, &windows);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].interview_id.as_str(), "i1");
        assert_eq!(conflicts[0].other_interview_id.as_str(), "i2");
    }

    #[test]
    fn touching_boundary_is_not_a_conflict() {
        let candidate = CandidateId::from("c1");
        let windows = vec![window("i1", 4, 5), window("i2", 5, 7)];
        assert!(detect_conflicts(&candidate, &windows).is_empty());
    }
}
