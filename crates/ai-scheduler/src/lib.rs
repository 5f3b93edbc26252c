//! Slot booking, conflict detection, and the Interview/Schedule lifecycle (C2).

pub mod conflict;
pub mod db;
pub mod error;
pub mod manager;
pub mod types;

pub use error::{Result, SchedulerError};
pub use manager::SchedulerManager;
pub use types::{BookingSchedule, ConflictRecord, Interview, InterviewStatus, Slot, SlotStatus};

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use ai_directory::types::{CodingLanguage, NewCandidate, NewJob};
    use ai_directory::Directory;
    use ai_token::{GraceWindow, TokenService};
    use chrono::{NaiveDate, NaiveTime};
    use rusqlite::Connection;

    use super::*;

    fn manager() -> (SchedulerManager, Arc<Directory>) {
        let directory = Arc::new(Directory::new(Connection::open_in_memory().unwrap()).unwrap());
        let tokens = Arc::new(TokenService::new(b"secret".to_vec(), GraceWindow::default()));
        let tz: chrono_tz::Tz = "Asia/Kolkata".parse().unwrap();
        let mgr = SchedulerManager::new(
            Connection::open_in_memory().unwrap(),
            directory.clone(),
            tokens,
            tz,
            7200,
        )
        .unwrap();
        (mgr, directory)
    }

    #[test]
    fn scenario_s1_booking_and_link_minting() {
        let (mgr, directory) = manager();
        let job = directory
            .create_job(NewJob {
                tenant_id: "t1".into(),
                title: "Backend Engineer".into(),
                company: "Acme".into(),
                domain: "fintech".into(),
                coding_language: CodingLanguage::Python,
                description: "".into(),
                tech_stack: vec![],
            })
            .unwrap();
        let candidate = directory
            .create_candidate(NewCandidate {
                tenant_id: "t1".into(),
                display_name: "Candidate".into(),
                email: "c@example.com".into(),
                resume_text: None,
            })
            .unwrap();

        let slot = mgr
            .create_slot(
                job.id.clone(),
                NaiveDate::from_ymd_opt(2025, 6, 15).unwrap(),
                NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
                NaiveTime::from_hms_opt(10, 30, 0).unwrap(),
                1,
                None,
            )
            .unwrap();

        let interview = mgr
            .create_interview(candidate.id.clone(), job.id.clone(), "round-1")
            .unwrap();

        let (_schedule, minted) = mgr.book(interview.id.as_str(), slot.id.as_str()).unwrap();

        let booked = mgr.get_interview(interview.id.as_str()).unwrap();
        assert_eq!(
            booked.started_at.unwrap().to_rfc3339(),
            "2025-06-15T04:30:00+00:00"
        );
        assert_eq!(booked.ended_at.unwrap().to_rfc3339(), "2025-06-15T05:00:00+00:00");

        let booked_slot = mgr.get_slot(slot.id.as_str()).unwrap();
        assert_eq!(booked_slot.current_bookings, 1);
        assert_eq!(booked_slot.status, SlotStatus::Full);

        let tokens = TokenService::new(b"secret".to_vec(), ai_token::GraceWindow::default());
        let snapshot = ai_token::InterviewSnapshot {
            interview_id: interview.id.to_string(),
            candidate_email: "c@example.com".to_string(),
            started_at: booked.started_at.unwrap(),
            ended_at: booked.ended_at.unwrap(),
        };
        let ok_now: chrono::DateTime<chrono::Utc> = "2025-06-15T04:20:00Z".parse().unwrap();
        let outcome = tokens.verify(&minted.token, Some(&snapshot), ok_now);
        assert_eq!(outcome.reason, ai_token::VerifyReason::Ok);

        let early_now: chrono::DateTime<chrono::Utc> = "2025-06-15T03:00:00Z".parse().unwrap();
        let outcome2 = tokens.verify(&minted.token, Some(&snapshot), early_now);
        assert_eq!(outcome2.reason, ai_token::VerifyReason::NotYetActive);
    }

    #[test]
    fn scenario_s2_capacity_race_resolves_to_exactly_capacity_bookings() {
        let (mgr, directory) = manager();
        let job = directory
            .create_job(NewJob {
                tenant_id: "t1".into(),
                title: "Backend Engineer".into(),
                company: "Acme".into(),
                domain: "fintech".into(),
                coding_language: CodingLanguage::Python,
                description: "".into(),
                tech_stack: vec![],
            })
            .unwrap();
        let slot = mgr
            .create_slot(
                job.id.clone(),
                NaiveDate::from_ymd_opt(2025, 6, 15).unwrap(),
                NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
                NaiveTime::from_hms_opt(10, 30, 0).unwrap(),
                2,
                None,
            )
            .unwrap();

        let mut succeeded = 0;
        let mut failed = 0;
        for n in 0..5 {
            let candidate = directory
                .create_candidate(NewCandidate {
                    tenant_id: "t1".into(),
                    display_name: format!("Candidate {n}"),
                    email: format!("c{n}@example.com"),
                    resume_text: None,
                })
                .unwrap();
            let interview = mgr
                .create_interview(candidate.id, job.id.clone(), "round-1")
                .unwrap();
            match mgr.book(interview.id.as_str(), slot.id.as_str()) {
                Ok(_) => succeeded += 1,
                Err(SchedulerError::SlotFull(_)) => failed += 1,
                Err(e) => panic!("unexpected error: {e}"),
            }
        }

        assert_eq!(succeeded, 2);
        assert_eq!(failed, 3);
        let final_slot = mgr.get_slot(slot.id.as_str()).unwrap();
        assert_eq!(final_slot.current_bookings, 2);
        assert_eq!(final_slot.status, SlotStatus::Full);
    }

    #[test]
    fn scenario_s3_reschedule_invalidates_token() {
        let (mgr, directory) = manager();
        let job = directory
            .create_job(NewJob {
                tenant_id: "t1".into(),
                title: "Backend Engineer".into(),
                company: "Acme".into(),
                domain: "fintech".into(),
                coding_language: CodingLanguage::Python,
                description: "".into(),
                tech_stack: vec![],
            })
            .unwrap();
        let candidate = directory
            .create_candidate(NewCandidate {
                tenant_id: "t1".into(),
                display_name: "Candidate".into(),
                email: "c@example.com".into(),
                resume_text: None,
            })
            .unwrap();
        let slot_a = mgr
            .create_slot(
                job.id.clone(),
                NaiveDate::from_ymd_opt(2025, 6, 15).unwrap(),
                NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
                NaiveTime::from_hms_opt(10, 30, 0).unwrap(),
                1,
                None,
            )
            .unwrap();
        let slot_b = mgr
            .create_slot(
                job.id.clone(),
                NaiveDate::from_ymd_opt(2025, 6, 15).unwrap(),
                NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
                NaiveTime::from_hms_opt(14, 30, 0).unwrap(),
                1,
                None,
            )
            .unwrap();
        let interview = mgr
            .create_interview(candidate.id, job.id, "round-1")
            .unwrap();

        let (_s1, minted1) = mgr.book(interview.id.as_str(), slot_a.id.as_str()).unwrap();
        let (_s2, minted2) = mgr.reschedule(interview.id.as_str(), slot_b.id.as_str()).unwrap();

        let rescheduled = mgr.get_interview(interview.id.as_str()).unwrap();
        let tokens = TokenService::new(b"secret".to_vec(), ai_token::GraceWindow::default());
        let snapshot = ai_token::InterviewSnapshot {
            interview_id: interview.id.to_string(),
            candidate_email: "c@example.com".to_string(),
            started_at: rescheduled.started_at.unwrap(),
            ended_at: rescheduled.ended_at.unwrap(),
        };
        let now = rescheduled.started_at.unwrap() - chrono::Duration::minutes(10);
        let outcome1 = tokens.verify(&minted1.token, Some(&snapshot), now);
        assert_eq!(outcome1.reason, ai_token::VerifyReason::SignatureMismatch);

        let outcome2 = tokens.verify(&minted2.token, Some(&snapshot), now);
        assert_eq!(outcome2.reason, ai_token::VerifyReason::Ok);

        let released_slot_a = mgr.get_slot(slot_a.id.as_str()).unwrap();
        assert_eq!(released_slot_a.current_bookings, 0);
        assert_eq!(released_slot_a.status, SlotStatus::Available);
    }
}
