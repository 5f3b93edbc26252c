use std::sync::{Arc, Mutex};

use ai_core::civiltime::civil_to_utc;
use ai_core::ids::{CandidateId, InterviewId, JobId, ScheduleId, SlotId};
use ai_directory::Directory;
use ai_token::{InterviewSnapshot, MintedToken, TokenService};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use rusqlite::Connection;
use tracing::{info, instrument, warn};

use crate::conflict::{self, ScheduledWindow};
use crate::db;
use crate::error::{Result, SchedulerError};
use crate::types::{
    BookingSchedule, ConflictRecord, Interview, InterviewStatus, ScheduleStatus, Slot, SlotStatus,
};

pub struct SchedulerManager {
    conn: Mutex<Connection>,
    directory: Arc<Directory>,
    tokens: Arc<TokenService>,
    tz: Tz,
    late_grace: Duration,
}

impl SchedulerManager {
    pub fn new(
        conn: Connection,
        directory: Arc<Directory>,
        tokens: Arc<TokenService>,
        tz: Tz,
        late_grace_secs: i64,
    ) -> Result<Self> {
        db::init_db(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            directory,
            tokens,
            tz,
            late_grace: Duration::seconds(late_grace_secs),
        })
    }

    #[instrument(skip(self))]
    pub fn create_interview(
        &self,
        candidate_id: CandidateId,
        job_id: JobId,
        round_label: &str,
    ) -> Result<Interview> {
        let now = Utc::now().to_rfc3339();
        let interview = Interview {
            id: InterviewId::new(),
            candidate_id,
            job_id,
            round_label: round_label.to_string(),
            status: InterviewStatus::PendingScheduling,
            schedule_id: None,
            started_at: None,
            ended_at: None,
            link_expires_at: None,
            created_at: now.clone(),
            updated_at: now,
        };
        let conn = self.conn.lock().expect("scheduler connection poisoned");
        db::insert_interview(&conn, &interview)?;
        Ok(interview)
    }

    pub fn get_interview(&self, id: &str) -> Result<Interview> {
        let conn = self.conn.lock().expect("scheduler connection poisoned");
        db::get_interview(&conn, id)
    }

    #[instrument(skip(self))]
    pub fn create_slot(
        &self,
        job_id: JobId,
        date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
        max_candidates: u32,
        recurrence: Option<String>,
    ) -> Result<Slot> {
        if end_time <= start_time {
            return Err(SchedulerError::InvalidWindow);
        }
        if max_candidates < 1 {
            return Err(SchedulerError::InvalidCapacity);
        }
        // `ai_directory::get_job` itself fails with `JobNotFound` when the
        // row is absent; coding_language is non-nullable on Job (§3), so its
        // mere presence satisfies the "job has non-null coding language"
        // precondition.
        let _job = self.directory.get_job(job_id.as_str())?;

        let now = Utc::now().to_rfc3339();
        let slot = Slot {
            id: SlotId::new(),
            job_id,
            date,
            start_time,
            end_time,
            max_candidates,
            current_bookings: 0,
            status: SlotStatus::Available,
            recurrence,
            created_at: now.clone(),
            updated_at: now,
        };
        let conn = self.conn.lock().expect("scheduler connection poisoned");
        db::insert_slot(&conn, &slot)?;
        Ok(slot)
    }

    pub fn get_slot(&self, id: &str) -> Result<Slot> {
        let conn = self.conn.lock().expect("scheduler connection poisoned");
        db::get_slot(&conn, id)
    }

    /// `book(interview, slot) → schedule`. Holding the manager-wide connection
    /// mutex for the whole read-modify-write is the per-slot exclusive
    /// critical section §4.2/§5 require — every booking in the process goes
    /// through this one connection, so no two bookings interleave.
    #[instrument(skip(self))]
    pub fn book(&self, interview_id: &str, slot_id: &str) -> Result<(BookingSchedule, MintedToken)> {
        let conn = self.conn.lock().expect("scheduler connection poisoned");
        let tx = conn.unchecked_transaction()?;

        let mut interview = db::get_interview(&tx, interview_id)?;
        let mut slot = db::get_slot(&tx, slot_id)?;

        if slot.status == SlotStatus::Cancelled {
            return Err(SchedulerError::SlotCancelled(slot_id.to_string()));
        }
        if slot.current_bookings >= slot.max_candidates {
            return Err(SchedulerError::SlotFull(slot_id.to_string()));
        }

        // If already scheduled elsewhere, release the old slot's count first.
        if let Some(existing_schedule_id) = interview.schedule_id.clone() {
            let old_schedule = db::get_schedule(&tx, existing_schedule_id.as_str())?;
            if old_schedule.slot_id.as_str() != slot_id && old_schedule.status != ScheduleStatus::Cancelled {
                self.release_locked(&tx, &old_schedule)?;
            }
        }

        let now_dt = Utc::now();
        let now = now_dt.to_rfc3339();

        let started_at = civil_to_utc(slot.date, slot.start_time, &self.tz)?;
        let ended_at = civil_to_utc(slot.date, slot.end_time, &self.tz)?;
        let link_expires_at = ended_at + self.late_grace;

        let schedule = BookingSchedule {
            id: ScheduleId::new(),
            interview_id: InterviewId::from(interview_id),
            slot_id: SlotId::from(slot_id),
            status: ScheduleStatus::Confirmed,
            note: None,
            created_at: now.clone(),
            updated_at: now.clone(),
        };
        db::insert_schedule(&tx, &schedule)?;

        slot.current_bookings += 1;
        slot.status = SlotStatus::recompute(slot.current_bookings, slot.max_candidates, false);
        db::update_slot_counter(&tx, slot_id, slot.current_bookings, slot.status, &now)?;

        db::update_interview_booking(
            &tx,
            interview_id,
            InterviewStatus::Scheduled,
            Some(schedule.id.as_str()),
            Some(started_at),
            Some(ended_at),
            Some(link_expires_at),
            &now,
        )?;

        tx.commit()?;

        interview.started_at = Some(started_at);
        interview.ended_at = Some(ended_at);
        interview.status = InterviewStatus::Scheduled;
        interview.schedule_id = Some(schedule.id.clone());

        let candidate = self.directory.get_candidate(interview.candidate_id.as_str())?;
        let snapshot = InterviewSnapshot {
            interview_id: interview.id.to_string(),
            candidate_email: candidate.email,
            started_at,
            ended_at,
        };
        let token = self.tokens.mint(&snapshot);

        info!(interview_id, slot_id, "booked interview into slot");
        Ok((schedule, token))
    }

    /// `release(schedule)`: decrements the slot counter and cancels the
    /// schedule but never clears `interview.started_at`/`ended_at` — history
    /// is preserved per §4.2.
    #[instrument(skip(self))]
    pub fn release(&self, schedule_id: &str) -> Result<()> {
        let conn = self.conn.lock().expect("scheduler connection poisoned");
        let tx = conn.unchecked_transaction()?;
        let schedule = db::get_schedule(&tx, schedule_id)?;
        self.release_locked(&tx, &schedule)?;
        let now = Utc::now().to_rfc3339();
        db::update_interview_status(&tx, schedule.interview_id.as_str(), InterviewStatus::PendingScheduling, &now)?;
        tx.commit()?;
        Ok(())
    }

    fn release_locked(&self, tx: &rusqlite::Transaction<'_>, schedule: &BookingSchedule) -> Result<()> {
        let mut slot = db::get_slot(tx, schedule.slot_id.as_str())?;
        let now = Utc::now().to_rfc3339();
        if slot.current_bookings > 0 {
            slot.current_bookings -= 1;
        }
        let cancelled = slot.status == SlotStatus::Cancelled;
        slot.status = SlotStatus::recompute(slot.current_bookings, slot.max_candidates, cancelled);
        db::update_slot_counter(tx, slot.id.as_str(), slot.current_bookings, slot.status, &now)?;
        db::update_schedule_status(tx, schedule.id.as_str(), ScheduleStatus::Cancelled, &now)?;
        Ok(())
    }

    /// Reschedule: release the old slot, book the new one. The new
    /// `started_at` changes the HMAC signing input, so every previously
    /// minted token fails `verify` with `SIGNATURE_MISMATCH` (§8 property 4).
    #[instrument(skip(self))]
    pub fn reschedule(&self, interview_id: &str, new_slot_id: &str) -> Result<(BookingSchedule, MintedToken)> {
        let interview = self.get_interview(interview_id)?;
        if let Some(schedule_id) = interview.schedule_id {
            if let Ok(schedule) = {
                let conn = self.conn.lock().expect("scheduler connection poisoned");
                db::get_schedule(&conn, schedule_id.as_str())
            } {
                if schedule.status != ScheduleStatus::Cancelled {
                    self.release(schedule_id.as_str())?;
                }
            }
        }
        self.book(interview_id, new_slot_id)
    }

    pub fn cancel_slot(&self, slot_id: &str) -> Result<()> {
        let conn = self.conn.lock().expect("scheduler connection poisoned");
        let mut slot = db::get_slot(&conn, slot_id)?;
        slot.status = SlotStatus::Cancelled;
        let now = Utc::now().to_rfc3339();
        db::update_slot_counter(&conn, slot_id, slot.current_bookings, SlotStatus::Cancelled, &now)?;
        Ok(())
    }

    /// Every interview currently in SCHEDULED status with an active
    /// schedule — the audience for `send_interview_emails`.
    pub fn list_booked_interviews(&self) -> Result<Vec<Interview>> {
        let conn = self.conn.lock().expect("scheduler connection poisoned");
        let interviews = db::list_interviews_with_schedule(&conn)?;
        Ok(interviews.into_iter().filter(|i| i.status == InterviewStatus::Scheduled).collect())
    }

    /// Idempotent repair for the `fix_existing_interview_times` admin command:
    /// recomputes `started_at`/`ended_at` for every scheduled interview from
    /// its bound Slot and writes back only the ones that drifted (e.g. after
    /// a timezone config change). Returns the number of rows touched.
    #[instrument(skip(self))]
    pub fn fix_interview_times(&self) -> Result<u32> {
        let conn = self.conn.lock().expect("scheduler connection poisoned");
        let interviews = db::list_interviews_with_schedule(&conn)?;

        let mut fixed = 0;
        for interview in interviews {
            let Some(schedule_id) = interview.schedule_id.clone() else {
                continue;
            };
            let schedule = db::get_schedule(&conn, schedule_id.as_str())?;
            let slot = db::get_slot(&conn, schedule.slot_id.as_str())?;

            let started_at = civil_to_utc(slot.date, slot.start_time, &self.tz)?;
            let ended_at = civil_to_utc(slot.date, slot.end_time, &self.tz)?;
            let link_expires_at = ended_at + self.late_grace;

            if interview.started_at == Some(started_at) && interview.ended_at == Some(ended_at) {
                continue;
            }

            let now = Utc::now().to_rfc3339();
            db::update_interview_booking(
                &conn,
                interview.id.as_str(),
                interview.status,
                Some(schedule_id.as_str()),
                Some(started_at),
                Some(ended_at),
                Some(link_expires_at),
                &now,
            )?;
            warn!(interview_id = interview.id.as_str(), "repaired drifted interview times");
            fixed += 1;
        }
        Ok(fixed)
    }

    /// `detect_conflicts(interview) → [ConflictRecord]`.
    #[instrument(skip(self))]
    pub fn detect_conflicts(&self, interview_id: &str) -> Result<Vec<ConflictRecord>> {
        let conn = self.conn.lock().expect("scheduler connection poisoned");
        let interview = db::get_interview(&conn, interview_id)?;
        let pairs = db::active_schedules_for_candidate(&conn, interview.candidate_id.as_str())?;
        let windows: Vec<ScheduledWindow> = pairs
            .into_iter()
            .filter_map(|(sched, slot)| {
                let start = civil_to_utc(slot.date, slot.start_time, &self.tz).ok()?;
                let end = civil_to_utc(slot.date, slot.end_time, &self.tz).ok()?;
                Some(ScheduledWindow {
                    interview_id: sched.interview_id,
                    start,
                    end,
                })
            })
            .collect();
        let conflicts = conflict::detect_conflicts(&interview.candidate_id, &windows);
        if !conflicts.is_empty() {
            warn!(interview_id, count = conflicts.len(), "scheduling conflicts detected");
        }
        Ok(conflicts)
    }
}
