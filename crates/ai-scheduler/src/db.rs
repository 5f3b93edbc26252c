use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{Result, SchedulerError};
use crate::types::{
    BookingSchedule, Interview, InterviewStatus, ScheduleStatus, Slot, SlotStatus,
};

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS slots (
            id                TEXT PRIMARY KEY NOT NULL,
            job_id            TEXT NOT NULL,
            date              TEXT NOT NULL,
            start_time        TEXT NOT NULL,
            end_time          TEXT NOT NULL,
            max_candidates    INTEGER NOT NULL,
            current_bookings  INTEGER NOT NULL DEFAULT 0,
            status            TEXT NOT NULL DEFAULT 'AVAILABLE',
            recurrence        TEXT,
            created_at        TEXT NOT NULL,
            updated_at        TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS schedules (
            id            TEXT PRIMARY KEY NOT NULL,
            interview_id  TEXT NOT NULL,
            slot_id       TEXT NOT NULL REFERENCES slots(id),
            status        TEXT NOT NULL DEFAULT 'PENDING',
            note          TEXT,
            created_at    TEXT NOT NULL,
            updated_at    TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_schedules_slot ON schedules (slot_id);
        CREATE INDEX IF NOT EXISTS idx_schedules_interview ON schedules (interview_id);

        CREATE TABLE IF NOT EXISTS interviews (
            id                TEXT PRIMARY KEY NOT NULL,
            candidate_id      TEXT NOT NULL,
            job_id            TEXT NOT NULL,
            round_label       TEXT NOT NULL DEFAULT '',
            status            TEXT NOT NULL DEFAULT 'NEW',
            schedule_id       TEXT,
            started_at        TEXT,
            ended_at          TEXT,
            link_expires_at   TEXT,
            created_at        TEXT NOT NULL,
            updated_at        TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_interviews_candidate ON interviews (candidate_id);",
    )?;
    Ok(())
}

fn parse_dt(s: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e)))
}

fn row_to_slot(row: &rusqlite::Row<'_>) -> rusqlite::Result<Slot> {
    let date_str: String = row.get(2)?;
    let start_str: String = row.get(3)?;
    let end_str: String = row.get(4)?;
    let status_str: String = row.get(7)?;
    Ok(Slot {
        id: row.get::<_, String>(0)?.into(),
        job_id: row.get::<_, String>(1)?.into(),
        date: NaiveDate::parse_from_str(&date_str, "%Y-%m-%d").unwrap_or_default(),
        start_time: NaiveTime::parse_from_str(&start_str, "%H:%M:%S").unwrap_or_default(),
        end_time: NaiveTime::parse_from_str(&end_str, "%H:%M:%S").unwrap_or_default(),
        max_candidates: row.get(5)?,
        current_bookings: row.get(6)?,
        status: SlotStatus::from_str(&status_str).unwrap_or(SlotStatus::Available),
        recurrence: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

const SLOT_SELECT: &str = "SELECT id, job_id, date, start_time, end_time, max_candidates,
        current_bookings, status, recurrence, created_at, updated_at FROM slots";

pub fn insert_slot(conn: &Connection, slot: &Slot) -> Result<()> {
    conn.execute(
        "INSERT INTO slots (id, job_id, date, start_time, end_time, max_candidates,
            current_bookings, status, recurrence, created_at, updated_at)
         VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11)",
        params![
            slot.id.as_str(),
            slot.job_id.as_str(),
            slot.date.format("%Y-%m-%d").to_string(),
            slot.start_time.format("%H:%M:%S").to_string(),
            slot.end_time.format("%H:%M:%S").to_string(),
            slot.max_candidates,
            slot.current_bookings,
            slot.status.as_str(),
            slot.recurrence,
            slot.created_at,
            slot.updated_at,
        ],
    )?;
    Ok(())
}

pub fn get_slot(conn: &Connection, id: &str) -> Result<Slot> {
    conn.prepare_cached(&format!("{SLOT_SELECT} WHERE id=?1"))?
        .query_row(params![id], row_to_slot)
        .optional()?
        .ok_or_else(|| SchedulerError::SlotNotFound(id.to_string()))
}

pub fn update_slot_counter(
    conn: &Connection,
    id: &str,
    current_bookings: u32,
    status: SlotStatus,
    now: &str,
) -> Result<()> {
    conn.execute(
        "UPDATE slots SET current_bookings=?2, status=?3, updated_at=?4 WHERE id=?1",
        params![id, current_bookings, status.as_str(), now],
    )?;
    Ok(())
}

fn row_to_interview(row: &rusqlite::Row<'_>) -> rusqlite::Result<Interview> {
    let status_str: String = row.get(4)?;
    let started_at: Option<String> = row.get(6)?;
    let ended_at: Option<String> = row.get(7)?;
    let link_expires_at: Option<String> = row.get(8)?;
    Ok(Interview {
        id: row.get::<_, String>(0)?.into(),
        candidate_id: row.get::<_, String>(1)?.into(),
        job_id: row.get::<_, String>(2)?.into(),
        round_label: row.get(3)?,
        status: InterviewStatus::from_str(&status_str).unwrap_or(InterviewStatus::New),
        schedule_id: row.get::<_, Option<String>>(5)?.map(Into::into),
        started_at: started_at.map(|s| parse_dt(&s)).transpose()?,
        ended_at: ended_at.map(|s| parse_dt(&s)).transpose()?,
        link_expires_at: link_expires_at.map(|s| parse_dt(&s)).transpose()?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

const INTERVIEW_SELECT: &str = "SELECT id, candidate_id, job_id, round_label, status,
        schedule_id, started_at, ended_at, link_expires_at, created_at, updated_at
        FROM interviews";

pub fn insert_interview(conn: &Connection, interview: &Interview) -> Result<()> {
    conn.execute(
        "INSERT INTO interviews (id, candidate_id, job_id, round_label, status,
            schedule_id, started_at, ended_at, link_expires_at, created_at, updated_at)
         VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11)",
        params![
            interview.id.as_str(),
            interview.candidate_id.as_str(),
            interview.job_id.as_str(),
            interview.round_label,
            interview.status.as_str(),
            interview.schedule_id.as_ref().map(|s| s.as_str().to_string()),
            interview.started_at.map(|dt| dt.to_rfc3339()),
            interview.ended_at.map(|dt| dt.to_rfc3339()),
            interview.link_expires_at.map(|dt| dt.to_rfc3339()),
            interview.created_at,
            interview.updated_at,
        ],
    )?;
    Ok(())
}

pub fn get_interview(conn: &Connection, id: &str) -> Result<Interview> {
    conn.prepare_cached(&format!("{INTERVIEW_SELECT} WHERE id=?1"))?
        .query_row(params![id], row_to_interview)
        .optional()?
        .ok_or_else(|| SchedulerError::InterviewNotFound(id.to_string()))
}

pub fn list_interviews_for_candidate(conn: &Connection, candidate_id: &str) -> Result<Vec<Interview>> {
    let mut stmt = conn.prepare(&format!("{INTERVIEW_SELECT} WHERE candidate_id=?1"))?;
    let rows = stmt
        .query_map(params![candidate_id], row_to_interview)?
        .filter_map(|r| r.ok())
        .collect();
    Ok(rows)
}

/// All interviews with a bound Schedule — the repair set for
/// `fix_existing_interview_times` (§6).
pub fn list_interviews_with_schedule(conn: &Connection) -> Result<Vec<Interview>> {
    let mut stmt = conn.prepare(&format!("{INTERVIEW_SELECT} WHERE schedule_id IS NOT NULL"))?;
    let rows = stmt.query_map([], row_to_interview)?.filter_map(|r| r.ok()).collect();
    Ok(rows)
}

#[allow(clippy::too_many_arguments)]
pub fn update_interview_booking(
    conn: &Connection,
    id: &str,
    status: InterviewStatus,
    schedule_id: Option<&str>,
    started_at: Option<DateTime<Utc>>,
    ended_at: Option<DateTime<Utc>>,
    link_expires_at: Option<DateTime<Utc>>,
    now: &str,
) -> Result<()> {
    conn.execute(
        "UPDATE interviews SET status=?2, schedule_id=?3, started_at=?4, ended_at=?5,
            link_expires_at=?6, updated_at=?7 WHERE id=?1",
        params![
            id,
            status.as_str(),
            schedule_id,
            started_at.map(|dt| dt.to_rfc3339()),
            ended_at.map(|dt| dt.to_rfc3339()),
            link_expires_at.map(|dt| dt.to_rfc3339()),
            now,
        ],
    )?;
    Ok(())
}

pub fn update_interview_status(conn: &Connection, id: &str, status: InterviewStatus, now: &str) -> Result<()> {
    conn.execute(
        "UPDATE interviews SET status=?2, updated_at=?3 WHERE id=?1",
        params![id, status.as_str(), now],
    )?;
    Ok(())
}

fn row_to_schedule(row: &rusqlite::Row<'_>) -> rusqlite::Result<BookingSchedule> {
    let status_str: String = row.get(3)?;
    Ok(BookingSchedule {
        id: row.get::<_, String>(0)?.into(),
        interview_id: row.get::<_, String>(1)?.into(),
        slot_id: row.get::<_, String>(2)?.into(),
        status: ScheduleStatus::from_str(&status_str).unwrap_or(ScheduleStatus::Pending),
        note: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

const SCHEDULE_SELECT: &str =
    "SELECT id, interview_id, slot_id, status, note, created_at, updated_at FROM schedules";

pub fn insert_schedule(conn: &Connection, schedule: &BookingSchedule) -> Result<()> {
    conn.execute(
        "INSERT INTO schedules (id, interview_id, slot_id, status, note, created_at, updated_at)
         VALUES (?1,?2,?3,?4,?5,?6,?7)",
        params![
            schedule.id.as_str(),
            schedule.interview_id.as_str(),
            schedule.slot_id.as_str(),
            schedule.status.as_str(),
            schedule.note,
            schedule.created_at,
            schedule.updated_at,
        ],
    )?;
    Ok(())
}

pub fn get_schedule(conn: &Connection, id: &str) -> Result<BookingSchedule> {
    conn.prepare_cached(&format!("{SCHEDULE_SELECT} WHERE id=?1"))?
        .query_row(params![id], row_to_schedule)
        .optional()?
        .ok_or_else(|| SchedulerError::ScheduleNotFound(id.to_string()))
}

pub fn update_schedule_status(conn: &Connection, id: &str, status: ScheduleStatus, now: &str) -> Result<()> {
    conn.execute(
        "UPDATE schedules SET status=?2, updated_at=?3 WHERE id=?1",
        params![id, status.as_str(), now],
    )?;
    Ok(())
}

/// Schedules (with their slot windows) for every interview belonging to
/// `candidate_id`, used by `detect_conflicts`. Cancelled schedules excluded.
pub fn active_schedules_for_candidate(
    conn: &Connection,
    candidate_id: &str,
) -> Result<Vec<(BookingSchedule, Slot)>> {
    let mut stmt = conn.prepare(
        "SELECT s.id, s.interview_id, s.slot_id, s.status, s.note, s.created_at, s.updated_at
         FROM schedules s
         JOIN interviews i ON i.id = s.interview_id
         WHERE i.candidate_id = ?1 AND s.status != 'CANCELLED'",
    )?;
    let schedules: Vec<BookingSchedule> = stmt
        .query_map(params![candidate_id], row_to_schedule)?
        .filter_map(|r| r.ok())
        .collect();
    schedules
        .into_iter()
        .map(|sched| {
            let slot = get_slot(conn, sched.slot_id.as_str())?;
            Ok((sched, slot))
        })
        .collect()
}
