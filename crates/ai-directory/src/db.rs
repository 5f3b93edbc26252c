use std::str::FromStr;

use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{DirectoryError, Result};
use crate::types::{Candidate, CodingLanguage, Job};

/// Initialise the jobs/candidates tables. Idempotent — safe on every startup.
pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS jobs (
            id               TEXT PRIMARY KEY NOT NULL,
            tenant_id        TEXT NOT NULL,
            title            TEXT NOT NULL,
            company          TEXT NOT NULL,
            domain           TEXT NOT NULL,
            coding_language  TEXT NOT NULL,
            description      TEXT NOT NULL DEFAULT '',
            tech_stack       TEXT NOT NULL DEFAULT '[]',
            created_at       TEXT NOT NULL,
            updated_at       TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS candidates (
            id               TEXT PRIMARY KEY NOT NULL,
            tenant_id        TEXT NOT NULL,
            display_name     TEXT NOT NULL,
            email            TEXT NOT NULL,
            resume_text      TEXT,
            created_at       TEXT NOT NULL,
            updated_at       TEXT NOT NULL
        );

        -- Unique index on Candidate email per tenant (§6 persisted state layout).
        CREATE UNIQUE INDEX IF NOT EXISTS idx_candidates_tenant_email
            ON candidates (tenant_id, email);",
    )?;
    Ok(())
}

fn row_to_job(row: &rusqlite::Row<'_>) -> rusqlite::Result<Job> {
    let tech_stack_json: String = row.get(7)?;
    let tech_stack: Vec<String> = serde_json::from_str(&tech_stack_json).unwrap_or_default();
    let lang_str: String = row.get(5)?;
    let coding_language = CodingLanguage::from_str(&lang_str).unwrap_or(CodingLanguage::Python);
    Ok(Job {
        id: row.get::<_, String>(0)?.into(),
        tenant_id: row.get(1)?,
        title: row.get(2)?,
        company: row.get(3)?,
        domain: row.get(4)?,
        coding_language,
        description: row.get(6)?,
        tech_stack,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

fn row_to_candidate(row: &rusqlite::Row<'_>) -> rusqlite::Result<Candidate> {
    Ok(Candidate {
        id: row.get::<_, String>(0)?.into(),
        tenant_id: row.get(1)?,
        display_name: row.get(2)?,
        email: row.get(3)?,
        resume_text: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

const JOB_SELECT: &str = "SELECT id, tenant_id, title, company, domain, coding_language,
        description, tech_stack, created_at, updated_at FROM jobs";

const CANDIDATE_SELECT: &str = "SELECT id, tenant_id, display_name, email, resume_text,
        created_at, updated_at FROM candidates";

pub fn insert_job(conn: &Connection, job: &Job) -> Result<()> {
    let tech_stack_json = serde_json::to_string(&job.tech_stack).unwrap_or_else(|_| "[]".to_string());
    conn.execute(
        "INSERT INTO jobs (id, tenant_id, title, company, domain, coding_language,
            description, tech_stack, created_at, updated_at)
         VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10)",
        params![
            job.id.as_str(),
            job.tenant_id,
            job.title,
            job.company,
            job.domain,
            job.coding_language.as_str(),
            job.description,
            tech_stack_json,
            job.created_at,
            job.updated_at,
        ],
    )?;
    Ok(())
}

pub fn get_job(conn: &Connection, id: &str) -> Result<Job> {
    conn.prepare_cached(&format!("{JOB_SELECT} WHERE id=?1"))?
        .query_row(params![id], row_to_job)
        .optional()?
        .ok_or_else(|| DirectoryError::JobNotFound(id.to_string()))
}

pub fn list_jobs(conn: &Connection) -> Result<Vec<Job>> {
    let mut stmt = conn.prepare(JOB_SELECT)?;
    let rows = stmt.query_map([], row_to_job)?.filter_map(|r| r.ok()).collect();
    Ok(rows)
}

pub fn insert_candidate(conn: &Connection, candidate: &Candidate) -> Result<()> {
    let outcome = conn.execute(
        "INSERT INTO candidates (id, tenant_id, display_name, email, resume_text,
            created_at, updated_at)
         VALUES (?1,?2,?3,?4,?5,?6,?7)",
        params![
            candidate.id.as_str(),
            candidate.tenant_id,
            candidate.display_name,
            candidate.email,
            candidate.resume_text,
            candidate.created_at,
            candidate.updated_at,
        ],
    );
    match outcome {
        Ok(_) => Ok(()),
        Err(rusqlite::Error::SqliteFailure(e, _))
            if e.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            Err(DirectoryError::DuplicateEmail(candidate.email.clone()))
        }
        Err(e) => Err(DirectoryError::Database(e)),
    }
}

pub fn get_candidate(conn: &Connection, id: &str) -> Result<Candidate> {
    conn.prepare_cached(&format!("{CANDIDATE_SELECT} WHERE id=?1"))?
        .query_row(params![id], row_to_candidate)
        .optional()?
        .ok_or_else(|| DirectoryError::CandidateNotFound(id.to_string()))
}

pub fn set_candidate_resume(conn: &Connection, id: &str, resume_text: &str, now: &str) -> Result<()> {
    conn.execute(
        "UPDATE candidates SET resume_text=?2, updated_at=?3 WHERE id=?1",
        params![id, resume_text, now],
    )?;
    Ok(())
}
