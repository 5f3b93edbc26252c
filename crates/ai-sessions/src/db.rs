use std::str::FromStr;

use ai_coderunner::TestCase;
use ai_directory::types::CodingLanguage;
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{Result, SessionsError};
use crate::types::{
    CodeSubmission, IdVerificationStatus, ModelConfig, Question, QuestionLevel, QuestionType,
    Response, ResponseKind, ResponseMetrics, Session, SessionStatus,
};

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS sessions (
            id                        TEXT PRIMARY KEY NOT NULL,
            session_key               TEXT NOT NULL UNIQUE,
            interview_id              TEXT NOT NULL UNIQUE,
            candidate_name            TEXT NOT NULL,
            candidate_email           TEXT NOT NULL,
            job_description_snapshot TEXT NOT NULL DEFAULT '',
            resume_text_snapshot      TEXT NOT NULL DEFAULT '',
            coding_language           TEXT NOT NULL,
            model_language            TEXT NOT NULL DEFAULT '',
            model_accent              TEXT NOT NULL DEFAULT '',
            status                    TEXT NOT NULL DEFAULT 'SCHEDULED',
            current_question_index    INTEGER NOT NULL DEFAULT 0,
            total_questions           INTEGER NOT NULL DEFAULT 0,
            session_started_at        TEXT,
            session_ended_at          TEXT,
            last_heartbeat_at         TEXT,
            id_verification_status    TEXT NOT NULL DEFAULT 'PENDING',
            id_extracted_name         TEXT,
            id_extracted_number       TEXT,
            error_message             TEXT,
            is_evaluated              INTEGER NOT NULL DEFAULT 0,
            created_at                TEXT NOT NULL,
            updated_at                TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_sessions_interview ON sessions (interview_id);
        CREATE INDEX IF NOT EXISTS idx_sessions_key ON sessions (session_key);

        CREATE TABLE IF NOT EXISTS questions (
            id               TEXT PRIMARY KEY NOT NULL,
            session_id       TEXT NOT NULL REFERENCES sessions(id),
            question_order   INTEGER NOT NULL,
            question_type    TEXT NOT NULL,
            level            TEXT NOT NULL,
            parent_id        TEXT,
            text             TEXT NOT NULL,
            coding_language  TEXT,
            audio_ref        TEXT,
            created_at       TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_questions_session ON questions (session_id);

        CREATE TABLE IF NOT EXISTS responses (
            id                  TEXT PRIMARY KEY NOT NULL,
            question_id         TEXT NOT NULL REFERENCES questions(id),
            session_id          TEXT NOT NULL REFERENCES sessions(id),
            kind                TEXT NOT NULL,
            text                TEXT NOT NULL DEFAULT '',
            submitted_at        TEXT NOT NULL,
            duration_seconds    REAL NOT NULL DEFAULT 0,
            filler_word_count   INTEGER,
            words_per_minute    REAL,
            sentiment           REAL
        );
        CREATE INDEX IF NOT EXISTS idx_responses_question ON responses (question_id);
        CREATE INDEX IF NOT EXISTS idx_responses_session ON responses (session_id);

        CREATE TABLE IF NOT EXISTS test_cases (
            id               TEXT PRIMARY KEY NOT NULL,
            question_id      TEXT NOT NULL REFERENCES questions(id),
            input            TEXT NOT NULL,
            expected_output  TEXT NOT NULL,
            is_hidden        INTEGER NOT NULL DEFAULT 0
        );
        CREATE INDEX IF NOT EXISTS idx_test_cases_question ON test_cases (question_id);

        CREATE TABLE IF NOT EXISTS code_submissions (
            id                  TEXT PRIMARY KEY NOT NULL,
            session_id          TEXT NOT NULL REFERENCES sessions(id),
            question_id         TEXT NOT NULL REFERENCES questions(id),
            language            TEXT NOT NULL,
            source              TEXT NOT NULL,
            passed_all_tests    INTEGER NOT NULL,
            output_log          TEXT NOT NULL DEFAULT '',
            created_at          TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_code_submissions_session ON code_submissions (session_id);",
    )?;
    Ok(())
}

fn row_to_session(row: &rusqlite::Row<'_>) -> rusqlite::Result<Session> {
    let coding_language: String = row.get(7)?;
    let status_str: String = row.get(10)?;
    let verification_str: String = row.get(16)?;
    Ok(Session {
        id: row.get::<_, String>(0)?.into(),
        session_key: row.get::<_, String>(1)?.as_str().into(),
        interview_id: row.get::<_, String>(2)?.into(),
        candidate_name: row.get(3)?,
        candidate_email: row.get(4)?,
        job_description_snapshot: row.get(5)?,
        resume_text_snapshot: row.get(6)?,
        coding_language: CodingLanguage::from_str(&coding_language).unwrap_or(CodingLanguage::Python),
        model_config: ModelConfig {
            language: row.get(8)?,
            accent: row.get(9)?,
        },
        status: SessionStatus::from_str(&status_str).unwrap_or(SessionStatus::Scheduled),
        current_question_index: row.get(11)?,
        total_questions: row.get(12)?,
        session_started_at: row.get(13)?,
        session_ended_at: row.get(14)?,
        last_heartbeat_at: row.get(15)?,
        id_verification_status: IdVerificationStatus::from_str(&verification_str).unwrap_or(IdVerificationStatus::Pending),
        id_extracted_name: row.get(17)?,
        id_extracted_number: row.get(18)?,
        error_message: row.get(19)?,
        is_evaluated: row.get::<_, i64>(20)? != 0,
        created_at: row.get(21)?,
        updated_at: row.get(22)?,
    })
}

const SESSION_SELECT: &str = "SELECT id, session_key, interview_id, candidate_name, candidate_email,
    job_description_snapshot, resume_text_snapshot, coding_language, model_language, model_accent,
    status, current_question_index, total_questions, session_started_at, session_ended_at,
    last_heartbeat_at, id_verification_status, id_extracted_name, id_extracted_number,
    error_message, is_evaluated, created_at, updated_at FROM sessions";

#[allow(clippy::too_many_arguments)]
pub fn insert_session(conn: &Connection, s: &Session) -> Result<()> {
    conn.execute(
        "INSERT INTO sessions (id, session_key, interview_id, candidate_name, candidate_email,
            job_description_snapshot, resume_text_snapshot, coding_language, model_language,
            model_accent, status, current_question_index, total_questions, session_started_at,
            session_ended_at, last_heartbeat_at, id_verification_status, id_extracted_name,
            id_extracted_number, error_message, is_evaluated, created_at, updated_at)
         VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15,?16,?17,?18,?19,?20,?21,?22,?23)",
        params![
            s.id.as_str(),
            s.session_key.as_str(),
            s.interview_id.as_str(),
            s.candidate_name,
            s.candidate_email,
            s.job_description_snapshot,
            s.resume_text_snapshot,
            s.coding_language.as_str(),
            s.model_config.language,
            s.model_config.accent,
            s.status.as_str(),
            s.current_question_index,
            s.total_questions,
            s.session_started_at,
            s.session_ended_at,
            s.last_heartbeat_at,
            s.id_verification_status.as_str(),
            s.id_extracted_name,
            s.id_extracted_number,
            s.error_message,
            s.is_evaluated as i64,
            s.created_at,
            s.updated_at,
        ],
    )?;
    Ok(())
}

pub fn get_session(conn: &Connection, id: &str) -> Result<Session> {
    conn.prepare_cached(&format!("{SESSION_SELECT} WHERE id=?1"))?
        .query_row(params![id], row_to_session)
        .optional()?
        .ok_or_else(|| SessionsError::SessionNotFound(id.to_string()))
}

pub fn find_session_by_interview(conn: &Connection, interview_id: &str) -> Result<Option<Session>> {
    Ok(conn
        .prepare_cached(&format!("{SESSION_SELECT} WHERE interview_id=?1"))?
        .query_row(params![interview_id], row_to_session)
        .optional()?)
}

pub fn list_active_sessions(conn: &Connection) -> Result<Vec<Session>> {
    let mut stmt = conn.prepare(&format!("{SESSION_SELECT} WHERE status='ACTIVE'"))?;
    let rows = stmt.query_map([], row_to_session)?.filter_map(|r| r.ok()).collect();
    Ok(rows)
}

pub fn list_completed_sessions(conn: &Connection) -> Result<Vec<Session>> {
    let mut stmt = conn.prepare(&format!("{SESSION_SELECT} WHERE status='COMPLETED'"))?;
    let rows = stmt.query_map([], row_to_session)?.filter_map(|r| r.ok()).collect();
    Ok(rows)
}

#[allow(clippy::too_many_arguments)]
pub fn update_session_state(
    conn: &Connection,
    id: &str,
    status: SessionStatus,
    current_question_index: u32,
    session_started_at: Option<&str>,
    session_ended_at: Option<&str>,
    error_message: Option<&str>,
    now: &str,
) -> Result<()> {
    conn.execute(
        "UPDATE sessions SET status=?2, current_question_index=?3, session_started_at=?4,
            session_ended_at=?5, error_message=?6, updated_at=?7 WHERE id=?1",
        params![id, status.as_str(), current_question_index, session_started_at, session_ended_at, error_message, now],
    )?;
    Ok(())
}

pub fn touch_heartbeat(conn: &Connection, id: &str, now: &str) -> Result<()> {
    conn.execute("UPDATE sessions SET last_heartbeat_at=?2, updated_at=?2 WHERE id=?1", params![id, now])?;
    Ok(())
}

pub fn update_id_verification(
    conn: &Connection,
    id: &str,
    status: IdVerificationStatus,
    name: Option<&str>,
    number: Option<&str>,
    now: &str,
) -> Result<()> {
    conn.execute(
        "UPDATE sessions SET id_verification_status=?2, id_extracted_name=?3,
            id_extracted_number=?4, updated_at=?5 WHERE id=?1",
        params![id, status.as_str(), name, number, now],
    )?;
    Ok(())
}

pub fn mark_evaluated(conn: &Connection, id: &str, now: &str) -> Result<()> {
    conn.execute("UPDATE sessions SET is_evaluated=1, updated_at=?2 WHERE id=?1", params![id, now])?;
    Ok(())
}

fn row_to_question(row: &rusqlite::Row<'_>) -> rusqlite::Result<Question> {
    let type_str: String = row.get(3)?;
    let level_str: String = row.get(4)?;
    let coding_language: Option<String> = row.get(7)?;
    Ok(Question {
        id: row.get::<_, String>(0)?.into(),
        session_id: row.get::<_, String>(1)?.into(),
        order: row.get(2)?,
        question_type: QuestionType::from_str(&type_str).unwrap_or(QuestionType::General),
        level: QuestionLevel::from_str(&level_str).unwrap_or(QuestionLevel::Main),
        parent_id: row.get::<_, Option<String>>(5)?.map(Into::into),
        text: row.get(6)?,
        coding_language: coding_language.and_then(|s| CodingLanguage::from_str(&s).ok()),
        audio_ref: row.get(8)?,
        created_at: row.get(9)?,
    })
}

const QUESTION_SELECT: &str = "SELECT id, session_id, question_order, question_type, level,
    parent_id, text, coding_language, audio_ref, created_at FROM questions";

pub fn insert_question(conn: &Connection, q: &Question) -> Result<()> {
    conn.execute(
        "INSERT INTO questions (id, session_id, question_order, question_type, level,
            parent_id, text, coding_language, audio_ref, created_at)
         VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10)",
        params![
            q.id.as_str(),
            q.session_id.as_str(),
            q.order,
            q.question_type.as_str(),
            q.level.as_str(),
            q.parent_id.as_ref().map(|p| p.as_str().to_string()),
            q.text,
            q.coding_language.map(|l| l.as_str().to_string()),
            q.audio_ref,
            q.created_at,
        ],
    )?;
    Ok(())
}

pub fn get_question(conn: &Connection, id: &str) -> Result<Question> {
    conn.prepare_cached(&format!("{QUESTION_SELECT} WHERE id=?1"))?
        .query_row(params![id], row_to_question)
        .optional()?
        .ok_or_else(|| SessionsError::QuestionNotFound(id.to_string()))
}

pub fn list_questions_for_session(conn: &Connection, session_id: &str) -> Result<Vec<Question>> {
    let mut stmt = conn.prepare(&format!("{QUESTION_SELECT} WHERE session_id=?1 ORDER BY question_order, created_at"))?;
    let rows = stmt.query_map(params![session_id], row_to_question)?.filter_map(|r| r.ok()).collect();
    Ok(rows)
}

fn row_to_response(row: &rusqlite::Row<'_>) -> rusqlite::Result<Response> {
    let kind_str: String = row.get(3)?;
    let filler: Option<u32> = row.get(6)?;
    let wpm: Option<f64> = row.get(7)?;
    let sentiment: Option<f64> = row.get(8)?;
    let metrics = match (filler, wpm, sentiment) {
        (Some(filler_word_count), Some(words_per_minute), Some(sentiment)) => Some(ResponseMetrics {
            filler_word_count,
            words_per_minute,
            sentiment,
        }),
        _ => None,
    };
    Ok(Response {
        id: row.get::<_, String>(0)?.into(),
        question_id: row.get::<_, String>(1)?.into(),
        session_id: row.get::<_, String>(2)?.into(),
        kind: ResponseKind::from_str(&kind_str).unwrap_or(ResponseKind::Text),
        text: row.get(4)?,
        submitted_at: row.get(5)?,
        duration_seconds: row.get(9)?,
        metrics,
    })
}

const RESPONSE_SELECT: &str = "SELECT id, question_id, session_id, kind, text, submitted_at,
    filler_word_count, words_per_minute, sentiment, duration_seconds FROM responses";

pub fn insert_response(conn: &Connection, r: &Response) -> Result<()> {
    conn.execute(
        "INSERT INTO responses (id, question_id, session_id, kind, text, submitted_at,
            duration_seconds, filler_word_count, words_per_minute, sentiment)
         VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10)",
        params![
            r.id.as_str(),
            r.question_id.as_str(),
            r.session_id.as_str(),
            r.kind.as_str(),
            r.text,
            r.submitted_at,
            r.duration_seconds,
            r.metrics.map(|m| m.filler_word_count),
            r.metrics.map(|m| m.words_per_minute),
            r.metrics.map(|m| m.sentiment),
        ],
    )?;
    Ok(())
}

pub fn find_response_for_question(conn: &Connection, question_id: &str) -> Result<Option<Response>> {
    Ok(conn
        .prepare_cached(&format!("{RESPONSE_SELECT} WHERE question_id=?1 ORDER BY submitted_at DESC"))?
        .query_row(params![question_id], row_to_response)
        .optional()?)
}

pub fn list_responses_for_session(conn: &Connection, session_id: &str) -> Result<Vec<Response>> {
    let mut stmt = conn.prepare(&format!("{RESPONSE_SELECT} WHERE session_id=?1 ORDER BY submitted_at"))?;
    let rows = stmt.query_map(params![session_id], row_to_response)?.filter_map(|r| r.ok()).collect();
    Ok(rows)
}

fn row_to_code_submission(row: &rusqlite::Row<'_>) -> rusqlite::Result<CodeSubmission> {
    let lang_str: String = row.get(3)?;
    Ok(CodeSubmission {
        id: row.get::<_, String>(0)?.into(),
        session_id: row.get::<_, String>(1)?.into(),
        question_id: row.get::<_, String>(2)?.into(),
        language: CodingLanguage::from_str(&lang_str).unwrap_or(CodingLanguage::Python),
        source: row.get(4)?,
        passed_all_tests: row.get::<_, i64>(5)? != 0,
        output_log: row.get(6)?,
        created_at: row.get(7)?,
    })
}

const CODE_SUBMISSION_SELECT: &str = "SELECT id, session_id, question_id, language, source,
    passed_all_tests, output_log, created_at FROM code_submissions";

pub fn insert_code_submission(conn: &Connection, c: &CodeSubmission) -> Result<()> {
    conn.execute(
        "INSERT INTO code_submissions (id, session_id, question_id, language, source,
            passed_all_tests, output_log, created_at)
         VALUES (?1,?2,?3,?4,?5,?6,?7,?8)",
        params![
            c.id.as_str(),
            c.session_id.as_str(),
            c.question_id.as_str(),
            c.language.as_str(),
            c.source,
            c.passed_all_tests as i64,
            c.output_log,
            c.created_at,
        ],
    )?;
    Ok(())
}

pub fn list_code_submissions_for_session(conn: &Connection, session_id: &str) -> Result<Vec<CodeSubmission>> {
    let mut stmt = conn.prepare(&format!("{CODE_SUBMISSION_SELECT} WHERE session_id=?1 ORDER BY created_at"))?;
    let rows = stmt.query_map(params![session_id], row_to_code_submission)?.filter_map(|r| r.ok()).collect();
    Ok(rows)
}

fn row_to_test_case(row: &rusqlite::Row<'_>) -> rusqlite::Result<TestCase> {
    Ok(TestCase {
        id: row.get::<_, String>(0)?.into(),
        question_id: row.get::<_, String>(1)?.into(),
        input: row.get(2)?,
        expected_output: row.get(3)?,
        is_hidden: row.get::<_, i64>(4)? != 0,
    })
}

const TEST_CASE_SELECT: &str = "SELECT id, question_id, input, expected_output, is_hidden FROM test_cases";

pub fn insert_test_case(conn: &Connection, case: &TestCase) -> Result<()> {
    conn.execute(
        "INSERT INTO test_cases (id, question_id, input, expected_output, is_hidden) VALUES (?1,?2,?3,?4,?5)",
        params![case.id.as_str(), case.question_id.as_str(), case.input, case.expected_output, case.is_hidden as i64],
    )?;
    Ok(())
}

pub fn list_test_cases_for_question(conn: &Connection, question_id: &str) -> Result<Vec<TestCase>> {
    let mut stmt = conn.prepare(&format!("{TEST_CASE_SELECT} WHERE question_id=?1"))?;
    let rows = stmt.query_map(params![question_id], row_to_test_case)?.filter_map(|r| r.ok()).collect();
    Ok(rows)
}
