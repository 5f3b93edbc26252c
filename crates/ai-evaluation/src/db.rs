use rusqlite::{params, Connection, OptionalExtension};

use crate::error::Result;
use crate::types::{EvaluationResult, MechanicalMetrics};

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS evaluation_results (
            id                  TEXT PRIMARY KEY NOT NULL,
            session_id          TEXT NOT NULL UNIQUE,
            interview_id        TEXT NOT NULL,
            overall_score       REAL NOT NULL,
            resume_fit_score    REAL NOT NULL,
            answers_score       REAL NOT NULL,
            technical_score     REAL,
            behavioral_score    REAL,
            coding_score        REAL,
            resume_feedback     TEXT NOT NULL DEFAULT '',
            answers_feedback    TEXT NOT NULL DEFAULT '',
            recommendation_text TEXT NOT NULL DEFAULT '',
            hire_recommendation INTEGER,
            confidence_level    REAL NOT NULL DEFAULT 0,
            mechanical_metrics  TEXT NOT NULL DEFAULT '{}',
            created_at          TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_evaluation_results_session ON evaluation_results (session_id);
        CREATE INDEX IF NOT EXISTS idx_evaluation_results_interview ON evaluation_results (interview_id);",
    )?;
    Ok(())
}

const SELECT: &str = "SELECT id, session_id, interview_id, overall_score, resume_fit_score,
    answers_score, technical_score, behavioral_score, coding_score, resume_feedback,
    answers_feedback, recommendation_text, hire_recommendation, confidence_level,
    mechanical_metrics, created_at FROM evaluation_results";

fn row_to_result(row: &rusqlite::Row<'_>) -> rusqlite::Result<EvaluationResult> {
    let metrics_json: String = row.get(14)?;
    let metrics: MechanicalMetrics = serde_json::from_str(&metrics_json).unwrap_or_default();
    Ok(EvaluationResult {
        id: row.get::<_, String>(0)?.into(),
        session_id: row.get::<_, String>(1)?.into(),
        interview_id: row.get::<_, String>(2)?.into(),
        overall_score: row.get(3)?,
        resume_fit_score: row.get(4)?,
        answers_score: row.get(5)?,
        technical_score: row.get(6)?,
        behavioral_score: row.get(7)?,
        coding_score: row.get(8)?,
        resume_feedback: row.get(9)?,
        answers_feedback: row.get(10)?,
        recommendation_text: row.get(11)?,
        hire_recommendation: row.get::<_, Option<i64>>(12)?.map(|v| v != 0),
        confidence_level: row.get(13)?,
        mechanical_metrics: metrics,
        created_at: row.get(15)?,
    })
}

/// Replaces any prior result for the same session atomically (§4.7
/// "Idempotence": re-evaluation replaces the prior `EvaluationResult`).
pub fn upsert_result(conn: &Connection, result: &EvaluationResult) -> Result<()> {
    let metrics_json = serde_json::to_string(&result.mechanical_metrics)?;
    let tx = conn.unchecked_transaction()?;
    tx.execute("DELETE FROM evaluation_results WHERE session_id = ?1", params![result.session_id.as_str()])?;
    tx.execute(
        "INSERT INTO evaluation_results (id, session_id, interview_id, overall_score,
            resume_fit_score, answers_score, technical_score, behavioral_score, coding_score,
            resume_feedback, answers_feedback, recommendation_text, hire_recommendation,
            confidence_level, mechanical_metrics, created_at)
         VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15,?16)",
        params![
            result.id.as_str(),
            result.session_id.as_str(),
            result.interview_id.as_str(),
            result.overall_score,
            result.resume_fit_score,
            result.answers_score,
            result.technical_score,
            result.behavioral_score,
            result.coding_score,
            result.resume_feedback,
            result.answers_feedback,
            result.recommendation_text,
            result.hire_recommendation.map(|b| b as i64),
            result.confidence_level,
            metrics_json,
            result.created_at,
        ],
    )?;
    tx.commit()?;
    Ok(())
}

pub fn get_by_session(conn: &Connection, session_id: &str) -> Result<Option<EvaluationResult>> {
    Ok(conn
        .prepare_cached(&format!("{SELECT} WHERE session_id=?1"))?
        .query_row(params![session_id], row_to_result)
        .optional()?)
}

/// Session ids that are COMPLETED but have no persisted result yet — used by
/// the `reevaluate_pending` CLI subcommand (§6 supplement).
pub fn list_sessions_missing_result(conn: &Connection, completed_session_ids: &[String]) -> Result<Vec<String>> {
    let mut missing = Vec::new();
    for id in completed_session_ids {
        let exists: Option<i64> = conn
            .query_row("SELECT 1 FROM evaluation_results WHERE session_id = ?1", params![id], |r| r.get(0))
            .optional()?;
        if exists.is_none() {
            missing.push(id.clone());
        }
    }
    Ok(missing)
}
