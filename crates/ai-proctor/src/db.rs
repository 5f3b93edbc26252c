use chrono::Utc;
use rusqlite::{params, Connection, Row};

use ai_core::ids::{SessionId, WarningLogId};

use crate::error::Result;
use crate::types::{WarningLog, WarningType};

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS warning_logs (
            id TEXT PRIMARY KEY,
            session_id TEXT NOT NULL,
            warning_type TEXT NOT NULL,
            suppressed INTEGER NOT NULL,
            evidence_ref TEXT,
            detail TEXT,
            created_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_warning_logs_session ON warning_logs(session_id);
        CREATE INDEX IF NOT EXISTS idx_warning_logs_session_type ON warning_logs(session_id, warning_type);
        ",
    )?;
    Ok(())
}

const WARNING_SELECT: &str =
    "SELECT id, session_id, warning_type, suppressed, evidence_ref, detail, created_at FROM warning_logs";

fn row_to_warning(row: &Row) -> rusqlite::Result<WarningLog> {
    let warning_type_str: String = row.get(2)?;
    Ok(WarningLog {
        id: WarningLogId::from(row.get::<_, String>(0)?),
        session_id: SessionId::from(row.get::<_, String>(1)?),
        warning_type: warning_type_str.parse().unwrap_or(WarningType::ProctorDegraded),
        suppressed: row.get::<_, i64>(3)? != 0,
        evidence_ref: row.get(4)?,
        detail: row.get(5)?,
        created_at: row.get(6)?,
    })
}

pub fn insert_warning(
    conn: &Connection,
    session_id: &SessionId,
    warning_type: WarningType,
    suppressed: bool,
    evidence_ref: Option<String>,
    detail: Option<String>,
) -> Result<WarningLog> {
    let id = WarningLogId::new();
    let created_at = Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO warning_logs (id, session_id, warning_type, suppressed, evidence_ref, detail, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            id.as_str(),
            session_id.as_str(),
            warning_type.as_str(),
            suppressed as i64,
            evidence_ref,
            detail,
            created_at,
        ],
    )?;
    Ok(WarningLog {
        id,
        session_id: session_id.clone(),
        warning_type,
        suppressed,
        evidence_ref,
        detail,
        created_at,
    })
}

pub fn list_for_session(conn: &Connection, session_id: &SessionId) -> Result<Vec<WarningLog>> {
    let mut stmt = conn.prepare(&format!("{WARNING_SELECT} WHERE session_id = ?1 ORDER BY created_at ASC"))?;
    let rows = stmt
        .query_map(params![session_id.as_str()], row_to_warning)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}
