//! Idempotent schema provisioning for `gaze_logs`.
//!
//! Forward-only and additive: the table is created if missing, then each
//! column added after the first release is added if missing. Every step is
//! safe to repeat and safe under concurrent callers, so this runs on every
//! write rather than once at startup.

use crate::error::DatabaseError;

pub const TABLE: &str = "gaze_logs";

const CREATE_GAZE_LOGS: &str = "
CREATE TABLE IF NOT EXISTS gaze_logs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
    prolific_pid TEXT,
    prolific_study_id TEXT,
    prolific_session_id TEXT,
    user_agent TEXT,
    ip TEXT,
    summary TEXT,
    rounds TEXT,
    completed_trials INTEGER,
    aborted INTEGER DEFAULT 0
)";

/// Columns that older deployments of the table may lack.
pub const ADDITIVE_COLUMNS: [(&str, &str); 2] = [
    ("completed_trials", "INTEGER"),
    ("aborted", "INTEGER DEFAULT 0"),
];

/// Create the table and any missing additive columns.
pub(crate) async fn ensure_schema(conn: &libsql::Connection) -> Result<(), DatabaseError> {
    conn.execute(CREATE_GAZE_LOGS, ())
        .await
        .map_err(|e| DatabaseError::Migration(format!("create {TABLE}: {e}")))?;

    for (name, decl) in ADDITIVE_COLUMNS {
        ensure_column(conn, name, decl).await?;
    }
    Ok(())
}

async fn ensure_column(
    conn: &libsql::Connection,
    name: &str,
    decl: &str,
) -> Result<(), DatabaseError> {
    if has_column(conn, name).await? {
        return Ok(());
    }

    match conn
        .execute(&format!("ALTER TABLE {TABLE} ADD COLUMN {name} {decl}"), ())
        .await
    {
        Ok(_) => {
            tracing::info!(column = name, "added column to {TABLE}");
            Ok(())
        }
        // Another caller added it between our check and our ALTER.
        Err(e) if e.to_string().contains("duplicate column name") => {
            tracing::warn!(column = name, "column added concurrently");
            Ok(())
        }
        Err(e) => Err(DatabaseError::Migration(format!("add column {name}: {e}"))),
    }
}

pub(crate) async fn has_column(conn: &libsql::Connection, name: &str) -> Result<bool, DatabaseError> {
    let mut rows = conn
        .query(
            &format!("SELECT 1 FROM pragma_table_info('{TABLE}') WHERE name = ?1"),
            [name],
        )
        .await
        .map_err(|e| DatabaseError::Migration(format!("inspect {TABLE}: {e}")))?;
    Ok(rows.next().await?.is_some())
}
