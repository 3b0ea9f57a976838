//! # gaze-db
//!
//! libSQL storage adapter for gazelog.
//!
//! Appends one immutable row per ingested submission to `gaze_logs`.
//! Summary and trial payloads are kept as JSON documents (validated by
//! `SQLite`'s `json()` on the way in), never flattened into columns.
//!
//! The adapter is optional at runtime: [`GazeDb::from_config`] returns
//! `Ok(None)` when no connection descriptor is configured, and callers treat
//! that as the skip mode rather than an error.

pub mod error;
pub mod helpers;
pub mod pool;
pub mod schema;
pub mod store;

mod clock;

use chrono::{DateTime, Utc};
use gaze_config::DatabaseConfig;
use gaze_core::NewGazeLog;
use libsql::Builder;

use clock::{CreationClock, format_timestamp};
use error::DatabaseError;
use helpers::{get_json, get_opt_string, parse_datetime};
use pool::{ConnectionPool, PoolOptions};

pub use store::LogStore;

const INSERT_GAZE_LOG: &str = "
INSERT INTO gaze_logs
    (created_at, prolific_pid, prolific_study_id, prolific_session_id,
     user_agent, ip, summary, rounds, completed_trials, aborted)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, json(?7), json(?8), ?9, ?10)
RETURNING id";

const SELECT_GAZE_LOG: &str = "
SELECT id, created_at, prolific_pid, prolific_study_id, prolific_session_id,
       user_agent, ip, summary, rounds, completed_trials, aborted
FROM gaze_logs WHERE id = ?1";

/// A row read back from `gaze_logs`.
///
/// Columns added after the first schema version are optional, since rows
/// written before they existed carry NULL.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredGazeLog {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub participant_id: Option<String>,
    pub study_id: Option<String>,
    pub session_id: Option<String>,
    pub user_agent: Option<String>,
    pub ip: Option<String>,
    pub summary: serde_json::Value,
    pub rounds: serde_json::Value,
    pub completed_trials: Option<i64>,
    pub aborted: bool,
}

/// Storage adapter: a bounded pool plus the creation clock.
pub struct GazeDb {
    pool: ConnectionPool,
    clock: CreationClock,
}

impl GazeDb {
    /// Build the adapter described by `config`, or `None` if storage is not
    /// configured.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database handle cannot be built.
    pub async fn from_config(config: &DatabaseConfig) -> Result<Option<Self>, DatabaseError> {
        if !config.is_configured() {
            return Ok(None);
        }
        let options = PoolOptions::from(config);
        let db = match config.local_path() {
            Some(path) => Self::open_local(path, options).await?,
            None => Self::open_remote(config.url.trim(), &config.auth_token, options).await?,
        };
        Ok(Some(db))
    }

    /// Open a local database file.
    ///
    /// Each pooled connection opens the file separately, so `":memory:"`
    /// would give every connection its own empty database; use a file.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened.
    pub async fn open_local(path: &str, options: PoolOptions) -> Result<Self, DatabaseError> {
        if path == ":memory:" {
            return Err(DatabaseError::InvalidState(
                "in-memory databases cannot be pooled; use a file path".into(),
            ));
        }
        let db = Builder::new_local(path).build().await?;
        tracing::info!(path, max_connections = options.max_connections, "opened local gaze log store");
        Ok(Self::with_pool(ConnectionPool::new(db, options, true)?))
    }

    /// Open a remote libSQL/sqld database.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database handle cannot be built.
    pub async fn open_remote(
        url: &str,
        auth_token: &str,
        options: PoolOptions,
    ) -> Result<Self, DatabaseError> {
        let db = Builder::new_remote(url.to_string(), auth_token.to_string())
            .build()
            .await?;
        tracing::info!(url, max_connections = options.max_connections, "opened remote gaze log store");
        Ok(Self::with_pool(ConnectionPool::new(db, options, false)?))
    }

    fn with_pool(pool: ConnectionPool) -> Self {
        Self {
            pool,
            clock: CreationClock::default(),
        }
    }

    pub const fn pool(&self) -> &ConnectionPool {
        &self.pool
    }

    /// Idempotently create `gaze_logs` and any missing additive columns.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Migration` if provisioning fails.
    pub async fn ensure_schema(&self) -> Result<(), DatabaseError> {
        let conn = self.pool.checkout().await?;
        schema::ensure_schema(&conn).await?;
        conn.release();
        Ok(())
    }

    /// Append one row. The table must already exist.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` on serialization, connectivity, or constraint
    /// failure. Nothing is written in that case.
    pub async fn insert(&self, log: &NewGazeLog) -> Result<i64, DatabaseError> {
        let conn = self.pool.checkout().await?;
        let id = self.insert_on(&conn, log).await?;
        conn.release();
        Ok(id)
    }

    /// Ensure the schema, then insert, on a single borrowed connection.
    ///
    /// The connection only goes back to the pool once both steps succeed;
    /// on error, or if this future is dropped mid-flight, it is closed.
    ///
    /// # Errors
    ///
    /// Returns the first `DatabaseError` from either step.
    pub async fn persist(&self, log: &NewGazeLog) -> Result<i64, DatabaseError> {
        let conn = self.pool.checkout().await?;
        schema::ensure_schema(&conn).await?;
        let id = self.insert_on(&conn, log).await?;
        conn.release();
        tracing::debug!(id, completed_trials = log.completed_trials, "persisted gaze log");
        Ok(id)
    }

    async fn insert_on(
        &self,
        conn: &libsql::Connection,
        log: &NewGazeLog,
    ) -> Result<i64, DatabaseError> {
        let summary = serde_json::to_string(&log.summary)?;
        let rounds = serde_json::to_string(&log.rounds)?;
        let completed_trials = i64::try_from(log.completed_trials).map_err(|_| {
            DatabaseError::InvalidState(format!(
                "completed_trials out of range: {}",
                log.completed_trials
            ))
        })?;
        let created_at = format_timestamp(&self.clock.next());

        let mut rows = conn
            .query(
                INSERT_GAZE_LOG,
                libsql::params![
                    created_at,
                    log.identity.participant_id.as_deref(),
                    log.identity.study_id.as_deref(),
                    log.identity.session_id.as_deref(),
                    log.user_agent.as_deref(),
                    log.ip.as_deref(),
                    summary,
                    rounds,
                    completed_trials,
                    i64::from(log.aborted)
                ],
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        Ok(row.get::<i64>(0)?)
    }

    /// Total rows in `gaze_logs`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the table is missing or the query fails.
    pub async fn count_logs(&self) -> Result<u64, DatabaseError> {
        let conn = self.pool.checkout().await?;
        let mut rows = conn.query("SELECT COUNT(*) FROM gaze_logs", ()).await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        let count = row.get::<i64>(0)?;
        drop(rows);
        conn.release();
        u64::try_from(count).map_err(|_| DatabaseError::InvalidState(format!("negative count {count}")))
    }

    /// Read one row back by id.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails or a column cannot be parsed.
    pub async fn get_log(&self, id: i64) -> Result<Option<StoredGazeLog>, DatabaseError> {
        let conn = self.pool.checkout().await?;
        let mut rows = conn.query(SELECT_GAZE_LOG, [id]).await?;
        let Some(row) = rows.next().await? else {
            drop(rows);
            conn.release();
            return Ok(None);
        };

        let stored = StoredGazeLog {
            id: row.get::<i64>(0)?,
            created_at: parse_datetime(&row.get::<String>(1)?)?,
            participant_id: get_opt_string(&row, 2)?,
            study_id: get_opt_string(&row, 3)?,
            session_id: get_opt_string(&row, 4)?,
            user_agent: get_opt_string(&row, 5)?,
            ip: get_opt_string(&row, 6)?,
            summary: get_json(&row, 7)?,
            rounds: get_json(&row, 8)?,
            completed_trials: row.get::<Option<i64>>(9)?,
            aborted: row.get::<Option<i64>>(10)?.is_some_and(|v| v != 0),
        };
        drop(rows);
        conn.release();
        Ok(Some(stored))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gaze_core::{IdentityContext, RequestMeta, Submission};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tempfile::TempDir;

    /// Helper to create a file-backed database for testing.
    async fn test_db() -> (TempDir, GazeDb) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("gaze.db");
        let db = GazeDb::open_local(path.to_str().unwrap(), PoolOptions::default())
            .await
            .unwrap();
        (dir, db)
    }

    fn sample_log(body: serde_json::Value) -> NewGazeLog {
        let submission = Submission::from_value(body);
        let identity = IdentityContext {
            participant_id: Some("P1".into()),
            study_id: Some("S1".into()),
            session_id: None,
        };
        let meta = RequestMeta {
            user_agent: Some("Mozilla/5.0".into()),
            ip: Some("203.0.113.7".into()),
        };
        NewGazeLog::build(submission, identity, meta)
    }

    #[tokio::test]
    async fn unconfigured_descriptor_yields_no_adapter() {
        let db = GazeDb::from_config(&DatabaseConfig::default()).await.unwrap();
        assert!(db.is_none());
    }

    #[tokio::test]
    async fn from_config_opens_local_file() {
        let dir = TempDir::new().unwrap();
        let config = DatabaseConfig {
            url: format!("file:{}", dir.path().join("cfg.db").display()),
            max_connections: 2,
            ..DatabaseConfig::default()
        };
        let db = GazeDb::from_config(&config).await.unwrap().expect("adapter");
        assert_eq!(db.pool().options().max_connections, 2);
        db.ensure_schema().await.unwrap();
        assert_eq!(db.count_logs().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn memory_path_rejected() {
        let result = GazeDb::open_local(":memory:", PoolOptions::default()).await;
        assert!(matches!(result, Err(DatabaseError::InvalidState(_))));
    }

    #[tokio::test]
    async fn ensure_schema_is_idempotent() {
        let (_dir, db) = test_db().await;
        for _ in 0..5 {
            db.ensure_schema().await.unwrap();
        }
        let conn = db.pool().checkout().await.unwrap();
        for (name, _) in schema::ADDITIVE_COLUMNS {
            assert!(schema::has_column(&conn, name).await.unwrap(), "{name} missing");
        }
    }

    #[tokio::test]
    async fn ensure_schema_leaves_rows_untouched() {
        let (_dir, db) = test_db().await;
        let id = db.persist(&sample_log(json!({"rounds": [{"phase": "decision"}]}))).await.unwrap();
        let before = db.get_log(id).await.unwrap();

        db.ensure_schema().await.unwrap();
        db.ensure_schema().await.unwrap();

        assert_eq!(db.get_log(id).await.unwrap(), before);
        assert_eq!(db.count_logs().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn persist_round_trips_every_field() {
        let (_dir, db) = test_db().await;
        let log = sample_log(json!({
            "summary": {"prolific_pid": "P1", "screen": {"w": 1920, "h": 1080}, "aborted": true},
            "rounds": [
                {"phase": "decision", "gaze": [[0.1, 0.2, 16], [0.3, 0.4, 33]]},
                {"phase": "practice"},
                {"phase": "decision", "choice": null}
            ]
        }));

        let id = db.persist(&log).await.unwrap();
        let stored = db.get_log(id).await.unwrap().expect("row exists");

        assert_eq!(stored.id, id);
        assert_eq!(stored.participant_id.as_deref(), Some("P1"));
        assert_eq!(stored.study_id.as_deref(), Some("S1"));
        assert_eq!(stored.session_id, None);
        assert_eq!(stored.user_agent.as_deref(), Some("Mozilla/5.0"));
        assert_eq!(stored.ip.as_deref(), Some("203.0.113.7"));
        assert_eq!(stored.summary, log.summary);
        assert_eq!(stored.rounds, log.rounds);
        assert_eq!(stored.completed_trials, Some(2));
        assert!(stored.aborted);
    }

    #[tokio::test]
    async fn identical_submissions_create_independent_rows() {
        let (_dir, db) = test_db().await;
        let log = sample_log(json!({"rounds": [{"phase": "decision"}]}));

        let first = db.persist(&log).await.unwrap();
        let second = db.persist(&log).await.unwrap();

        assert_ne!(first, second);
        assert_eq!(db.count_logs().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn created_at_is_non_decreasing() {
        let (_dir, db) = test_db().await;
        let mut last = None;
        for _ in 0..20 {
            let id = db.persist(&sample_log(json!({}))).await.unwrap();
            let created_at = db.get_log(id).await.unwrap().unwrap().created_at;
            if let Some(prev) = last {
                assert!(created_at >= prev);
            }
            last = Some(created_at);
        }
    }

    #[tokio::test]
    async fn insert_without_schema_fails_and_writes_nothing() {
        let (_dir, db) = test_db().await;
        let err = db.insert(&sample_log(json!({}))).await.unwrap_err();
        assert!(matches!(err, DatabaseError::LibSql(_)), "got {err}");
        assert_eq!(db.pool().status().size, 0, "failed connection must be closed");

        db.ensure_schema().await.unwrap();
        assert_eq!(db.count_logs().await.unwrap(), 0);
        db.insert(&sample_log(json!({}))).await.expect("adapter still usable");
        assert_eq!(db.count_logs().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn legacy_table_gains_additive_columns() {
        let (_dir, db) = test_db().await;
        {
            let conn = db.pool().checkout().await.unwrap();
            conn.execute(
                "CREATE TABLE gaze_logs (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
                    prolific_pid TEXT,
                    prolific_study_id TEXT,
                    prolific_session_id TEXT,
                    user_agent TEXT,
                    ip TEXT,
                    summary TEXT,
                    rounds TEXT
                )",
                (),
            )
            .await
            .unwrap();
            conn.execute(
                "INSERT INTO gaze_logs (prolific_pid, summary, rounds) VALUES ('OLD', '{}', '[]')",
                (),
            )
            .await
            .unwrap();
        }

        db.ensure_schema().await.unwrap();

        let old = db.get_log(1).await.unwrap().expect("legacy row survives");
        assert_eq!(old.participant_id.as_deref(), Some("OLD"));
        assert_eq!(old.completed_trials, None);
        assert!(!old.aborted);

        let id = db.persist(&sample_log(json!({"trials": [{"phase": "decision"}]}))).await.unwrap();
        assert_eq!(db.get_log(id).await.unwrap().unwrap().completed_trials, Some(1));
    }

    #[tokio::test]
    async fn concurrent_persists_share_the_pool() {
        let (_dir, db) = test_db().await;
        let db = std::sync::Arc::new(db);

        let mut handles = Vec::new();
        for i in 0..12 {
            let db = db.clone();
            handles.push(tokio::spawn(async move {
                db.persist(&sample_log(json!({"summary": {"n": i}}))).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(db.count_logs().await.unwrap(), 12);
        assert!(db.pool().status().size <= db.pool().options().max_connections);
    }

    #[tokio::test]
    async fn interrupted_persist_leaves_adapter_usable() {
        use std::future::Future;
        use std::task::{Context, Waker};

        let (_dir, db) = test_db().await;
        db.ensure_schema().await.unwrap();
        let log = sample_log(json!({"rounds": [{"phase": "decision"}]}));

        // Poll once, then drop the in-flight future, as a deadline would.
        let first_finished = {
            let mut in_flight = std::pin::pin!(db.persist(&log));
            let mut cx = Context::from_waker(Waker::noop());
            in_flight.as_mut().poll(&mut cx).is_ready()
        };
        if !first_finished {
            assert_eq!(db.pool().status().size, 0, "interrupted connection went back to the pool");
        }

        let id = db.persist(&log).await.expect("persist after interruption");
        assert_eq!(db.get_log(id).await.unwrap().unwrap().completed_trials, Some(1));
        assert!(db.count_logs().await.unwrap() >= 1);
    }

    #[tokio::test]
    async fn missing_row_is_none() {
        let (_dir, db) = test_db().await;
        db.ensure_schema().await.unwrap();
        assert_eq!(db.get_log(42).await.unwrap(), None);
    }
}
