//! Database error types for gaze-db.

use std::time::Duration;

use thiserror::Error;

/// Errors from storage operations.
///
/// None of these are retried internally; they surface to the caller as-is.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// A SQL query failed.
    #[error("Query failed: {0}")]
    Query(String),

    /// Schema provisioning failed.
    #[error("Migration failed: {0}")]
    Migration(String),

    /// Expected a result row but none was returned.
    #[error("No result returned")]
    NoResult,

    /// Invalid state encountered (e.g., bad data in DB, unusable descriptor).
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Every pooled connection stayed busy past the acquire timeout.
    #[error("Timed out after {0:?} waiting for a pooled connection")]
    PoolTimeout(Duration),

    /// A storage operation exceeded its deadline.
    #[error("Storage operation timed out after {0:?}")]
    Timeout(Duration),

    /// A payload could not be serialized to JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Underlying libSQL error.
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),
}
