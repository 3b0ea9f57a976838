//! Row parsing helpers.
//!
//! `created_at` may hold either the adapter's RFC 3339 text or the column
//! default written by other tools, so both formats are accepted.

use chrono::{DateTime, Utc};

use crate::error::DatabaseError;

/// Parse a TEXT column as `DateTime<Utc>`.
///
/// Handles RFC 3339 (`"2026-02-09T14:30:00.125Z"`) and `SQLite`'s
/// `datetime('now')` format (`"2026-02-09 14:30:00"`).
///
/// # Errors
///
/// Returns `DatabaseError::Query` if the string matches neither format.
pub fn parse_datetime(s: &str) -> Result<DateTime<Utc>, DatabaseError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map(|naive| naive.and_utc())
        .map_err(|e| DatabaseError::Query(format!("Failed to parse datetime '{s}': {e}")))
}

/// Read a nullable TEXT column. Returns `None` for both SQL NULL and empty string.
///
/// # Errors
///
/// Returns `DatabaseError` if the column read fails.
pub fn get_opt_string(row: &libsql::Row, idx: i32) -> Result<Option<String>, DatabaseError> {
    match row.get::<Option<String>>(idx)? {
        Some(s) if s.is_empty() => Ok(None),
        other => Ok(other),
    }
}

/// Parse a JSON document column. SQL NULL becomes `Value::Null`.
///
/// # Errors
///
/// Returns `DatabaseError::Query` if the column holds invalid JSON.
pub fn get_json(row: &libsql::Row, idx: i32) -> Result<serde_json::Value, DatabaseError> {
    match row.get::<Option<String>>(idx)? {
        Some(s) => serde_json::from_str(&s)
            .map_err(|e| DatabaseError::Query(format!("Invalid JSON in column {idx}: {e}"))),
        None => Ok(serde_json::Value::Null),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rfc3339_with_millis() {
        let dt = parse_datetime("2026-02-09T14:30:00.125Z").unwrap();
        assert_eq!(dt.timestamp_millis() % 1000, 125);
    }

    #[test]
    fn parses_sqlite_default_format() {
        let dt = parse_datetime("2026-02-09 14:30:00").unwrap();
        assert_eq!(dt.to_rfc3339(), "2026-02-09T14:30:00+00:00");
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(parse_datetime("yesterday"), Err(DatabaseError::Query(_))));
    }
}
