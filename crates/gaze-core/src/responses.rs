//! JSON acknowledgments returned by the HTTP surface.
//!
//! Every outcome of a save, including failure, is reported with the same
//! `ok`-keyed shape so the client can tell whether data was durably stored.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Acknowledgment for `POST /save`.
///
/// - stored: `{ "ok": true, "completedTrials": n }`
/// - skipped: `{ "ok": true, "skip": "<reason>", "completedTrials": n }`
/// - failed: `{ "ok": false, "error": "<description>" }`
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SaveResponse {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_trials: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SaveResponse {
    /// The record was durably inserted.
    #[must_use]
    pub const fn stored(completed_trials: u64) -> Self {
        Self {
            ok: true,
            skip: None,
            completed_trials: Some(completed_trials),
            error: None,
        }
    }

    /// Persistence was skipped because no storage is configured.
    #[must_use]
    pub fn skipped(reason: impl Into<String>, completed_trials: u64) -> Self {
        Self {
            ok: true,
            skip: Some(reason.into()),
            completed_trials: Some(completed_trials),
            error: None,
        }
    }

    /// Persistence failed; nothing was written.
    #[must_use]
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            skip: None,
            completed_trials: None,
            error: Some(error.into()),
        }
    }
}

/// Liveness check body for `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct HealthResponse {
    pub ok: bool,
    /// Server time in epoch milliseconds.
    pub ts: i64,
}

impl HealthResponse {
    #[must_use]
    pub fn now() -> Self {
        Self {
            ok: true,
            ts: chrono::Utc::now().timestamp_millis(),
        }
    }
}
