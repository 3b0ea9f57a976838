//! The ingestion handler: one untrusted submission in, one acknowledgment out.
//!
//! Per request:
//! 1. Normalize the body and resolve identity
//! 2. Recompute the completed-trial count and abort flag
//! 3. No store configured: acknowledge with an explicit skip
//! 4. Otherwise ensure schema + insert under a deadline
//! 5. Acknowledge success, or report the storage error
//!
//! No state is shared between requests apart from the store's pool.

use std::time::Duration;

use gaze_core::{IdentityContext, IdentityQuery, NewGazeLog, RequestMeta, SaveResponse, Submission};
use gaze_db::LogStore;
use gaze_db::error::DatabaseError;
use serde_json::Value;

/// Reason reported when persistence is skipped.
pub const SKIP_NO_DATABASE: &str = "no DATABASE_URL";

pub struct IngestService<S> {
    store: Option<S>,
    storage_timeout: Duration,
}

impl<S: LogStore> IngestService<S> {
    /// `store` is `None` when no backend is configured; that selects skip mode.
    pub const fn new(store: Option<S>, storage_timeout: Duration) -> Self {
        Self {
            store,
            storage_timeout,
        }
    }

    /// Process one submission body.
    ///
    /// Never fails: storage errors come back as an `ok: false` response.
    pub async fn ingest(&self, body: Value, query: &IdentityQuery, meta: RequestMeta) -> SaveResponse {
        let submission = Submission::from_value(body);
        let identity = IdentityContext::resolve(&submission.summary, query);
        let completed_trials = submission.completed_trials();

        let Some(store) = &self.store else {
            return SaveResponse::skipped(SKIP_NO_DATABASE, completed_trials);
        };

        let log = NewGazeLog::build(submission, identity, meta);
        let result = tokio::time::timeout(self.storage_timeout, store.persist(&log))
            .await
            .unwrap_or(Err(DatabaseError::Timeout(self.storage_timeout)));

        match result {
            Ok(id) => {
                tracing::debug!(
                    id,
                    completed_trials,
                    aborted = log.aborted,
                    participant = log.identity.participant_id.as_deref(),
                    "stored submission"
                );
                SaveResponse::stored(completed_trials)
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    participant = log.identity.participant_id.as_deref(),
                    "save error"
                );
                SaveResponse::failed(e.to_string())
            }
        }
    }
}
