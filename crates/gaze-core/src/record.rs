//! The immutable row appended for each successful ingestion.

use serde_json::Value;

use crate::identity::IdentityContext;
use crate::submission::Submission;

/// Transport metadata captured from the request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestMeta {
    pub user_agent: Option<String>,
    pub ip: Option<String>,
}

/// A fully derived record ready to be inserted.
///
/// The creation timestamp and surrogate id are assigned by storage.
#[derive(Debug, Clone, PartialEq)]
pub struct NewGazeLog {
    pub identity: IdentityContext,
    pub user_agent: Option<String>,
    pub ip: Option<String>,
    /// Summary object, stored as an opaque JSON document.
    pub summary: Value,
    /// Trial sequence, stored as an opaque JSON document.
    pub rounds: Value,
    /// Server-computed count of decision-phase trials.
    pub completed_trials: u64,
    /// Client-reported abort signal (non-authoritative).
    pub aborted: bool,
}

impl NewGazeLog {
    /// Build the record from a normalized submission, consuming its payloads.
    #[must_use]
    pub fn build(submission: Submission, identity: IdentityContext, meta: RequestMeta) -> Self {
        let completed_trials = submission.completed_trials();
        let aborted = submission.aborted();
        Self {
            identity,
            user_agent: meta.user_agent,
            ip: meta.ip,
            summary: Value::Object(submission.summary),
            rounds: Value::Array(submission.rounds),
            completed_trials,
            aborted,
        }
    }
}
