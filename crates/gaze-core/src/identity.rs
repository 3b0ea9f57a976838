//! Participant/study/session identity resolution.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::submission::is_truthy;

/// Recruitment-platform identifiers carried on the request URL.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct IdentityQuery {
    #[serde(rename = "PROLIFIC_PID", default)]
    pub prolific_pid: Option<String>,
    #[serde(rename = "STUDY_ID", default)]
    pub study_id: Option<String>,
    #[serde(rename = "SESSION_ID", default)]
    pub session_id: Option<String>,
}

impl IdentityQuery {
    /// Build from raw query pairs, keeping the first value of each key.
    ///
    /// A repeated parameter never discards the others.
    #[must_use]
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut query = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_ref() {
                "PROLIFIC_PID" => &mut query.prolific_pid,
                "STUDY_ID" => &mut query.study_id,
                "SESSION_ID" => &mut query.session_id,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into());
            }
        }
        query
    }
}

/// Identity fields attached to a persisted record. All nullable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityContext {
    pub participant_id: Option<String>,
    pub study_id: Option<String>,
    pub session_id: Option<String>,
}

impl IdentityContext {
    /// Resolve identity for one submission.
    ///
    /// Participant id comes from `summary.prolific_pid` first, then the
    /// `PROLIFIC_PID` query parameter. Study and session ids come from the
    /// query only. Empty strings count as absent.
    #[must_use]
    pub fn resolve(summary: &Map<String, Value>, query: &IdentityQuery) -> Self {
        let participant_id = summary
            .get("prolific_pid")
            .and_then(summary_text)
            .or_else(|| non_empty(query.prolific_pid.as_deref()));

        Self {
            participant_id,
            study_id: non_empty(query.study_id.as_deref()),
            session_id: non_empty(query.session_id.as_deref()),
        }
    }
}

/// Any truthy value is kept; non-strings are stored as their JSON text.
fn summary_text(value: &Value) -> Option<String> {
    if !is_truthy(value) {
        return None;
    }
    match value {
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|s| !s.is_empty()).map(str::to_string)
}
