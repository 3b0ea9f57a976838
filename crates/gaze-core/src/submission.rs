//! Client submission normalization and server-side derived fields.
//!
//! The browser client posts `{ summary, rounds | trials, aborted }`. The
//! shape is only loosely validated: anything missing or of the wrong type
//! collapses to an empty map / empty sequence instead of failing the request.

use serde_json::{Map, Value};

/// Phase label counted toward server-trusted completion.
pub const DECISION_PHASE: &str = "decision";

/// One normalized client submission.
///
/// Lives for the duration of a single request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Submission {
    /// Free-form summary object, stored verbatim.
    pub summary: Map<String, Value>,
    /// Trial records, stored verbatim.
    pub rounds: Vec<Value>,
    /// Truthiness of the top-level `aborted` field.
    top_level_aborted: bool,
}

impl Submission {
    /// Normalize a parsed request body.
    ///
    /// `rounds` wins over `trials` when both are present; `null` counts as
    /// absent. A non-object body yields an empty submission.
    #[must_use]
    pub fn from_value(body: Value) -> Self {
        let Value::Object(mut body) = body else {
            return Self::default();
        };

        let summary = match body.remove("summary") {
            Some(Value::Object(map)) => map,
            _ => Map::new(),
        };

        let rounds = match take_present(&mut body, "rounds")
            .or_else(|| take_present(&mut body, "trials"))
        {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        };

        let top_level_aborted = body.get("aborted").is_some_and(is_truthy);

        Self {
            summary,
            rounds,
            top_level_aborted,
        }
    }

    /// Number of trial records whose `phase` is exactly `"decision"`.
    ///
    /// Always recomputed here; a client-supplied count is never consulted.
    #[must_use]
    pub fn completed_trials(&self) -> u64 {
        let count = self
            .rounds
            .iter()
            .filter(|round| round.get("phase").and_then(Value::as_str) == Some(DECISION_PHASE))
            .count();
        u64::try_from(count).unwrap_or(u64::MAX)
    }

    /// Best-effort abort signal from the top-level body or the summary.
    ///
    /// Not corroborated against the trial sequence.
    #[must_use]
    pub fn aborted(&self) -> bool {
        self.top_level_aborted || self.summary.get("aborted").is_some_and(is_truthy)
    }
}

/// Remove `key` from `map` unless it is missing or `null`.
fn take_present(map: &mut Map<String, Value>, key: &str) -> Option<Value> {
    match map.remove(key) {
        Some(Value::Null) | None => None,
        other => other,
    }
}

/// Loose truthiness for client-supplied JSON values.
///
/// `null`, `false`, `0`, NaN and `""` are falsy; everything else, including
/// empty arrays and objects, is truthy.
#[must_use]
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
