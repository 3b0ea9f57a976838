//! Creation timestamps that never go backwards.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, SecondsFormat, Utc};

/// Issues millisecond timestamps that are non-decreasing across calls, even
/// if the wall clock steps back.
#[derive(Debug, Default)]
pub(crate) struct CreationClock {
    last_millis: AtomicI64,
}

impl CreationClock {
    pub(crate) fn next(&self) -> DateTime<Utc> {
        let now = Utc::now().timestamp_millis();
        let previous = self.last_millis.fetch_max(now, Ordering::AcqRel);
        let millis = previous.max(now);
        DateTime::from_timestamp_millis(millis).unwrap_or_else(Utc::now)
    }
}

/// Storage format for `created_at`: RFC 3339 UTC with millisecond precision,
/// which also sorts correctly as text.
pub(crate) fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}
