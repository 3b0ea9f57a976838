//! The persistence seam the ingestion handler depends on.

use std::future::Future;

use gaze_core::NewGazeLog;

use crate::GazeDb;
use crate::error::DatabaseError;

/// Durable, append-only sink for ingested records.
///
/// `persist` must ensure the schema and insert exactly one row, or fail
/// without writing anything.
pub trait LogStore: Send + Sync + 'static {
    /// Returns the surrogate id of the new row.
    fn persist(&self, log: &NewGazeLog) -> impl Future<Output = Result<i64, DatabaseError>> + Send;
}

impl LogStore for GazeDb {
    fn persist(&self, log: &NewGazeLog) -> impl Future<Output = Result<i64, DatabaseError>> + Send {
        Self::persist(self, log)
    }
}
