//! # gaze-server
//!
//! HTTP surface for gazelog: the `/save` ingestion endpoint, a liveness
//! check, and static hosting for the browser experiment client.
//!
//! The ingestion logic lives in [`ingest::IngestService`], generic over the
//! [`gaze_db::LogStore`] it persists to. [`http`] wraps it in an axum router.

pub mod http;
pub mod ingest;

pub use http::{AppState, app, router, serve};
pub use ingest::{IngestService, SKIP_NO_DATABASE};
