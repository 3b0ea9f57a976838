//! # gaze-core
//!
//! Core types for gazelog, the experiment telemetry ingestion service.
//!
//! This crate has no I/O. It provides:
//! - Loose normalization of client submissions (summary + trial sequence)
//! - Server-side derivation of the completed-trial count and abort flag
//! - Identity context resolution (summary body first, then query parameters)
//! - The record value handed to storage
//! - JSON response types returned by the HTTP surface

pub mod identity;
pub mod record;
pub mod responses;
pub mod submission;

pub use identity::{IdentityContext, IdentityQuery};
pub use record::{NewGazeLog, RequestMeta};
pub use responses::{HealthResponse, SaveResponse};
pub use submission::{DECISION_PHASE, Submission};
