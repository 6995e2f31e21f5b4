//! `jobboard-core` — job record domain building blocks.
//!
//! This crate contains **pure domain** types (no storage or HTTP concerns):
//! the job record, its identifier, and validation of submitted postings.

pub mod error;
pub mod id;
pub mod job;

pub use error::{DomainError, DomainResult};
pub use id::JobId;
pub use job::{JobRecord, NewJob, RETENTION_WINDOW_DAYS, retention_window};
