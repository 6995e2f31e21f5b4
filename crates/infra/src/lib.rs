//! Infrastructure layer: job persistence and store-owned background work.

pub mod job_store;
pub mod workers;

pub use job_store::{InMemoryJobStore, JobStore, PostgresJobStore, StoreError};
pub use workers::{RetentionPolicy, RetentionSweeper};
