//! Job store boundary.
//!
//! Defines the storage-facing abstraction for deduplicated, time-bounded job
//! records, plus the in-memory (tests/dev) and Postgres implementations.

pub mod in_memory;
pub mod page;
pub mod postgres;
pub mod r#trait;

pub use in_memory::InMemoryJobStore;
pub use page::{JobPage, PageRequest, DEFAULT_LIMIT, DEFAULT_PAGE};
pub use postgres::{PgConnector, PostgresJobStore};
pub use r#trait::{InsertOutcome, JobStore, StoreError};
