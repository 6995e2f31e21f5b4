//! Background workers owned by the store layer.

pub mod retention_sweeper;

pub use retention_sweeper::{RetentionPolicy, RetentionSweeper, WorkerHandle};
