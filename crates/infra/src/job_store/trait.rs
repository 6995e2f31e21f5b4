use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use jobboard_core::NewJob;

use super::page::{JobPage, PageRequest};

/// Result of a bulk insert.
///
/// `added + skipped` always equals the number of submitted jobs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertOutcome {
    pub added: usize,
    pub skipped: usize,
}

impl InsertOutcome {
    pub fn new(submitted: usize, added: usize) -> Self {
        Self {
            added,
            skipped: submitted.saturating_sub(added),
        }
    }
}

/// Job store operation error.
///
/// These are **infrastructure errors**. Duplicate `apply_url`s are not errors;
/// they surface as `skipped` in [`InsertOutcome`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend could not be reached (connect failure, pool closed, I/O).
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The backend rejected or failed an operation.
    #[error("backend error: {0}")]
    Backend(String),

    /// A stored row could not be decoded.
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

/// Deduplicated, time-bounded persistence of job records.
///
/// ## Dedup contract
///
/// `apply_url` is the identity key. `bulk_insert` never updates an existing
/// record: a job whose `apply_url` is already stored (or appears earlier in
/// the same batch, or is written concurrently by another caller) is skipped.
/// Implementations rely on their native uniqueness guarantee as the source of
/// truth and must not let one failing record abort the rest of the batch.
///
/// ## Retention
///
/// Records are removed by [`JobStore::purge_expired`], driven by the
/// retention sweeper (`crate::workers::RetentionSweeper`), never inline in
/// `list` or `bulk_insert`.
#[async_trait::async_trait]
pub trait JobStore: Send + Sync {
    /// One page of records ordered by `created_at` descending, plus the total count.
    async fn list(&self, request: PageRequest) -> Result<JobPage, StoreError>;

    /// Insert the jobs whose `apply_url` is not yet stored.
    ///
    /// Jobs are expected to be validated already (see `NewJob::validate`).
    async fn bulk_insert(&self, jobs: Vec<NewJob>) -> Result<InsertOutcome, StoreError>;

    /// Delete every record created strictly before `cutoff`; returns how many were removed.
    async fn purge_expired(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError>;

    /// Cheap backend round trip used by readiness probes.
    async fn health(&self) -> Result<(), StoreError>;
}

#[async_trait::async_trait]
impl<S> JobStore for Arc<S>
where
    S: JobStore + ?Sized,
{
    async fn list(&self, request: PageRequest) -> Result<JobPage, StoreError> {
        (**self).list(request).await
    }

    async fn bulk_insert(&self, jobs: Vec<NewJob>) -> Result<InsertOutcome, StoreError> {
        (**self).bulk_insert(jobs).await
    }

    async fn purge_expired(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError> {
        (**self).purge_expired(cutoff).await
    }

    async fn health(&self) -> Result<(), StoreError> {
        (**self).health().await
    }
}
