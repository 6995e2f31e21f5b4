use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use chrono::{DateTime, Utc};

use jobboard_core::{JobId, JobRecord, NewJob};

use super::page::{JobPage, PageRequest};
use super::r#trait::{InsertOutcome, JobStore, StoreError};

/// Ordering key: ascending `(created_at, id)`; listings iterate it in reverse.
type OrderKey = (DateTime<Utc>, JobId);

#[derive(Debug, Default)]
struct Inner {
    records: BTreeMap<OrderKey, JobRecord>,
    by_url: HashMap<String, OrderKey>,
}

impl Inner {
    fn insert(&mut self, record: JobRecord) -> bool {
        if self.by_url.contains_key(&record.apply_url) {
            return false;
        }
        let key = (record.created_at, record.id);
        self.by_url.insert(record.apply_url.clone(), key);
        self.records.insert(key, record);
        true
    }
}

/// In-memory job store.
///
/// Intended for tests/dev. All state lives behind one `RwLock`; no lock is
/// held across an `.await`.
#[derive(Debug, Default)]
pub struct InMemoryJobStore {
    inner: RwLock<Inner>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fully materialized record, keeping its timestamps.
    ///
    /// Returns `false` when a record with the same `apply_url` already exists.
    /// Used to seed the store (e.g. with aged records in tests).
    pub fn insert_record(&self, record: JobRecord) -> Result<bool, StoreError> {
        let mut inner = self.write()?;
        Ok(inner.insert(record))
    }

    /// Number of stored records.
    pub fn record_count(&self) -> Result<usize, StoreError> {
        self.inner
            .read()
            .map(|i| i.records.len())
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Inner>, StoreError> {
        self.inner
            .write()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))
    }
}

#[async_trait::async_trait]
impl JobStore for InMemoryJobStore {
    async fn list(&self, request: PageRequest) -> Result<JobPage, StoreError> {
        let inner = self
            .inner
            .read()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))?;

        let offset = usize::try_from(request.offset()).unwrap_or(usize::MAX);
        let jobs = inner
            .records
            .values()
            .rev()
            .skip(offset)
            .take(request.limit() as usize)
            .cloned()
            .collect();

        Ok(JobPage::new(request, jobs, inner.records.len() as u64))
    }

    async fn bulk_insert(&self, jobs: Vec<NewJob>) -> Result<InsertOutcome, StoreError> {
        let submitted = jobs.len();
        let now = Utc::now();

        let mut inner = self.write()?;
        let mut added = 0;
        for job in jobs {
            if inner.insert(JobRecord::from_new(job, now)) {
                added += 1;
            }
        }

        Ok(InsertOutcome::new(submitted, added))
    }

    async fn purge_expired(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut inner = self.write()?;

        // Everything strictly before (cutoff, min id) is expired.
        let kept = inner.records.split_off(&(cutoff, JobId::from_uuid(uuid::Uuid::nil())));
        let expired = std::mem::replace(&mut inner.records, kept);
        for record in expired.values() {
            inner.by_url.remove(&record.apply_url);
        }

        Ok(expired.len() as u64)
    }

    async fn health(&self) -> Result<(), StoreError> {
        self.inner
            .read()
            .map(|_| ())
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use proptest::prelude::*;

    fn job(n: usize) -> NewJob {
        NewJob::new(format!("Job {n}"), format!("https://a.com/{n}"))
    }

    fn aged(url: &str, age: Duration) -> JobRecord {
        JobRecord::from_new(NewJob::new("old", url), Utc::now() - age)
    }

    #[tokio::test]
    async fn distinct_jobs_are_all_added() {
        let store = InMemoryJobStore::new();
        let out = store.bulk_insert((0..5).map(job).collect()).await.unwrap();
        assert_eq!(out, InsertOutcome { added: 5, skipped: 0 });

        let page = store.list(PageRequest::default()).await.unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(page.jobs.len(), 5);
        assert_eq!(page.pages, 1);
    }

    #[tokio::test]
    async fn self_duplicate_in_batch_is_skipped() {
        let store = InMemoryJobStore::new();
        let out = store
            .bulk_insert(vec![
                NewJob::new("A", "https://a.com/1"),
                NewJob::new("A-dup", "https://a.com/1"),
            ])
            .await
            .unwrap();
        assert_eq!(out, InsertOutcome { added: 1, skipped: 1 });

        let page = store.list(PageRequest::default()).await.unwrap();
        assert_eq!(page.jobs[0].job_title, "A");
    }

    #[tokio::test]
    async fn resubmission_leaves_existing_record_unchanged() {
        let store = InMemoryJobStore::new();
        store.bulk_insert(vec![job(1)]).await.unwrap();
        let before = store.list(PageRequest::default()).await.unwrap().jobs[0].clone();

        let out = store
            .bulk_insert(vec![NewJob::new("renamed", "https://a.com/1").with_description("new")])
            .await
            .unwrap();
        assert_eq!(out, InsertOutcome { added: 0, skipped: 1 });

        let after = store.list(PageRequest::default()).await.unwrap();
        assert_eq!(after.total, 1);
        assert_eq!(after.jobs[0], before);
    }

    #[tokio::test]
    async fn list_is_newest_first() {
        let store = InMemoryJobStore::new();
        store.insert_record(aged("https://a.com/old", Duration::days(2))).unwrap();
        store.insert_record(aged("https://a.com/mid", Duration::days(1))).unwrap();
        store.bulk_insert(vec![NewJob::new("new", "https://a.com/new")]).await.unwrap();

        let urls: Vec<_> = store
            .list(PageRequest::default())
            .await
            .unwrap()
            .jobs
            .into_iter()
            .map(|j| j.apply_url)
            .collect();
        assert_eq!(urls, vec!["https://a.com/new", "https://a.com/mid", "https://a.com/old"]);
    }

    #[tokio::test]
    async fn page_past_the_end_is_empty() {
        let store = InMemoryJobStore::new();
        store.bulk_insert((0..7).map(job).collect()).await.unwrap();

        let page = store.list(PageRequest::new(Some(5), Some(3))).await.unwrap();
        assert!(page.jobs.is_empty());
        assert_eq!(page.total, 7);
        assert_eq!(page.pages, 3);
        assert_eq!(page.page, 5);

        let last = store.list(PageRequest::new(Some(3), Some(3))).await.unwrap();
        assert_eq!(last.jobs.len(), 1);
    }

    #[tokio::test]
    async fn purge_removes_only_records_older_than_cutoff() {
        let store = InMemoryJobStore::new();
        store.insert_record(aged("https://a.com/expired", Duration::days(61))).unwrap();
        store.insert_record(aged("https://a.com/fresh", Duration::days(59))).unwrap();

        let cutoff = Utc::now() - jobboard_core::retention_window();
        assert_eq!(store.purge_expired(cutoff).await.unwrap(), 1);

        let page = store.list(PageRequest::default()).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.jobs[0].apply_url, "https://a.com/fresh");

        // The purged URL is free again.
        let out = store
            .bulk_insert(vec![NewJob::new("again", "https://a.com/expired")])
            .await
            .unwrap();
        assert_eq!(out.added, 1);
    }

    #[test]
    fn poisoned_lock_is_a_store_error() {
        let store = std::sync::Arc::new(InMemoryJobStore::new());
        let poisoner = std::sync::Arc::clone(&store);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.inner.write().unwrap();
            panic!("poison the lock");
        })
        .join();

        assert!(matches!(store.record_count(), Err(StoreError::Backend(_))));
        assert!(store.insert_record(aged("https://a.com/1", Duration::days(1))).is_err());
    }

    #[test]
    fn insert_record_rejects_known_url() {
        let store = InMemoryJobStore::new();
        assert!(store.insert_record(aged("https://a.com/1", Duration::days(1))).unwrap());
        assert!(!store.insert_record(aged("https://a.com/1", Duration::days(2))).unwrap());
        assert_eq!(store.record_count().unwrap(), 1);
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 64,
            ..ProptestConfig::default()
        })]

        /// Property: every batch splits exactly into added + skipped, and the
        /// store grows by `added`.
        #[test]
        fn added_plus_skipped_is_batch_size(
            batches in prop::collection::vec(prop::collection::vec(0u8..20, 0..15), 1..6)
        ) {
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let store = InMemoryJobStore::new();
            let mut expected_total = 0usize;

            for batch in batches {
                let jobs: Vec<_> = batch.iter().map(|n| job(*n as usize)).collect();
                let submitted = jobs.len();
                let out = rt.block_on(store.bulk_insert(jobs)).unwrap();
                prop_assert_eq!(out.added + out.skipped, submitted);
                expected_total += out.added;
                prop_assert_eq!(store.record_count().unwrap(), expected_total);
            }
        }

        /// Property: a page never exceeds `limit`, and `pages == ceil(total / limit)`.
        #[test]
        fn pages_respect_limit(count in 0usize..40, page in 1i64..10, limit in 1i64..12) {
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let store = InMemoryJobStore::new();
            rt.block_on(store.bulk_insert((0..count).map(job).collect())).unwrap();

            let out = rt.block_on(store.list(PageRequest::new(Some(page), Some(limit)))).unwrap();
            prop_assert!(out.jobs.len() as i64 <= limit);
            prop_assert_eq!(out.total, count as u64);
            prop_assert_eq!(out.pages, (count as u64).div_ceil(limit as u64));
        }
    }
}
