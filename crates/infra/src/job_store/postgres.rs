//! Postgres-backed job store implementation.
//!
//! ## Connection handle
//!
//! [`PgConnector`] owns the connection pool and establishes it lazily, at
//! most once, behind a single `tokio::sync::OnceCell`. Concurrent first
//! requests wait on the same initialization; a failed attempt is not cached,
//! so the next request retries. Table and index creation runs inside that
//! one-time initialization.
//!
//! ## Dedup
//!
//! The `UNIQUE (apply_url)` constraint is the sole arbiter of duplicates.
//! `bulk_insert` first looks up which submitted URLs already exist (one
//! round trip) so known duplicates never reach the insert, then inserts the
//! remainder with `ON CONFLICT (apply_url) DO NOTHING`. Rows that lose a race
//! against a concurrent writer, or repeat a URL earlier in the same batch, are
//! simply not returned by `RETURNING` and count as skipped.
//!
//! ## Error Mapping
//!
//! | SQLx Error | StoreError |
//! |------------|------------|
//! | Database (any SQLSTATE) | `Backend` |
//! | PoolClosed / PoolTimedOut / Io / Tls | `Unavailable` |
//! | ColumnDecode / Decode / ColumnNotFound | `Corrupt` |
//! | Other | `Backend` |

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, FromRow, PgPool, Row};
use tokio::sync::OnceCell;
use tracing::instrument;
use uuid::Uuid;

use jobboard_core::{JobId, JobRecord, NewJob};

use super::page::{JobPage, PageRequest};
use super::r#trait::{InsertOutcome, JobStore, StoreError};

const CREATE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS jobs (
    id              UUID PRIMARY KEY,
    job_title       TEXT NOT NULL,
    job_description TEXT,
    apply_url       TEXT NOT NULL,
    company_image   TEXT,
    date_posted     TIMESTAMPTZ NOT NULL,
    created_at      TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at      TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    CONSTRAINT jobs_apply_url_key UNIQUE (apply_url)
)
"#;

const CREATE_LISTING_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS jobs_created_at_idx ON jobs (created_at DESC, id DESC)";

const JOB_COLUMNS: &str =
    "id, job_title, job_description, apply_url, company_image, date_posted, created_at, updated_at";

/// Lazily-established, process-wide Postgres pool.
#[derive(Debug)]
pub struct PgConnector {
    url: String,
    max_connections: u32,
    pool: OnceCell<PgPool>,
}

impl PgConnector {
    pub fn new(url: impl Into<String>, max_connections: u32) -> Self {
        Self {
            url: url.into(),
            max_connections,
            pool: OnceCell::new(),
        }
    }

    /// The shared pool, connecting and preparing the schema on first use.
    pub async fn pool(&self) -> Result<&PgPool, StoreError> {
        self.pool
            .get_or_try_init(|| async {
                let pool = PgPoolOptions::new()
                    .max_connections(self.max_connections)
                    .connect(&self.url)
                    .await
                    .map_err(|e| map_sqlx_error("connect", e))?;
                ensure_schema(&pool).await?;
                tracing::info!(max_connections = self.max_connections, "connected to postgres");
                Ok(pool)
            })
            .await
    }

    pub fn is_connected(&self) -> bool {
        self.pool.initialized()
    }
}

/// Create the `jobs` table and its listing index if they do not exist.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), StoreError> {
    sqlx::query(CREATE_TABLE)
        .execute(pool)
        .await
        .map_err(|e| map_sqlx_error("create_table", e))?;
    sqlx::query(CREATE_LISTING_INDEX)
        .execute(pool)
        .await
        .map_err(|e| map_sqlx_error("create_index", e))?;
    Ok(())
}

/// Postgres-backed job store.
///
/// `Send + Sync`; share it behind an `Arc`. Every operation goes through the
/// connector, so the first request pays the connection cost.
#[derive(Debug)]
pub struct PostgresJobStore {
    connector: PgConnector,
}

impl PostgresJobStore {
    pub fn new(connector: PgConnector) -> Self {
        Self { connector }
    }

    pub fn connector(&self) -> &PgConnector {
        &self.connector
    }

    /// Which of `urls` are already stored (single round trip).
    async fn existing_urls(&self, pool: &PgPool, urls: &[String]) -> Result<HashSet<String>, StoreError> {
        let rows = sqlx::query("SELECT apply_url FROM jobs WHERE apply_url = ANY($1)")
            .bind(urls)
            .fetch_all(pool)
            .await
            .map_err(|e| map_sqlx_error("existing_urls", e))?;

        rows.into_iter()
            .map(|row| {
                row.try_get::<String, _>("apply_url")
                    .map_err(|e| map_sqlx_error("existing_urls", e))
            })
            .collect()
    }

    /// Insert the batch in one statement; returns the number of rows written.
    async fn insert_batch(&self, pool: &PgPool, records: &[JobRecord]) -> Result<u64, sqlx::Error> {
        let ids: Vec<Uuid> = records.iter().map(|r| *r.id.as_uuid()).collect();
        let titles: Vec<&str> = records.iter().map(|r| r.job_title.as_str()).collect();
        let descriptions: Vec<Option<&str>> =
            records.iter().map(|r| r.job_description.as_deref()).collect();
        let urls: Vec<&str> = records.iter().map(|r| r.apply_url.as_str()).collect();
        let images: Vec<Option<&str>> = records.iter().map(|r| r.company_image.as_deref()).collect();
        let posted: Vec<DateTime<Utc>> = records.iter().map(|r| r.date_posted).collect();
        let created: Vec<DateTime<Utc>> = records.iter().map(|r| r.created_at).collect();
        let updated: Vec<DateTime<Utc>> = records.iter().map(|r| r.updated_at).collect();

        let rows = sqlx::query(
            r#"
            INSERT INTO jobs (
                id,
                job_title,
                job_description,
                apply_url,
                company_image,
                date_posted,
                created_at,
                updated_at
            )
            SELECT * FROM UNNEST(
                $1::uuid[],
                $2::text[],
                $3::text[],
                $4::text[],
                $5::text[],
                $6::timestamptz[],
                $7::timestamptz[],
                $8::timestamptz[]
            )
            ON CONFLICT (apply_url) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(&ids)
        .bind(&titles)
        .bind(&descriptions)
        .bind(&urls)
        .bind(&images)
        .bind(&posted)
        .bind(&created)
        .bind(&updated)
        .fetch_all(pool)
        .await?;

        Ok(rows.len() as u64)
    }

    /// Row-at-a-time fallback used when the batch statement as a whole is
    /// rejected. A record the database refuses is logged and skipped; an
    /// unreachable backend still fails the call.
    async fn insert_each(&self, pool: &PgPool, records: &[JobRecord]) -> Result<u64, StoreError> {
        let mut added = 0;
        for record in records {
            let result = sqlx::query(
                r#"
                INSERT INTO jobs (
                    id,
                    job_title,
                    job_description,
                    apply_url,
                    company_image,
                    date_posted,
                    created_at,
                    updated_at
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                ON CONFLICT (apply_url) DO NOTHING
                "#,
            )
            .bind(record.id.as_uuid())
            .bind(&record.job_title)
            .bind(&record.job_description)
            .bind(&record.apply_url)
            .bind(&record.company_image)
            .bind(record.date_posted)
            .bind(record.created_at)
            .bind(record.updated_at)
            .execute(pool)
            .await;

            match result {
                Ok(done) => added += done.rows_affected(),
                Err(sqlx::Error::Database(db_err)) => {
                    tracing::warn!(
                        apply_url = %record.apply_url,
                        error = %db_err.message(),
                        "job insert rejected; skipping record"
                    );
                }
                Err(e) => return Err(map_sqlx_error("insert_job", e)),
            }
        }
        Ok(added)
    }
}

#[async_trait::async_trait]
impl JobStore for PostgresJobStore {
    #[instrument(skip(self), fields(page = request.page(), limit = request.limit()), err)]
    async fn list(&self, request: PageRequest) -> Result<JobPage, StoreError> {
        let pool = self.connector.pool().await?;

        let select = format!(
            "SELECT {JOB_COLUMNS} FROM jobs ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2"
        );
        let rows = sqlx::query(&select)
            .bind(i64::from(request.limit()))
            .bind(i64::try_from(request.offset()).unwrap_or(i64::MAX))
            .fetch_all(pool);
        let count = sqlx::query("SELECT COUNT(*) AS total FROM jobs").fetch_one(pool);

        let (rows, count) = tokio::try_join!(rows, count).map_err(|e| map_sqlx_error("list_jobs", e))?;

        let total: i64 = count
            .try_get("total")
            .map_err(|e| map_sqlx_error("count_jobs", e))?;

        let mut jobs = Vec::with_capacity(rows.len());
        for row in rows {
            let job = JobRow::from_row(&row)
                .map_err(|e| StoreError::Corrupt(format!("failed to decode job row: {e}")))?;
            jobs.push(job.into());
        }

        Ok(JobPage::new(request, jobs, total.max(0) as u64))
    }

    #[instrument(skip(self, jobs), fields(submitted = jobs.len()), err)]
    async fn bulk_insert(&self, jobs: Vec<NewJob>) -> Result<InsertOutcome, StoreError> {
        let submitted = jobs.len();
        if submitted == 0 {
            return Ok(InsertOutcome::default());
        }

        let pool = self.connector.pool().await?;

        let urls: Vec<String> = jobs.iter().map(|j| j.apply_url.clone()).collect();
        let existing = self.existing_urls(pool, &urls).await?;

        // In-batch repeats are left to the uniqueness constraint.
        let now = Utc::now();
        let candidates: Vec<JobRecord> = jobs
            .into_iter()
            .filter(|j| !existing.contains(&j.apply_url))
            .map(|j| JobRecord::from_new(j, now))
            .collect();

        if candidates.is_empty() {
            return Ok(InsertOutcome::new(submitted, 0));
        }

        let added = match self.insert_batch(pool, &candidates).await {
            Ok(n) => n,
            Err(sqlx::Error::Database(db_err)) => {
                tracing::warn!(
                    error = %db_err.message(),
                    candidates = candidates.len(),
                    "batch insert rejected; retrying row by row"
                );
                self.insert_each(pool, &candidates).await?
            }
            Err(e) => return Err(map_sqlx_error("insert_batch", e)),
        };

        Ok(InsertOutcome::new(submitted, added as usize))
    }

    #[instrument(skip(self), err)]
    async fn purge_expired(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError> {
        let pool = self.connector.pool().await?;
        let done = sqlx::query("DELETE FROM jobs WHERE created_at < $1")
            .bind(cutoff)
            .execute(pool)
            .await
            .map_err(|e| map_sqlx_error("purge_expired", e))?;
        Ok(done.rows_affected())
    }

    async fn health(&self) -> Result<(), StoreError> {
        let pool = self.connector.pool().await?;
        sqlx::query("SELECT 1")
            .execute(pool)
            .await
            .map_err(|e| map_sqlx_error("health", e))?;
        Ok(())
    }
}

/// Map SQLx errors to store errors.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let code = db_err.code().map(|c| c.to_string()).unwrap_or_default();
            StoreError::Backend(format!(
                "database error in {operation} ({code}): {}",
                db_err.message()
            ))
        }
        sqlx::Error::PoolClosed => {
            StoreError::Unavailable(format!("connection pool closed in {operation}"))
        }
        sqlx::Error::PoolTimedOut => {
            StoreError::Unavailable(format!("connection pool timed out in {operation}"))
        }
        sqlx::Error::Io(e) => StoreError::Unavailable(format!("i/o error in {operation}: {e}")),
        sqlx::Error::Tls(e) => StoreError::Unavailable(format!("tls error in {operation}: {e}")),
        e @ (sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::ColumnNotFound(_)) => {
            StoreError::Corrupt(format!("decode error in {operation}: {e}"))
        }
        other => StoreError::Backend(format!("sqlx error in {operation}: {other}")),
    }
}

// SQLx row types

#[derive(Debug)]
struct JobRow {
    id: Uuid,
    job_title: String,
    job_description: Option<String>,
    apply_url: String,
    company_image: Option<String>,
    date_posted: DateTime<Utc>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for JobRow {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(JobRow {
            id: row.try_get("id")?,
            job_title: row.try_get("job_title")?,
            job_description: row.try_get("job_description")?,
            apply_url: row.try_get("apply_url")?,
            company_image: row.try_get("company_image")?,
            date_posted: row.try_get("date_posted")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl From<JobRow> for JobRecord {
    fn from(row: JobRow) -> Self {
        JobRecord {
            id: JobId::from_uuid(row.id),
            job_title: row.job_title,
            job_description: row.job_description,
            apply_url: row.apply_url,
            company_image: row.company_image,
            date_posted: row.date_posted,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
