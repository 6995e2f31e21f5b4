//! Job record domain types.
//!
//! A job posting arrives as a [`NewJob`] (caller-supplied fields only) and is
//! persisted as a [`JobRecord`] once the store has assigned its identity and
//! timestamps. Records are never mutated after insert; they only expire.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::id::JobId;

/// Days a record is kept after `created_at` before the retention sweep removes it.
pub const RETENTION_WINDOW_DAYS: i64 = 60;

/// The fixed retention window as a duration.
pub fn retention_window() -> Duration {
    Duration::days(RETENTION_WINDOW_DAYS)
}

/// A job posting as submitted by a caller.
///
/// Unknown fields are ignored. `job_title` and `apply_url` are required and
/// must not be blank; see [`NewJob::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewJob {
    pub job_title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_description: Option<String>,
    pub apply_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_image: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_date_posted",
        skip_serializing_if = "Option::is_none"
    )]
    pub date_posted: Option<DateTime<Utc>>,
}

impl NewJob {
    pub fn new(job_title: impl Into<String>, apply_url: impl Into<String>) -> Self {
        Self {
            job_title: job_title.into(),
            job_description: None,
            apply_url: apply_url.into(),
            company_image: None,
            date_posted: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.job_description = Some(description.into());
        self
    }

    pub fn with_company_image(mut self, url: impl Into<String>) -> Self {
        self.company_image = Some(url.into());
        self
    }

    pub fn with_date_posted(mut self, at: DateTime<Utc>) -> Self {
        self.date_posted = Some(at);
        self
    }

    /// Decode and validate one element of a submitted batch.
    pub fn from_value(value: serde_json::Value) -> DomainResult<Self> {
        let job: NewJob = serde_json::from_value(value)
            .map_err(|e| DomainError::validation(e.to_string()))?;
        job.validate()?;
        Ok(job)
    }

    /// Required-field validation.
    pub fn validate(&self) -> DomainResult<()> {
        if self.job_title.trim().is_empty() {
            return Err(DomainError::validation("job_title must not be blank"));
        }
        if self.apply_url.trim().is_empty() {
            return Err(DomainError::validation("apply_url must not be blank"));
        }
        Ok(())
    }
}

/// A persisted job record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: JobId,
    pub job_title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_description: Option<String>,
    pub apply_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_image: Option<String>,
    pub date_posted: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JobRecord {
    /// Materialize a submitted job at insert time `now`.
    ///
    /// `date_posted` defaults to the creation time when the caller omitted it.
    pub fn from_new(job: NewJob, now: DateTime<Utc>) -> Self {
        Self {
            id: JobId::new(),
            date_posted: job.date_posted.unwrap_or(now),
            job_title: job.job_title,
            job_description: job.job_description,
            apply_url: job.apply_url,
            company_image: job.company_image,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the record falls outside the retention window ending at `cutoff`.
    pub fn is_expired(&self, cutoff: DateTime<Utc>) -> bool {
        self.created_at < cutoff
    }
}

/// Accepts RFC 3339 timestamps, plain `YYYY-MM-DD` dates (midnight UTC) and
/// epoch milliseconds, the forms JavaScript clients commonly send.
fn deserialize_date_posted<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Millis(i64),
    }

    let raw: Option<Raw> = Option::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(Raw::Millis(ms)) => DateTime::<Utc>::from_timestamp_millis(ms)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom("date_posted is out of range")),
        Some(Raw::Text(s)) => {
            if let Ok(dt) = DateTime::parse_from_rfc3339(s.trim()) {
                return Ok(Some(dt.with_timezone(&Utc)));
            }
            NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|naive| Some(naive.and_utc()))
                .ok_or_else(|| serde::de::Error::custom(format!("date_posted is not a valid date: {s}")))
        }
    }
}
