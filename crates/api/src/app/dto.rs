use serde::{Deserialize, Serialize};
use serde_json::Value;

use jobboard_core::NewJob;
use jobboard_infra::job_store::{InsertOutcome, PageRequest};

// -------------------------
// Request DTOs
// -------------------------

/// Raw `GET /jobs` query parameters.
///
/// Kept as strings so that malformed values fall back to defaults. A repeated
/// key keeps its first value.
#[derive(Debug, Default)]
pub struct ListJobsQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl ListJobsQuery {
    /// Build from decoded query pairs, in request order.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut query = Self::default();
        for (key, value) in pairs {
            match key.as_str() {
                "page" if query.page.is_none() => query.page = Some(value),
                "limit" if query.limit.is_none() => query.limit = Some(value),
                _ => {}
            }
        }
        query
    }

    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(
            self.page.as_deref().and_then(parse_int_prefix),
            self.limit.as_deref().and_then(parse_int_prefix),
        )
    }
}

/// Lenient integer parsing: leading whitespace, an optional sign, then the
/// longest run of ASCII digits. Anything after the digits is ignored.
///
/// `"3abc"` → `Some(3)`, `" -2"` → `Some(-2)`, `"abc"` → `None`.
pub fn parse_int_prefix(raw: &str) -> Option<i64> {
    let s = raw.trim_start();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }

    // Saturate rather than fail on absurdly long inputs.
    let magnitude = rest[..digits].parse::<i64>().unwrap_or(i64::MAX);
    Some(if negative { -magnitude } else { magnitude })
}

/// A `POST /jobs` body split into insertable jobs and per-record rejections.
#[derive(Debug, Default)]
pub struct JobBatch {
    pub submitted: usize,
    pub jobs: Vec<NewJob>,
    pub rejected: Vec<RejectedJob>,
}

impl JobBatch {
    /// Accepts either a single job object or an array of them.
    pub fn from_body(body: Value) -> Self {
        let items = match body {
            Value::Array(items) => items,
            single => vec![single],
        };

        let mut batch = JobBatch {
            submitted: items.len(),
            ..JobBatch::default()
        };

        for (index, item) in items.into_iter().enumerate() {
            let apply_url = item
                .get("apply_url")
                .and_then(Value::as_str)
                .map(str::to_owned);

            match NewJob::from_value(item) {
                Ok(job) => batch.jobs.push(job),
                Err(e) => batch.rejected.push(RejectedJob {
                    index,
                    apply_url,
                    reason: e.to_string(),
                }),
            }
        }

        batch
    }
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedJob {
    /// Position in the submitted batch (0 for a single object).
    pub index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apply_url: Option<String>,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkInsertResponse {
    pub added: usize,
    /// Duplicates and rejected records together.
    pub skipped: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rejected: Vec<RejectedJob>,
}

impl BulkInsertResponse {
    pub fn new(submitted: usize, outcome: InsertOutcome, rejected: Vec<RejectedJob>) -> Self {
        Self {
            added: outcome.added,
            skipped: submitted.saturating_sub(outcome.added),
            rejected,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self { status: "ok".to_string() }
    }

    pub fn unavailable() -> Self {
        Self {
            status: "unavailable".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn int_prefix_parsing() {
        assert_eq!(parse_int_prefix("3"), Some(3));
        assert_eq!(parse_int_prefix("3abc"), Some(3));
        assert_eq!(parse_int_prefix("  7 "), Some(7));
        assert_eq!(parse_int_prefix("-2"), Some(-2));
        assert_eq!(parse_int_prefix("+4"), Some(4));
        assert_eq!(parse_int_prefix("2.9"), Some(2));
        assert_eq!(parse_int_prefix("abc"), None);
        assert_eq!(parse_int_prefix(""), None);
        assert_eq!(parse_int_prefix("-"), None);
        assert_eq!(parse_int_prefix("99999999999999999999999"), Some(i64::MAX));
    }

    #[test]
    fn malformed_query_falls_back_to_defaults() {
        let q = ListJobsQuery {
            page: Some("abc".into()),
            limit: Some("-5".into()),
        };
        let req = q.page_request();
        assert_eq!(req.page(), 1);
        assert_eq!(req.limit(), 100);

        let req = ListJobsQuery::default().page_request();
        assert_eq!((req.page(), req.limit()), (1, 100));
    }

    #[test]
    fn query_prefix_values_are_used() {
        let q = ListJobsQuery {
            page: Some("2x".into()),
            limit: Some("10".into()),
        };
        let req = q.page_request();
        assert_eq!((req.page(), req.limit()), (2, 10));
        assert_eq!(req.offset(), 10);
    }

    #[test]
    fn repeated_keys_keep_the_first_value() {
        let q = ListJobsQuery::from_pairs(vec![
            ("page".into(), "1".into()),
            ("page".into(), "2".into()),
            ("limit".into(), "5".into()),
            ("sort".into(), "asc".into()),
            ("limit".into(), "50".into()),
        ]);
        assert_eq!(q.page.as_deref(), Some("1"));
        assert_eq!(q.limit.as_deref(), Some("5"));
        let req = q.page_request();
        assert_eq!((req.page(), req.limit()), (1, 5));
    }

    #[test]
    fn single_object_body_is_a_batch_of_one() {
        let batch = JobBatch::from_body(json!({ "job_title": "A", "apply_url": "https://a.com/1" }));
        assert_eq!(batch.submitted, 1);
        assert_eq!(batch.jobs.len(), 1);
        assert!(batch.rejected.is_empty());
    }

    #[test]
    fn invalid_records_are_rejected_with_their_index() {
        let batch = JobBatch::from_body(json!([
            { "job_title": "A", "apply_url": "https://a.com/1" },
            { "job_title": "", "apply_url": "https://a.com/2" },
            { "job_title": "C" },
            "not a job",
        ]));
        assert_eq!(batch.submitted, 4);
        assert_eq!(batch.jobs.len(), 1);

        let indexes: Vec<_> = batch.rejected.iter().map(|r| r.index).collect();
        assert_eq!(indexes, vec![1, 2, 3]);
        assert_eq!(batch.rejected[0].apply_url.as_deref(), Some("https://a.com/2"));
        assert_eq!(batch.rejected[1].apply_url, None);
    }

    #[test]
    fn empty_array_is_an_empty_batch() {
        let batch = JobBatch::from_body(json!([]));
        assert_eq!(batch.submitted, 0);
        assert!(batch.jobs.is_empty());
    }

    #[test]
    fn response_counts_rejections_as_skipped() {
        let rejected = vec![RejectedJob {
            index: 2,
            apply_url: None,
            reason: "validation error: job_title must not be blank".into(),
        }];
        let resp = BulkInsertResponse::new(3, InsertOutcome::new(2, 1), rejected);
        assert_eq!(resp.added, 1);
        assert_eq!(resp.skipped, 2);

        let v = serde_json::to_value(&resp).unwrap();
        assert_eq!(v["rejected"][0]["index"], 2);
        assert!(v["rejected"][0].get("apply_url").is_none());
    }

    #[test]
    fn response_omits_empty_rejections() {
        let resp = BulkInsertResponse::new(2, InsertOutcome::new(2, 2), Vec::new());
        assert_eq!(
            serde_json::to_value(&resp).unwrap(),
            json!({ "added": 2, "skipped": 0 })
        );
    }
}
