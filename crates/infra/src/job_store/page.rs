//! Pagination window for job listings.

use serde::{Deserialize, Serialize};

use jobboard_core::JobRecord;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 100;

/// A normalized page request (`page` and `limit` are always >= 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    page: u32,
    limit: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl PageRequest {
    /// Normalize raw parameters: absent or non-positive values fall back to
    /// the defaults, values beyond `u32::MAX` saturate.
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        fn positive(v: Option<i64>, default: u32) -> u32 {
            match v {
                Some(v) if v >= 1 => u32::try_from(v).unwrap_or(u32::MAX),
                _ => default,
            }
        }

        Self {
            page: positive(page, DEFAULT_PAGE),
            limit: positive(limit, DEFAULT_LIMIT),
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Number of records skipped before this page: `(page - 1) * limit`.
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }

    /// `ceil(total / limit)`.
    pub fn pages(&self, total: u64) -> u64 {
        total.div_ceil(u64::from(self.limit))
    }
}

/// One page of jobs, newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobPage {
    pub jobs: Vec<JobRecord>,
    /// Count of all stored records, not just this page.
    pub total: u64,
    pub page: u32,
    pub pages: u64,
}

impl JobPage {
    pub fn new(request: PageRequest, jobs: Vec<JobRecord>, total: u64) -> Self {
        Self {
            jobs,
            total,
            page: request.page(),
            pages: request.pages(total),
        }
    }
}
