use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Extension, Query},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::Value;

use crate::app::dto::{BulkInsertResponse, JobBatch, ListJobsQuery};
use crate::app::errors;
use crate::app::services::AppServices;

pub async fn list_jobs(
    Extension(services): Extension<Arc<AppServices>>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> axum::response::Response {
    let query = match query {
        Ok(Query(pairs)) => ListJobsQuery::from_pairs(pairs),
        Err(e) => return errors::internal_error("list_jobs", e),
    };

    match services.store().list(query.page_request()).await {
        Ok(page) => (StatusCode::OK, Json(page)).into_response(),
        Err(e) => errors::store_error_to_response("list_jobs", e),
    }
}

pub async fn create_jobs(
    Extension(services): Extension<Arc<AppServices>>,
    body: Bytes,
) -> axum::response::Response {
    let body: Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            tracing::debug!(error = %e, "rejecting non-JSON body");
            return errors::json_error(StatusCode::BAD_REQUEST, "Invalid JSON body");
        }
    };

    let batch = JobBatch::from_body(body);
    if !batch.rejected.is_empty() {
        tracing::info!(rejected = batch.rejected.len(), "records failed validation");
    }

    let JobBatch {
        submitted,
        jobs,
        rejected,
    } = batch;

    match services.store().bulk_insert(jobs).await {
        Ok(outcome) => {
            tracing::info!(submitted, added = outcome.added, "bulk insert completed");
            (
                StatusCode::OK,
                Json(BulkInsertResponse::new(submitted, outcome, rejected)),
            )
                .into_response()
        }
        Err(e) => errors::store_error_to_response("create_jobs", e),
    }
}
