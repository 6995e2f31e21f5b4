use axum::{routing::get, Router};

pub mod jobs;
pub mod system;

/// Router for every endpoint; the caller nests it under the configured prefix.
pub fn router() -> Router {
    Router::new()
        .route("/jobs", get(jobs::list_jobs).post(jobs::create_jobs))
        .route("/ping", get(system::ping))
        .route("/health", get(system::health))
}
