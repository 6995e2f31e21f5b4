use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};

use crate::app::dto::HealthResponse;
use crate::app::services::AppServices;

/// Liveness probe.
pub async fn ping() -> &'static str {
    "pong"
}

/// Readiness probe: the store must answer a round trip.
pub async fn health(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match services.store().health().await {
        Ok(()) => (StatusCode::OK, Json(HealthResponse::ok())).into_response(),
        Err(e) => {
            tracing::warn!(backend = services.backend(), error = %e, "health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, Json(HealthResponse::unavailable())).into_response()
        }
    }
}
