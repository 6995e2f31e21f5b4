use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use jobboard_infra::StoreError;

/// The only failure message clients ever see for unexpected errors.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

pub fn json_error(status: StatusCode, message: impl Into<String>) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": message.into(),
        })),
    )
        .into_response()
}

/// Log `err` with the failing operation and answer with a generic 500.
pub fn internal_error(operation: &'static str, err: impl std::fmt::Display) -> axum::response::Response {
    tracing::error!(operation, error = %err, "request failed");
    json_error(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MESSAGE)
}

/// Every store failure is fatal for the request only; the cause stays server-side.
pub fn store_error_to_response(operation: &'static str, err: StoreError) -> axum::response::Response {
    match &err {
        StoreError::Unavailable(_) => {
            tracing::warn!(operation, "job store unavailable");
        }
        StoreError::Corrupt(_) => {
            tracing::warn!(operation, "job store returned an undecodable record");
        }
        StoreError::Backend(_) => {}
    }
    internal_error(operation, err)
}
