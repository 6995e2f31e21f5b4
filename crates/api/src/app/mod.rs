//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: store wiring and the retention sweeper
//! - `routes/`: HTTP routes + handlers
//! - `dto.rs`: request/response DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{extract::DefaultBodyLimit, Extension, Router};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

use services::AppServices;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
///
/// `prefix` is either empty or a normalized `/segment` path under which all
/// routes are nested.
pub fn build_app(services: Arc<AppServices>, prefix: &str) -> Router {
    let routes = routes::router();
    let routes = if prefix.is_empty() {
        routes
    } else {
        Router::new().nest(prefix, routes)
    };

    routes.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(middleware::cors())
            .layer(DefaultBodyLimit::max(middleware::BODY_LIMIT_BYTES))
            .layer(Extension(services)),
    )
}
