//! Cross-cutting HTTP layers.

use axum::http::Method;
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};

/// Largest accepted request body (bulk submissions included).
pub const BODY_LIMIT_BYTES: usize = 5 * 1024 * 1024;

/// Permissive CORS: any origin is echoed back and credentials are allowed.
///
/// A wildcard origin cannot be combined with credentials, so the request's
/// own `Origin` and requested headers are mirrored instead.
pub fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(AllowHeaders::mirror_request())
}
