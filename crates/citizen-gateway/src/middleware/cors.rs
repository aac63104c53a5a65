//! CORS for browser clients, on tower-http.

use crate::domain::CorsConfig;
use axum::http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, ORIGIN};
use axum::http::{HeaderName, Method};
use tower_http::cors::{Any, CorsLayer};

const X_REQUESTED_WITH: HeaderName = HeaderName::from_static("x-requested-with");

const ALLOWED_METHODS: [Method; 5] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::DELETE,
    Method::OPTIONS,
];

/// Any origin, the citizen API methods, and the headers browser clients send.
pub fn create_cors_layer(config: &CorsConfig) -> CorsLayer {
    if !config.enabled {
        // No CORS headers; browsers fall back to same-origin.
        return CorsLayer::new();
    }

    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(ALLOWED_METHODS.to_vec())
        .allow_headers([ORIGIN, X_REQUESTED_WITH, AUTHORIZATION, CONTENT_TYPE, ACCEPT])
}
