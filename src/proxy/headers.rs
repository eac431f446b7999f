//! Response header policy.
//!
//! Holds the permissive CORS header set attached to every response,
//! content-type selection for relayed bodies, and correlation id
//! extraction for request logging.

use axum::http::{header, HeaderMap, HeaderName, HeaderValue};

pub const CORS_HEADERS: [(HeaderName, &str); 3] = [
    (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
    (header::ACCESS_CONTROL_ALLOW_METHODS, "GET,OPTIONS"),
    (header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type"),
];

pub const DEFAULT_CONTENT_TYPE: &str = "application/json";

const CORRELATION_HEADER: &str = "x-correlation-id";

/// Upstream content type if present and non-empty, JSON otherwise.
#[must_use]
pub fn relay_content_type(upstream: &HeaderMap) -> HeaderValue {
    upstream
        .get(header::CONTENT_TYPE)
        .filter(|v| !v.is_empty())
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static(DEFAULT_CONTENT_TYPE))
}

/// Caller-supplied correlation id, or a fresh UUID v4.
#[must_use]
pub fn correlation_id(headers: &HeaderMap) -> String {
    headers
        .get(CORRELATION_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map_or_else(|| uuid::Uuid::new_v4().to_string(), String::from)
}
