//! Unified error types for fmp-relay.
//!
//! [`RelayError`] covers process-level failures (route files, addresses,
//! IO, the `health` subcommand). [`ProxyError`] covers request-level
//! failures and renders itself as the JSON error bodies callers see.
//! [`ValidationError`] reports route-table problems with a hint.

use std::path::PathBuf;

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub route: String,
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "  route {}: {}: {}", self.route, self.field, self.message)?;
        if let Some(ref suggestion) = self.suggestion {
            write!(f, " ({suggestion})")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

fn format_errors(errors: &[ValidationError]) -> String {
    use std::fmt::Write;
    let mut buf = String::new();
    for (i, e) in errors.iter().enumerate() {
        if i > 0 {
            buf.push('\n');
        }
        // write! to String is infallible (only fails on OOM which is unrecoverable)
        let _ = write!(buf, "{e}");
    }
    buf
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum RelayError {
    #[error("Route file not found: {}", path.display())]
    RouteFileNotFound { path: PathBuf },

    #[error("Route file parse error in {path}:\n  {source}")]
    RouteFileParse {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Route table validation failed:\n{}", format_errors(.errors))]
    RouteValidation { errors: Vec<ValidationError> },

    #[error("Unsupported route file format: '{0}'")]
    UnsupportedFormat(String),

    #[error("Invalid address: {0}")]
    AddressParse(#[from] std::net::AddrParseError),

    #[error("Invalid upstream base URL '{url}': {reason}")]
    BaseUrl { url: String, reason: String },

    #[error("Invalid URI: {source}")]
    UriParse {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("HTTP request failed: {source}")]
    HttpRequest {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("File already exists: {}", path.display())]
    FileExists { path: PathBuf },

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("Health check failed with status {0}")]
    HealthCheckFailed(hyper::StatusCode),
}

/// Request-level failure, rendered as a JSON body with the matching status.
///
/// None of these variants ever carries the API key. [`ProxyError::Upstream`]
/// details are redacted by the forwarder before construction.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("{param} is required")]
    MissingParam { param: String },

    #[error("Missing {var} env var")]
    MissingApiKey { var: String },

    #[error("Not Found")]
    NotFound { path: String, routes: Vec<String> },

    #[error("Method Not Allowed")]
    MethodNotAllowed,

    #[error("Invalid upstream URL")]
    InvalidUpstreamUrl,

    #[error("Internal error")]
    Internal,

    #[error("Upstream error")]
    Upstream { detail: String },
}

impl ProxyError {
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::MissingParam { .. } => StatusCode::BAD_REQUEST,
            Self::MissingApiKey { .. } | Self::InvalidUpstreamUrl | Self::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::Upstream { .. } => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            Self::NotFound { path, routes } => json!({
                "error": self.to_string(),
                "path": path,
                "routes": routes,
            }),
            Self::Upstream { detail } => json!({
                "error": self.to_string(),
                "detail": detail,
            }),
            _ => json!({ "error": self.to_string() }),
        };

        let mut response = (status, Json(body)).into_response();
        if matches!(self, Self::MethodNotAllowed) {
            response
                .headers_mut()
                .insert(header::ALLOW, HeaderValue::from_static("GET, OPTIONS"));
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_param_message_names_the_param() {
        let err = ProxyError::MissingParam {
            param: "symbol".into(),
        };
        assert_eq!(err.to_string(), "symbol is required");
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn missing_key_message_names_the_var() {
        let err = ProxyError::MissingApiKey {
            var: "FMP_API_KEY".into(),
        };
        assert_eq!(err.to_string(), "Missing FMP_API_KEY env var");
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn method_not_allowed_sets_allow_header() {
        let response = ProxyError::MethodNotAllowed.into_response();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[header::ALLOW], "GET, OPTIONS");
    }

    #[test]
    fn validation_error_display_includes_suggestion() {
        let err = ValidationError {
            route: "quote".into(),
            field: "path".into(),
            message: "must start with '/'".into(),
            suggestion: Some("did you mean '/quote'?".into()),
        };
        assert_eq!(
            err.to_string(),
            "  route quote: path: must start with '/' (did you mean '/quote'?)"
        );
    }
}
