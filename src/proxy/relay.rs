//! Single upstream call and verbatim relay of its response.
//!
//! [`fetch`] issues one GET and collects the body as raw bytes.
//! [`RelayedResponse`] copies status, content type and body onto the
//! outbound response without parsing anything.

use std::time::{Duration, Instant};

use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use http_body_util::{BodyExt, Full};

use crate::server::HttpClient;

use super::headers::relay_content_type;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

const USER_AGENT: &str = concat!("fmp-relay/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub latency_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayedResponse {
    pub status: StatusCode,
    pub content_type: HeaderValue,
    pub body: Bytes,
}

impl From<UpstreamResponse> for RelayedResponse {
    fn from(upstream: UpstreamResponse) -> Self {
        Self {
            status: upstream.status,
            content_type: relay_content_type(&upstream.headers),
            body: upstream.body,
        }
    }
}

impl IntoResponse for RelayedResponse {
    fn into_response(self) -> Response {
        (
            self.status,
            [(header::CONTENT_TYPE, self.content_type)],
            self.body,
        )
            .into_response()
    }
}

/// Transport-level failure: the upstream never produced a full response.
#[derive(Debug, thiserror::Error)]
#[error("{}", error_chain(.source.as_ref()))]
pub struct FetchError {
    #[source]
    source: BoxError,
}

impl FetchError {
    fn new(source: impl Into<BoxError>) -> Self {
        Self {
            source: source.into(),
        }
    }
}

/// Render an error and all of its sources as `outer: inner: root`.
#[must_use]
pub fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut rendered = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !rendered.ends_with(&text) {
            rendered.push_str(": ");
            rendered.push_str(&text);
        }
        source = cause.source();
    }
    rendered
}

/// Issue one GET to `url` and collect the whole response.
///
/// Non-2xx statuses are returned as ordinary responses. With a timeout,
/// the deadline covers both the response head and the body.
#[allow(clippy::cast_possible_truncation)]
pub async fn fetch(
    client: &HttpClient,
    url: &url::Url,
    timeout: Option<Duration>,
) -> Result<UpstreamResponse, FetchError> {
    let start = Instant::now();

    let request = hyper::Request::builder()
        .method(Method::GET)
        .uri(url.as_str())
        .header(header::ACCEPT, "application/json")
        .header(header::USER_AGENT, USER_AGENT)
        .body(Full::new(Bytes::new()))
        .map_err(FetchError::new)?;

    let exchange = async {
        let response = client.request(request).await.map_err(FetchError::new)?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .into_body()
            .collect()
            .await
            .map_err(|e| FetchError::new(format!("body read error: {e}")))?
            .to_bytes();
        Ok::<_, FetchError>((status, headers, body))
    };

    let (status, headers, body) = match timeout {
        Some(limit) => tokio::time::timeout(limit, exchange).await.map_err(|_| {
            FetchError::new(format!(
                "upstream request timed out after {}ms",
                limit.as_millis()
            ))
        })??,
        None => exchange.await?,
    };

    Ok(UpstreamResponse {
        status,
        headers,
        body,
        latency_ms: start.elapsed().as_millis() as u64,
    })
}
