//! Core HTTP forwarding handler.
//!
//! The [`forward_handler`] function is the Axum fallback that receives
//! every non-`/health` request. It answers CORS preflights, rejects
//! non-GET methods, checks the server key, resolves the route, and either
//! relays a single upstream call or runs the fan-out. Submodules handle
//! route lookup ([`routing`]), URL construction ([`upstream`]), the
//! upstream call ([`relay`]), multi-symbol aggregation ([`fanout`]), and
//! header policy ([`headers`]).

pub mod fanout;
pub mod headers;
pub mod relay;
pub mod routing;
pub mod upstream;

use std::sync::Arc;

use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::config::model::RouteDescriptor;
use crate::config::ApiKey;
use crate::error::ProxyError;
use crate::server::AppState;

use routing::Resolved;
use upstream::QueryParams;

/// `OPTIONS` on any path: 200, empty body. CORS headers come from the
/// router's header layers.
pub async fn preflight() -> StatusCode {
    StatusCode::OK
}

pub async fn forward_handler(
    axum::extract::State(state): axum::extract::State<Arc<AppState>>,
    method: Method,
    uri: Uri,
    req_headers: HeaderMap,
) -> Response {
    if method == Method::OPTIONS {
        return preflight().await.into_response();
    }

    let correlation_id = headers::correlation_id(&req_headers);

    match handle(&state, &method, &uri, &correlation_id).await {
        Ok(response) => response,
        Err(e) => {
            let status = e.status();
            if status.is_server_error() {
                state.stats.record_failed();
                tracing::error!(
                    correlation_id = %correlation_id,
                    method = %method,
                    path = %uri.path(),
                    status = status.as_u16(),
                    error = %e,
                    "request failed"
                );
            } else {
                tracing::warn!(
                    correlation_id = %correlation_id,
                    method = %method,
                    path = %uri.path(),
                    status = status.as_u16(),
                    error = %e,
                    "request rejected"
                );
            }
            e.into_response()
        }
    }
}

async fn handle(
    state: &AppState,
    method: &Method,
    uri: &Uri,
    correlation_id: &str,
) -> Result<Response, ProxyError> {
    if *method != Method::GET {
        return Err(ProxyError::MethodNotAllowed);
    }

    let proxy = &state.proxy;
    let api_key = proxy
        .api_key
        .as_ref()
        .ok_or_else(|| ProxyError::MissingApiKey {
            var: proxy.api_key_var.clone(),
        })?;

    let path = routing::strip_prefix(uri.path(), &proxy.prefix);
    let route = match routing::match_route(&state.routes, path) {
        Resolved::Root => return Ok(capabilities(state).into_response()),
        Resolved::Route(route) => route,
        Resolved::NotFound => {
            return Err(ProxyError::NotFound {
                path: path.to_string(),
                routes: state.routes.examples(&proxy.prefix),
            })
        }
    };

    let query = QueryParams::parse(uri.query());
    let required = route
        .required
        .as_deref()
        .map(|name| query.required(name))
        .transpose()?;

    tracing::info!(
        correlation_id = %correlation_id,
        route = %route.path,
        fan_out = route.fan_out,
        "request received"
    );

    if route.fan_out {
        forward_fan_out(state, route, &query, required, api_key, correlation_id).await
    } else {
        forward_single(state, route, &query, required, api_key, correlation_id).await
    }
}

async fn forward_single(
    state: &AppState,
    route: &RouteDescriptor,
    query: &QueryParams,
    required: Option<&str>,
    api_key: &ApiKey,
    correlation_id: &str,
) -> Result<Response, ProxyError> {
    let url = upstream::build_upstream_url(
        &state.proxy.base_url,
        route,
        query,
        required,
        api_key,
    )?;

    match relay::fetch(&state.http_client, &url, state.proxy.timeout).await {
        Ok(response) => {
            state.stats.record_forwarded();
            tracing::info!(
                correlation_id = %correlation_id,
                route = %route.path,
                upstream = %url.path(),
                status = response.status.as_u16(),
                latency_ms = response.latency_ms,
                "upstream responded"
            );
            Ok(relay::RelayedResponse::from(response).into_response())
        }
        Err(e) => Err(ProxyError::Upstream {
            detail: api_key.redact(&e.to_string()),
        }),
    }
}

async fn forward_fan_out(
    state: &AppState,
    route: &RouteDescriptor,
    query: &QueryParams,
    required: Option<&str>,
    api_key: &ApiKey,
    correlation_id: &str,
) -> Result<Response, ProxyError> {
    let name = route.required.as_deref().unwrap_or("symbol");
    let symbols = fanout::split_symbols(required.unwrap_or_default());
    if symbols.is_empty() {
        return Err(ProxyError::MissingParam {
            param: name.to_string(),
        });
    }

    let request = fanout::FanOutRequest {
        client: &state.http_client,
        base_url: &state.proxy.base_url,
        route,
        query,
        api_key,
        timeout: state.proxy.timeout,
        correlation_id,
    };

    let body = fanout::fan_out(request, &symbols).await?;
    state.stats.record_forwarded();

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, headers::DEFAULT_CONTENT_TYPE)],
        body,
    )
        .into_response())
}

fn capabilities(state: &AppState) -> Json<serde_json::Value> {
    Json(json!({
        "ok": true,
        "message": "FMP proxy is up.",
        "routes": state.routes.examples(&state.proxy.prefix),
    }))
}
