//! `GET /health` endpoint handler.
//!
//! Returns a [`HealthResponse`] JSON payload containing the server
//! version, uptime, upstream settings (never the key itself), the number
//! of loaded routes, and cumulative request statistics.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::server::AppState;

#[derive(Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub commit: String,
    pub uptime_seconds: u64,
    pub upstream: UpstreamHealth,
    pub routes: usize,
    pub stats: StatsResponse,
}

#[derive(Serialize, Deserialize)]
pub struct UpstreamHealth {
    pub base_url: String,
    pub api_key_configured: bool,
    pub timeout_ms: Option<u64>,
}

#[derive(Serialize, Deserialize)]
pub struct StatsResponse {
    pub requests_forwarded: u64,
    pub requests_failed: u64,
}

#[allow(clippy::cast_possible_truncation)]
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let proxy = &state.proxy;
    let (forwarded, failed) = state.stats.snapshot();

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        commit: env!("FMP_RELAY_GIT_SHORT").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        upstream: UpstreamHealth {
            base_url: proxy.base_url.to_string(),
            api_key_configured: proxy.api_key.is_some(),
            timeout_ms: proxy.timeout.map(|t| t.as_millis() as u64),
        },
        routes: state.routes.routes.len(),
        stats: StatsResponse {
            requests_forwarded: forwarded,
            requests_failed: failed,
        },
    })
}
