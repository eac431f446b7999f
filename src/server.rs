//! Router assembly and the state every request handler shares.
//!
//! [`AppState`] is built once at startup and never mutated apart from the
//! [`Stats`] counters. The router has one named route (`/health`); every
//! other path falls through to the forwarding handler.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::http::{HeaderValue, Request};
use axum::routing::get;
use axum::Router;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use tower::ServiceBuilder;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::config::model::RouteTable;
use crate::config::ProxyConfig;
use crate::health::health_handler;
use crate::proxy::{self, headers::CORS_HEADERS};

/// Idle pooled connections to the upstream are closed after this long.
const POOL_IDLE: Duration = Duration::from_secs(30);

pub type HttpClient =
    Client<hyper_rustls::HttpsConnector<HttpConnector>, http_body_util::Full<bytes::Bytes>>;

/// Request outcome counters reported by `/health`.
#[derive(Debug, Default)]
pub struct Stats {
    forwarded: AtomicU64,
    failed: AtomicU64,
}

impl Stats {
    /// A request that produced an upstream answer (any status).
    pub fn record_forwarded(&self) {
        self.forwarded.fetch_add(1, Ordering::Relaxed);
    }

    /// A request that ended in a 5xx generated by the relay itself.
    pub fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    /// `(forwarded, failed)`.
    #[must_use]
    pub fn snapshot(&self) -> (u64, u64) {
        (
            self.forwarded.load(Ordering::Relaxed),
            self.failed.load(Ordering::Relaxed),
        )
    }
}

pub struct AppState {
    pub proxy: ProxyConfig,
    pub routes: RouteTable,
    pub http_client: HttpClient,
    pub start_time: Instant,
    pub stats: Stats,
}

impl AppState {
    #[must_use]
    pub fn new(proxy: ProxyConfig, routes: RouteTable) -> Self {
        Self {
            proxy,
            routes,
            http_client: build_http_client(),
            start_time: Instant::now(),
            stats: Stats::default(),
        }
    }
}

/// Pooled client speaking plain HTTP (local mocks) and HTTPS (FMP).
#[must_use]
pub fn build_http_client() -> HttpClient {
    // rustls cannot pick a provider on its own when more than one is linked.
    let _ = rustls::crypto::ring::default_provider().install_default();

    let connector = hyper_rustls::HttpsConnectorBuilder::new()
        .with_webpki_roots()
        .https_or_http()
        .enable_http1()
        .build();

    Client::builder(TokioExecutor::new())
        .pool_idle_timeout(POOL_IDLE)
        .build(connector)
}

pub fn build_router(state: Arc<AppState>) -> Router {
    let [origin, methods, allow_headers] = CORS_HEADERS.map(|(name, value)| {
        SetResponseHeaderLayer::overriding(name, HeaderValue::from_static(value))
    });

    // Only the path goes into the span; query strings may carry a caller's key.
    let trace = TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
        tracing::info_span!("relay", method = %req.method(), path = %req.uri().path())
    });

    Router::new()
        .route("/health", get(health_handler).options(proxy::preflight))
        .fallback(proxy::forward_handler)
        .layer(
            ServiceBuilder::new()
                .layer(trace)
                .layer(origin)
                .layer(methods)
                .layer(allow_headers),
        )
        .with_state(state)
}

/// Resolves on Ctrl+C, or SIGTERM on unix, so `axum::serve` can drain.
pub async fn shutdown_signal() {
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "cannot listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = interrupt => tracing::info!("interrupt received, draining"),
        () = terminate => tracing::info!("SIGTERM received, draining"),
    }
}
