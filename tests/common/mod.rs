//! Shared helpers: a recording mock upstream and a relay bound to a random port.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;

use fmp_relay::config::model::RouteTable;
use fmp_relay::config::ProxyConfig;
use fmp_relay::server::{self, AppState};

pub const TEST_KEY: &str = "test-key-123";

pub const AAPL_QUOTE: &str = r#"[{"symbol":"AAPL","price":229.00}]"#;
pub const SLOW_QUOTE: &str = r#"[{"symbol":"SLOW","price":1.50}]"#;
pub const PROFILE_BODY: &str =
    r#"[{"symbol":"AAPL","mktCap":3000000000000000000001,"beta":1.240,"zeta":0}]"#;

/// Upstream double that records every request URI it sees.
#[derive(Clone, Default)]
pub struct MockUpstream {
    seen: Arc<Mutex<Vec<String>>>,
}

impl MockUpstream {
    pub fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }

    pub fn last(&self) -> String {
        self.seen().last().cloned().expect("no upstream call recorded")
    }
}

fn query_value(uri: &Uri, name: &str) -> Option<String> {
    url::form_urlencoded::parse(uri.query().unwrap_or("").as_bytes())
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.into_owned())
}

async fn respond(uri: Uri) -> Response {
    match uri.path() {
        "/stable/quote" => match query_value(&uri, "symbol").as_deref() {
            Some("AAPL") => ([(header::CONTENT_TYPE, "application/json")], AAPL_QUOTE).into_response(),
            Some("SLOW") => {
                tokio::time::sleep(Duration::from_millis(200)).await;
                ([(header::CONTENT_TYPE, "application/json")], SLOW_QUOTE).into_response()
            }
            _ => (StatusCode::NOT_FOUND, "{\"Error Message\":\"unknown symbol\"}").into_response(),
        },
        "/api/v3/profile/AAPL" => (
            [(header::CONTENT_TYPE, "application/json; charset=utf-8")],
            PROFILE_BODY,
        )
            .into_response(),
        "/stable/income-statement" => (
            StatusCode::UNAUTHORIZED,
            [(header::CONTENT_TYPE, "text/plain")],
            "Invalid API KEY",
        )
            .into_response(),
        "/api/v3/key-metrics/SLEEPY" => {
            tokio::time::sleep(Duration::from_secs(2)).await;
            StatusCode::OK.into_response()
        }
        // No content-type header at all.
        _ => Response::new(Body::from("[]")),
    }
}

pub async fn start_mock_upstream() -> (String, MockUpstream) {
    let mock = MockUpstream::default();
    let recorder = mock.clone();

    let router = Router::new().fallback(move |uri: Uri| {
        let recorder = recorder.clone();
        async move {
            recorder.seen.lock().unwrap().push(uri.to_string());
            respond(uri).await
        }
    });

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    (format!("http://{addr}"), mock)
}

/// Base URL of a port nothing listens on.
pub async fn dead_upstream() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

pub async fn start_relay(proxy: ProxyConfig) -> (SocketAddr, tokio::sync::oneshot::Sender<()>) {
    start_relay_with(proxy, RouteTable::builtin()).await
}

pub async fn start_relay_with(
    proxy: ProxyConfig,
    routes: RouteTable,
) -> (SocketAddr, tokio::sync::oneshot::Sender<()>) {
    let state = Arc::new(AppState::new(proxy, routes));
    let router = server::build_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
            .unwrap();
    });

    (addr, shutdown_tx)
}

pub fn proxy_config(base_url: &str) -> ProxyConfig {
    ProxyConfig::new(base_url, Some(TEST_KEY.into())).unwrap()
}
