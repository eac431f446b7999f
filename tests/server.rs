//! Integration tests for the HTTP surface: health, CORS, root listing,
//! unknown routes, methods, and graceful shutdown.

mod common;

use common::{proxy_config, start_mock_upstream, start_relay};
use fmp_relay::config::ProxyConfig;
use fmp_relay::health::HealthResponse;

const CORS: [(&str, &str); 3] = [
    ("access-control-allow-origin", "*"),
    ("access-control-allow-methods", "GET,OPTIONS"),
    ("access-control-allow-headers", "Content-Type"),
];

fn assert_cors(resp: &reqwest::Response) {
    for (name, value) in CORS {
        assert_eq!(resp.headers()[name], value, "{name}");
    }
}

#[tokio::test]
async fn health_endpoint_returns_healthy() {
    let (base, _mock) = start_mock_upstream().await;
    let (addr, shutdown) = start_relay(proxy_config(&base)).await;

    let resp = reqwest::get(format!("http://{addr}/health")).await.unwrap();
    assert_eq!(resp.status(), 200);
    assert_cors(&resp);

    let health: HealthResponse = resp.json().await.unwrap();
    assert_eq!(health.status, "healthy");
    assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
    assert!(health.upstream.api_key_configured);
    assert_eq!(health.upstream.timeout_ms, None);
    assert_eq!(health.routes, 8);
    assert_eq!(health.stats.requests_forwarded, 0);
    assert_eq!(health.stats.requests_failed, 0);

    let _ = shutdown.send(());
}

#[tokio::test]
async fn health_works_without_key_and_counts_requests() {
    let (base, _mock) = start_mock_upstream().await;
    let (addr, shutdown) = start_relay(ProxyConfig::new(&base, None).unwrap()).await;

    let resp = reqwest::get(format!("http://{addr}/api/profile?symbol=AAPL"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 500);

    let health: HealthResponse = reqwest::get(format!("http://{addr}/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(!health.upstream.api_key_configured);
    assert_eq!(health.stats.requests_failed, 1);

    let _ = shutdown.send(());
}

#[tokio::test]
async fn root_lists_capabilities() {
    let (base, mock) = start_mock_upstream().await;
    let (addr, shutdown) = start_relay(proxy_config(&base)).await;

    let resp = reqwest::get(format!("http://{addr}/api")).await.unwrap();
    assert_eq!(resp.status(), 200);
    assert_cors(&resp);

    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["ok"], true);
    assert_eq!(body["message"], "FMP proxy is up.");
    let routes = body["routes"].as_array().unwrap();
    assert_eq!(routes.len(), 8);
    assert_eq!(routes[0], "/api/quote?symbol=AAPL,MSFT");
    assert_eq!(mock.calls(), 0);

    let _ = shutdown.send(());
}

#[tokio::test]
async fn unknown_route_returns_404_with_route_list() {
    let (base, mock) = start_mock_upstream().await;
    let (addr, shutdown) = start_relay(proxy_config(&base)).await;

    let resp = reqwest::get(format!("http://{addr}/api/bogus")).await.unwrap();
    assert_eq!(resp.status(), 404);
    assert_cors(&resp);

    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Not Found");
    assert_eq!(body["path"], "/bogus");
    let routes: Vec<&str> = body["routes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r.as_str().unwrap())
        .collect();
    assert!(routes.contains(&"/api/search?query=apple&limit=10&exchange=NASDAQ"));
    assert_eq!(routes.len(), 8);
    assert_eq!(mock.calls(), 0);

    let _ = shutdown.send(());
}

#[tokio::test]
async fn options_returns_empty_200_with_cors_everywhere() {
    let (base, mock) = start_mock_upstream().await;
    let (addr, shutdown) = start_relay(proxy_config(&base)).await;
    let client = reqwest::Client::new();

    for path in ["/api/quote", "/api/bogus", "/health", "/"] {
        let resp = client
            .request(reqwest::Method::OPTIONS, format!("http://{addr}{path}"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200, "{path}");
        assert_cors(&resp);
        assert!(resp.bytes().await.unwrap().is_empty(), "{path}");
    }

    assert_eq!(mock.calls(), 0);
    let _ = shutdown.send(());
}

#[tokio::test]
async fn non_get_methods_are_rejected() {
    let (base, mock) = start_mock_upstream().await;
    let (addr, shutdown) = start_relay(proxy_config(&base)).await;

    let resp = reqwest::Client::new()
        .post(format!("http://{addr}/api/quote?symbol=AAPL"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 405);
    assert_eq!(resp.headers()["allow"], "GET, OPTIONS");
    assert_cors(&resp);
    assert_eq!(mock.calls(), 0);

    let _ = shutdown.send(());
}

#[tokio::test]
async fn graceful_shutdown_works() {
    let (base, _mock) = start_mock_upstream().await;
    let (addr, shutdown) = start_relay(proxy_config(&base)).await;

    let url = format!("http://{addr}/health");
    assert!(reqwest::get(&url).await.is_ok());

    let _ = shutdown.send(());
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;

    assert!(reqwest::get(&url).await.is_err());
}
