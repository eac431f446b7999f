//! `fmp-relay health`: query `/health` on a running relay.

use std::fmt::Write;
use std::time::Duration;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::StatusCode;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;

use crate::cli::HealthArgs;
use crate::error::RelayError;
use crate::health::HealthResponse;

const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

fn request_failed(e: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> RelayError {
    RelayError::HttpRequest { source: e.into() }
}

async fn probe(base: &str) -> Result<(StatusCode, Bytes), RelayError> {
    let uri: hyper::Uri = format!("{}/health", base.trim_end_matches('/'))
        .parse()
        .map_err(|e: hyper::http::uri::InvalidUri| RelayError::UriParse {
            source: Box::new(e),
        })?;

    let client: Client<HttpConnector, Full<Bytes>> =
        Client::builder(TokioExecutor::new()).build(HttpConnector::new());
    let response = tokio::time::timeout(PROBE_TIMEOUT, client.get(uri))
        .await
        .map_err(|_| request_failed("no answer from /health within 10s"))?
        .map_err(request_failed)?;

    let status = response.status();
    let body = response
        .into_body()
        .collect()
        .await
        .map_err(request_failed)?
        .to_bytes();
    Ok((status, body))
}

pub async fn execute(args: HealthArgs) -> Result<(), RelayError> {
    let (status, body) = probe(&args.url).await?;
    if !status.is_success() {
        return Err(RelayError::HealthCheckFailed(status));
    }

    if args.json {
        println!("{}", String::from_utf8_lossy(&body));
        return Ok(());
    }

    match serde_json::from_slice::<HealthResponse>(&body) {
        Ok(health) => print!("{}", render(&args.url, &health)),
        Err(e) => {
            eprintln!("unexpected /health payload ({e}):");
            println!("{}", String::from_utf8_lossy(&body));
        }
    }
    Ok(())
}

fn render(url: &str, health: &HealthResponse) -> String {
    let key = if health.upstream.api_key_configured {
        "configured"
    } else {
        "MISSING (every forwarded request will fail with 500)"
    };
    let timeout = health
        .upstream
        .timeout_ms
        .map_or_else(|| "none".to_string(), |ms| format!("{ms}ms"));

    let mut out = String::new();
    let _ = writeln!(out, "\u{2713} fmp-relay at {url} is {}", health.status);
    let _ = writeln!(out, "  version   {} ({})", health.version, health.commit);
    let _ = writeln!(out, "  uptime    {}", format_uptime(health.uptime_seconds));
    let _ = writeln!(out, "  upstream  {} (timeout {timeout})", health.upstream.base_url);
    let _ = writeln!(out, "  api key   {key}");
    let _ = writeln!(out, "  routes    {}", health.routes);
    let _ = writeln!(
        out,
        "  requests  {} forwarded, {} failed",
        health.stats.requests_forwarded, health.stats.requests_failed
    );
    out
}

fn format_uptime(seconds: u64) -> String {
    let (h, m, s) = (seconds / 3600, seconds % 3600 / 60, seconds % 60);
    match (h, m) {
        (0, 0) => format!("{s}s"),
        (0, _) => format!("{m}m {s}s"),
        _ => format!("{h}h {m}m {s}s"),
    }
}
