//! Multi-symbol fan-out with positional aggregation.
//!
//! Splits a comma-separated identifier list and runs one upstream call per
//! identifier, a bounded number at a time. Results are slotted by input
//! index so the combined array matches the request regardless of
//! completion order. Array payloads are spread into the result as raw
//! JSON; failed statuses become `{"symbol", "error"}` placeholders in
//! their slot.

use std::future::Future;
use std::time::Duration;

use bytes::Bytes;
use serde::Serialize;
use serde_json::value::RawValue;
use tokio::task::{JoinError, JoinSet};
use url::Url;

use crate::config::model::RouteDescriptor;
use crate::config::ApiKey;
use crate::error::ProxyError;
use crate::server::HttpClient;

use super::relay::{fetch, UpstreamResponse};
use super::upstream::{build_upstream_url, QueryParams};

pub struct FanOutRequest<'a> {
    pub client: &'a HttpClient,
    pub base_url: &'a Url,
    pub route: &'a RouteDescriptor,
    pub query: &'a QueryParams,
    pub api_key: &'a ApiKey,
    pub timeout: Option<Duration>,
    pub correlation_id: &'a str,
}

#[derive(Serialize)]
struct FailedSymbol<'a> {
    symbol: &'a str,
    error: String,
}

/// Split `raw` on commas, trimming and dropping empty entries.
#[must_use]
pub fn split_symbols(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Upstream calls in flight at once for a single fan-out request.
pub const MAX_IN_FLIGHT: usize = 8;

/// Why a bounded batch stopped early.
#[derive(Debug)]
pub enum BatchError<E> {
    /// The job at this input index returned an error.
    Failed(usize, E),
    Panicked(JoinError),
}

/// Run `jobs` with at most `limit` in flight and return their outputs in
/// input order.
///
/// Stops at the first failure. Jobs still running or not yet started are
/// aborted when the internal [`JoinSet`] is dropped.
pub async fn run_bounded<T, E, Fut>(
    jobs: Vec<Fut>,
    limit: usize,
) -> Result<Vec<T>, BatchError<E>>
where
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    let mut slots: Vec<Option<T>> = jobs.iter().map(|_| None).collect();
    let mut queue = jobs.into_iter().enumerate();
    let mut running = JoinSet::new();

    for (idx, job) in queue.by_ref().take(limit.max(1)) {
        running.spawn(async move { (idx, job.await) });
    }

    while let Some(joined) = running.join_next().await {
        let (idx, result) = joined.map_err(BatchError::Panicked)?;
        slots[idx] = Some(result.map_err(|e| BatchError::Failed(idx, e))?);

        if let Some((idx, job)) = queue.next() {
            running.spawn(async move { (idx, job.await) });
        }
    }

    Ok(slots.into_iter().flatten().collect())
}

/// Run one upstream call per symbol and return the aggregated JSON array.
///
/// A transport failure on any symbol fails the whole batch and cancels
/// the calls still pending; upstream error statuses only mark their own
/// slot.
pub async fn fan_out(req: FanOutRequest<'_>, symbols: &[String]) -> Result<Bytes, ProxyError> {
    let mut jobs = Vec::with_capacity(symbols.len());
    for symbol in symbols {
        let url = build_upstream_url(
            req.base_url,
            req.route,
            req.query,
            Some(symbol),
            req.api_key,
        )?;
        let client = req.client.clone();
        let timeout = req.timeout;
        jobs.push(async move { fetch(&client, &url, timeout).await });
    }

    let responses = run_bounded(jobs, MAX_IN_FLIGHT).await.map_err(|err| match err {
        BatchError::Failed(idx, e) => {
            let detail = req.api_key.redact(&e.to_string());
            tracing::warn!(
                correlation_id = %req.correlation_id,
                symbol = %symbols[idx],
                error = %detail,
                "fan-out target failed, cancelling batch"
            );
            ProxyError::Upstream { detail }
        }
        BatchError::Panicked(join_err) => {
            tracing::error!(
                correlation_id = %req.correlation_id,
                error = %join_err,
                "fan-out task panicked"
            );
            ProxyError::Internal
        }
    })?;

    let outcomes: Vec<(&str, UpstreamResponse)> = symbols
        .iter()
        .map(String::as_str)
        .zip(responses)
        .collect();
    for (symbol, response) in &outcomes {
        tracing::info!(
            correlation_id = %req.correlation_id,
            symbol = %symbol,
            status = response.status.as_u16(),
            latency_ms = response.latency_ms,
            "fan-out target responded"
        );
    }

    aggregate(&outcomes).map_err(|e| {
        tracing::error!(correlation_id = %req.correlation_id, error = %e, "failed to encode fan-out result");
        ProxyError::Internal
    })
}

/// Combine per-symbol responses into one JSON array, in order.
pub fn aggregate(outcomes: &[(&str, UpstreamResponse)]) -> serde_json::Result<Bytes> {
    let mut elements: Vec<String> = Vec::new();

    for (symbol, response) in outcomes {
        if !response.status.is_success() {
            elements.push(placeholder(
                symbol,
                format!("status {}", response.status.as_u16()),
            )?);
            continue;
        }

        if let Ok(items) = serde_json::from_slice::<Vec<Box<RawValue>>>(&response.body) {
            elements.extend(items.into_iter().map(|item| item.get().to_string()));
        } else if let Ok(single) = serde_json::from_slice::<Box<RawValue>>(&response.body) {
            elements.push(single.get().to_string());
        } else {
            elements.push(placeholder(symbol, "invalid payload".into())?);
        }
    }

    Ok(Bytes::from(format!("[{}]", elements.join(","))))
}

fn placeholder(symbol: &str, error: String) -> serde_json::Result<String> {
    serde_json::to_string(&FailedSymbol { symbol, error })
}
