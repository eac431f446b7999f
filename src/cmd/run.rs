//! `fmp-relay run`: start the relay server.
//!
//! Builds the [`ProxyConfig`] once from flags / env vars, loads the route
//! table (built-in or from a file), and serves it with graceful shutdown.

use std::net::SocketAddr;
use std::sync::Arc;

use crate::cli::RunArgs;
use crate::config::model::RouteTable;
use crate::config::{sources, ProxyConfig};
use crate::error::RelayError;
use crate::logging;
use crate::server::{self, AppState};

pub async fn execute(args: RunArgs) -> Result<(), RelayError> {
    let log_format = logging::LogFormat::resolve(args.pretty, args.json);
    logging::init(&args.log_level, log_format);

    let proxy = ProxyConfig::new(&args.base_url, args.api_key.clone())?
        .with_timeout_ms(args.timeout)
        .with_prefix(&args.prefix);

    if proxy.api_key.is_none() {
        tracing::warn!(
            var = %proxy.api_key_var,
            "no API key configured, proxied requests will fail with 500"
        );
    }

    let routes = match args.routes.as_deref() {
        Some(path) => {
            let table = sources::load_route_file(path).await?;
            tracing::info!(path = %path.display(), routes = table.routes.len(), "loaded route file");
            table
        }
        None => RouteTable::builtin(),
    };

    let route_count = routes.routes.len();
    let base_url = proxy.base_url.to_string();
    let state = Arc::new(AppState::new(proxy, routes));
    let router = server::build_router(state);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!(
        addr = %addr,
        routes = route_count,
        upstream = %base_url,
        "fmp-relay started"
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(server::shutdown_signal())
        .await?;

    tracing::info!("fmp-relay stopped");
    Ok(())
}
