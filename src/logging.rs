//! `tracing` subscriber setup for the `run` command.
//!
//! Output is JSON when stdout is not a terminal (containers, log shippers)
//! and pretty otherwise. `--json` and `--pretty` override the detection.
//! Connection-level chatter from hyper and rustls is held at `warn` unless
//! the relay itself runs at `trace`.

use std::io::IsTerminal;

use tracing::Level;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::LogLevel;

const TRANSPORT_TARGETS: [&str; 3] = ["hyper_util", "rustls", "h2"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl LogFormat {
    #[must_use]
    pub fn resolve(pretty: bool, json: bool) -> Self {
        match (pretty, json) {
            (_, true) => Self::Json,
            (true, false) => Self::Pretty,
            (false, false) if std::io::stdout().is_terminal() => Self::Pretty,
            (false, false) => Self::Json,
        }
    }
}

fn filter(level: Level) -> Targets {
    let transport = if level == Level::TRACE {
        Level::TRACE
    } else {
        Level::WARN.min(level)
    };
    TRANSPORT_TARGETS
        .iter()
        .fold(Targets::new().with_default(level), |targets, target| {
            targets.with_target(*target, transport)
        })
}

pub fn init(level: &LogLevel, format: LogFormat) {
    let registry = tracing_subscriber::registry().with(filter(level.to_tracing_level()));

    match format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_current_span(true).with_target(false))
            .init(),
        LogFormat::Pretty => registry.with(fmt::layer().pretty()).init(),
    }
}
