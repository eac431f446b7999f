//! Command-line interface definitions using clap derive macros.
//!
//! Contains the top-level [`Cli`] parser, the [`Commands`] enum for
//! subcommands (run, init, validate, health), and their associated
//! argument structs. Every `run` flag has an environment variable
//! equivalent for serverless and container deployments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::config::{API_KEY_VAR, DEFAULT_BASE_URL, DEFAULT_PREFIX};

#[derive(Parser)]
#[command(
    name = "fmp-relay",
    version,
    about = "Key-injecting HTTP relay for the Financial Modeling Prep API",
    propagate_version = true,
    after_help = "\x1b[1mQuick start:\x1b[0m\n  \
        FMP_API_KEY=... fmp-relay run          Serve the built-in routes on :3000\n  \
        fmp-relay init -o routes.yaml          Export the route table for editing\n  \
        fmp-relay run --routes routes.yaml     Serve a custom route table"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the relay server
    Run(Box<RunArgs>),

    /// Write the built-in route table to a file
    Init(InitArgs),

    /// Validate a route file without starting
    Validate(ValidateArgs),

    /// Check health of a running instance
    Health(HealthArgs),
}

#[derive(Args)]
#[command(after_help = "\x1b[1mExamples:\x1b[0m\n  \
        fmp-relay run                                  Built-in routes, key from FMP_API_KEY\n  \
        fmp-relay run -p 8080 --pretty                 Local dev mode\n  \
        fmp-relay run --base-url http://localhost:9000 Point at a mock upstream")]
pub struct RunArgs {
    /// Upstream API key, injected into every outbound request
    #[arg(long, env = API_KEY_VAR, hide_env_values = true)]
    pub api_key: Option<String>,

    /// Upstream base URL
    #[arg(long, env = "FMP_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Route file (.yaml, .json, .toml); the built-in table is used if omitted
    #[arg(short, long, env = "ROUTES_FILE")]
    pub routes: Option<PathBuf>,

    /// Inbound path prefix stripped before route lookup
    #[arg(long, env = "PATH_PREFIX", default_value = DEFAULT_PREFIX)]
    pub prefix: String,

    /// Listen port
    #[arg(short, long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Listen address
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    // -- Logging --
    /// Log level
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: LogLevel,

    /// Force pretty (human-readable) log output
    #[arg(long)]
    pub pretty: bool,

    /// Force JSON log output (overrides TTY detection)
    #[arg(long, conflicts_with = "pretty")]
    pub json: bool,

    // -- Tuning --
    /// Upstream timeout in milliseconds (0 disables it)
    #[arg(
        long,
        env = "REQUEST_TIMEOUT_MS",
        default_value_t = 0,
        help_heading = "Tuning"
    )]
    pub timeout: u64,
}

#[derive(Args)]
#[command(after_help = "\x1b[1mExamples:\x1b[0m\n  \
        fmp-relay init                          routes.yaml\n  \
        fmp-relay init -f toml -o routes.toml   TOML output")]
pub struct InitArgs {
    /// Output format
    #[arg(short, long, default_value = "yaml")]
    pub format: ConfigFormat,

    /// Output file path
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct ValidateArgs {
    /// Route file to validate
    #[arg(default_value = "routes.yaml")]
    pub routes: PathBuf,

    /// Output format
    #[arg(long, default_value = "text")]
    pub format: ValidateFormat,
}

#[derive(Args)]
pub struct HealthArgs {
    /// URL of the running instance
    #[arg(default_value = "http://localhost:3000")]
    pub url: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    #[must_use]
    pub const fn to_tracing_level(&self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

#[derive(Clone, Debug, ValueEnum)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

impl ConfigFormat {
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Yaml => "yaml",
            Self::Json => "json",
            Self::Toml => "toml",
        }
    }
}

#[derive(Clone, Debug, ValueEnum)]
pub enum ValidateFormat {
    Text,
    Json,
}
