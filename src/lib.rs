//! fmp-relay is a stateless HTTP relay for the Financial Modeling Prep API.
//!
//! It receives browser/client GET requests, resolves them against a
//! declarative route table, injects the server-held API key into the
//! upstream URL, and relays the upstream status, content type, and body
//! back unchanged. One route fans a comma-separated symbol list out into
//! several upstream calls and aggregates the results positionally.
//!
//! # Architecture
//!
//! - [`cli`] -- Command-line argument parsing with clap derive macros.
//! - [`cmd`] -- Subcommand dispatch and execution (run, init, validate, health).
//! - [`config`] -- [`ProxyConfig`](config::ProxyConfig), the route table
//!   model, its validation, and route file loading.
//! - [`error`] -- Process-level and request-level error types using `thiserror`.
//! - [`health`] -- `GET /health` endpoint handler returning runtime diagnostics.
//! - [`logging`] -- Structured tracing setup with JSON and pretty-print output.
//! - [`proxy`] -- Core forwarding: route lookup, upstream URL construction,
//!   verbatim relay, and multi-symbol fan-out.
//! - [`server`] -- Axum server setup, shared application state, HTTP client,
//!   CORS headers, and graceful shutdown.
//!
//! # Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `yaml` | YAML route files _(enabled by default)_ |
//! | `json` | JSON route files |
//! | `toml` | TOML route files |
//! | `file-backends` | All route file formats |
//! | `full` | All features |

// Library surface exists for the binary and the integration tests.
#![allow(clippy::missing_errors_doc)]

pub mod cli;
pub mod cmd;
pub mod config;
pub mod error;
pub mod health;
pub mod logging;
pub mod proxy;
pub mod server;
