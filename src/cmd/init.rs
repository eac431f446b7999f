//! `fmp-relay init`: export the built-in route table.
//!
//! Serializes [`RouteTable::builtin`] to YAML, JSON, or TOML so it can be
//! edited and passed back with `run --routes`.

use std::path::PathBuf;

use crate::cli::{ConfigFormat, InitArgs};
use crate::config::model::RouteTable;
use crate::error::RelayError;

pub fn execute(args: &InitArgs) -> Result<(), RelayError> {
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(format!("routes.{}", args.format.extension())));

    if output.exists() {
        return Err(RelayError::FileExists { path: output });
    }

    let content = serialize_routes(&RouteTable::builtin(), &args.format)?;
    std::fs::write(&output, content)?;
    println!("Created {}", output.display());
    Ok(())
}

/// Serialize a route table to a formatted string in the given format.
pub fn serialize_routes(table: &RouteTable, format: &ConfigFormat) -> Result<String, RelayError> {
    match format {
        #[cfg(feature = "yaml")]
        ConfigFormat::Yaml => serde_yml::to_string(table)
            .map_err(|e| RelayError::Io(std::io::Error::other(e.to_string()))),

        #[cfg(not(feature = "yaml"))]
        ConfigFormat::Yaml => Err(RelayError::UnsupportedFormat("yaml".into())),

        ConfigFormat::Json => serde_json::to_string_pretty(table)
            .map_err(|e| RelayError::Io(std::io::Error::other(e.to_string()))),

        #[cfg(feature = "toml")]
        ConfigFormat::Toml => toml::to_string_pretty(table)
            .map_err(|e| RelayError::Io(std::io::Error::other(e.to_string()))),

        #[cfg(not(feature = "toml"))]
        ConfigFormat::Toml => Err(RelayError::UnsupportedFormat("toml".into())),
    }
}
