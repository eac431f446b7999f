//! Route table loading from YAML, JSON or TOML files.
//!
//! The format is picked from the file extension and gated by feature
//! flags. Every loaded table is validated before it is returned.

use std::path::Path;

use super::model::RouteTable;
use super::validation::validate;
use crate::error::RelayError;

/// Parse a route table string based on file extension.
pub fn parse_routes_str(
    ext: &str,
    content: &str,
    path_display: &str,
) -> Result<RouteTable, RelayError> {
    let parse_err = |source: Box<dyn std::error::Error + Send + Sync>| RelayError::RouteFileParse {
        path: path_display.to_string(),
        source,
    };

    match ext {
        #[cfg(feature = "yaml")]
        "yaml" | "yml" => serde_yml::from_str(content).map_err(|e| parse_err(Box::new(e))),

        #[cfg(feature = "json")]
        "json" => serde_json::from_str(content).map_err(|e| parse_err(Box::new(e))),

        #[cfg(feature = "toml")]
        "toml" => toml::from_str(content).map_err(|e| parse_err(Box::new(e))),

        other => Err(RelayError::UnsupportedFormat(other.to_string())),
    }
}

/// Read, parse and validate a route file.
pub async fn load_route_file(path: &Path) -> Result<RouteTable, RelayError> {
    let content = tokio::fs::read_to_string(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            RelayError::RouteFileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            RelayError::Io(e)
        }
    })?;

    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    let table = parse_routes_str(ext, &content, &path.display().to_string())?;

    validate(&table).map_err(|errors| RelayError::RouteValidation { errors })?;
    Ok(table)
}
