//! Process configuration and the route table.
//!
//! [`ProxyConfig`] is built once at startup from CLI flags / env vars and
//! handed to request handlers by reference through
//! [`AppState`](crate::server::AppState). Submodules provide the route
//! table data model, its validation, and file loading.

pub mod model;
pub mod sources;
pub mod validation;

use std::time::Duration;

use url::Url;

use crate::error::RelayError;

pub const DEFAULT_BASE_URL: &str = "https://financialmodelingprep.com";
pub const API_KEY_VAR: &str = "FMP_API_KEY";
pub const DEFAULT_PREFIX: &str = "/api";

const REDACTED: &str = "***";

/// Server-held upstream credential. Never printed by `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Returns `None` for empty or whitespace-only keys.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            None
        } else {
            Some(Self(raw))
        }
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Replace every occurrence of the key in `text`.
    #[must_use]
    pub fn redact(&self, text: &str) -> String {
        text.replace(&self.0, REDACTED)
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ApiKey({REDACTED})")
    }
}

#[derive(Debug, Clone)]
pub struct ProxyConfig {
    pub base_url: Url,
    pub api_key: Option<ApiKey>,
    /// Environment variable the key is read from, named in error bodies.
    pub api_key_var: String,
    pub timeout: Option<Duration>,
    /// Inbound path prefix stripped before route lookup.
    pub prefix: String,
}

impl ProxyConfig {
    pub fn new(base_url: &str, api_key: Option<String>) -> Result<Self, RelayError> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            api_key: api_key.and_then(ApiKey::new),
            api_key_var: API_KEY_VAR.into(),
            timeout: None,
            prefix: DEFAULT_PREFIX.into(),
        })
    }

    /// A zero timeout disables the upstream deadline.
    #[must_use]
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout = (timeout_ms > 0).then(|| Duration::from_millis(timeout_ms));
        self
    }

    #[must_use]
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.prefix = normalize_prefix(prefix);
        self
    }
}

fn parse_base_url(raw: &str) -> Result<Url, RelayError> {
    let err = |reason: &str| RelayError::BaseUrl {
        url: raw.to_string(),
        reason: reason.to_string(),
    };
    let url = Url::parse(raw).map_err(|e| err(&e.to_string()))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(err("expected an http or https URL"));
    }
    if url.cannot_be_a_base() {
        return Err(err("URL cannot carry a path"));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(err("query strings and fragments are not allowed"));
    }
    Ok(url)
}

fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_key_is_treated_as_missing() {
        let config = ProxyConfig::new(DEFAULT_BASE_URL, Some("  ".into())).unwrap();
        assert!(config.api_key.is_none());
    }

    #[test]
    fn key_debug_is_masked() {
        let key = ApiKey::new("s3cr3t").unwrap();
        assert_eq!(format!("{key:?}"), "ApiKey(***)");
        assert_eq!(key.redact("apikey=s3cr3t&x=s3cr3t"), "apikey=***&x=***");
    }

    #[test]
    fn rejects_non_http_base() {
        assert!(ProxyConfig::new("ftp://example.com", None).is_err());
        assert!(ProxyConfig::new("not a url", None).is_err());
        assert!(ProxyConfig::new("https://example.com/?a=1", None).is_err());
    }

    #[test]
    fn zero_timeout_disables_deadline() {
        let config = ProxyConfig::new(DEFAULT_BASE_URL, None)
            .unwrap()
            .with_timeout_ms(0);
        assert!(config.timeout.is_none());
        let config = config.with_timeout_ms(250);
        assert_eq!(config.timeout, Some(Duration::from_millis(250)));
    }

    #[test]
    fn prefix_is_normalized() {
        let config = ProxyConfig::new(DEFAULT_BASE_URL, None).unwrap();
        assert_eq!(config.prefix, "/api");
        assert_eq!(config.clone().with_prefix("v1/").prefix, "/v1");
        assert_eq!(config.with_prefix("/").prefix, "");
    }
}
