//! Upstream URL construction.
//!
//! [`build_upstream_url`] turns a [`RouteDescriptor`] plus the caller's
//! query string into the outbound URL: templated path, filtered query
//! parameters, the `limit` clamp, and finally the server key.

use url::form_urlencoded;
use url::Url;

use crate::config::model::{Passthrough, RouteDescriptor, API_KEY_PARAM};
use crate::config::ApiKey;
use crate::error::ProxyError;

/// Decoded inbound query parameters in their original order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    #[must_use]
    pub fn parse(query: Option<&str>) -> Self {
        Self(
            query
                .map(|q| form_urlencoded::parse(q.as_bytes()).into_owned().collect())
                .unwrap_or_default(),
        )
    }

    /// First value for `name`, as browsers' `URLSearchParams.get` does.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// The identifying parameter a route cannot run without. Empty values
    /// count as missing.
    pub fn required(&self, name: &str) -> Result<&str, ProxyError> {
        self.get(name)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ProxyError::MissingParam {
                param: name.to_string(),
            })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Set `key` to `value`: the first existing entry is overwritten in place
/// and later duplicates are dropped, otherwise the pair is appended.
fn set_param(pairs: &mut Vec<(String, String)>, key: &str, value: &str) {
    match pairs.iter().position(|(k, _)| k == key) {
        Some(pos) => {
            pairs[pos].1 = value.to_string();
            let mut idx = 0;
            pairs.retain(|(k, _)| {
                let keep = idx <= pos || k != key;
                idx += 1;
                keep
            });
        }
        None => pairs.push((key.to_string(), value.to_string())),
    }
}

/// Build the outbound URL for one upstream call.
///
/// `required_value` is the already-validated identifying parameter (one
/// symbol of a fan-out list, or the whole value otherwise). The key is
/// always the last query parameter, replacing any caller-supplied one.
pub fn build_upstream_url(
    base: &Url,
    route: &RouteDescriptor,
    query: &QueryParams,
    required_value: Option<&str>,
    api_key: &ApiKey,
) -> Result<Url, ProxyError> {
    let required = route.required.as_deref().zip(required_value);

    let mut url = base.clone();
    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|()| ProxyError::InvalidUpstreamUrl)?;
        segments.pop_if_empty();
        for segment in route.upstream.split('/').filter(|s| !s.is_empty()) {
            match (segment.strip_prefix(':'), required) {
                (Some(name), Some((required_name, value))) if name == required_name => {
                    segments.push(value);
                }
                (Some(_), _) => return Err(ProxyError::InvalidUpstreamUrl),
                (None, _) => {
                    segments.push(segment);
                }
            }
        }
    }

    let mut pairs: Vec<(String, String)> = Vec::new();

    if let Some((name, value)) = required {
        if !route.required_in_path() {
            set_param(&mut pairs, name, value);
        }
    }

    // The required parameter keeps this call's value (one symbol of a
    // fan-out list), never the caller's raw copy.
    let copies = |name: &str| required.map_or(true, |(required_name, _)| name != required_name);

    match route.passthrough_policy() {
        Passthrough::None => {}
        Passthrough::All => {
            for (key, value) in query.iter().filter(|(key, _)| copies(*key)) {
                set_param(&mut pairs, key, value);
            }
        }
        Passthrough::Only(names) => {
            for name in names.iter().filter(|name| copies(name.as_str())) {
                if let Some(value) = query.get(name) {
                    set_param(&mut pairs, name, value);
                }
            }
        }
    }

    if let Some(clamp) = route.limit {
        let limit = clamp.apply(query.get("limit"));
        set_param(&mut pairs, "limit", &limit.to_string());
    }

    pairs.retain(|(k, _)| k != API_KEY_PARAM);
    pairs.push((API_KEY_PARAM.to_string(), api_key.expose().to_string()));

    url.query_pairs_mut().clear().extend_pairs(&pairs);
    Ok(url)
}
