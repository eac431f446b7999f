//! Serde data structures for the route table.
//!
//! Contains [`RouteTable`] (the root), [`RouteDescriptor`] and
//! [`LimitClamp`]. All types derive `Serialize` and `Deserialize` with
//! `deny_unknown_fields` for strict parsing. [`RouteTable::builtin`] is the
//! table used when no route file is given.

use serde::{Deserialize, Serialize};

/// Query parameter that always carries the server-held key upstream.
pub const API_KEY_PARAM: &str = "apikey";

/// Pass-through entry meaning "copy every inbound parameter".
pub const PASSTHROUGH_ALL: &str = "*";

fn is_false(v: &bool) -> bool {
    !*v
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RouteTable {
    pub routes: Vec<RouteDescriptor>,
}

/// Static description of how one inbound path maps to an upstream call.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RouteDescriptor {
    /// Inbound path, e.g. `/quote`.
    pub path: String,

    /// Upstream path template relative to the base URL. A `:name` segment
    /// is replaced by the required parameter's value.
    pub upstream: String,

    /// Identifying query parameter that must be present and non-empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<String>,

    /// Inbound parameters copied upstream. `["*"]` copies all of them.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub passthrough: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<LimitClamp>,

    /// Split the required value on commas and issue one call per item.
    #[serde(default, skip_serializing_if = "is_false")]
    pub fan_out: bool,

    /// Sample request shown in capability listings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
}

/// Server-side override of the `limit` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LimitClamp {
    pub max: i64,
    pub default: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Passthrough<'a> {
    None,
    All,
    Only(&'a [String]),
}

impl RouteTable {
    /// The Financial Modeling Prep routes served out of the box.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            routes: vec![
                RouteDescriptor {
                    fan_out: true,
                    ..RouteDescriptor::symbol(
                        "/quote",
                        "/stable/quote",
                        &[],
                        "/quote?symbol=AAPL,MSFT",
                    )
                },
                RouteDescriptor::symbol(
                    "/profile",
                    "/api/v3/profile/:symbol",
                    &[],
                    "/profile?symbol=AAPL",
                ),
                RouteDescriptor::symbol(
                    "/income-statement",
                    "/stable/income-statement",
                    &["period"],
                    "/income-statement?symbol=AAPL&period=quarter",
                ),
                RouteDescriptor::symbol(
                    "/historical",
                    "/stable/historical-price-eod/full",
                    &["from", "to"],
                    "/historical?symbol=AAPL&from=2024-01-01&to=2025-09-20",
                ),
                RouteDescriptor::symbol(
                    "/key-metrics",
                    "/api/v3/key-metrics/:symbol",
                    &["limit"],
                    "/key-metrics?symbol=AAPL&limit=40",
                ),
                RouteDescriptor {
                    limit: Some(LimitClamp { max: 5, default: 5 }),
                    ..RouteDescriptor::symbol(
                        "/balance-sheet",
                        "/stable/balance-sheet-statement",
                        &["period"],
                        "/balance-sheet?symbol=AAPL&period=annual&limit=5",
                    )
                },
                RouteDescriptor::symbol(
                    "/analyst-estimates",
                    "/stable/analyst-estimates",
                    &["limit"],
                    "/analyst-estimates?symbol=AAPL&limit=10",
                ),
                RouteDescriptor {
                    path: "/search".into(),
                    upstream: "/api/v3/search".into(),
                    required: None,
                    passthrough: vec![PASSTHROUGH_ALL.into()],
                    limit: None,
                    fan_out: false,
                    example: Some("/search?query=apple&limit=10&exchange=NASDAQ".into()),
                },
            ],
        }
    }

    #[must_use]
    pub fn find(&self, path: &str) -> Option<&RouteDescriptor> {
        self.routes.iter().find(|r| r.path == path)
    }

    /// Sample URLs for every route, each prefixed with `prefix`.
    #[must_use]
    pub fn examples(&self, prefix: &str) -> Vec<String> {
        self.routes
            .iter()
            .map(|r| format!("{prefix}{}", r.example.as_deref().unwrap_or(&r.path)))
            .collect()
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl RouteDescriptor {
    fn symbol(path: &str, upstream: &str, passthrough: &[&str], example: &str) -> Self {
        Self {
            path: path.into(),
            upstream: upstream.into(),
            required: Some("symbol".into()),
            passthrough: passthrough.iter().map(|s| (*s).to_string()).collect(),
            limit: None,
            fan_out: false,
            example: Some(example.into()),
        }
    }

    #[must_use]
    pub fn passthrough_policy(&self) -> Passthrough<'_> {
        if self.passthrough.iter().any(|p| p == PASSTHROUGH_ALL) {
            Passthrough::All
        } else if self.passthrough.is_empty() {
            Passthrough::None
        } else {
            Passthrough::Only(&self.passthrough)
        }
    }

    /// Names of `:param` segments in the upstream template.
    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.upstream
            .split('/')
            .filter_map(|segment| segment.strip_prefix(':'))
    }

    /// Whether the required parameter is substituted into the upstream path
    /// rather than sent as a query parameter.
    #[must_use]
    pub fn required_in_path(&self) -> bool {
        self.required
            .as_deref()
            .is_some_and(|name| self.placeholders().any(|p| p == name))
    }
}

impl LimitClamp {
    /// Resolve the upstream `limit` from the caller's raw value.
    ///
    /// The value is read like a lenient integer parse: leading whitespace,
    /// an optional sign, then digits; trailing garbage is ignored. Anything
    /// without leading digits falls back to the default.
    #[must_use]
    pub fn apply(&self, requested: Option<&str>) -> i64 {
        requested
            .and_then(parse_leading_int)
            .map_or(self.default, |n| n.min(self.max))
    }
}

fn parse_leading_int(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let digits_len = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits_len == 0 {
        return None;
    }
    let saturated = if negative { i64::MIN } else { i64::MAX };
    Some(
        rest[..digits_len]
            .parse::<i64>()
            .map_or(saturated, |n| if negative { -n } else { n }),
    )
}
