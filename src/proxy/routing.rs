//! Inbound path resolution against the route table.
//!
//! [`match_route`] strips the configured prefix (so `/api/quote` and
//! `/quote` both resolve), then looks the path up exactly. The bare root
//! resolves to the built-in capability listing.

use crate::config::model::{RouteDescriptor, RouteTable};

#[derive(Debug, PartialEq, Eq)]
pub enum Resolved<'a> {
    Root,
    Route(&'a RouteDescriptor),
    NotFound,
}

/// Remove `prefix` from the front of `path` when it matches on a segment
/// boundary. Paths without the prefix are returned unchanged.
#[must_use]
pub fn strip_prefix<'a>(path: &'a str, prefix: &str) -> &'a str {
    if prefix.is_empty() {
        return path;
    }
    match path.strip_prefix(prefix) {
        Some("") => "/",
        Some(rest) if rest.starts_with('/') => rest,
        _ => path,
    }
}

#[must_use]
pub fn match_route<'a>(table: &'a RouteTable, path: &str) -> Resolved<'a> {
    let path = if path.len() > 1 {
        path.trim_end_matches('/')
    } else {
        path
    };

    if path.is_empty() || path == "/" {
        return Resolved::Root;
    }

    table.find(path).map_or(Resolved::NotFound, Resolved::Route)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixed_and_bare_paths_resolve() {
        assert_eq!(strip_prefix("/api/quote", "/api"), "/quote");
        assert_eq!(strip_prefix("/quote", "/api"), "/quote");
        assert_eq!(strip_prefix("/api", "/api"), "/");
        assert_eq!(strip_prefix("/apiquote", "/api"), "/apiquote");
        assert_eq!(strip_prefix("/api/quote", ""), "/api/quote");
    }

    #[test]
    fn exact_match() {
        let table = RouteTable::builtin();
        match match_route(&table, "/profile") {
            Resolved::Route(route) => assert_eq!(route.path, "/profile"),
            other => panic!("expected route, got {other:?}"),
        }
    }

    #[test]
    fn trailing_slash_is_ignored() {
        let table = RouteTable::builtin();
        assert!(matches!(
            match_route(&table, "/search/"),
            Resolved::Route(r) if r.path == "/search"
        ));
    }

    #[test]
    fn root_resolves_to_listing() {
        let table = RouteTable::builtin();
        assert_eq!(match_route(&table, "/"), Resolved::Root);
        assert_eq!(match_route(&table, ""), Resolved::Root);
    }

    #[test]
    fn no_match() {
        let table = RouteTable::builtin();
        assert_eq!(match_route(&table, "/bogus"), Resolved::NotFound);
        assert_eq!(match_route(&table, "/profile/AAPL"), Resolved::NotFound);
    }
}
