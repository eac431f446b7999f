//! Route table validation with detailed error reporting.
//!
//! The [`validate`] function checks a parsed [`RouteTable`] for structural
//! errors such as empty tables, malformed or duplicate paths, upstream
//! templates that reference unknown parameters, and inconsistent limit
//! clamps. Returns a list of [`ValidationError`] values with per-field
//! suggestions.

use std::collections::HashSet;

use super::model::{RouteDescriptor, RouteTable, API_KEY_PARAM, PASSTHROUGH_ALL};
use crate::error::ValidationError;

/// Paths answered by the server itself.
pub const RESERVED_PATHS: &[&str] = &["/", "/health"];

/// Validate a single inbound or upstream path. Returns `Ok(())` or a
/// human-readable error.
pub fn validate_path(path: &str) -> Result<(), String> {
    if path.is_empty() {
        return Err("path cannot be empty".into());
    }
    if !path.starts_with('/') {
        return Err(format!("path must start with '/' (did you mean '/{path}'?)"));
    }
    if path.contains(['?', '#']) {
        return Err("path cannot contain a query string or fragment".into());
    }
    Ok(())
}

pub fn validate(table: &RouteTable) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if table.routes.is_empty() {
        errors.push(ValidationError {
            route: "(root)".into(),
            field: "routes".into(),
            message: "at least one route must be defined".into(),
            suggestion: Some("run 'fmp-relay init' for the built-in table".into()),
        });
    }

    let mut seen_paths = HashSet::new();

    for (i, route) in table.routes.iter().enumerate() {
        let route_id = if route.path.is_empty() {
            format!("#{i}")
        } else {
            route.path.clone()
        };
        let mut push = |field: &str, message: String, suggestion: Option<String>| {
            errors.push(ValidationError {
                route: route_id.clone(),
                field: field.into(),
                message,
                suggestion,
            });
        };

        match validate_path(&route.path) {
            Ok(()) => {
                if RESERVED_PATHS.contains(&route.path.as_str()) {
                    push("path", format!("'{}' is reserved", route.path), None);
                }
            }
            Err(msg) => {
                let suggestion = (!route.path.is_empty() && !route.path.starts_with('/'))
                    .then(|| format!("did you mean '/{}'?", route.path));
                push("path", msg, suggestion);
            }
        }

        if !seen_paths.insert(route.path.as_str()) {
            push("path", format!("duplicate path '{}'", route.path), None);
        }

        if let Err(msg) = validate_path(&route.upstream) {
            push("upstream", msg, None);
        }

        for placeholder in route.placeholders() {
            if route.required.as_deref() != Some(placeholder) {
                push(
                    "upstream",
                    format!("placeholder ':{placeholder}' does not name the required parameter"),
                    Some(format!("set required: {placeholder}")),
                );
            }
        }

        if let Some(required) = &route.required {
            if required.is_empty() {
                push("required", "parameter name cannot be empty".into(), None);
            }
            if required == API_KEY_PARAM {
                push(
                    "required",
                    format!("'{API_KEY_PARAM}' is injected by the server"),
                    None,
                );
            }
        } else if route.fan_out {
            push(
                "fan_out",
                "fan-out routes need a required parameter to split".into(),
                None,
            );
        }

        validate_passthrough(route, &mut push);

        if let Some(limit) = route.limit {
            if limit.max < 1 {
                push("limit.max", "must be at least 1".into(), None);
            }
            if limit.default > limit.max {
                push(
                    "limit.default",
                    format!("{} exceeds max {}", limit.default, limit.max),
                    None,
                );
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_passthrough(
    route: &RouteDescriptor,
    push: &mut impl FnMut(&str, String, Option<String>),
) {
    for name in &route.passthrough {
        if name.is_empty() {
            push("passthrough", "parameter name cannot be empty".into(), None);
        } else if name == API_KEY_PARAM {
            push(
                "passthrough",
                format!("'{API_KEY_PARAM}' is always replaced by the server key"),
                Some("remove it from the list".into()),
            );
        }
    }
    if route.passthrough.len() > 1 && route.passthrough.iter().any(|p| p == PASSTHROUGH_ALL) {
        push(
            "passthrough",
            format!("'{PASSTHROUGH_ALL}' already copies every parameter"),
            Some(format!("use [\"{PASSTHROUGH_ALL}\"] alone")),
        );
    }
}

#[must_use]
pub fn format_validation_report(path: &str, table: &RouteTable) -> String {
    let mut lines = vec![format!("  {} routes\n", table.routes.len())];

    for route in &table.routes {
        let mode = if route.fan_out { " (fan-out)" } else { "" };
        lines.push(format!("  {}  -> {}{mode}", route.path, route.upstream));
        if let Some(required) = &route.required {
            lines.push(format!("    required:    {required}"));
        }
        if !route.passthrough.is_empty() {
            lines.push(format!("    passthrough: {}", route.passthrough.join(", ")));
        }
        if let Some(limit) = route.limit {
            lines.push(format!(
                "    limit:       max {} (default {})",
                limit.max, limit.default
            ));
        }
    }

    format!("{} is valid\n{}", path, lines.join("\n"))
}
