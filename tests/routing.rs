//! Integration tests for route table files: export, parse, validate.

use fmp_relay::cli::ConfigFormat;
use fmp_relay::cmd::init::serialize_routes;
use fmp_relay::config::model::{RouteDescriptor, RouteTable};
use fmp_relay::config::sources::{load_route_file, parse_routes_str};
use fmp_relay::config::validation::validate;
use fmp_relay::error::RelayError;
use fmp_relay::proxy::routing::{match_route, strip_prefix, Resolved};

#[cfg(feature = "yaml")]
#[test]
fn yaml_export_round_trips() {
    let yaml = serialize_routes(&RouteTable::builtin(), &ConfigFormat::Yaml).unwrap();
    let table = parse_routes_str("yaml", &yaml, "routes.yaml").unwrap();
    validate(&table).unwrap();
    assert_eq!(table, RouteTable::builtin());
}

#[cfg(feature = "toml")]
#[test]
fn toml_export_round_trips() {
    let toml = serialize_routes(&RouteTable::builtin(), &ConfigFormat::Toml).unwrap();
    let table = parse_routes_str("toml", &toml, "routes.toml").unwrap();
    assert_eq!(table, RouteTable::builtin());
}

#[cfg(feature = "json")]
#[tokio::test]
async fn json_file_loads_and_validates() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("routes.json");
    let json = serialize_routes(&RouteTable::builtin(), &ConfigFormat::Json).unwrap();
    std::fs::write(&path, json).unwrap();

    let table = load_route_file(&path).await.unwrap();
    assert_eq!(table.routes.len(), 8);
}

#[cfg(feature = "yaml")]
#[tokio::test]
async fn invalid_file_is_rejected_with_all_errors() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("routes.yaml");
    std::fs::write(
        &path,
        r#"
routes:
  - path: "quote"
    upstream: "/stable/quote"
  - path: "/profile"
    upstream: "/api/v3/profile/:ticker"
    required: symbol
"#,
    )
    .unwrap();

    match load_route_file(&path).await.unwrap_err() {
        RelayError::RouteValidation { errors } => {
            assert_eq!(errors.len(), 2);
            assert_eq!(errors[0].field, "path");
            assert_eq!(errors[1].field, "upstream");
        }
        other => panic!("expected validation error, got {other}"),
    }
}

#[test]
fn custom_table_resolves_its_own_routes() {
    let table = RouteTable {
        routes: vec![RouteDescriptor {
            path: "/ratios".into(),
            upstream: "/stable/ratios".into(),
            required: Some("symbol".into()),
            passthrough: vec!["period".into()],
            limit: None,
            fan_out: false,
            example: None,
        }],
    };
    validate(&table).unwrap();

    let path = strip_prefix("/api/ratios", "/api");
    assert!(matches!(match_route(&table, path), Resolved::Route(r) if r.path == "/ratios"));
    assert_eq!(match_route(&table, "/quote"), Resolved::NotFound);
    assert_eq!(table.examples("/api"), ["/api/ratios"]);
}
