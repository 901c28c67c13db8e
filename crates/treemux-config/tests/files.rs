//! Loading configuration from files on disk.

use std::io::Write;

use tempfile::NamedTempFile;
use treemux_config::{ConfigError, ConfigLoader, LogFormat, RouteConfig};

fn write_temp(suffix: &str, content: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(suffix)
        .tempfile()
        .expect("create temp file");
    file.write_all(content.as_bytes()).expect("write temp file");
    file
}

#[test]
fn loads_toml_file_with_routes() {
    let file = write_temp(
        ".toml",
        r#"
            [server]
            http_addr = "127.0.0.1:0"
            request_timeout_ms = 500

            [[router.routes]]
            path = "/foo/*"
            handler = "foo"

            [[router.routes]]
            path = "moo/"
            handler = "moo"

            [telemetry.logging]
            format = "pretty"
        "#,
    );

    let config = ConfigLoader::new()
        .with_file(file.path())
        .unwrap()
        .load()
        .unwrap();

    assert_eq!(config.server.request_timeout_ms, 500);
    assert_eq!(
        config.router.routes,
        vec![RouteConfig::new("/foo/*", "foo"), RouteConfig::new("moo/", "moo")]
    );
    assert_eq!(config.telemetry.logging.format, LogFormat::Pretty);
}

#[test]
fn loads_json_file() {
    let file = write_temp(".json", r#"{"server": {"max_body_bytes": 16}}"#);

    let config = ConfigLoader::new()
        .with_optional_file(file.path())
        .unwrap()
        .load()
        .unwrap();

    assert_eq!(config.server.max_body_bytes, 16);
}

#[test]
fn rejects_unknown_extension() {
    let file = write_temp(".yaml", "server: {}");
    let err = ConfigLoader::new().with_file(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::UnsupportedFormat { .. }));
}

#[test]
fn rejects_unknown_fields() {
    let file = write_temp(
        ".toml",
        r#"
            [[router.routes]]
            path = "/a"
            handler = "a"
            method = "GET"
        "#,
    );
    let err = ConfigLoader::new().with_file(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::TomlError(_)));
}

#[test]
fn file_layer_replaces_preset() {
    let file = write_temp(".toml", "[server]\nhttp_addr = \"127.0.0.1:9999\"\n");

    let config = ConfigLoader::new()
        .with_development()
        .with_file(file.path())
        .unwrap()
        .load_unvalidated();

    assert_eq!(config.server.http_addr, "127.0.0.1:9999");
    assert_eq!(config.telemetry.logging.level, "info");
}

#[test]
fn invalid_route_fails_validation() {
    let file = write_temp(
        ".toml",
        r#"
            [[router.routes]]
            path = "/users"
            handler = ""
        "#,
    );
    let err = ConfigLoader::new()
        .with_file(file.path())
        .unwrap()
        .load()
        .unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { .. }));
}
