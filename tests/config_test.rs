use std::net::SocketAddr;
use std::path::Path;

use pr_monitor::config::loader::{data_dir, load_config};
use pr_monitor::config::types::AppConfig;

#[test]
fn parse_minimal_config() {
    let toml = r#"
[github]
owner = "acme"
repo = "widgets"
"#;
    let config: AppConfig = toml::from_str(toml).unwrap();
    assert_eq!(config.github.owner, "acme");
    assert_eq!(config.github.repo, "widgets");
    assert_eq!(config.github.host, "github.com");
    assert_eq!(config.github.per_page, 100);
    assert_eq!(config.sync.interval_seconds, 600);
    assert_eq!(config.sync.overlap_seconds, 0);
    assert_eq!(config.server.port, 3030);
    assert_eq!(config.server.refresh_seconds, 30);
    assert!(config.filters.include.is_empty());
    config.validate().unwrap();
}

#[test]
fn parse_unknown_keys_ignored() {
    let toml = r#"
unknown_top_level = "should be ignored"

[github]
owner = "acme"
repo = "widgets"
color = "blue"
"#;
    let config: AppConfig = toml::from_str(toml).unwrap();
    assert_eq!(config.github.repo, "widgets");
}

#[test]
fn parse_full_config() {
    let toml = r#"
[github]
host = "git.example.com"
owner = "platform"
repo = "monorepo"
per_page = 50

[sync]
interval_seconds = 120
overlap_seconds = 5

[server]
bind = "127.0.0.1"
port = 8080
refresh_seconds = 10

[filters]
include = ["services/billing/", "libs/money/"]
exclude = ["services/billing/generated/"]

[storage]
data_dir = "/var/lib/pr-monitor"
"#;
    let config: AppConfig = toml::from_str(toml).unwrap();
    assert_eq!(config.github.host, "git.example.com");
    assert_eq!(config.github.per_page, 50);
    assert_eq!(config.sync.interval_seconds, 120);
    assert_eq!(config.sync.overlap_seconds, 5);
    assert_eq!(config.server.bind, "127.0.0.1");
    assert_eq!(config.server.port, 8080);
    assert_eq!(config.filters.include.len(), 2);
    assert_eq!(config.filters.exclude, vec!["services/billing/generated/"]);
    assert_eq!(
        data_dir(&config).unwrap(),
        Path::new("/var/lib/pr-monitor")
    );
    config.validate().unwrap();
}

#[test]
fn validate_requires_repository() {
    let err = AppConfig::default().validate().unwrap_err();
    assert!(err.to_string().contains("owner and repo"));
}

#[test]
fn validate_rejects_tiny_interval_and_huge_overlap() {
    let mut config: AppConfig = toml::from_str(
        r#"
[github]
owner = "a"
repo = "b"

[sync]
interval_seconds = 1
"#,
    )
    .unwrap();
    assert!(config.validate().is_err());

    config.sync.interval_seconds = 60;
    config.sync.overlap_seconds = 7 * 86_400;
    assert!(config.validate().is_err());
}

#[test]
fn validate_rejects_runaway_refresh() {
    let mut config: AppConfig = toml::from_str(
        r#"
[github]
owner = "a"
repo = "b"

[server]
refresh_seconds = 0
"#,
    )
    .unwrap();
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("refresh_seconds"));

    config.server.refresh_seconds = 5;
    config.validate().unwrap();
}

#[test]
fn listen_addr_accepts_ipv4_and_ipv6() {
    let mut config = AppConfig::default();
    config.server.port = 8080;
    assert_eq!(
        config.server.listen_addr().unwrap(),
        "0.0.0.0:8080".parse::<SocketAddr>().unwrap()
    );

    config.server.bind = "::".to_owned();
    assert_eq!(
        config.server.listen_addr().unwrap(),
        "[::]:8080".parse::<SocketAddr>().unwrap()
    );

    config.server.bind = "::1".to_owned();
    assert!(config.server.listen_addr().unwrap().is_ipv6());

    config.server.bind = "localhost:80".to_owned();
    assert!(config.server.listen_addr().is_err());
}

#[test]
fn invalid_toml_is_an_error() {
    let result: Result<AppConfig, _> = toml::from_str("[github\nowner = ");
    assert!(result.is_err());
}

#[test]
fn load_explicit_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
[github]
owner = "acme"
repo = "widgets"

[server]
port = 9999
"#,
    )
    .unwrap();
    let config = load_config(Some(&path)).unwrap();
    assert_eq!(config.server.port, 9999);
}

#[test]
fn load_missing_explicit_path_fails() {
    let result = load_config(Some(Path::new("/nonexistent/pr-monitor.toml")));
    assert!(result.is_err());
}
