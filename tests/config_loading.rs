//! Integration tests for loading filter chains from TOML files
//!
//! Verifies the full path file -> parse -> validate -> build, and that each
//! phase reports failures with the file path and underlying cause.

use meter_filter::{
    DistributionStatisticConfig, FilterError, MeterFilterReply, MeterId, MeterType,
    config::{FilterChainConfig, FilterRule},
};
use std::io::Write;
use tempfile::NamedTempFile;

/// Helper to create a temporary config file with given TOML content
fn create_temp_config(toml_content: &str) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().expect("Failed to create temp file");
    temp_file
        .write_all(toml_content.as_bytes())
        .expect("Failed to write temp file");
    temp_file.flush().expect("Failed to flush temp file");
    temp_file
}

const FULL_CONFIG: &str = r#"
[observability]
log_level = "debug"

[[filters]]
type = "deny_name_starts_with"
prefix = "jvm.buffer"

[[filters]]
type = "common_tags"
tags = [{ key = "env", value = "prod" }, { key = "region", value = "eu" }]

[[filters]]
type = "rename_tag"
prefix = "http"
from_key = "method"
to_key = "http.method"

[[filters]]
type = "ignore_tags"
keys = ["instance"]

[[filters]]
type = "maximum_allowable_tags"
name = "http.server.requests"
tag_key = "uri"
max_values = 2
on_max_reached = { type = "deny" }

[[filters]]
type = "maximum_allowable_metrics"
max = 1000

[[filters]]
type = "max_expected"
prefix = "http"
meter_type = "timer"
millis = 5000

[[filters]]
type = "min_expected"
prefix = "http"
meter_type = "timer"
millis = 1

[[filters]]
type = "max_expected"
prefix = "payload"
meter_type = "distribution_summary"
value = 1048576.0
"#;

#[test]
fn test_full_config_loads_and_builds_in_order() {
    let temp_file = create_temp_config(FULL_CONFIG);
    let config = FilterChainConfig::from_file(temp_file.path()).expect("config should load");

    assert_eq!(config.observability.log_level, "debug");
    assert_eq!(config.filters.len(), 9);
    assert!(matches!(
        config.filters[0],
        FilterRule::DenyNameStartsWith { .. }
    ));

    let chain = config.build().expect("chain should build");
    assert_eq!(chain.len(), 9);
}

#[test]
fn test_built_chain_applies_every_pass() {
    let temp_file = create_temp_config(FULL_CONFIG);
    let chain = FilterChainConfig::from_file(temp_file.path())
        .and_then(|c| c.build())
        .expect("chain should build");

    let id = MeterId::new("http.server.requests", MeterType::Timer).with_tags([
        ("method", "GET"),
        ("uri", "/a"),
        ("instance", "i-123"),
    ]);
    let registration = chain.register(id, DistributionStatisticConfig::none());

    assert_eq!(registration.reply, MeterFilterReply::Neutral);
    assert_eq!(registration.id.tag("http.method"), Some("GET"));
    assert_eq!(registration.id.tag("env"), Some("prod"));
    assert_eq!(registration.id.tag("instance"), None);

    let config = registration.config.expect("timer config");
    assert_eq!(config.maximum_expected_value(), Some(5_000_000_000.0));
    assert_eq!(config.minimum_expected_value(), Some(1_000_000.0));

    let buffer = MeterId::new("jvm.buffer.count", MeterType::Gauge);
    let denied = chain.register(buffer, DistributionStatisticConfig::none());
    assert_eq!(denied.reply, MeterFilterReply::Deny);
    assert_eq!(denied.config, None);
}

#[test]
fn test_built_chain_limits_uri_values() {
    let temp_file = create_temp_config(FULL_CONFIG);
    let chain = FilterChainConfig::from_file(temp_file.path())
        .and_then(|c| c.build())
        .expect("chain should build");

    let replies: Vec<MeterFilterReply> = ["/a", "/b", "/c"]
        .into_iter()
        .map(|uri| {
            let id = MeterId::new("http.server.requests", MeterType::Timer)
                .with_tags([("uri", uri)]);
            chain
                .register(id, DistributionStatisticConfig::none())
                .reply
        })
        .collect();

    assert_eq!(
        replies,
        vec![
            MeterFilterReply::Neutral,
            MeterFilterReply::Neutral,
            MeterFilterReply::Deny
        ]
    );
}

#[test]
fn test_config_from_file_missing_file() {
    let result = FilterChainConfig::from_file("/nonexistent/filters.toml");

    match result {
        Err(FilterError::ConfigFileRead { path, .. }) => {
            assert!(path.contains("filters.toml"));
        }
        other => panic!("expected ConfigFileRead, got {:?}", other),
    }
}

#[test]
fn test_config_from_file_parse_error_keeps_path() {
    let temp_file = create_temp_config("[[filters]]\ntype = 42\n");
    let result = FilterChainConfig::from_file(temp_file.path());

    match result {
        Err(err @ FilterError::ConfigParseFailed { .. }) => {
            let msg = err.to_string();
            assert!(
                msg.contains(&temp_file.path().display().to_string()),
                "error should name the file: {}",
                msg
            );
        }
        other => panic!("expected ConfigParseFailed, got {:?}", other),
    }
}

#[test]
fn test_config_from_file_rejects_invalid_rule() {
    let toml_content = r#"
[[filters]]
type = "max_expected"
prefix = "payload"
meter_type = "distribution_summary"
value = -1.0
"#;

    let temp_file = create_temp_config(toml_content);
    let result = FilterChainConfig::from_file(temp_file.path());

    match result {
        Err(FilterError::ConfigValidationFailed { reason, .. }) => {
            assert!(reason.contains("non-negative"), "reason: {}", reason);
            assert!(reason.contains("filters[0]"), "reason: {}", reason);
        }
        other => panic!("expected ConfigValidationFailed, got {:?}", other),
    }
}

#[test]
fn test_config_log_level_feeds_telemetry() {
    let config = FilterChainConfig::from_toml_str("[observability]\nlog_level = \"warn\"\n")
        .expect("config should parse");

    meter_filter::telemetry::init(&config.observability.log_level);
    assert!(config.filters.is_empty());
}
