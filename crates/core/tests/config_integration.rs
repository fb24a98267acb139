//! grokline.toml 통합 설정 테스트
//!
//! - grokline.toml.example 파싱 테스트
//! - 파일 로딩 / 기본값 대체 테스트
//! - 잘못된 형식 에러 테스트

use std::fs;

use grokline_core::config::GroklineConfig;
use grokline_core::error::{ConfigError, GroklineError};
use tempfile::TempDir;

// =============================================================================
// grokline.toml.example 파싱 테스트
// =============================================================================

#[test]
fn example_config_parses_successfully() {
    let content = include_str!("../../../grokline.toml.example");
    let config = GroklineConfig::parse(content).expect("example config should parse");

    assert_eq!(config.general.log_level, "info");
    assert_eq!(config.general.log_format, "pretty");
    assert_eq!(config.engine.max_recursion_depth, 50);
    assert_eq!(config.engine.parallel_threshold, 256);
    assert!(config.engine.pattern_dirs.is_empty());
    assert!(config.engine.custom_patterns.is_empty());
}

#[test]
fn example_config_passes_validation() {
    let content = include_str!("../../../grokline.toml.example");
    let config = GroklineConfig::parse(content).expect("should parse");
    config
        .validate()
        .expect("example config should pass validation");
}

// =============================================================================
// 파일 로딩
// =============================================================================

#[tokio::test]
async fn load_reads_file_from_disk() {
    let dir = TempDir::new().expect("should create temp dir");
    let path = dir.path().join("grokline.toml");
    fs::write(
        &path,
        "[engine]\nmax_lines = 10\n\n[engine.custom_patterns]\nTENANT = \"t-[0-9]+\"\n",
    )
    .expect("should write config");

    let config = GroklineConfig::load(&path).await.expect("should load");
    assert_eq!(config.engine.max_lines, 10);
    assert!(config.engine.custom_patterns.contains_key("TENANT"));
}

#[tokio::test]
async fn load_missing_file_returns_not_found() {
    let result = GroklineConfig::load("/nonexistent/grokline.toml").await;
    assert!(matches!(
        result,
        Err(GroklineError::Config(ConfigError::FileNotFound { .. }))
    ));
}

#[tokio::test]
async fn load_or_default_falls_back_for_missing_file() {
    let config = GroklineConfig::load_or_default("/nonexistent/grokline.toml")
        .await
        .expect("missing file should fall back to defaults");
    assert_eq!(config.engine.max_recursion_depth, 50);
}

#[tokio::test]
async fn load_or_default_still_rejects_malformed_file() {
    let dir = TempDir::new().expect("should create temp dir");
    let path = dir.path().join("bad.toml");
    fs::write(&path, "[general\nlog_level = \"info\"\n").expect("should write config");

    let result = GroklineConfig::load_or_default(&path).await;
    assert!(matches!(
        result,
        Err(GroklineError::Config(ConfigError::ParseFailed { .. }))
    ));
}

#[tokio::test]
async fn load_rejects_invalid_values() {
    let dir = TempDir::new().expect("should create temp dir");
    let path = dir.path().join("invalid.toml");
    fs::write(&path, "[engine]\nmax_recursion_depth = 0\n").expect("should write config");

    let result = GroklineConfig::load(&path).await;
    assert!(matches!(
        result,
        Err(GroklineError::Config(ConfigError::InvalidValue { .. }))
    ));
}

#[test]
fn config_roundtrips_through_toml() {
    let mut config = GroklineConfig::default();
    config
        .engine
        .custom_patterns
        .insert("APP".to_owned(), "app-[0-9]+".to_owned());

    let text = toml::to_string_pretty(&config).expect("should serialize");
    let parsed = GroklineConfig::parse(&text).expect("should parse back");
    assert_eq!(
        parsed.engine.custom_patterns.get("APP").map(String::as_str),
        Some("app-[0-9]+")
    );
}
