//! 설정 관리: grokline.toml 파싱 및 런타임 설정
//!
//! [`GroklineConfig`]는 모든 크레이트의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`GROKLINE_ENGINE_MAX_LINES=5000` 형식)
//! 3. 설정 파일 (`grokline.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), grokline_core::error::GroklineError> {
//! use grokline_core::config::GroklineConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = GroklineConfig::load("grokline.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = GroklineConfig::parse("[engine]\nmax_recursion_depth = 20")?;
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, GroklineError};

/// 재귀 확장 깊이 상한의 최대 허용값
const MAX_RECURSION_DEPTH_LIMIT: usize = 1000;

/// grokline 통합 설정
///
/// `grokline.toml` 파일의 최상위 구조를 나타냅니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroklineConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 패턴 엔진 설정
    #[serde(default)]
    pub engine: EngineSection,
}

impl GroklineConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, GroklineError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// 설정 파일이 없으면 기본값으로 대체하여 로드합니다.
    ///
    /// 파일이 존재하지만 파싱/검증에 실패하면 에러를 그대로 반환합니다.
    pub async fn load_or_default(path: impl AsRef<Path>) -> Result<Self, GroklineError> {
        match Self::load(path.as_ref()).await {
            Err(GroklineError::Config(ConfigError::FileNotFound { path })) => {
                tracing::debug!(path = %path, "config file not found, using defaults");
                let mut config = Self::default();
                config.apply_env_overrides();
                config.validate()?;
                Ok(config)
            }
            other => other,
        }
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, GroklineError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                GroklineError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                GroklineError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, GroklineError> {
        toml::from_str(toml_str).map_err(|e| {
            GroklineError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `GROKLINE_{SECTION}_{FIELD}`
    /// 예: `GROKLINE_ENGINE_WORKER_THREADS=4`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "GROKLINE_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "GROKLINE_GENERAL_LOG_FORMAT");

        // Engine
        override_usize(
            &mut self.engine.max_recursion_depth,
            "GROKLINE_ENGINE_MAX_RECURSION_DEPTH",
        );
        override_usize(
            &mut self.engine.worker_threads,
            "GROKLINE_ENGINE_WORKER_THREADS",
        );
        override_usize(
            &mut self.engine.parallel_threshold,
            "GROKLINE_ENGINE_PARALLEL_THRESHOLD",
        );
        override_usize(&mut self.engine.max_lines, "GROKLINE_ENGINE_MAX_LINES");
        override_csv(&mut self.engine.pattern_dirs, "GROKLINE_ENGINE_PATTERN_DIRS");
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), GroklineError> {
        // log_level 검증
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            }
            .into());
        }

        // log_format 검증
        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            }
            .into());
        }

        if self.engine.max_recursion_depth == 0
            || self.engine.max_recursion_depth > MAX_RECURSION_DEPTH_LIMIT
        {
            return Err(ConfigError::InvalidValue {
                field: "engine.max_recursion_depth".to_owned(),
                reason: format!("must be 1-{MAX_RECURSION_DEPTH_LIMIT}"),
            }
            .into());
        }

        if self.engine.max_lines == 0 {
            return Err(ConfigError::InvalidValue {
                field: "engine.max_lines".to_owned(),
                reason: "must be greater than 0".to_owned(),
            }
            .into());
        }

        for name in self.engine.custom_patterns.keys() {
            if !is_valid_pattern_name(name) {
                return Err(ConfigError::InvalidValue {
                    field: format!("engine.custom_patterns.{name}"),
                    reason: "pattern name must be non-empty and contain only [A-Za-z0-9_]"
                        .to_owned(),
                }
                .into());
            }
        }

        Ok(())
    }
}

/// 패턴 이름이 `[A-Za-z0-9_]+` 형식인지 확인합니다.
///
/// 엔진의 레지스트리와 토큰 파서도 같은 규칙을 사용합니다.
pub fn is_valid_pattern_name(name: &str) -> bool {
    !name.is_empty() && name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "pretty".to_owned(),
        }
    }
}

/// 패턴 엔진 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSection {
    /// 이름 참조 재귀 확장 깊이 상한
    pub max_recursion_depth: usize,
    /// 라인 매칭 워커 수 (0 = 사용 가능한 병렬도)
    pub worker_threads: usize,
    /// 이 라인 수 미만이면 워커 없이 현재 태스크에서 매칭
    pub parallel_threshold: usize,
    /// 한 번의 검증 요청에서 허용하는 최대 라인 수
    pub max_lines: usize,
    /// 사용자 패턴 파일 디렉토리 목록
    pub pattern_dirs: Vec<String>,
    /// 인라인 사용자 패턴 (NAME = "regex")
    pub custom_patterns: BTreeMap<String, String>,
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            max_recursion_depth: 50,
            worker_threads: 0,
            parallel_threshold: 256,
            max_lines: 100_000,
            pattern_dirs: Vec::new(),
            custom_patterns: BTreeMap::new(),
        }
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_usize(target: &mut usize, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<usize>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse usize from env var, ignoring"
            ),
        }
    }
}

fn override_csv(target: &mut Vec<String>, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val
            .split(',')
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn default_config_has_sane_values() {
        let config = GroklineConfig::default();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.general.log_format, "pretty");
        assert_eq!(config.engine.max_recursion_depth, 50);
        assert_eq!(config.engine.worker_threads, 0);
        assert!(config.engine.custom_patterns.is_empty());
    }

    #[test]
    fn default_config_passes_validation() {
        GroklineConfig::default().validate().unwrap();
    }

    #[test]
    fn from_str_empty_toml_uses_defaults() {
        let config = GroklineConfig::parse("").unwrap();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.engine.max_lines, 100_000);
    }

    #[test]
    fn from_str_full_toml() {
        let toml = r#"
[general]
log_level = "debug"
log_format = "json"

[engine]
max_recursion_depth = 20
worker_threads = 4
parallel_threshold = 64
max_lines = 5000
pattern_dirs = ["/etc/grokline/patterns"]

[engine.custom_patterns]
APP_ID = "app-[0-9]+"
REQUEST = "%{WORD:method} %{NOTSPACE:path}"
"#;
        let config = GroklineConfig::parse(toml).unwrap();
        config.validate().unwrap();
        assert_eq!(config.general.log_format, "json");
        assert_eq!(config.engine.max_recursion_depth, 20);
        assert_eq!(config.engine.worker_threads, 4);
        assert_eq!(config.engine.pattern_dirs.len(), 1);
        assert_eq!(
            config.engine.custom_patterns.get("APP_ID").map(String::as_str),
            Some("app-[0-9]+")
        );
    }

    #[test]
    fn from_str_invalid_toml_returns_error() {
        let result = GroklineConfig::parse("[engine\nmax_lines = ");
        assert!(result.is_err());
    }

    #[test]
    fn validate_rejects_invalid_log_level() {
        let mut config = GroklineConfig::default();
        config.general.log_level = "verbose".to_owned();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_invalid_log_format() {
        let mut config = GroklineConfig::default();
        config.general.log_format = "xml".to_owned();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_depth() {
        let mut config = GroklineConfig::default();
        config.engine.max_recursion_depth = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_excessive_depth() {
        let mut config = GroklineConfig::default();
        config.engine.max_recursion_depth = MAX_RECURSION_DEPTH_LIMIT + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_max_lines() {
        let mut config = GroklineConfig::default();
        config.engine.max_lines = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_custom_pattern_name() {
        let mut config = GroklineConfig::default();
        config
            .engine
            .custom_patterns
            .insert("BAD-NAME".to_owned(), "x".to_owned());
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("BAD-NAME"));
    }

    #[test]
    fn pattern_name_rules() {
        assert!(is_valid_pattern_name("WORD"));
        assert!(is_valid_pattern_name("my_pattern_2"));
        assert!(!is_valid_pattern_name(""));
        assert!(!is_valid_pattern_name("has space"));
        assert!(!is_valid_pattern_name("dash-ed"));
    }

    #[test]
    #[serial]
    fn env_overrides_apply() {
        // SAFETY: serial 테스트이므로 다른 스레드가 환경변수를 읽지 않습니다.
        unsafe {
            std::env::set_var("GROKLINE_ENGINE_MAX_LINES", "42");
            std::env::set_var("GROKLINE_ENGINE_PATTERN_DIRS", "/a, /b,");
        }
        let mut config = GroklineConfig::default();
        config.apply_env_overrides();
        unsafe {
            std::env::remove_var("GROKLINE_ENGINE_MAX_LINES");
            std::env::remove_var("GROKLINE_ENGINE_PATTERN_DIRS");
        }
        assert_eq!(config.engine.max_lines, 42);
        assert_eq!(config.engine.pattern_dirs, vec!["/a", "/b"]);
    }

    #[test]
    #[serial]
    fn env_override_with_garbage_is_ignored() {
        unsafe {
            std::env::set_var("GROKLINE_ENGINE_WORKER_THREADS", "many");
        }
        let mut config = GroklineConfig::default();
        config.apply_env_overrides();
        unsafe {
            std::env::remove_var("GROKLINE_ENGINE_WORKER_THREADS");
        }
        assert_eq!(config.engine.worker_threads, 0);
    }
}
