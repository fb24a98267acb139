//! 엔진 설정
//!
//! [`EngineConfig`]는 core의 [`EngineSection`](grokline_core::config::EngineSection)을
//! 기반으로 검증 엔진이 실제로 사용하는 값을 담습니다.
//!
//! # 사용 예시
//! ```
//! use grokline_core::config::GroklineConfig;
//! use grokline_engine::config::EngineConfig;
//!
//! let core_config = GroklineConfig::default();
//! let config = EngineConfig::from_core(&core_config.engine);
//! assert_eq!(config.max_recursion_depth, 50);
//! ```

use std::collections::BTreeMap;
use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

use grokline_core::config::{EngineSection, is_valid_pattern_name};

use crate::error::GrokEngineError;

/// 재귀 확장 깊이 상한의 최대 허용값
const MAX_RECURSION_DEPTH_LIMIT: usize = 1000;
/// 워커 수 최대 허용값
const MAX_WORKER_THREADS: usize = 256;

/// 엔진 설정
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// 이름 참조 재귀 확장 깊이 상한
    pub max_recursion_depth: usize,
    /// 라인 매칭 워커 수 (0 = 사용 가능한 병렬도)
    pub worker_threads: usize,
    /// 이 라인 수 미만이면 현재 태스크에서 순차 매칭
    pub parallel_threshold: usize,
    /// 요청당 최대 라인 수
    pub max_lines: usize,
    /// 사용자 패턴 파일 디렉토리
    pub pattern_dirs: Vec<String>,
    /// 인라인 사용자 패턴
    pub custom_patterns: BTreeMap<String, String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::from_core(&EngineSection::default())
    }
}

impl EngineConfig {
    /// core의 `EngineSection`에서 엔진 설정을 생성합니다.
    pub fn from_core(core: &EngineSection) -> Self {
        Self {
            max_recursion_depth: core.max_recursion_depth,
            worker_threads: core.worker_threads,
            parallel_threshold: core.parallel_threshold,
            max_lines: core.max_lines,
            pattern_dirs: core.pattern_dirs.clone(),
            custom_patterns: core.custom_patterns.clone(),
        }
    }

    /// 레지스트리 구성에 쓰이는 core 섹션 형태로 되돌립니다.
    pub fn to_section(&self) -> EngineSection {
        EngineSection {
            max_recursion_depth: self.max_recursion_depth,
            worker_threads: self.worker_threads,
            parallel_threshold: self.parallel_threshold,
            max_lines: self.max_lines,
            pattern_dirs: self.pattern_dirs.clone(),
            custom_patterns: self.custom_patterns.clone(),
        }
    }

    /// 실제로 사용할 워커 수를 반환합니다.
    ///
    /// `worker_threads`가 0이면 사용 가능한 병렬도를 따릅니다.
    pub fn effective_workers(&self) -> usize {
        if self.worker_threads > 0 {
            return self.worker_threads;
        }
        std::thread::available_parallelism()
            .map(NonZeroUsize::get)
            .unwrap_or(1)
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), GrokEngineError> {
        if self.max_recursion_depth == 0 || self.max_recursion_depth > MAX_RECURSION_DEPTH_LIMIT {
            return Err(GrokEngineError::Config {
                field: "max_recursion_depth".to_owned(),
                reason: format!("must be 1-{MAX_RECURSION_DEPTH_LIMIT}"),
            });
        }

        if self.worker_threads > MAX_WORKER_THREADS {
            return Err(GrokEngineError::Config {
                field: "worker_threads".to_owned(),
                reason: format!("must be 0-{MAX_WORKER_THREADS}"),
            });
        }

        if self.max_lines == 0 {
            return Err(GrokEngineError::Config {
                field: "max_lines".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }

        for dir in &self.pattern_dirs {
            if dir.trim().is_empty() {
                return Err(GrokEngineError::Config {
                    field: "pattern_dirs".to_owned(),
                    reason: "pattern directory must not be empty".to_owned(),
                });
            }
        }

        if let Some(name) = self
            .custom_patterns
            .keys()
            .find(|name| !is_valid_pattern_name(name))
        {
            return Err(GrokEngineError::Config {
                field: format!("custom_patterns.{name}"),
                reason: "pattern name must contain only [A-Za-z0-9_]".to_owned(),
            });
        }

        Ok(())
    }
}

/// 엔진 설정 빌더
#[derive(Default)]
pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl EngineConfigBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 재귀 확장 깊이 상한을 설정합니다.
    pub fn max_recursion_depth(mut self, depth: usize) -> Self {
        self.config.max_recursion_depth = depth;
        self
    }

    /// 워커 수를 설정합니다.
    pub fn worker_threads(mut self, workers: usize) -> Self {
        self.config.worker_threads = workers;
        self
    }

    /// 병렬 처리 임계값을 설정합니다.
    pub fn parallel_threshold(mut self, threshold: usize) -> Self {
        self.config.parallel_threshold = threshold;
        self
    }

    /// 요청당 최대 라인 수를 설정합니다.
    pub fn max_lines(mut self, max_lines: usize) -> Self {
        self.config.max_lines = max_lines;
        self
    }

    /// 패턴 파일 디렉토리를 추가합니다.
    pub fn pattern_dir(mut self, dir: impl Into<String>) -> Self {
        self.config.pattern_dirs.push(dir.into());
        self
    }

    /// 인라인 사용자 패턴을 추가합니다.
    pub fn custom_pattern(mut self, name: impl Into<String>, fragment: impl Into<String>) -> Self {
        self.config
            .custom_patterns
            .insert(name.into(), fragment.into());
        self
    }

    /// 설정을 검증하고 `EngineConfig`를 생성합니다.
    pub fn build(self) -> Result<EngineConfig, GrokEngineError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
