//! 패턴 레지스트리 -- 이름에서 정규식 조각으로의 매핑
//!
//! [`PatternRegistry`]는 표준 라이브러리([`builtin`])와 사용자 정의 조각을 담습니다.
//! 초기화 후에는 읽기 전용으로 `Arc`를 통해 모든 컴파일에서 공유됩니다.
//!
//! # 아키텍처
//! - [`builtin`]: 표준 패턴 라이브러리
//! - [`loader`]: Logstash 형식 패턴 파일 로딩

pub mod builtin;
pub mod loader;

pub use loader::PatternLoader;

use std::collections::HashMap;

use grokline_core::config::{EngineSection, is_valid_pattern_name};

use crate::error::GrokEngineError;

/// 레지스트리에 없는 이름 조회
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown pattern '{0}'")]
pub struct UnknownPatternError(pub String);

/// 패턴 레지스트리
///
/// 이름은 인스턴스 내에서 유일하며, 같은 이름으로 다시 등록하면 덮어씁니다.
#[derive(Debug, Clone, Default)]
pub struct PatternRegistry {
    entries: HashMap<String, String>,
}

impl PatternRegistry {
    /// 빈 레지스트리를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 표준 라이브러리가 등록된 레지스트리를 생성합니다.
    pub fn with_builtins() -> Self {
        let entries = builtin::BUILTIN_PATTERNS
            .iter()
            .map(|(name, fragment)| ((*name).to_owned(), (*fragment).to_owned()))
            .collect();
        Self { entries }
    }

    /// 엔진 설정으로부터 레지스트리를 구성합니다.
    ///
    /// 적용 순서는 표준 라이브러리, `pattern_dirs`의 파일, `custom_patterns` 순이며
    /// 뒤에 적용된 정의가 앞의 정의를 덮어씁니다.
    pub async fn from_section(section: &EngineSection) -> Result<Self, GrokEngineError> {
        let mut registry = Self::with_builtins();

        for dir in &section.pattern_dirs {
            let patterns = PatternLoader::load_directory(dir).await?;
            registry.register_all(patterns)?;
        }

        registry.register_all(
            section
                .custom_patterns
                .iter()
                .map(|(name, fragment)| (name.clone(), fragment.clone())),
        )?;

        tracing::debug!(patterns = registry.len(), "pattern registry initialized");
        Ok(registry)
    }

    /// 조각을 등록합니다. 같은 이름이 있으면 덮어쓰고 이전 조각을 반환합니다.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        fragment: impl Into<String>,
    ) -> Result<Option<String>, GrokEngineError> {
        let name = name.into();
        if !is_valid_pattern_name(&name) {
            return Err(GrokEngineError::InvalidPatternName {
                name,
                reason: "must be non-empty and contain only [A-Za-z0-9_]".to_owned(),
            });
        }

        let previous = self.entries.insert(name, fragment.into());
        Ok(previous)
    }

    /// 여러 조각을 순서대로 등록합니다.
    pub fn register_all<I, N, F>(&mut self, patterns: I) -> Result<(), GrokEngineError>
    where
        I: IntoIterator<Item = (N, F)>,
        N: Into<String>,
        F: Into<String>,
    {
        for (name, fragment) in patterns {
            if let Some(previous) = self.register(name, fragment)? {
                tracing::trace!(fragment = %previous, "pattern definition overwritten");
            }
        }
        Ok(())
    }

    /// 이름으로 조각을 조회합니다.
    pub fn lookup(&self, name: &str) -> Result<&str, UnknownPatternError> {
        self.entries
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| UnknownPatternError(name.to_owned()))
    }

    /// 이름이 등록되어 있는지 확인합니다.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// 등록된 이름을 정렬하여 반환합니다.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// 등록된 조각 수를 반환합니다.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 레지스트리가 비어 있는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
