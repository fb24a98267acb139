//! 패턴 엔진 에러 타입
//!
//! [`GrokEngineError`]는 엔진 내부에서 발생하는 모든 에러를 표현합니다.
//! 패턴 컴파일 실패는 별도의 [`CompileError`]로 분류되며, 배치 검증에서는
//! 패턴별 실패가 [`CompileFailure`]로 모여 하나의 집계 메시지가 됩니다.
//! `From<GrokEngineError> for GroklineError` 변환이 구현되어 있어
//! 상위 레이어에서 `?` 연산자로 자연스럽게 전파할 수 있습니다.

use std::fmt;

use grokline_core::error::GroklineError;

/// 패턴 컴파일 에러
///
/// 어느 하나라도 발생하면 해당 배치 검증 전체가 매칭 전에 중단됩니다.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompileError {
    /// 패턴 텍스트가 비어 있음
    #[error("pattern text is empty")]
    EmptyPattern,

    /// 레지스트리에 없는 이름 참조
    #[error("unknown pattern reference '{name}' at offset {position}")]
    UnknownPatternReference {
        /// 참조된 이름
        name: String,
        /// 최상위 패턴 텍스트 내 토큰 시작 위치 (바이트 오프셋)
        position: usize,
    },

    /// 이름 참조 순환
    #[error("cyclic pattern reference: {}", chain.join(" -> "))]
    CyclicPatternReference {
        /// 순환을 이루는 이름 체인 (마지막 원소가 다시 등장한 이름)
        chain: Vec<String>,
    },

    /// 재귀 확장 깊이 상한 초과
    #[error("max recursion depth {depth} exceeded while expanding '{name}'")]
    MaxRecursionDepthExceeded {
        /// 설정된 깊이 상한
        depth: usize,
        /// 상한에 도달한 시점에 확장 중이던 이름
        name: String,
    },

    /// 최종 정규식이 유효하지 않음
    #[error("invalid regex syntax: {reason}")]
    InvalidRegexSyntax {
        /// 정규식 엔진의 에러 메시지
        reason: String,
    },
}

impl CompileError {
    /// 에러 종류의 고정 이름을 반환합니다.
    ///
    /// 집계 메시지와 메트릭 레이블에 사용됩니다.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::EmptyPattern => "EmptyPattern",
            Self::UnknownPatternReference { .. } => "UnknownPatternReference",
            Self::CyclicPatternReference { .. } => "CyclicPatternReference",
            Self::MaxRecursionDepthExceeded { .. } => "MaxRecursionDepthExceeded",
            Self::InvalidRegexSyntax { .. } => "InvalidRegexSyntax",
        }
    }
}

/// 배치 내 단일 패턴의 컴파일 실패
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileFailure {
    /// 선언 순서상 위치 (0부터)
    pub index: usize,
    /// 패턴 정의의 사용자 표시 이름
    pub pattern_name: String,
    /// 실패 원인
    pub error: CompileError,
}

impl fmt::Display for CompileFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}' ({}): {}",
            self.pattern_name,
            self.error.kind(),
            self.error
        )
    }
}

/// 실패 목록을 하나의 집계 메시지로 만듭니다.
///
/// 모든 실패 패턴의 이름과 실패 종류가 포함됩니다.
pub fn aggregate_compile_failures(failures: &[CompileFailure], total: usize) -> String {
    let details = failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ");
    format!(
        "{} of {} patterns failed to compile: {}",
        failures.len(),
        total,
        details
    )
}

/// 패턴 엔진 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum GrokEngineError {
    /// 단일 패턴 컴파일 실패
    #[error("compile error in pattern '{pattern}': {source}")]
    Compile {
        /// 패턴 이름 또는 원문
        pattern: String,
        /// 실패 원인
        #[source]
        source: CompileError,
    },

    /// 패턴 파일 로딩 실패
    #[error("pattern load error: {path}: {reason}")]
    PatternLoad {
        /// 파일 경로
        path: String,
        /// 로딩 실패 사유
        reason: String,
    },

    /// 레지스트리에 등록할 수 없는 이름
    #[error("invalid pattern name '{name}': {reason}")]
    InvalidPatternName {
        /// 문제가 된 이름
        name: String,
        /// 거부 사유
        reason: String,
    },

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// 검증 요청이 취소됨
    #[error("validation cancelled")]
    Cancelled,

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<GrokEngineError> for GroklineError {
    fn from(err: GrokEngineError) -> Self {
        GroklineError::Engine(err.to_string())
    }
}
