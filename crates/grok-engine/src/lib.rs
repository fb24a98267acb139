#![doc = include_str!("../README.md")]
//!
//! # 모듈 구성
//!
//! - [`registry`]: 이름 -> 정규식 조각 레지스트리, 표준 라이브러리, 패턴 파일 로더
//! - [`compiler`]: `%{NAME:field:type}` DSL을 정규식과 필드 스키마로 컴파일
//! - [`matcher`]: 컴파일된 패턴을 라인에 적용
//! - [`validation`]: 패턴 집합 x 라인 배치 검증 (first-match, 병렬 매칭, 취소)
//! - [`syntax`]: 수집 파이프라인 필터 블록 생성
//! - [`definitions`]: YAML 패턴 정의 파일 로더
//! - [`types`]: 요청/응답 데이터 타입
//! - [`config`]: 엔진 설정 (core 설정 확장)
//! - [`error`]: 도메인 에러 타입
//!
//! # 아키텍처
//!
//! ```text
//! PatternRegistry -> PatternCompiler -> CompiledPattern -> Matcher
//!        |                                                   |
//!   builtin + files + inline              ValidationEngine (batch, ordered results)
//!
//! pattern text -> SyntaxGenerator -> filter block
//! ```

pub mod compiler;
pub mod config;
pub mod definitions;
pub mod error;
pub mod matcher;
pub mod registry;
pub mod syntax;
pub mod types;
pub mod validation;

// --- 주요 타입 re-export ---

// 레지스트리
pub use registry::{PatternLoader, PatternRegistry, UnknownPatternError};

// 컴파일러 / 매처
pub use compiler::{CompiledPattern, FieldSpec, PatternCompiler};
pub use matcher::{FieldMap, match_line};

// 검증
pub use validation::{ValidationEngine, ValidationEngineBuilder};

// 필터 블록
pub use syntax::SyntaxGenerator;

// 정의 파일
pub use definitions::DefinitionLoader;

// 데이터 타입
pub use types::{
    LineOutcome, LogLine, ParsedResult, PatternDefinition, PatternInput, ValidationOutcome,
    ValidationRequest,
};

// 설정
pub use config::{EngineConfig, EngineConfigBuilder};

// 에러
pub use error::{CompileError, CompileFailure, GrokEngineError};
