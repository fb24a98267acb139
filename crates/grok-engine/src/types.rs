//! 검증 요청/응답 데이터 타입
//!
//! 외부 호출자와 주고받는 JSON 구조는 camelCase 필드 이름을 사용합니다.
//!
//! ```text
//! 요청: { logLines: [..], patterns: [{ name, pattern }] }
//! 응답: { success, results: [{ lineNumber, line, parsed, error? }], error? }
//! ```

use serde::{Deserialize, Serialize, Serializer};

use crate::matcher::FieldMap;

/// 빈 라인에 대한 라인별 에러 메시지
pub const EMPTY_LINE_MESSAGE: &str = "Empty log line";
/// 어떤 패턴도 매칭되지 않은 라인의 에러 메시지
pub const NO_MATCH_MESSAGE: &str = "Pattern did not match this log line";
/// 매칭 중 내부 실패 메시지 접두어
pub const INTERNAL_FAILURE_PREFIX: &str = "Internal matcher failure";

/// 사용자 패턴 정의
///
/// `name`은 표시용 레이블이며 중복을 허용합니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternDefinition {
    /// 정의 식별자 (생략 시 UUID v4)
    #[serde(default = "new_definition_id")]
    pub id: String,
    /// 표시 이름
    pub name: String,
    /// DSL 패턴 텍스트
    #[serde(alias = "patternText")]
    pub pattern: String,
}

fn new_definition_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

impl PatternDefinition {
    /// 새 ID로 정의를 생성합니다.
    pub fn new(name: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            id: new_definition_id(),
            name: name.into(),
            pattern: pattern.into(),
        }
    }
}

impl From<PatternInput> for PatternDefinition {
    fn from(input: PatternInput) -> Self {
        Self::new(input.name, input.pattern)
    }
}

/// 입력 라인
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    /// 1부터 시작하는 라인 번호
    pub line_number: usize,
    /// 원문
    pub raw: String,
}

impl LogLine {
    /// 문자열 목록에 1부터 번호를 붙입니다. 빈 라인도 그대로 유지합니다.
    pub fn number<I, S>(lines: I) -> Vec<LogLine>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        lines
            .into_iter()
            .enumerate()
            .map(|(idx, raw)| LogLine {
                line_number: idx + 1,
                raw: raw.into(),
            })
            .collect()
    }

    /// 공백을 제거하면 비어 있는지 확인합니다.
    pub fn is_blank(&self) -> bool {
        self.raw.trim().is_empty()
    }
}

/// 라인 하나의 처리 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome {
    /// 선언 순서상 `pattern_index`번째 패턴이 처음으로 매칭됨
    Matched {
        /// 매칭된 패턴 위치 (0부터)
        pattern_index: usize,
        /// 추출된 필드
        fields: FieldMap,
    },
    /// 빈 라인
    Empty,
    /// 어떤 패턴도 매칭되지 않음
    NoMatch,
    /// 매칭 중 내부 실패
    Failed(String),
}

impl LineOutcome {
    /// 메트릭 레이블 값
    pub fn label(&self) -> &'static str {
        match self {
            Self::Matched { .. } => "matched",
            Self::Empty => "empty",
            Self::NoMatch => "no_match",
            Self::Failed(_) => "failed",
        }
    }
}

/// 라인별 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedResult {
    /// 1부터 시작하는 라인 번호
    pub line_number: usize,
    /// 원문
    pub line: String,
    /// 처리 결과
    pub outcome: LineOutcome,
}

impl ParsedResult {
    /// 매칭된 경우 추출 필드
    pub fn parsed(&self) -> Option<&FieldMap> {
        match &self.outcome {
            LineOutcome::Matched { fields, .. } => Some(fields),
            _ => None,
        }
    }

    /// 매칭되지 않은 경우 에러 메시지
    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            LineOutcome::Matched { .. } => None,
            LineOutcome::Empty => Some(EMPTY_LINE_MESSAGE),
            LineOutcome::NoMatch => Some(NO_MATCH_MESSAGE),
            LineOutcome::Failed(reason) => Some(reason.as_str()),
        }
    }

    /// 매칭된 패턴 위치
    pub fn pattern_index(&self) -> Option<usize> {
        match &self.outcome {
            LineOutcome::Matched { pattern_index, .. } => Some(*pattern_index),
            _ => None,
        }
    }

    /// 매칭 여부
    pub fn is_matched(&self) -> bool {
        matches!(self.outcome, LineOutcome::Matched { .. })
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ParsedResultWire<'a> {
    line_number: usize,
    line: &'a str,
    parsed: Option<&'a FieldMap>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
}

impl Serialize for ParsedResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        ParsedResultWire {
            line_number: self.line_number,
            line: &self.line,
            parsed: self.parsed(),
            error: self.error(),
        }
        .serialize(serializer)
    }
}

/// 배치 검증 결과
///
/// `success = false`이면 `results`는 비어 있고 `error`에 사유가 담깁니다.
/// `success = true`이면 입력 라인마다 정확히 하나의 결과가 입력 순서대로 담깁니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationOutcome {
    /// 배치 성공 여부
    pub success: bool,
    /// 라인별 결과
    pub results: Vec<ParsedResult>,
    /// 배치 수준 에러
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ValidationOutcome {
    /// 성공 결과를 생성합니다.
    pub fn completed(results: Vec<ParsedResult>) -> Self {
        Self {
            success: true,
            results,
            error: None,
        }
    }

    /// 배치 수준 실패 결과를 생성합니다.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            results: Vec::new(),
            error: Some(error.into()),
        }
    }

    /// 매칭된 라인 수
    pub fn matched_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_matched()).count()
    }
}

/// 요청 내 패턴 항목
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternInput {
    /// 표시 이름
    #[serde(default)]
    pub name: String,
    /// DSL 패턴 텍스트
    #[serde(default)]
    pub pattern: String,
}

/// 검증 요청
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationRequest {
    /// 입력 라인
    #[serde(default)]
    pub log_lines: Vec<String>,
    /// 선언 순서대로의 패턴
    #[serde(default)]
    pub patterns: Vec<PatternInput>,
}
