//! 패턴 컴파일러 -- `%{NAME:field}` DSL을 실행 가능한 정규식으로 변환합니다.
//!
//! [`PatternCompiler`]는 패턴 텍스트를 왼쪽에서 오른쪽으로 훑으며 토큰을
//! 레지스트리 조각으로 재귀 확장하고, 필드 토큰마다 하나의 캡처 그룹을 만듭니다.
//!
//! # 변환 규칙
//! - 최상위 리터럴은 `regex::escape`로 이스케이프합니다. 단, 텍스트 맨 앞의 `^`와
//!   맨 끝의 `$`는 앵커로 남깁니다. 맨 끝의 `\$`는 리터럴 `$` 하나입니다.
//! - 필드가 있는 토큰은 `(?P<fN>...)`, 필드가 없는 토큰은 `(?:...)`이 됩니다.
//!   내부 그룹 이름 `fN`은 스키마 위치이므로 필드 이름이 겹쳐도 충돌하지 않습니다.
//! - 조각 안의 리터럴은 정규식 원문이며, 캡처 그룹만 비캡처로 바뀝니다.
//! - 확장 중인 이름 체인으로 순환과 깊이를 검사합니다.
//! - 확장 문자열이 [`MAX_EXPANDED_LEN`]을 넘으면 즉시 중단합니다. 깊이가 얕아도
//!   조각이 다음 이름을 여러 번 참조하면 길이가 지수적으로 늘어납니다.
//!
//! # 아키텍처
//! - [`token`]: 토크나이저
//! - [`groups`]: 조각 내 캡처 그룹 무력화

pub mod groups;
pub mod token;

use std::fmt;
use std::fmt::Write as _;

use regex::Regex;

use grokline_core::config::is_valid_pattern_name;

use crate::error::{CompileError, GrokEngineError};
use crate::matcher::{self, FieldMap};
use crate::registry::PatternRegistry;

use groups::neutralize_groups;
use token::{Segment, Token, tokenize};

/// 기본 재귀 확장 깊이 상한
pub const DEFAULT_MAX_DEPTH: usize = 50;

/// 확장된 정규식 문자열의 최대 길이 (바이트)
pub const MAX_EXPANDED_LEN: usize = 1 << 20;

/// 필드 스키마 항목
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    /// 선언된 필드 이름
    pub name: String,
    /// 필드를 선언한 토큰 원문 (예: `%{IP:client}`)
    pub source_token: String,
    /// 타입 힌트. 캡처 여부에는 영향을 주지 않습니다.
    pub type_hint: Option<String>,
}

/// 컴파일된 패턴
///
/// 정규식의 캡처 그룹 수는 항상 `fields().len()`과 같고,
/// `i`번째 캡처 그룹이 `fields()[i]`에 대응합니다.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    source_text: String,
    regex: Regex,
    fields: Vec<FieldSpec>,
}

impl CompiledPattern {
    /// 원본 패턴 텍스트
    pub fn source_text(&self) -> &str {
        &self.source_text
    }

    /// 컴파일된 정규식
    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    /// 확장이 끝난 정규식 문자열
    pub fn expanded(&self) -> &str {
        self.regex.as_str()
    }

    /// 필드 스키마 (첫 등장 순서)
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// 필드 이름 목록
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// 한 라인에 매칭합니다. [`matcher::match_line`]과 같습니다.
    pub fn match_line(&self, line: &str) -> Option<FieldMap> {
        matcher::match_line(self, line)
    }
}

impl fmt::Display for CompiledPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source_text)
    }
}

/// 패턴 컴파일러
///
/// 레지스트리를 빌려 쓰며 상태를 갖지 않으므로 여러 패턴에 재사용할 수 있습니다.
///
/// # 사용 예시
/// ```
/// use grokline_engine::{PatternCompiler, PatternRegistry};
///
/// let registry = PatternRegistry::with_builtins();
/// let compiler = PatternCompiler::new(&registry);
/// let pattern = compiler.compile("%{IP:client} %{WORD:verb}").unwrap();
/// let fields = pattern.match_line("10.0.0.1 GET").unwrap();
/// assert_eq!(fields["client"], "10.0.0.1");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct PatternCompiler<'r> {
    registry: &'r PatternRegistry,
    max_depth: usize,
}

impl<'r> PatternCompiler<'r> {
    /// 기본 깊이 상한으로 컴파일러를 생성합니다.
    pub fn new(registry: &'r PatternRegistry) -> Self {
        Self {
            registry,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// 재귀 확장 깊이 상한을 설정합니다.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// 설정된 깊이 상한
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// 패턴 텍스트를 컴파일합니다.
    ///
    /// # Errors
    /// - 빈 텍스트: [`CompileError::EmptyPattern`]
    /// - 등록되지 않았거나 형식이 잘못된 이름: [`CompileError::UnknownPatternReference`]
    /// - 이름 순환: [`CompileError::CyclicPatternReference`]
    /// - 깊이 상한 초과: [`CompileError::MaxRecursionDepthExceeded`]
    /// - 최종 정규식 오류 또는 확장 길이 초과: [`CompileError::InvalidRegexSyntax`]
    pub fn compile(&self, text: &str) -> Result<CompiledPattern, CompileError> {
        if text.is_empty() {
            return Err(CompileError::EmptyPattern);
        }

        let segments = tokenize(text);
        let last = segments.len().saturating_sub(1);
        let mut expansion = Expansion::default();

        for (idx, segment) in segments.iter().enumerate() {
            match segment {
                Segment::Literal(literal) => {
                    push_escaped_literal(&mut expansion.regex, literal, idx == 0, idx == last);
                    expansion.check_len()?;
                }
                Segment::Token(token) => {
                    self.expand_token(token, token.offset, &mut expansion)?;
                }
            }
        }

        let regex =
            Regex::new(&expansion.regex).map_err(|e| CompileError::InvalidRegexSyntax {
                reason: e.to_string(),
            })?;

        let groups = regex.captures_len().saturating_sub(1);
        if groups != expansion.fields.len() {
            return Err(CompileError::InvalidRegexSyntax {
                reason: format!(
                    "capture group count {groups} does not match field count {}",
                    expansion.fields.len()
                ),
            });
        }

        tracing::trace!(
            pattern = text,
            regex = regex.as_str(),
            fields = expansion.fields.len(),
            "pattern compiled"
        );

        Ok(CompiledPattern {
            source_text: text.to_owned(),
            regex,
            fields: expansion.fields,
        })
    }

    /// 이름이 붙은 패턴을 컴파일합니다.
    ///
    /// 실패는 패턴 이름과 함께 [`GrokEngineError::Compile`]로 감쌉니다.
    pub fn compile_named(
        &self,
        name: &str,
        text: &str,
    ) -> Result<CompiledPattern, GrokEngineError> {
        self.compile(text).map_err(|source| GrokEngineError::Compile {
            pattern: name.to_owned(),
            source,
        })
    }

    /// 토큰 하나를 확장합니다.
    ///
    /// `position`은 최상위 텍스트에서 이 확장을 시작한 토큰의 오프셋입니다.
    fn expand_token(
        &self,
        token: &Token<'_>,
        position: usize,
        expansion: &mut Expansion,
    ) -> Result<(), CompileError> {
        let name = token.name;
        let fragment = if is_valid_pattern_name(name) {
            self.registry.lookup(name).ok()
        } else {
            None
        };
        let Some(fragment) = fragment else {
            return Err(CompileError::UnknownPatternReference {
                name: name.to_owned(),
                position,
            });
        };

        if expansion.chain.iter().any(|n| n == name) {
            let mut chain = expansion.chain.clone();
            chain.push(name.to_owned());
            return Err(CompileError::CyclicPatternReference { chain });
        }

        if expansion.chain.len() >= self.max_depth {
            return Err(CompileError::MaxRecursionDepthExceeded {
                depth: self.max_depth,
                name: name.to_owned(),
            });
        }

        match token.field {
            Some(field) => {
                let idx = expansion.fields.len();
                expansion.fields.push(FieldSpec {
                    name: field.to_owned(),
                    source_token: token.raw.to_owned(),
                    type_hint: token.type_hint.map(str::to_owned),
                });
                // String에 대한 write!는 실패하지 않습니다.
                let _ = write!(expansion.regex, "(?P<f{idx}>");
            }
            None => expansion.regex.push_str("(?:"),
        }

        expansion.chain.push(name.to_owned());
        for segment in tokenize(fragment) {
            match segment {
                Segment::Literal(raw) => expansion.regex.push_str(&neutralize_groups(raw)),
                Segment::Token(inner) => self.expand_token(&inner, position, expansion)?,
            }
            expansion.check_len()?;
        }
        expansion.chain.pop();

        expansion.regex.push(')');
        Ok(())
    }
}

/// 확장 중 누적 상태
#[derive(Default)]
struct Expansion {
    regex: String,
    fields: Vec<FieldSpec>,
    chain: Vec<String>,
}

impl Expansion {
    fn check_len(&self) -> Result<(), CompileError> {
        if self.regex.len() > MAX_EXPANDED_LEN {
            return Err(CompileError::InvalidRegexSyntax {
                reason: format!(
                    "expanded pattern exceeds {MAX_EXPANDED_LEN} bytes while expanding '{}'",
                    self.chain.first().map(String::as_str).unwrap_or("<top level>")
                ),
            });
        }
        Ok(())
    }
}

/// 최상위 리터럴을 이스케이프하여 추가합니다.
fn push_escaped_literal(out: &mut String, literal: &str, is_first: bool, is_last: bool) {
    let mut body = literal;

    let leading_anchor = is_first && body.starts_with('^');
    if leading_anchor {
        out.push('^');
        body = &body[1..];
    }

    // 끝의 `\$`는 앵커가 아닌 리터럴 `$`
    let escaped_dollar = is_last && body.ends_with("\\$");
    let trailing_anchor = is_last && !escaped_dollar && body.ends_with('$');
    if escaped_dollar {
        body = &body[..body.len() - 2];
    } else if trailing_anchor {
        body = &body[..body.len() - 1];
    }

    out.push_str(&regex::escape(body));

    if escaped_dollar {
        out.push_str("\\$");
    } else if trailing_anchor {
        out.push('$');
    }
}
