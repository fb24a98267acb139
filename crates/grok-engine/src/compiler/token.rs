//! 패턴 텍스트 토크나이저
//!
//! 텍스트를 리터럴 구간과 `%{NAME[:field[:type]]}` 토큰으로 나눕니다.
//! 닫는 `}`가 없는 `%{`는 토큰이 아니라 리터럴로 취급합니다.

/// 토큰 시작 표식
const TOKEN_OPEN: &str = "%{";

/// 패턴 텍스트의 한 구간
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    /// 토큰 밖의 텍스트
    Literal(&'a str),
    /// `%{...}` 토큰
    Token(Token<'a>),
}

/// 파싱된 `%{NAME:field:type}` 토큰
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    /// 참조하는 레지스트리 이름 (검증 전 원문)
    pub name: &'a str,
    /// 캡처 필드 이름. 생략되거나 비어 있으면 `None`
    pub field: Option<&'a str>,
    /// 타입 힌트 (`int`, `float` 등)
    pub type_hint: Option<&'a str>,
    /// 텍스트 내 `%{`의 바이트 오프셋
    pub offset: usize,
    /// 토큰 원문 (`%{...}` 전체)
    pub raw: &'a str,
}

/// 텍스트를 구간 목록으로 분해합니다.
///
/// 빈 리터럴 구간은 만들지 않습니다.
pub fn tokenize(text: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut cursor = 0;

    while let Some(rel) = text[cursor..].find(TOKEN_OPEN) {
        let open = cursor + rel;
        let body_start = open + TOKEN_OPEN.len();
        let Some(close_rel) = text[body_start..].find('}') else {
            break;
        };
        let close = body_start + close_rel;

        if open > cursor {
            segments.push(Segment::Literal(&text[cursor..open]));
        }
        segments.push(Segment::Token(parse_body(
            &text[body_start..close],
            open,
            &text[open..=close],
        )));
        cursor = close + 1;
    }

    if cursor < text.len() {
        segments.push(Segment::Literal(&text[cursor..]));
    }
    segments
}

fn parse_body<'a>(body: &'a str, offset: usize, raw: &'a str) -> Token<'a> {
    let mut parts = body.splitn(3, ':');
    let name = parts.next().unwrap_or_default();
    let field = parts.next().filter(|f| !f.is_empty());
    let type_hint = parts.next().filter(|t| !t.is_empty());
    Token {
        name,
        field,
        type_hint,
        offset,
        raw,
    }
}
