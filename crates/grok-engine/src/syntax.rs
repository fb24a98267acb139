//! 수집 파이프라인 필터 블록 생성
//!
//! 패턴 텍스트를 Logstash `grok` 필터 블록에 그대로 끼워 넣습니다.
//! 컴파일 성공 여부와 무관한 텍스트 변환이며, 큰따옴표 문자열 안에 들어갈 수 있도록
//! `\`와 `"`만 이스케이프합니다.

/// 필터 블록 생성기
pub struct SyntaxGenerator;

impl SyntaxGenerator {
    /// 단일 패턴 필터 블록을 생성합니다.
    ///
    /// ```
    /// use grokline_engine::SyntaxGenerator;
    ///
    /// let block = SyntaxGenerator::generate("%{IP:client}");
    /// assert!(block.contains(r#""message" => "%{IP:client}""#));
    /// ```
    pub fn generate(pattern: &str) -> String {
        render(&quote(pattern))
    }

    /// 여러 패턴을 배열 형태의 필터 블록으로 생성합니다.
    ///
    /// 대상 파이프라인도 배열 순서대로 시도하므로 first-match 순서가 유지됩니다.
    /// 패턴이 하나면 [`generate`](Self::generate)와 같은 결과를 냅니다.
    pub fn generate_all<S: AsRef<str>>(patterns: &[S]) -> String {
        if let [single] = patterns {
            return Self::generate(single.as_ref());
        }
        let items = patterns
            .iter()
            .map(|p| quote(p.as_ref()))
            .collect::<Vec<_>>()
            .join(", ");
        render(&format!("[{items}]"))
    }
}

fn render(value: &str) -> String {
    format!("filter {{\n  grok {{\n    match => {{ \"message\" => {value} }}\n  }}\n}}")
}

fn quote(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() + 2);
    out.push('"');
    for c in pattern.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}
