#![no_main]

use arbitrary::Arbitrary;
use grokline_engine::{PatternCompiler, PatternRegistry};
use libfuzzer_sys::fuzz_target;

/// 퍼저용 구조적 입력
#[derive(Arbitrary, Debug)]
struct FuzzInput {
    /// 사용자 조각 (최대 4개로 제한)
    fragments: Vec<(FuzzName, String)>,
    pattern: String,
    lines: Vec<String>,
}

#[derive(Arbitrary, Debug)]
enum FuzzName {
    A,
    B,
    C,
    D,
}

impl FuzzName {
    fn as_str(&self) -> &str {
        match self {
            FuzzName::A => "FUZZ_A",
            FuzzName::B => "FUZZ_B",
            FuzzName::C => "FUZZ_C",
            FuzzName::D => "FUZZ_D",
        }
    }
}

fuzz_target!(|input: FuzzInput| {
    let mut registry = PatternRegistry::with_builtins();
    for (name, fragment) in input.fragments.iter().take(4) {
        // 이름은 항상 유효하므로 등록은 실패하지 않음
        let _ = registry.register(name.as_str(), fragment.as_str());
    }

    // 순환 참조나 잘못된 정규식은 Err로 끝나야 하고 크래시는 안 됨
    let Ok(pattern) = PatternCompiler::new(&registry).compile(&input.pattern) else {
        return;
    };

    for line in input.lines.iter().take(16) {
        if let Some(fields) = pattern.match_line(line) {
            // 추출 필드는 스키마에 선언된 이름만 가짐
            assert!(fields
                .keys()
                .all(|k| pattern.field_names().any(|f| f == k)));
        }
    }
});
