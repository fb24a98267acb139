#![no_main]

use grokline_engine::{PatternCompiler, PatternRegistry};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        let registry = PatternRegistry::with_builtins();
        if let Ok(pattern) = PatternCompiler::new(&registry).compile(text) {
            // 캡처 그룹 수와 필드 스키마는 항상 일치해야 함
            assert_eq!(
                pattern.regex().captures_len() - 1,
                pattern.fields().len()
            );
        }
    }
});
