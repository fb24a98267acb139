#![no_main]

use grokline_engine::PatternLoader;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(content) = std::str::from_utf8(data) {
        let _ = PatternLoader::parse_text(content, "fuzz-patterns");
    }
});
