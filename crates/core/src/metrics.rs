//! 메트릭 상수 및 설명 등록
//!
//! 모든 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 엔진은 이 상수를 사용하여 `metrics::counter!()`, `metrics::histogram!()`
//! 매크로를 호출합니다. 레코더가 설치되지 않았다면 모든 호출은 no-op입니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `grokline_`
//! - 접미어: `_total` (counter), `_seconds` (histogram/latency)
//!
//! # 사용 예시
//!
//! ```ignore
//! use metrics::counter;
//!
//! counter!(grokline_core::metrics::PATTERNS_COMPILED_TOTAL).increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 결과 레이블 키 (matched, no_match, empty, failed)
pub const LABEL_RESULT: &str = "result";

/// 컴파일 에러 종류 레이블 키 (UnknownPatternReference 등)
pub const LABEL_KIND: &str = "kind";

// ─── 패턴 엔진 메트릭 ──────────────────────────────────────────────

/// 컴파일에 성공한 패턴 수 (counter)
pub const PATTERNS_COMPILED_TOTAL: &str = "grokline_patterns_compiled_total";

/// 컴파일 실패 수 (counter, label: kind)
pub const COMPILE_ERRORS_TOTAL: &str = "grokline_compile_errors_total";

/// 처리된 라인 수 (counter, label: result)
pub const LINES_PROCESSED_TOTAL: &str = "grokline_lines_processed_total";

/// 검증 배치 처리 시간 (histogram, 초)
pub const VALIDATION_DURATION_SECONDS: &str = "grokline_validation_duration_seconds";

/// 전체 메트릭 이름 목록
pub const ALL_METRIC_NAMES: &[&str] = &[
    PATTERNS_COMPILED_TOTAL,
    COMPILE_ERRORS_TOTAL,
    LINES_PROCESSED_TOTAL,
    VALIDATION_DURATION_SECONDS,
];

/// 모든 메트릭의 설명을 등록합니다.
///
/// 레코더 설치 직후 한 번 호출합니다. 레코더가 없으면 아무 일도 하지 않습니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_histogram};

    describe_counter!(
        PATTERNS_COMPILED_TOTAL,
        "Total number of pattern definitions compiled successfully"
    );
    describe_counter!(
        COMPILE_ERRORS_TOTAL,
        "Total number of pattern compile failures by kind"
    );
    describe_counter!(
        LINES_PROCESSED_TOTAL,
        "Total number of log lines processed by outcome"
    );
    describe_histogram!(
        VALIDATION_DURATION_SECONDS,
        "Wall-clock duration of one validation batch"
    );
}
