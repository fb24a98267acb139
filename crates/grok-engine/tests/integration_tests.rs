//! 통합 테스트 -- 레지스트리부터 배치 검증까지의 전체 흐름 검증

use std::sync::Arc;

use proptest::prelude::*;
use tokio_util::sync::CancellationToken;

use grokline_core::config::GroklineConfig;
use grokline_engine::{
    CompileError, EngineConfig, EngineConfigBuilder, GrokEngineError, PatternCompiler,
    PatternDefinition, PatternLoader, PatternRegistry, SyntaxGenerator, ValidationEngine,
    ValidationRequest,
};

const APP: &str = "%{TIMESTAMP_ISO8601:ts} %{LOGLEVEL:lvl} %{GREEDYDATA:msg}";

fn lines(raw: &[&str]) -> Vec<String> {
    raw.iter().map(|s| (*s).to_owned()).collect()
}

/// 타임스탬프/레벨/메시지 추출
#[tokio::test]
async fn test_timestamp_level_message_extraction() {
    let engine = ValidationEngine::builder().build().unwrap();
    let outcome = engine
        .validate(
            &lines(&["2024-01-01T10:00:00 ERROR disk full"]),
            &[PatternDefinition::new("app", APP)],
        )
        .await;

    assert!(outcome.success);
    let parsed = outcome.results[0].parsed().unwrap();
    assert_eq!(parsed.len(), 3);
    assert_eq!(parsed["ts"], "2024-01-01T10:00:00");
    assert_eq!(parsed["lvl"], "ERROR");
    assert_eq!(parsed["msg"], "disk full");
}

/// 매칭되지 않는 라인
#[tokio::test]
async fn test_non_matching_line() {
    let engine = ValidationEngine::builder().build().unwrap();
    let outcome = engine
        .validate(
            &lines(&["not a log line"]),
            &[PatternDefinition::new("app", APP)],
        )
        .await;

    assert!(outcome.success);
    assert!(outcome.results[0].parsed().is_none());
    assert_eq!(
        outcome.results[0].error(),
        Some("Pattern did not match this log line")
    );
}

/// 알 수 없는 참조는 배치 실패
#[tokio::test]
async fn test_unknown_reference_fails_batch() {
    let engine = ValidationEngine::builder().build().unwrap();
    let outcome = engine
        .validate(
            &lines(&["anything"]),
            &[PatternDefinition::new("broken", "%{NOT_A_PATTERN:x}")],
        )
        .await;

    assert!(!outcome.success);
    assert!(outcome.results.is_empty());
    let error = outcome.error.unwrap();
    assert!(error.contains("NOT_A_PATTERN"));
    assert!(error.contains("UnknownPatternReference"));
}

/// 첫 번째 패턴이 실패하면 두 번째 패턴이 결과를 채움
#[tokio::test]
async fn test_second_pattern_fills_result() {
    let engine = ValidationEngine::builder().build().unwrap();
    let outcome = engine
        .validate(
            &lines(&["192.168.0.10 GET /health"]),
            &[
                PatternDefinition::new("app", APP),
                PatternDefinition::new("access", "%{IP:client} %{WORD:verb} %{URIPATH:path}"),
            ],
        )
        .await;

    let result = &outcome.results[0];
    assert_eq!(result.pattern_index(), Some(1));
    let parsed = result.parsed().unwrap();
    assert_eq!(parsed["client"], "192.168.0.10");
    assert_eq!(parsed["verb"], "GET");
    assert_eq!(parsed["path"], "/health");
}

/// 필터 블록 생성
#[test]
fn test_syntax_block_for_ip() {
    let expected = concat!(
        "filter {\n",
        "  grok {\n",
        "    match => { \"message\" => \"%{IP:client}\" }\n",
        "  }\n",
        "}"
    );
    assert_eq!(SyntaxGenerator::generate("%{IP:client}"), expected);
}

/// 빈 라인은 번호를 유지한 채 결과에 포함
#[tokio::test]
async fn test_blank_lines_keep_numbering() {
    let engine = ValidationEngine::builder().build().unwrap();
    let input = lines(&[
        "2024-01-01T10:00:00 INFO start",
        "",
        "2024-01-01T10:00:05 WARN slow",
        "    ",
    ]);
    let outcome = engine
        .validate(&input, &[PatternDefinition::new("app", APP)])
        .await;

    assert_eq!(outcome.results.len(), 4);
    assert_eq!(outcome.results[1].line_number, 2);
    assert_eq!(outcome.results[1].error(), Some("Empty log line"));
    assert_eq!(outcome.results[3].line, "    ");
    assert_eq!(outcome.results[2].parsed().unwrap()["lvl"], "WARN");
}

/// 응답 봉투 JSON 형태
#[tokio::test]
async fn test_response_envelope_shape() {
    let engine = ValidationEngine::builder().build().unwrap();
    let request: ValidationRequest = serde_json::from_str(
        r#"{
            "logLines": ["2024-01-01T10:00:00 ERROR disk full", "nope"],
            "patterns": [{ "name": "app", "pattern": "%{TIMESTAMP_ISO8601:ts} %{LOGLEVEL:lvl} %{GREEDYDATA:msg}" }]
        }"#,
    )
    .unwrap();

    let outcome = engine.handle_request(request).await;
    let json = serde_json::to_value(&outcome).unwrap();

    assert_eq!(json["success"], true);
    assert!(json.get("error").is_none());
    let results = json["results"].as_array().unwrap();
    assert_eq!(results[0]["lineNumber"], 1);
    assert_eq!(results[0]["parsed"]["msg"], "disk full");
    assert!(results[0].get("error").is_none());
    assert!(results[1]["parsed"].is_null());
    assert_eq!(results[1]["error"], "Pattern did not match this log line");
}

/// 순환 참조와 깊이 상한
#[tokio::test]
async fn test_cycle_and_depth_errors_are_batch_fatal() {
    let mut registry = PatternRegistry::with_builtins();
    registry.register("PING", "%{PONG}").unwrap();
    registry.register("PONG", "%{PING}").unwrap();
    registry.register("L0", "%{L1}").unwrap();
    registry.register("L1", "%{L2}").unwrap();
    registry.register("L2", "%{WORD}").unwrap();

    let config = EngineConfigBuilder::new()
        .max_recursion_depth(2)
        .build()
        .unwrap();
    let engine = ValidationEngine::new(Arc::new(registry), config);

    let outcome = engine
        .validate(
            &lines(&["x"]),
            &[
                PatternDefinition::new("cycle", "%{PING:p}"),
                PatternDefinition::new("deep", "%{L0:l}"),
            ],
        )
        .await;

    assert!(!outcome.success);
    let error = outcome.error.unwrap();
    assert!(error.contains("'cycle' (CyclicPatternReference)"));
    assert!(error.contains("'deep' (MaxRecursionDepthExceeded)"));
}

/// 병렬 경로에서도 입력 순서 유지
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_parallel_results_follow_input_order() {
    let config = EngineConfigBuilder::new()
        .worker_threads(8)
        .parallel_threshold(16)
        .build()
        .unwrap();
    let engine = ValidationEngine::builder().config(config).build().unwrap();

    let input: Vec<String> = (0..2_000)
        .map(|i| match i % 3 {
            0 => format!("2024-01-01T10:00:{:02} INFO event {i}", i % 60),
            1 => format!("garbage {i}"),
            _ => "   ".to_owned(),
        })
        .collect();

    let outcome = engine
        .validate(&input, &[PatternDefinition::new("app", APP)])
        .await;

    assert!(outcome.success);
    assert_eq!(outcome.results.len(), input.len());
    for (idx, result) in outcome.results.iter().enumerate() {
        assert_eq!(result.line_number, idx + 1);
        assert_eq!(result.line, input[idx]);
        match idx % 3 {
            0 => assert_eq!(result.parsed().unwrap()["msg"], format!("event {idx}")),
            1 => assert_eq!(result.error(), Some("Pattern did not match this log line")),
            _ => assert_eq!(result.error(), Some("Empty log line")),
        }
    }
}

/// 취소된 검증은 부분 결과 없이 실패
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_cancelled_parallel_validation() {
    let config = EngineConfigBuilder::new()
        .worker_threads(2)
        .parallel_threshold(1)
        .build()
        .unwrap();
    let engine = ValidationEngine::builder().config(config).build().unwrap();
    let input: Vec<String> = (0..1_000).map(|i| format!("line {i}")).collect();

    let cancel = CancellationToken::new();
    cancel.cancel();
    let result = engine
        .validate_with_cancel(
            &input,
            &[PatternDefinition::new("w", "%{WORD:w} %{INT:n}")],
            cancel,
        )
        .await;
    assert!(matches!(result, Err(GrokEngineError::Cancelled)));
}

/// 설정 파일의 인라인 패턴과 패턴 디렉토리로 레지스트리 구성
#[tokio::test]
async fn test_registry_from_config_with_files() {
    let dir = tempfile::TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("app"),
        "# app patterns\nREQUEST_ID req-[0-9a-f]{8}\n",
    )
    .unwrap();

    let toml = format!(
        "[engine]\npattern_dirs = [\"{}\"]\n\n[engine.custom_patterns]\nAPP_LINE = \"%{{LOGLEVEL:lvl}} %{{REQUEST_ID:rid}}\"\n",
        dir.path().display()
    );
    let core = GroklineConfig::parse(&toml).unwrap();
    core.validate().unwrap();

    let registry = PatternRegistry::from_section(&core.engine).await.unwrap();
    let engine = ValidationEngine::new(Arc::new(registry), EngineConfig::from_core(&core.engine));

    let outcome = engine
        .validate(
            &lines(&["WARN req-0a1b2c3d retry"]),
            &[PatternDefinition::new("app", "%{APP_LINE}")],
        )
        .await;
    let parsed = outcome.results[0].parsed().unwrap();
    assert_eq!(parsed["lvl"], "WARN");
    assert_eq!(parsed["rid"], "req-0a1b2c3d");
}

/// Logstash 형식 패턴 텍스트 파싱 후 등록
#[test]
fn test_pattern_text_registration() {
    let mut registry = PatternRegistry::with_builtins();
    registry
        .register_all(PatternLoader::parse_text(
            "DURATION %{NUMBER}ms\nTIMING took %{DURATION:elapsed}\n",
            "inline",
        ))
        .unwrap();

    let pattern = PatternCompiler::new(&registry)
        .compile("%{TIMING}")
        .unwrap();
    assert_eq!(pattern.match_line("request took 12.5ms").unwrap()["elapsed"], "12.5ms");
}

/// 아파치 combined 로그
#[test]
fn test_combined_apache_log() {
    let registry = PatternRegistry::with_builtins();
    let pattern = PatternCompiler::new(&registry)
        .compile("%{COMBINEDAPACHELOG}")
        .unwrap();
    let line = r#"127.0.0.1 - frank [10/Oct/2000:13:55:36 -0700] "GET /apache_pb.gif HTTP/1.0" 200 2326 "http://www.example.com/start.html" "Mozilla/4.08""#;
    let fields = pattern.match_line(line).unwrap();
    assert_eq!(fields["clientip"], "127.0.0.1");
    assert_eq!(fields["auth"], "frank");
    assert_eq!(fields["timestamp"], "10/Oct/2000:13:55:36 -0700");
    assert_eq!(fields["verb"], "GET");
    assert_eq!(fields["request"], "/apache_pb.gif");
    assert_eq!(fields["httpversion"], "1.0");
    assert_eq!(fields["response"], "200");
    assert_eq!(fields["bytes"], "2326");
    assert_eq!(fields["agent"], "\"Mozilla/4.08\"");
}

/// 자기 참조 / 상호 참조는 항상 순환 에러
#[test]
fn test_self_and_mutual_reference_are_cyclic() {
    let mut registry = PatternRegistry::new();
    registry.register("SELF", "x%{SELF}").unwrap();
    registry.register("A", "%{B}").unwrap();
    registry.register("B", "%{A}").unwrap();
    let compiler = PatternCompiler::new(&registry);

    for text in ["%{SELF}", "%{A:a}", "%{B}"] {
        let err = compiler.compile(text).unwrap_err();
        assert_eq!(err.kind(), "CyclicPatternReference", "pattern {text}");
    }
    assert!(matches!(
        compiler.compile("%{SELF}"),
        Err(CompileError::CyclicPatternReference { .. })
    ));
}

fn field_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,8}"
}

fn builtin_name() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec![
        "WORD", "NUMBER", "INT", "IP", "LOGLEVEL", "NOTSPACE", "DATA", "GREEDYDATA",
    ])
}

proptest! {
    /// 같은 텍스트를 두 번 컴파일하면 같은 스키마
    #[test]
    fn prop_compile_is_structurally_deterministic(
        tokens in prop::collection::vec((builtin_name(), prop::option::of(field_name())), 1..6),
        sep in "[ :|,-]{1,3}",
    ) {
        let text = tokens
            .iter()
            .map(|(name, field)| match field {
                Some(f) => format!("%{{{name}:{f}}}"),
                None => format!("%{{{name}}}"),
            })
            .collect::<Vec<_>>()
            .join(&sep);

        let registry = PatternRegistry::with_builtins();
        let compiler = PatternCompiler::new(&registry);
        let first = compiler.compile(&text).unwrap();
        let second = compiler.compile(&text).unwrap();

        let expected: Vec<&str> = tokens.iter().filter_map(|(_, f)| f.as_deref()).collect();
        prop_assert_eq!(first.field_names().collect::<Vec<_>>(), expected.clone());
        prop_assert_eq!(second.field_names().collect::<Vec<_>>(), expected);
        prop_assert_eq!(first.regex().captures_len() - 1, first.fields().len());
    }

    /// 단일 WORD 필드는 매칭된 부분 문자열만 키로 가짐
    #[test]
    fn prop_single_field_captures_substring(
        prefix in "[ .:;-]{0,5}",
        word in "[A-Za-z0-9_]{1,12}",
        suffix in "[ .:;-]{0,5}",
    ) {
        let registry = PatternRegistry::with_builtins();
        let pattern = PatternCompiler::new(&registry).compile("%{WORD:w}").unwrap();
        let line = format!("{prefix}{word}{suffix}");
        let fields = pattern.match_line(&line).unwrap();
        prop_assert_eq!(fields.len(), 1);
        prop_assert_eq!(&fields["w"], &word);
    }

    /// 임의의 텍스트 컴파일은 panic 없이 Ok 또는 Err
    #[test]
    fn prop_compile_never_panics(text in ".{0,64}") {
        let registry = PatternRegistry::with_builtins();
        let _ = PatternCompiler::new(&registry).compile(&text);
    }
}
