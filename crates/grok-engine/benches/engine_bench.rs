//! 패턴 엔진 벤치마크
//!
//! 컴파일 비용, 단일 라인 매칭, 배치 검증의 순차/병렬 스케일링을 측정합니다.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use grokline_engine::{
    EngineConfigBuilder, PatternCompiler, PatternDefinition, PatternRegistry, ValidationEngine,
};

const APP: &str = "%{TIMESTAMP_ISO8601:ts} %{LOGLEVEL:lvl} %{GREEDYDATA:msg}";
const APACHE_LINE: &str = r#"127.0.0.1 - frank [10/Oct/2000:13:55:36 -0700] "GET /apache_pb.gif HTTP/1.0" 200 2326 "http://www.example.com/start.html" "Mozilla/4.08""#;

fn bench_compile(c: &mut Criterion) {
    let registry = PatternRegistry::with_builtins();
    let compiler = PatternCompiler::new(&registry);

    let mut group = c.benchmark_group("compile");
    for (name, text) in [
        ("app", APP),
        ("syslog", "%{SYSLOGBASE} %{GREEDYDATA:message}"),
        ("combined_apache", "%{COMBINEDAPACHELOG}"),
    ] {
        group.bench_function(name, |b| {
            b.iter(|| compiler.compile(black_box(text)));
        });
    }
    group.finish();
}

fn bench_match_line(c: &mut Criterion) {
    let registry = PatternRegistry::with_builtins();
    let compiler = PatternCompiler::new(&registry);
    let app = compiler.compile(APP).unwrap();
    let apache = compiler.compile("%{COMBINEDAPACHELOG}").unwrap();

    let mut group = c.benchmark_group("match_line");
    group.bench_function("app_hit", |b| {
        b.iter(|| app.match_line(black_box("2024-01-01T10:00:00 ERROR disk full")));
    });
    group.bench_function("app_miss", |b| {
        b.iter(|| app.match_line(black_box("not a log line at all, nothing to see")));
    });
    group.bench_function("combined_apache_hit", |b| {
        b.iter(|| apache.match_line(black_box(APACHE_LINE)));
    });
    group.finish();
}

fn bench_validate_batch(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let definitions = vec![
        PatternDefinition::new("apache", "%{COMBINEDAPACHELOG}"),
        PatternDefinition::new("app", APP),
    ];

    let mut group = c.benchmark_group("validate_batch");
    for size in [100usize, 1_000, 10_000] {
        let lines: Vec<String> = (0..size)
            .map(|i| {
                if i % 2 == 0 {
                    format!("2024-01-01T10:00:{:02} INFO request {i} done", i % 60)
                } else {
                    APACHE_LINE.to_owned()
                }
            })
            .collect();
        group.throughput(Throughput::Elements(size as u64));

        for (label, threshold) in [("inline", usize::MAX), ("parallel", 0)] {
            let config = EngineConfigBuilder::new()
                .parallel_threshold(threshold)
                .max_lines(size)
                .build()
                .unwrap();
            let engine = ValidationEngine::builder().config(config).build().unwrap();

            group.bench_with_input(BenchmarkId::new(label, size), &lines, |b, lines| {
                b.iter(|| runtime.block_on(engine.validate(black_box(lines), &definitions)));
            });
        }
    }
    group.finish();
}

criterion_group!(benches, bench_compile, bench_match_line, bench_validate_batch);
criterion_main!(benches);
