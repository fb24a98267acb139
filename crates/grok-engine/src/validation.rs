//! 배치 검증 엔진 -- 패턴 집합 컴파일과 라인 배치 매칭을 조율합니다.
//!
//! # 처리 순서
//! 1. 모든 패턴을 컴파일합니다. 하나라도 실패하면 매칭 없이 배치 실패를 반환하며,
//!    에러 메시지에는 실패한 모든 패턴의 이름과 실패 종류가 담깁니다.
//! 2. 라인마다 빈 라인이면 `Empty`, 아니면 선언 순서대로 패턴을 시도하여
//!    처음 매칭된 패턴의 필드를 사용합니다 (first-match).
//! 3. 라인 수가 `parallel_threshold` 이상이면 라인을 청크로 나눠 blocking 워커에서
//!    매칭하고, 결과는 라인 번호로 인덱싱된 슬롯에 모아 입력 순서를 보장합니다.
//!
//! # 내부 아키텍처
//! ```text
//! definitions -> compile_all -> Arc<Vec<CompiledPattern>>
//!                                   |
//! lines -> chunks -> JoinSet::spawn_blocking -> slots[line_number - 1] -> results
//!                          ^
//!                   CancellationToken
//! ```

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::Instant;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use grokline_core::metrics as m;

use crate::compiler::{CompiledPattern, PatternCompiler};
use crate::config::EngineConfig;
use crate::error::{CompileFailure, GrokEngineError, aggregate_compile_failures};
use crate::matcher::FieldMap;
use crate::registry::PatternRegistry;
use crate::types::{
    INTERNAL_FAILURE_PREFIX, LineOutcome, LogLine, ParsedResult, PatternDefinition,
    ValidationOutcome, ValidationRequest,
};

/// 요청에 라인이 없을 때의 에러 메시지
pub const NO_LINES_MESSAGE: &str = "No log lines provided";
/// 요청에 패턴이 없을 때의 에러 메시지
pub const NO_PATTERNS_MESSAGE: &str = "No patterns provided";

/// 배치 검증 엔진
///
/// 레지스트리는 `Arc`로 공유되며 읽기 전용입니다. 컴파일된 패턴은
/// 한 번의 검증 호출 동안만 존재합니다.
///
/// # 사용 예시
/// ```no_run
/// # async fn example() {
/// use grokline_engine::{PatternDefinition, ValidationEngine};
///
/// let engine = ValidationEngine::builder().build().unwrap();
/// let outcome = engine
///     .validate(
///         &["2024-01-01T10:00:00 ERROR disk full".to_owned()],
///         &[PatternDefinition::new(
///             "app",
///             "%{TIMESTAMP_ISO8601:ts} %{LOGLEVEL:lvl} %{GREEDYDATA:msg}",
///         )],
///     )
///     .await;
/// assert!(outcome.success);
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ValidationEngine {
    registry: Arc<PatternRegistry>,
    config: EngineConfig,
}

impl ValidationEngine {
    /// 레지스트리와 설정으로 엔진을 생성합니다.
    pub fn new(registry: Arc<PatternRegistry>, config: EngineConfig) -> Self {
        Self { registry, config }
    }

    /// 빌더를 반환합니다.
    pub fn builder() -> ValidationEngineBuilder {
        ValidationEngineBuilder::new()
    }

    /// 공유 레지스트리
    pub fn registry(&self) -> &PatternRegistry {
        &self.registry
    }

    /// 엔진 설정
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// 설정된 깊이 상한을 적용한 컴파일러를 반환합니다.
    pub fn compiler(&self) -> PatternCompiler<'_> {
        PatternCompiler::new(&self.registry).with_max_depth(self.config.max_recursion_depth)
    }

    /// 모든 정의를 컴파일합니다.
    ///
    /// 첫 실패에서 멈추지 않고 모든 실패를 모아 반환합니다.
    pub fn compile_all(
        &self,
        definitions: &[PatternDefinition],
    ) -> Result<Vec<CompiledPattern>, Vec<CompileFailure>> {
        let compiler = self.compiler();
        let mut compiled = Vec::with_capacity(definitions.len());
        let mut failures = Vec::new();

        for (index, definition) in definitions.iter().enumerate() {
            match compiler.compile(&definition.pattern) {
                Ok(pattern) => compiled.push(pattern),
                Err(error) => {
                    tracing::warn!(
                        pattern = %definition.name,
                        index,
                        kind = error.kind(),
                        error = %error,
                        "pattern failed to compile"
                    );
                    metrics::counter!(m::COMPILE_ERRORS_TOTAL, m::LABEL_KIND => error.kind())
                        .increment(1);
                    failures.push(CompileFailure {
                        index,
                        pattern_name: definition.name.clone(),
                        error,
                    });
                }
            }
        }

        if !failures.is_empty() {
            return Err(failures);
        }
        metrics::counter!(m::PATTERNS_COMPILED_TOTAL).increment(compiled.len() as u64);
        Ok(compiled)
    }

    /// 라인 배치를 검증합니다.
    pub async fn validate(
        &self,
        log_lines: &[String],
        definitions: &[PatternDefinition],
    ) -> ValidationOutcome {
        match self
            .validate_with_cancel(log_lines, definitions, CancellationToken::new())
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => ValidationOutcome::failed(e.to_string()),
        }
    }

    /// 취소 토큰과 함께 라인 배치를 검증합니다.
    ///
    /// 컴파일 실패는 `Ok(success = false)`로 반환됩니다.
    ///
    /// # Errors
    /// 매칭 도중 토큰이 취소되면 [`GrokEngineError::Cancelled`]를 반환하며,
    /// 부분 결과는 반환하지 않습니다.
    pub async fn validate_with_cancel(
        &self,
        log_lines: &[String],
        definitions: &[PatternDefinition],
        cancel: CancellationToken,
    ) -> Result<ValidationOutcome, GrokEngineError> {
        let started = Instant::now();

        let patterns = match self.compile_all(definitions) {
            Ok(patterns) => Arc::new(patterns),
            Err(failures) => {
                return Ok(ValidationOutcome::failed(aggregate_compile_failures(
                    &failures,
                    definitions.len(),
                )));
            }
        };

        let lines = LogLine::number(log_lines.iter().cloned());
        let total = lines.len();
        let workers = self.config.effective_workers();

        let results = if total < self.config.parallel_threshold || workers <= 1 {
            match_inline(&patterns, lines, &cancel)?
        } else {
            match_parallel(patterns, lines, workers, &cancel, process_line).await?
        };

        record_line_metrics(&results);
        let elapsed = started.elapsed();
        metrics::histogram!(m::VALIDATION_DURATION_SECONDS).record(elapsed.as_secs_f64());

        let outcome = ValidationOutcome::completed(results);
        tracing::info!(
            lines = total,
            patterns = definitions.len(),
            matched = outcome.matched_count(),
            elapsed_ms = elapsed.as_millis() as u64,
            "validation batch completed"
        );
        Ok(outcome)
    }

    /// 외부 요청 봉투를 처리합니다.
    ///
    /// 빈 라인 목록, 빈 패턴 목록, `max_lines` 초과는 매칭 전에 거부됩니다.
    pub async fn handle_request(&self, request: ValidationRequest) -> ValidationOutcome {
        if request.log_lines.is_empty() {
            return ValidationOutcome::failed(NO_LINES_MESSAGE);
        }
        if request.patterns.is_empty() {
            return ValidationOutcome::failed(NO_PATTERNS_MESSAGE);
        }
        if request.log_lines.len() > self.config.max_lines {
            return ValidationOutcome::failed(format!(
                "Too many log lines: {} (max {})",
                request.log_lines.len(),
                self.config.max_lines
            ));
        }

        let definitions: Vec<PatternDefinition> = request
            .patterns
            .into_iter()
            .map(PatternDefinition::from)
            .collect();
        self.validate(&request.log_lines, &definitions).await
    }
}

/// 현재 태스크에서 순차 매칭합니다.
fn match_inline(
    patterns: &[CompiledPattern],
    lines: Vec<LogLine>,
    cancel: &CancellationToken,
) -> Result<Vec<ParsedResult>, GrokEngineError> {
    let mut results = Vec::with_capacity(lines.len());
    for line in lines {
        if cancel.is_cancelled() {
            return Err(GrokEngineError::Cancelled);
        }
        results.push(process_line(patterns, line));
    }
    Ok(results)
}

/// 청크 단위로 blocking 워커에서 매칭하고 라인 번호 순으로 모읍니다.
///
/// 워커 태스크가 통째로 실패하면 그 청크의 라인은 모두 내부 실패로 채워집니다.
async fn match_parallel<F>(
    patterns: Arc<Vec<CompiledPattern>>,
    lines: Vec<LogLine>,
    workers: usize,
    cancel: &CancellationToken,
    process: F,
) -> Result<Vec<ParsedResult>, GrokEngineError>
where
    F: Fn(&[CompiledPattern], LogLine) -> ParsedResult + Copy + Send + 'static,
{
    let total = lines.len();
    let chunk_size = total.div_ceil(workers).max(1);

    // 실패한 워커의 라인을 채우기 위해 원문을 보관
    let raw_lines: Vec<String> = lines.iter().map(|l| l.raw.clone()).collect();
    let mut slots: Vec<Option<ParsedResult>> = (0..total).map(|_| None).collect();

    let mut tasks = JoinSet::new();
    let mut remaining = lines.into_iter();
    loop {
        let chunk: Vec<LogLine> = remaining.by_ref().take(chunk_size).collect();
        if chunk.is_empty() {
            break;
        }
        let patterns = Arc::clone(&patterns);
        let cancel = cancel.clone();
        tasks.spawn_blocking(move || {
            chunk
                .into_iter()
                .map_while(|line| (!cancel.is_cancelled()).then(|| process(&patterns, line)))
                .collect::<Vec<_>>()
        });
    }

    tracing::debug!(
        lines = total,
        workers,
        chunk_size,
        tasks = tasks.len(),
        "dispatched line matching"
    );

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tasks.abort_all();
                tracing::debug!(lines = total, "validation cancelled");
                return Err(GrokEngineError::Cancelled);
            }
            joined = tasks.join_next() => match joined {
                None => break,
                Some(Ok(chunk_results)) => {
                    for result in chunk_results {
                        if let Some(slot) = slots.get_mut(result.line_number - 1) {
                            *slot = Some(result);
                        }
                    }
                }
                Some(Err(e)) => {
                    tracing::warn!(error = %e, "line matching worker failed");
                }
            },
        }
    }

    if cancel.is_cancelled() {
        return Err(GrokEngineError::Cancelled);
    }

    let results = slots
        .into_iter()
        .zip(raw_lines)
        .enumerate()
        .map(|(idx, (slot, raw))| {
            slot.unwrap_or_else(|| ParsedResult {
                line_number: idx + 1,
                line: raw,
                outcome: LineOutcome::Failed(format!(
                    "{INTERNAL_FAILURE_PREFIX}: worker task did not complete"
                )),
            })
        })
        .collect();
    Ok(results)
}

/// 라인 하나를 처리합니다.
fn process_line(patterns: &[CompiledPattern], line: LogLine) -> ParsedResult {
    process_line_with(line, |raw| first_match(patterns, raw))
}

/// 주어진 매칭 함수로 라인을 처리합니다. 매칭 중 panic은 라인별 실패로 바뀝니다.
fn process_line_with<M>(line: LogLine, matcher: M) -> ParsedResult
where
    M: FnOnce(&str) -> Option<(usize, FieldMap)>,
{
    let outcome = if line.is_blank() {
        LineOutcome::Empty
    } else {
        match catch_unwind(AssertUnwindSafe(|| matcher(&line.raw))) {
            Ok(Some((pattern_index, fields))) => LineOutcome::Matched {
                pattern_index,
                fields,
            },
            Ok(None) => LineOutcome::NoMatch,
            Err(panic) => {
                let reason = panic_message(panic.as_ref());
                tracing::error!(
                    line_number = line.line_number,
                    reason = %reason,
                    "matcher panicked"
                );
                LineOutcome::Failed(format!("{INTERNAL_FAILURE_PREFIX}: {reason}"))
            }
        }
    };

    tracing::trace!(
        line_number = line.line_number,
        result = outcome.label(),
        "line processed"
    );

    ParsedResult {
        line_number: line.line_number,
        line: line.raw,
        outcome,
    }
}

/// 선언 순서대로 시도하여 처음 매칭된 패턴을 반환합니다.
fn first_match(patterns: &[CompiledPattern], line: &str) -> Option<(usize, FieldMap)> {
    patterns
        .iter()
        .enumerate()
        .find_map(|(idx, pattern)| pattern.match_line(line).map(|fields| (idx, fields)))
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_owned()
    }
}

fn record_line_metrics(results: &[ParsedResult]) {
    let mut counts = [0u64; 4];
    for result in results {
        let slot = match result.outcome {
            LineOutcome::Matched { .. } => 0,
            LineOutcome::Empty => 1,
            LineOutcome::NoMatch => 2,
            LineOutcome::Failed(_) => 3,
        };
        counts[slot] += 1;
    }
    for (label, count) in ["matched", "empty", "no_match", "failed"].iter().zip(counts) {
        if count > 0 {
            metrics::counter!(m::LINES_PROCESSED_TOTAL, m::LABEL_RESULT => *label)
                .increment(count);
        }
    }
}

/// 검증 엔진 빌더
pub struct ValidationEngineBuilder {
    config: EngineConfig,
    registry: Option<Arc<PatternRegistry>>,
}

impl ValidationEngineBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
            registry: None,
        }
    }

    /// 엔진 설정을 지정합니다.
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// 공유 레지스트리를 지정합니다.
    ///
    /// 지정하지 않으면 표준 라이브러리에 `custom_patterns`를 더한 레지스트리를 만듭니다.
    pub fn registry(mut self, registry: Arc<PatternRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// 엔진을 빌드합니다.
    ///
    /// `pattern_dirs`는 읽지 않습니다. 디렉토리까지 반영하려면
    /// [`PatternRegistry::from_section`]으로 만든 레지스트리를 지정합니다.
    pub fn build(self) -> Result<ValidationEngine, GrokEngineError> {
        self.config.validate()?;

        let registry = match self.registry {
            Some(registry) => registry,
            None => {
                let mut registry = PatternRegistry::with_builtins();
                registry.register_all(
                    self.config
                        .custom_patterns
                        .iter()
                        .map(|(name, fragment)| (name.clone(), fragment.clone())),
                )?;
                Arc::new(registry)
            }
        };

        Ok(ValidationEngine::new(registry, self.config))
    }
}

impl Default for ValidationEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
