//! `grokline validate` command handler

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tokio::io::AsyncReadExt;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use grokline_core::config::GroklineConfig;
use grokline_engine::validation::{NO_LINES_MESSAGE, NO_PATTERNS_MESSAGE};
use grokline_engine::{
    DefinitionLoader, LineOutcome, PatternDefinition, ValidationEngine, ValidationOutcome,
    ValidationRequest,
};

use crate::cli::ValidateArgs;
use crate::commands::{build_registry, engine_config};
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `validate` command.
pub async fn execute(
    args: ValidateArgs,
    config: &GroklineConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let engine_config = engine_config(config, &args.pattern_dir)?;
    let registry = build_registry(&engine_config).await?;
    let engine = ValidationEngine::builder()
        .config(engine_config)
        .registry(Arc::new(registry))
        .build()?;

    let mut args = args;
    if let Some(path) = args.request.take() {
        return execute_request(&engine, &path, writer).await;
    }
    execute_batch(&engine, args, writer).await
}

/// `--request FILE.json`: envelope in, envelope out.
async fn execute_request(
    engine: &ValidationEngine,
    path: &Path,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    info!(path = %path.display(), "validating request envelope");

    let content = tokio::fs::read_to_string(path).await?;
    let request: ValidationRequest = serde_json::from_str(&content)?;
    let pattern_names = request.patterns.iter().map(|p| p.name.clone()).collect();

    let outcome = engine.handle_request(request).await;
    let report = ValidationReport {
        outcome,
        pattern_names,
    };
    writer.render(&report)?;

    match report.outcome.error {
        Some(reason) if !report.outcome.success => Err(CliError::Command(reason)),
        _ => Ok(()),
    }
}

/// Patterns from `-p` / `--definitions`, lines from `--log-file` or stdin.
async fn execute_batch(
    engine: &ValidationEngine,
    args: ValidateArgs,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let mut definitions = inline_definitions(&args.patterns);
    if let Some(ref path) = args.definitions {
        definitions.extend(DefinitionLoader::load_file(path).await?);
    }
    if definitions.is_empty() {
        return Err(CliError::Command(NO_PATTERNS_MESSAGE.to_owned()));
    }

    let content = match args.log_file {
        Some(ref path) => tokio::fs::read_to_string(path).await?,
        None => {
            let mut buf = String::new();
            tokio::io::stdin().read_to_string(&mut buf).await?;
            buf
        }
    };
    let lines = split_lines(&content);
    if lines.is_empty() {
        return Err(CliError::Command(NO_LINES_MESSAGE.to_owned()));
    }
    let max_lines = engine.config().max_lines;
    if lines.len() > max_lines {
        return Err(CliError::Command(format!(
            "Too many log lines: {} (max {max_lines})",
            lines.len()
        )));
    }

    info!(
        lines = lines.len(),
        patterns = definitions.len(),
        "validating log lines"
    );

    let cancel = CancellationToken::new();
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupt received, cancelling validation");
                cancel.cancel();
            }
        })
    };
    let result = engine
        .validate_with_cancel(&lines, &definitions, cancel)
        .await;
    interrupt.abort();
    let outcome = result?;

    let report = ValidationReport {
        pattern_names: definitions.into_iter().map(|d| d.name).collect(),
        outcome,
    };
    writer.render(&report)?;

    match report.outcome.error {
        Some(reason) if !report.outcome.success => Err(CliError::Compile(reason)),
        _ => Ok(()),
    }
}

/// `-p` patterns are named by position.
fn inline_definitions(patterns: &[String]) -> Vec<PatternDefinition> {
    patterns
        .iter()
        .enumerate()
        .map(|(idx, text)| PatternDefinition::new(format!("pattern-{}", idx + 1), text.as_str()))
        .collect()
}

/// Blank lines are kept so line numbers match the input file.
fn split_lines(content: &str) -> Vec<String> {
    content.lines().map(str::to_owned).collect()
}

/// Serialises exactly as the response envelope.
#[derive(Serialize)]
#[serde(transparent)]
pub struct ValidationReport {
    pub outcome: ValidationOutcome,
    #[serde(skip)]
    pub pattern_names: Vec<String>,
}

impl Render for ValidationReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        if !self.outcome.success {
            let reason = self.outcome.error.as_deref().unwrap_or("unknown error");
            writeln!(w, "{} {}", "Validation failed:".red().bold(), reason)?;
            return Ok(());
        }

        let total = self.outcome.results.len();
        let matched = self.outcome.matched_count();
        writeln!(
            w,
            "Validation: {} lines, {} matched, {} unmatched",
            total.to_string().bold(),
            matched.to_string().green(),
            (total - matched).to_string().yellow()
        )?;
        writeln!(w)?;
        writeln!(w, "{:>6}  {:<8} Detail", "Line", "Status")?;
        writeln!(w, "{}", "-".repeat(72))?;

        for result in &self.outcome.results {
            match &result.outcome {
                LineOutcome::Matched {
                    pattern_index,
                    fields,
                } => {
                    let name = self
                        .pattern_names
                        .get(*pattern_index)
                        .map(String::as_str)
                        .unwrap_or("?");
                    let rendered = fields
                        .iter()
                        .map(|(k, v)| format!("{k}={v:?}"))
                        .collect::<Vec<_>>()
                        .join(" ");
                    writeln!(
                        w,
                        "{:>6}  {:<8} [{}] {}",
                        result.line_number,
                        "MATCH".green(),
                        name,
                        rendered
                    )?;
                }
                LineOutcome::Empty | LineOutcome::NoMatch => {
                    writeln!(
                        w,
                        "{:>6}  {:<8} {}",
                        result.line_number,
                        "NOMATCH".yellow(),
                        result.error().unwrap_or_default()
                    )?;
                }
                LineOutcome::Failed(reason) => {
                    writeln!(
                        w,
                        "{:>6}  {:<8} {}",
                        result.line_number,
                        "ERROR".red(),
                        reason
                    )?;
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use grokline_engine::ParsedResult;

    #[test]
    fn test_split_lines_keeps_blank_lines() {
        let lines = split_lines("a\n\nb\r\n");
        assert_eq!(lines, vec!["a", "", "b"]);
    }

    #[test]
    fn test_inline_definitions_named_by_position() {
        let defs = inline_definitions(&["%{IP:ip}".to_owned(), "%{WORD:w}".to_owned()]);
        assert_eq!(defs[0].name, "pattern-1");
        assert_eq!(defs[1].name, "pattern-2");
        assert_eq!(defs[1].pattern, "%{WORD:w}");
    }

    #[tokio::test]
    async fn test_report_json_is_response_envelope() {
        let engine = ValidationEngine::builder().build().expect("default engine");
        let outcome = engine
            .validate(
                &["10.0.0.1".to_owned(), "nope".to_owned()],
                &[PatternDefinition::new("ip", "%{IPV4:ip}")],
            )
            .await;
        let report = ValidationReport {
            outcome,
            pattern_names: vec!["ip".to_owned()],
        };

        let json = serde_json::to_value(&report).expect("serialize");
        assert_eq!(json["success"], true);
        assert_eq!(json["results"][0]["lineNumber"], 1);
        assert_eq!(json["results"][0]["parsed"]["ip"], "10.0.0.1");
        assert!(json["results"][1]["parsed"].is_null());
        assert!(json.get("patternNames").is_none());
        assert!(json.get("pattern_names").is_none());
    }

    #[test]
    fn test_report_text_lists_every_line() {
        colored::control::set_override(false);
        let mut fields = grokline_engine::FieldMap::new();
        fields.insert("ip".to_owned(), "10.0.0.1".to_owned());
        let report = ValidationReport {
            outcome: ValidationOutcome::completed(vec![
                ParsedResult {
                    line_number: 1,
                    line: "10.0.0.1".to_owned(),
                    outcome: LineOutcome::Matched {
                        pattern_index: 0,
                        fields,
                    },
                },
                ParsedResult {
                    line_number: 2,
                    line: String::new(),
                    outcome: LineOutcome::Empty,
                },
            ]),
            pattern_names: vec!["ip".to_owned()],
        };

        let mut buffer = Vec::new();
        report.render_text(&mut buffer).expect("render");
        let text = String::from_utf8(buffer).expect("utf8");
        assert!(text.contains("2 lines, 1 matched, 1 unmatched"));
        assert!(text.contains("[ip] ip=\"10.0.0.1\""));
        assert!(text.contains("Empty log line"));
    }

    #[test]
    fn test_report_text_failure_shows_reason() {
        colored::control::set_override(false);
        let report = ValidationReport {
            outcome: ValidationOutcome::failed("1 of 1 patterns failed to compile"),
            pattern_names: Vec::new(),
        };
        let mut buffer = Vec::new();
        report.render_text(&mut buffer).expect("render");
        let text = String::from_utf8(buffer).expect("utf8");
        assert!(text.contains("Validation failed: 1 of 1 patterns failed to compile"));
    }
}
