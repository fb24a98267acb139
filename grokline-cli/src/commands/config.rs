//! `grokline config` command handler

use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use grokline_core::config::GroklineConfig;

use crate::cli::{ConfigAction, ConfigArgs};
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `config` command.
pub async fn execute(
    args: ConfigArgs,
    config_path: &Path,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    match args.action {
        ConfigAction::Validate => execute_validate(config_path, writer).await,
        ConfigAction::Show { section } => execute_show(config_path, section, writer).await,
    }
}

/// Load and validate the file, reporting any error.
///
/// # Errors
///
/// Returns `CliError::Config` if the file is missing, malformed or invalid.
async fn execute_validate(config_path: &Path, writer: &OutputWriter) -> Result<(), CliError> {
    info!(path = %config_path.display(), "validating configuration");

    let errors = match GroklineConfig::load(config_path).await {
        Ok(_) => Vec::new(),
        Err(e) => vec![e.to_string()],
    };
    let report = ConfigValidationReport {
        source: config_path.display().to_string(),
        valid: errors.is_empty(),
        errors,
    };

    writer.render(&report)?;

    if !report.valid {
        return Err(CliError::Config("configuration is invalid".to_owned()));
    }
    Ok(())
}

/// Show the effective configuration (file + env overrides + defaults).
async fn execute_show(
    config_path: &Path,
    section: Option<String>,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    info!(path = %config_path.display(), "loading configuration");

    let config = GroklineConfig::load_or_default(config_path).await?;
    let report = ConfigReport::build(&config, config_path, section.as_deref())?;
    writer.render(&report)
}

#[derive(Serialize)]
pub struct ConfigValidationReport {
    pub source: String,
    pub valid: bool,
    pub errors: Vec<String>,
}

impl Render for ConfigValidationReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        if self.valid {
            writeln!(w, "{} {}", "Valid:".green().bold(), self.source)?;
        } else {
            writeln!(w, "{} {}", "Invalid:".red().bold(), self.source)?;
            for e in &self.errors {
                writeln!(w, "  - {e}")?;
            }
        }
        Ok(())
    }
}

#[derive(Serialize)]
pub struct ConfigReport {
    pub source: String,
    pub section: Option<String>,
    pub config_toml: String,
}

impl ConfigReport {
    fn build(
        config: &GroklineConfig,
        config_path: &Path,
        section: Option<&str>,
    ) -> Result<Self, CliError> {
        let rendered = match section {
            None => toml::to_string_pretty(config),
            Some("general") => toml::to_string_pretty(&config.general),
            Some("engine") => toml::to_string_pretty(&config.engine),
            Some(other) => {
                return Err(CliError::Command(format!(
                    "unknown section '{other}', expected one of: general, engine"
                )));
            }
        }
        .map_err(|e| CliError::Command(format!("failed to serialize config: {e}")))?;

        Ok(Self {
            source: config_path.display().to_string(),
            section: section.map(str::to_owned),
            config_toml: rendered,
        })
    }
}

impl Render for ConfigReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        match &self.section {
            Some(section) => writeln!(w, "# {} [{}]", self.source.bold(), section)?,
            None => writeln!(w, "# {}", self.source.bold())?,
        }
        write!(w, "{}", self.config_toml)
    }
}
