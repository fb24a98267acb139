//! Command handlers -- one module per subcommand

pub mod config;
pub mod patterns;
pub mod syntax;
pub mod validate;

use std::path::PathBuf;

use grokline_core::config::GroklineConfig;
use grokline_engine::{EngineConfig, PatternRegistry};

use crate::error::CliError;

/// Engine settings from the loaded config plus any `--pattern-dir` flags.
pub(crate) fn engine_config(
    config: &GroklineConfig,
    extra_dirs: &[PathBuf],
) -> Result<EngineConfig, CliError> {
    let mut engine = EngineConfig::from_core(&config.engine);
    engine
        .pattern_dirs
        .extend(extra_dirs.iter().map(|d| d.display().to_string()));
    engine.validate()?;
    Ok(engine)
}

/// Builtins, then pattern directories, then inline custom patterns.
pub(crate) async fn build_registry(engine: &EngineConfig) -> Result<PatternRegistry, CliError> {
    Ok(PatternRegistry::from_section(&engine.to_section()).await?)
}
