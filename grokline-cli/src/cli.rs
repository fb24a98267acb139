//! CLI argument parsing using clap derive API
//!
//! Purely declarative: no side effects or I/O happen here.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// grokline -- grok-style log pattern validation.
///
/// Use `grokline <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "grokline", version, about, long_about = None)]
pub struct Cli {
    /// Path to the grokline.toml configuration file.
    #[arg(short, long, global = true, default_value = "grokline.toml")]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output format.
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table / text output.
    Text,
    /// Machine-readable JSON.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate log lines against one or more patterns.
    Validate(ValidateArgs),

    /// Print the ingestion-pipeline filter block for patterns.
    Syntax(SyntaxArgs),

    /// Inspect the named pattern registry.
    Patterns(PatternsArgs),

    /// Manage configuration.
    Config(ConfigArgs),
}

// ---- validate ----

/// Validate a batch of log lines.
///
/// Patterns are tried in the order given: `--pattern` flags first,
/// then the entries of `--definitions`.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Pattern text, e.g. `%{IP:client} %{WORD:method}` (repeatable).
    #[arg(short = 'p', long = "pattern", conflicts_with = "request")]
    pub patterns: Vec<String>,

    /// YAML file of `{ name, pattern }` definitions.
    #[arg(long, conflicts_with = "request")]
    pub definitions: Option<PathBuf>,

    /// Log file to validate (default: stdin).
    #[arg(long, conflicts_with = "request")]
    pub log_file: Option<PathBuf>,

    /// Extra directory of pattern files to register (repeatable).
    #[arg(long)]
    pub pattern_dir: Vec<PathBuf>,

    /// JSON request envelope `{ logLines, patterns }`; prints the response envelope.
    #[arg(long)]
    pub request: Option<PathBuf>,
}

// ---- syntax ----

/// Generate a filter block.
#[derive(Args, Debug)]
pub struct SyntaxArgs {
    /// Pattern texts; more than one renders the array form.
    #[arg(required = true)]
    pub patterns: Vec<String>,
}

// ---- patterns ----

/// Inspect registered patterns.
#[derive(Args, Debug)]
pub struct PatternsArgs {
    #[command(subcommand)]
    pub action: PatternsAction,
}

#[derive(Subcommand, Debug)]
pub enum PatternsAction {
    /// List registered pattern names.
    List {
        /// Only names containing this substring (case-insensitive).
        #[arg(long)]
        filter: Option<String>,
    },
    /// Show a pattern's fragment, expanded regex and field schema.
    Show {
        /// Pattern name, e.g. `SYSLOGBASE`.
        name: String,
    },
}

// ---- config ----

/// Manage grokline configuration.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate the configuration file and report errors.
    Validate,
    /// Show the effective configuration (file + env overrides + defaults).
    Show {
        /// Show only a specific section (general, engine).
        #[arg(long)]
        section: Option<String>,
    },
}
