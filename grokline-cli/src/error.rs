//! CLI-specific error types and exit code mapping

use grokline_core::error::GroklineError;
use grokline_engine::GrokEngineError;

/// CLI-specific error type.
///
/// The `exit_code()` method maps errors to process exit codes.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration loading or validation failure.
    #[error("configuration error: {0}")]
    Config(String),

    /// A subcommand-specific operation failed.
    #[error("{0}")]
    Command(String),

    /// At least one pattern failed to compile; no line was matched.
    #[error("compile error: {0}")]
    Compile(String),

    /// JSON serialisation or parsing failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error (file read, stdout write, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Pattern engine error.
    #[error("{0}")]
    Engine(#[from] GrokEngineError),
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                 |
    /// |------|-------------------------|
    /// | 0    | Success                 |
    /// | 1    | General / command error |
    /// | 2    | Configuration error     |
    /// | 3    | Pattern compile failure |
    /// | 10   | IO error                |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 2,
            Self::Compile(_) => 3,
            Self::Io(_) => 10,
            Self::Engine(e) => match e {
                GrokEngineError::Compile { .. } => 3,
                GrokEngineError::Config { .. } | GrokEngineError::InvalidPatternName { .. } => 2,
                GrokEngineError::Io(_) | GrokEngineError::PatternLoad { .. } => 10,
                GrokEngineError::Cancelled => 1,
            },
            Self::Json(_) | Self::Command(_) => 1,
        }
    }
}

impl From<GroklineError> for CliError {
    fn from(e: GroklineError) -> Self {
        match e {
            GroklineError::Config(c) => Self::Config(c.to_string()),
            GroklineError::Io(io) => Self::Io(io),
            GroklineError::Engine(msg) => Self::Command(msg),
        }
    }
}
