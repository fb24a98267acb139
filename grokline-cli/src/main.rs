//! grokline -- command-line front end for the grok pattern engine.

mod cli;
mod commands;
mod error;
mod logging;
mod output;

use clap::Parser;
use colored::Colorize;

use grokline_core::config::GroklineConfig;

use crate::cli::{Cli, Commands};
use crate::error::CliError;
use crate::output::OutputWriter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let code = match run(cli).await {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("{} {e}", "error:".red().bold());
            e.exit_code()
        }
    };
    std::process::exit(code);
}

async fn run(cli: Cli) -> Result<(), CliError> {
    // `config validate` reports load failures itself, so a bad file must not
    // stop logging from coming up.
    let loaded = GroklineConfig::load_or_default(&cli.config).await;

    let mut general = loaded
        .as_ref()
        .map(|c| c.general.clone())
        .unwrap_or_default();
    if let Some(level) = cli.log_level {
        general.log_level = level;
    }
    logging::init_tracing(&general)?;
    grokline_core::metrics::describe_all();

    tracing::debug!(config = %cli.config.display(), "grokline starting");
    let writer = OutputWriter::new(cli.output);

    match cli.command {
        Commands::Config(args) => commands::config::execute(args, &cli.config, &writer).await,
        Commands::Syntax(args) => commands::syntax::execute(args, &writer),
        Commands::Validate(args) => {
            let config = loaded?;
            commands::validate::execute(args, &config, &writer).await
        }
        Commands::Patterns(args) => {
            let config = loaded?;
            commands::patterns::execute(args, &config, &writer).await
        }
    }
}
