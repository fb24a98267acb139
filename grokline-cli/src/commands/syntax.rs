//! `grokline syntax` command handler

use std::io::Write;

use serde::Serialize;

use grokline_engine::SyntaxGenerator;

use crate::cli::SyntaxArgs;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `syntax` command.
///
/// Pure text transformation: patterns are not compiled.
pub fn execute(args: SyntaxArgs, writer: &OutputWriter) -> Result<(), CliError> {
    let report = SyntaxReport::new(args.patterns);
    writer.render(&report)
}

#[derive(Serialize)]
pub struct SyntaxReport {
    pub patterns: Vec<String>,
    pub block: String,
}

impl SyntaxReport {
    fn new(patterns: Vec<String>) -> Self {
        let block = SyntaxGenerator::generate_all(&patterns);
        Self { patterns, block }
    }
}

impl Render for SyntaxReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        writeln!(w, "{}", self.block)
    }
}
