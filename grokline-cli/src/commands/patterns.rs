//! `grokline patterns` command handler

use std::io::Write;

use serde::Serialize;
use tracing::info;

use grokline_core::config::GroklineConfig;
use grokline_engine::{PatternCompiler, PatternRegistry};

use crate::cli::{PatternsAction, PatternsArgs};
use crate::commands::{build_registry, engine_config};
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Fragments longer than this are cut in the text listing.
const FRAGMENT_PREVIEW: usize = 60;

/// Execute the `patterns` command.
pub async fn execute(
    args: PatternsArgs,
    config: &GroklineConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let engine = engine_config(config, &[])?;
    let registry = build_registry(&engine).await?;
    info!(patterns = registry.len(), "pattern registry loaded");

    match args.action {
        PatternsAction::List { filter } => {
            writer.render(&PatternListReport::build(&registry, filter.as_deref()))
        }
        PatternsAction::Show { name } => {
            let report = PatternDetailReport::build(&registry, engine.max_recursion_depth, &name)?;
            writer.render(&report)
        }
    }
}

#[derive(Serialize)]
pub struct PatternListReport {
    pub total: usize,
    pub patterns: Vec<PatternEntry>,
}

#[derive(Serialize)]
pub struct PatternEntry {
    pub name: String,
    pub fragment: String,
}

impl PatternListReport {
    fn build(registry: &PatternRegistry, filter: Option<&str>) -> Self {
        let needle = filter.map(str::to_lowercase);
        let patterns: Vec<PatternEntry> = registry
            .names()
            .into_iter()
            .filter(|name| {
                needle
                    .as_deref()
                    .is_none_or(|n| name.to_lowercase().contains(n))
            })
            .filter_map(|name| {
                registry.lookup(name).ok().map(|fragment| PatternEntry {
                    name: name.to_owned(),
                    fragment: fragment.to_owned(),
                })
            })
            .collect();
        Self {
            total: patterns.len(),
            patterns,
        }
    }
}

impl Render for PatternListReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Patterns ({} total)", self.total.to_string().bold())?;
        writeln!(w)?;
        writeln!(w, "{:<28} Fragment", "Name")?;
        writeln!(w, "{}", "-".repeat(90))?;

        for p in &self.patterns {
            writeln!(w, "{:<28} {}", p.name.cyan(), preview(&p.fragment))?;
        }
        Ok(())
    }
}

fn preview(fragment: &str) -> String {
    if fragment.chars().count() <= FRAGMENT_PREVIEW {
        return fragment.to_owned();
    }
    let cut: String = fragment.chars().take(FRAGMENT_PREVIEW).collect();
    format!("{cut}...")
}

#[derive(Serialize)]
pub struct PatternDetailReport {
    pub name: String,
    pub fragment: String,
    pub expanded: String,
    pub fields: Vec<FieldEntry>,
}

#[derive(Serialize)]
pub struct FieldEntry {
    pub name: String,
    pub token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_hint: Option<String>,
}

impl PatternDetailReport {
    fn build(
        registry: &PatternRegistry,
        max_depth: usize,
        name: &str,
    ) -> Result<Self, CliError> {
        let fragment = registry
            .lookup(name)
            .map_err(|e| CliError::Command(e.to_string()))?;
        let compiled = PatternCompiler::new(registry)
            .with_max_depth(max_depth)
            .compile_named(name, &format!("%{{{name}}}"))?;

        Ok(Self {
            name: name.to_owned(),
            fragment: fragment.to_owned(),
            expanded: compiled.expanded().to_owned(),
            fields: compiled
                .fields()
                .iter()
                .map(|f| FieldEntry {
                    name: f.name.clone(),
                    token: f.source_token.clone(),
                    type_hint: f.type_hint.clone(),
                })
                .collect(),
        })
    }
}

impl Render for PatternDetailReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Pattern: {}", self.name.bold())?;
        writeln!(w, "  Fragment: {}", self.fragment)?;
        writeln!(w, "  Expanded: {}", self.expanded)?;
        if self.fields.is_empty() {
            writeln!(w, "  Fields:   (none)")?;
            return Ok(());
        }
        writeln!(w, "  Fields:")?;
        for f in &self.fields {
            match &f.type_hint {
                Some(hint) => writeln!(w, "    - {} ({hint}) from {}", f.name.cyan(), f.token)?,
                None => writeln!(w, "    - {} from {}", f.name.cyan(), f.token)?,
            }
        }
        Ok(())
    }
}
