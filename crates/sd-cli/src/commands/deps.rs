//! Deps command implementation
//!
//! Walk the dependency graph of one snapshot from every object matching the
//! given names.

use anyhow::{Context, Result};
use sd_core::{CancelFlag, Config, DependentMatch, NamePattern, ObjectKind, Snapshot};
use serde::Serialize;
use std::fmt::Write;

use crate::cli::{DepsArgs, DepsOutput, GlobalArgs};
use crate::commands::common::{analyzer, build_graph, load_config, load_snapshot};

/// One reached object for JSON output
#[derive(Debug, Serialize)]
struct DependentEntry<'a> {
    depth: usize,
    kind: ObjectKind,
    name: &'a str,
}

/// Compile command-line patterns with the config's name case rule.
pub(crate) fn patterns(texts: &[String], regex: bool, config: &Config) -> Result<Vec<NamePattern>> {
    let case_insensitive = config.names_case_insensitive();
    texts
        .iter()
        .map(|text| {
            if regex {
                NamePattern::regex(text, case_insensitive)
                    .with_context(|| format!("Invalid pattern '{}'", text))
            } else if case_insensitive {
                Ok(NamePattern::literal_ci(text.as_str()))
            } else {
                Ok(NamePattern::literal(text.as_str()))
            }
        })
        .collect()
}

/// `depth  KIND  name` per object, columns aligned.
pub(crate) fn format_table(found: &[DependentMatch], snapshot: &Snapshot) -> String {
    let width = found
        .iter()
        .map(|m| snapshot.get(m.id).kind.keyword().len())
        .max()
        .unwrap_or(0);
    let mut out = String::new();
    for m in found {
        let object = snapshot.get(m.id);
        let _ = writeln!(
            out,
            "{:>5}  {:<width$}  {}",
            m.depth,
            object.kind.keyword(),
            object.qualified_name(),
            width = width
        );
    }
    out
}

/// Execute the deps command
pub fn execute(args: &DepsArgs, global: &GlobalArgs) -> Result<()> {
    let config = load_config(global)?;
    let cancel = CancelFlag::new();
    let snapshot = load_snapshot(&args.snapshot)?;
    let graph = build_graph(&snapshot, &analyzer(&config), &cancel)?;

    let patterns = patterns(&args.patterns, args.regex, &config)?;
    let depth = args.depth.unwrap_or(config.default_depth);
    let found = graph
        .find_dependents(&snapshot, &patterns, depth, args.reverse, &cancel)
        .context("Failed to search dependencies")?;

    if found.is_empty() {
        eprintln!("No objects match {}", args.patterns.join(", "));
    }

    match args.output {
        DepsOutput::Table => print!("{}", format_table(&found, &snapshot)),
        DepsOutput::Json => {
            let entries: Vec<DependentEntry<'_>> = found
                .iter()
                .map(|m| {
                    let object = snapshot.get(m.id);
                    DependentEntry {
                        depth: m.depth,
                        kind: object.kind,
                        name: object.qualified_name(),
                    }
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "deps_test.rs"]
mod tests;
