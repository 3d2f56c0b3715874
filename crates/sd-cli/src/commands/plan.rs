//! Plan command implementation
//!
//! Diff two snapshots, order the selected changes and render the migration
//! script.

use anyhow::{bail, Context, Result};
use sd_core::{CancelFlag, DiffNode, ObjectKind, Selection, Snapshot};
use sd_migrate::{
    plan_migration, render, Action, ActionKind, ActionPart, EmitContext, GenericEmitter,
    MigrationPlan, PlanError, PlanRequest, Script,
};
use serde::Serialize;
use std::fmt::Write;

use crate::cli::{GlobalArgs, PlanArgs, PlanOutput};
use crate::commands::common::{
    analyzer, build_graph, compare, load_config, parse_selector, ExitCode,
};

/// One action for JSON output
#[derive(Debug, Serialize)]
struct ActionSummary {
    rank: usize,
    action: ActionKind,
    kind: ObjectKind,
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    part: Option<&'static str>,
}

/// Plan summary for JSON output
#[derive(Debug, Serialize)]
struct PlanSummary {
    actions: Vec<ActionSummary>,
    diagnostics: Vec<String>,
    statements: Vec<String>,
    checksum: String,
}

fn part_label(part: &ActionPart) -> Option<&'static str> {
    match part {
        ActionPart::Whole => None,
        ActionPart::Skeleton { .. } => Some("skeleton"),
        ActionPart::Stub => Some("stub"),
        ActionPart::Completion => Some("completion"),
    }
}

fn target<'a>(action: &Action, old: &'a Snapshot, new: &'a Snapshot) -> (ObjectKind, &'a str) {
    let snapshot = if action.kind == ActionKind::Drop { old } else { new };
    let object = snapshot.get(action.target);
    (object.kind, object.qualified_name())
}

/// Selection from `KIND:name` selectors, or every change when none given.
pub(crate) fn selection(tree: &DiffNode, selectors: &[String]) -> Result<Selection> {
    if selectors.is_empty() {
        return Ok(Selection::all_changed(tree));
    }
    let mut selection = Selection::new();
    for text in selectors {
        let key = parse_selector(text)?;
        if tree.find(key.kind, &key.qualified_name).is_none() {
            bail!("No {} '{}' in the diff", key.kind, key.qualified_name);
        }
        selection.insert(key);
    }
    Ok(selection)
}

/// `rank. DESCRIPTION` per action.
pub(crate) fn format_actions(plan: &MigrationPlan, old: &Snapshot, new: &Snapshot) -> String {
    let mut out = String::new();
    for action in &plan.actions {
        let _ = writeln!(out, "{:>3}. {}", action.rank + 1, action.describe(old, new));
    }
    out
}

/// Script text with a checksum header.
pub(crate) fn format_script(script: &Script) -> String {
    format!("-- checksum: {}\n{}", script.checksum, script.text())
}

fn format_json(plan: &MigrationPlan, script: Script, old: &Snapshot, new: &Snapshot) -> Result<String> {
    let actions = plan
        .actions
        .iter()
        .map(|action| {
            let (kind, name) = target(action, old, new);
            ActionSummary {
                rank: action.rank,
                action: action.kind,
                kind,
                name: name.to_string(),
                part: part_label(&action.part),
            }
        })
        .collect();
    let summary = PlanSummary {
        actions,
        diagnostics: plan.diagnostics.iter().map(ToString::to_string).collect(),
        statements: script.statements,
        checksum: script.checksum,
    };
    Ok(serde_json::to_string_pretty(&summary)?)
}

/// Execute the plan command
pub fn execute(args: &PlanArgs, global: &GlobalArgs) -> Result<()> {
    let config = load_config(global)?;
    let cancel = CancelFlag::new();
    let comparison = compare(&args.compare, &config, &cancel)?;

    let analyzer = analyzer(&config);
    let old_graph = build_graph(&comparison.old, &analyzer, &cancel)?;
    let new_graph = build_graph(&comparison.new, &analyzer, &cancel)?;
    let selection = selection(&comparison.tree, &args.select)?;

    let request = PlanRequest {
        old: &comparison.old,
        new: &comparison.new,
        old_graph: &old_graph,
        new_graph: &new_graph,
        tree: &comparison.tree,
        selection: &selection,
        options: comparison.options,
    };
    let plan = match plan_migration(&request, &cancel) {
        Ok(plan) => plan,
        Err(PlanError::OrderingConflict { objects }) => {
            eprintln!(
                "Cannot order the migration; these objects depend on each other: {}",
                objects.join(", ")
            );
            return Err(ExitCode(2).into());
        }
        Err(err) => return Err(err).context("Failed to plan migration"),
    };

    for diagnostic in &plan.diagnostics {
        eprintln!("Warning: {}", diagnostic);
    }
    if plan.is_empty() {
        eprintln!("No changes to migrate");
    }

    let ctx = EmitContext {
        old: &comparison.old,
        new: &comparison.new,
    };
    let script = render(&plan, &GenericEmitter, &ctx);
    log::debug!("Script checksum {}", script.checksum);

    let text = match args.output {
        PlanOutput::Sql => format_script(&script),
        PlanOutput::Actions => format_actions(&plan, &comparison.old, &comparison.new),
        PlanOutput::Json => format_json(&plan, script, &comparison.old, &comparison.new)?,
    };

    match &args.out {
        Some(path) => std::fs::write(path, &text)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => print!("{}", text),
    }
    Ok(())
}

#[cfg(test)]
#[path = "plan_test.rs"]
mod tests;
