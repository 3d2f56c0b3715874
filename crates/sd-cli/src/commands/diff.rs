//! Diff command implementation
//!
//! Merge two snapshots into one tree and show what was added, removed or
//! changed.

use anyhow::Result;
use sd_core::{CancelFlag, DiffNode, Side};
use serde::Serialize;
use std::fmt::Write;

use crate::cli::{DiffArgs, DiffOutput, GlobalArgs};
use crate::commands::common::{compare, load_config, ExitCode};

/// Difference summary for JSON output
#[derive(Debug, Serialize)]
struct DiffSummary<'a> {
    old: String,
    new: String,
    added: usize,
    removed: usize,
    changed: usize,
    tree: &'a DiffNode,
}

/// Counts of (added, removed, changed in place), root excluded.
pub(crate) fn change_counts(tree: &DiffNode) -> (usize, usize, usize) {
    let (removed, _, added) = tree.side_counts();
    let changed = tree
        .iter()
        .skip(1)
        .filter(|n| n.side == Side::Both && (n.own_changed || n.reordered))
        .count();
    (added, removed, changed)
}

/// Copy of `node` without unchanged descendants.
pub(crate) fn changed_only(node: &DiffNode) -> DiffNode {
    let mut out = node.clone();
    out.children = node
        .children
        .iter()
        .filter(|c| c.changed)
        .map(changed_only)
        .collect();
    out
}

fn marker(node: &DiffNode) -> char {
    match node.side {
        Side::Left => '-',
        Side::Right => '+',
        Side::Both if node.own_changed || node.reordered => '~',
        Side::Both => ' ',
    }
}

/// Indented tree, one object per line.
pub(crate) fn render_tree(tree: &DiffNode, all: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} {}", tree.kind, tree.name);
    for child in &tree.children {
        render_node(child, all, 1, &mut out);
    }
    out
}

fn render_node(node: &DiffNode, all: bool, depth: usize, out: &mut String) {
    if !all && !node.changed {
        return;
    }
    let mut notes = Vec::new();
    if node.reordered {
        notes.push("columns reordered");
    }
    if node.content_ignored {
        notes.push("content ignored");
    }
    let _ = write!(
        out,
        "{}{} {} {}",
        "  ".repeat(depth),
        marker(node),
        node.kind,
        node.name
    );
    if !notes.is_empty() {
        let _ = write!(out, " ({})", notes.join(", "));
    }
    out.push('\n');
    for child in &node.children {
        render_node(child, all, depth + 1, out);
    }
}

/// Execute the diff command
pub fn execute(args: &DiffArgs, global: &GlobalArgs) -> Result<()> {
    let config = load_config(global)?;
    let cancel = CancelFlag::new();
    let comparison = compare(&args.compare, &config, &cancel)?;
    let (added, removed, changed) = change_counts(&comparison.tree);

    match args.output {
        DiffOutput::Json => {
            let pruned;
            let tree = if args.all {
                &comparison.tree
            } else {
                pruned = changed_only(&comparison.tree);
                &pruned
            };
            let summary = DiffSummary {
                old: args.compare.old.display().to_string(),
                new: args.compare.new.display().to_string(),
                added,
                removed,
                changed,
                tree,
            };
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        DiffOutput::Tree => {
            print!("{}", render_tree(&comparison.tree, args.all));
            println!();
            println!("{} added, {} removed, {} changed", added, removed, changed);
        }
    }

    if args.exit_code && comparison.tree.changed {
        return Err(ExitCode(1).into());
    }
    Ok(())
}

#[cfg(test)]
#[path = "diff_test.rs"]
mod tests;
