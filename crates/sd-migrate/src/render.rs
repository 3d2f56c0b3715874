//! Script rendering.
//!
//! The planner decides what happens and in which order; a [`ScriptEmitter`]
//! only turns one action at a time into statement text. [`render`] drives
//! the emitter in plan order so emitters never reorder anything.

use crate::action::{Action, MigrationPlan};
use sd_core::{checksum_statements, Snapshot};
use serde::Serialize;

/// Snapshots an emitter may consult while rendering an action.
#[derive(Debug, Clone, Copy)]
pub struct EmitContext<'a> {
    pub old: &'a Snapshot,
    pub new: &'a Snapshot,
}

/// Turns one action into zero or more statements.
pub trait ScriptEmitter {
    fn emit(&self, action: &Action, ctx: &EmitContext<'_>) -> Vec<String>;
}

/// Rendered migration script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Script {
    pub statements: Vec<String>,
    /// SHA-256 of the statement text, one statement per line
    pub checksum: String,
}

impl Script {
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// Statements separated by newlines, with a trailing newline.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for statement in &self.statements {
            out.push_str(statement);
            out.push('\n');
        }
        out
    }
}

/// Render every action of `plan` in order.
pub fn render(plan: &MigrationPlan, emitter: &dyn ScriptEmitter, ctx: &EmitContext<'_>) -> Script {
    let statements: Vec<String> = plan
        .actions
        .iter()
        .flat_map(|action| emitter.emit(action, ctx))
        .collect();
    log::debug!(
        "Rendered {} actions into {} statements",
        plan.actions.len(),
        statements.len()
    );
    let checksum = checksum_statements(&statements);
    Script {
        statements,
        checksum,
    }
}
