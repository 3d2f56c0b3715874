//! sd-migrate - Migration planning for Schemadelta
//!
//! Turns a selection of diff-tree nodes into dependency-ordered
//! DROP/CREATE/ALTER/REFRESH actions and renders them through a
//! [`ScriptEmitter`].

pub mod action;
pub mod emitter;
pub mod error;
pub mod planner;
pub mod policy;
pub mod render;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;

pub use action::{Action, ActionKind, ActionPart, MigrationPlan, Origin, PlanDiagnostic};
pub use emitter::{quote_ident, GenericEmitter};
pub use error::{PlanError, PlanResult};
pub use planner::Planner;
pub use policy::{alter_policy, AlterPolicy};
pub use render::{render, EmitContext, Script, ScriptEmitter};

use sd_core::{CancelFlag, DependencyGraph, DiffNode, DiffOptions, Selection, Snapshot};

/// Inputs of one planning request.
pub struct PlanRequest<'a> {
    pub old: &'a Snapshot,
    pub new: &'a Snapshot,
    pub old_graph: &'a DependencyGraph,
    pub new_graph: &'a DependencyGraph,
    pub tree: &'a DiffNode,
    pub selection: &'a Selection,
    pub options: DiffOptions,
}

/// Plan the selected nodes of a diff tree.
pub fn plan_migration(request: &PlanRequest<'_>, cancel: &CancelFlag) -> PlanResult<MigrationPlan> {
    Planner::new(
        request.old,
        request.new,
        request.old_graph,
        request.new_graph,
        request.options,
        cancel,
    )
    .plan(request.tree, request.selection)
}
