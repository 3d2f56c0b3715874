//! Planned migration actions.

use sd_core::{ObjectId, Reference, Snapshot};
use serde::Serialize;
use std::fmt;

/// What an action does to its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ActionKind {
    Drop,
    Create,
    Alter,
    /// Re-create an unchanged object that was dropped because something it
    /// depends on was
    Refresh,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ActionKind::Drop => "DROP",
            ActionKind::Create => "CREATE",
            ActionKind::Alter => "ALTER",
            ActionKind::Refresh => "REFRESH",
        })
    }
}

/// Snapshot an action's target lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Old,
    New,
}

/// Which slice of the target an action covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "part")]
pub enum ActionPart {
    /// The complete object
    Whole,
    /// A table created without the listed foreign keys
    Skeleton { deferred: Vec<ObjectId> },
    /// A placeholder view or function with no dependencies. Before drops it
    /// replaces the existing definition; before creates it stands in for
    /// the real one.
    Stub,
    /// The part a skeleton or stub left out: a deferred foreign key or the
    /// real body of a stubbed view or function
    Completion,
}

/// One planned operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Action {
    pub kind: ActionKind,
    pub part: ActionPart,
    /// Object acted on; in the old snapshot for drops, the new one otherwise
    pub target: ObjectId,
    /// Old counterpart of the target for alters, refreshes and re-creates
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous: Option<ObjectId>,
    /// Position in the plan
    pub rank: usize,
}

impl Action {
    pub fn origin(&self) -> Origin {
        match self.kind {
            ActionKind::Drop => Origin::Old,
            _ => Origin::New,
        }
    }

    /// `KIND OBJECT qualified.name`, with the part when not whole.
    pub fn describe(&self, old: &Snapshot, new: &Snapshot) -> String {
        let snapshot = match self.origin() {
            Origin::Old => old,
            Origin::New => new,
        };
        let object = snapshot.get(self.target);
        let part = match &self.part {
            ActionPart::Whole => "",
            ActionPart::Skeleton { .. } => " (skeleton)",
            ActionPart::Stub => " (stub)",
            ActionPart::Completion => " (completion)",
        };
        format!(
            "{} {} {}{}",
            self.kind,
            object.kind,
            object.qualified_name(),
            part
        )
    }
}

/// Non-fatal finding attached to a plan.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlanDiagnostic {
    /// A definition mentions an object neither snapshot contains. The
    /// object was planned as if the reference did not exist.
    MissingReference { object: String, reference: Reference },
}

impl fmt::Display for PlanDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanDiagnostic::MissingReference { object, reference } => {
                write!(f, "{} references missing {}", object, reference)
            }
        }
    }
}

/// Ordered actions plus diagnostics for one plan request.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MigrationPlan {
    pub actions: Vec<Action>,
    pub diagnostics: Vec<PlanDiagnostic>,
}

impl MigrationPlan {
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Number of actions of `kind`.
    pub fn count(&self, kind: ActionKind) -> usize {
        self.actions.iter().filter(|a| a.kind == kind).count()
    }
}
