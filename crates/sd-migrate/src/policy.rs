//! Per-kind rules for changing an object in place.

use sd_core::{ObjectBody, ObjectKind, SchemaObject};

/// How a changed object reaches its new definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlterPolicy {
    /// One ALTER (or CREATE OR REPLACE)
    InPlace,
    /// DROP followed by CREATE
    Recreate,
}

/// Decide how `old` becomes `new`. Both must share kind and name.
///
/// Owner, comment and privilege changes never force a re-create.
pub fn alter_policy(old: &SchemaObject, new: &SchemaObject) -> AlterPolicy {
    if old.same_definition(new) {
        return AlterPolicy::InPlace;
    }
    match (&old.body, &new.body) {
        (ObjectBody::Column(o), ObjectBody::Column(n)) => {
            // A generated expression cannot be altered
            if o.generated == n.generated {
                AlterPolicy::InPlace
            } else {
                AlterPolicy::Recreate
            }
        }
        (ObjectBody::Table(_), ObjectBody::Table(_))
        | (ObjectBody::Sequence(_), ObjectBody::Sequence(_)) => AlterPolicy::InPlace,
        (ObjectBody::View(o), ObjectBody::View(n)) => {
            let replaceable = !o.materialized
                && !n.materialized
                && n.columns.len() >= o.columns.len()
                && n.columns[..o.columns.len()] == o.columns[..]
                && types_kept(&o.column_types, &n.column_types);
            if replaceable {
                AlterPolicy::InPlace
            } else {
                AlterPolicy::Recreate
            }
        }
        (ObjectBody::Function(o), ObjectBody::Function(n)) => {
            let same_signature = o.returns == n.returns
                && o.arguments.len() == n.arguments.len()
                && o
                    .arguments
                    .iter()
                    .zip(&n.arguments)
                    .all(|(a, b)| a.data_type == b.data_type && a.name == b.name);
            if same_signature {
                AlterPolicy::InPlace
            } else {
                AlterPolicy::Recreate
            }
        }
        _ if matches!(
            old.kind,
            ObjectKind::Database | ObjectKind::Role | ObjectKind::Schema
        ) =>
        {
            AlterPolicy::InPlace
        }
        _ => AlterPolicy::Recreate,
    }
}

/// True when an in-place change rewrites a column's type, which invalidates
/// views and functions compiled against it.
pub fn changes_column_type(old: &SchemaObject, new: &SchemaObject) -> bool {
    match (old.column(), new.column()) {
        (Some(o), Some(n)) => o.data_type != n.data_type || o.collation != n.collation,
        _ => false,
    }
}

/// Output types recorded for the old view are kept by the new one.
/// Unrecorded types are not compared.
fn types_kept(old: &[String], new: &[String]) -> bool {
    old.is_empty() || new.is_empty() || (new.len() >= old.len() && new[..old.len()] == old[..])
}
