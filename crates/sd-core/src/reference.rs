//! Reference analysis seam.
//!
//! The dependency graph does not inspect definitions itself. It asks a
//! [`ReferenceAnalyzer`] which objects a definition mentions and resolves the
//! answers against the snapshot.

use crate::kind::ObjectKind;
use crate::object::{ConstraintDef, ObjectBody, ObjectId};
use crate::snapshot::Snapshot;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Position of a reference inside the defining text. Diagnostics only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

/// One object mentioned by a definition.
///
/// `name` is the object name relative to `schema`; sub-objects carry their
/// parent too (`orders.customer_id` for a column).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Reference {
    #[serde(default)]
    pub schema: Option<String>,
    pub name: String,
    pub kind: ObjectKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceLocation>,
}

impl Reference {
    pub fn new(schema: Option<&str>, name: impl Into<String>, kind: ObjectKind) -> Self {
        Self {
            schema: schema.map(str::to_string),
            name: name.into(),
            kind,
            location: None,
        }
    }

    /// Build a reference from a possibly schema-qualified `schema.name` string.
    pub fn parse_qualified(qualified: &str, kind: ObjectKind) -> Self {
        match split_schema(qualified) {
            (Some(schema), name) => Self::new(Some(schema), name, kind),
            (None, name) => Self::new(None, name, kind),
        }
    }

    pub fn at(mut self, line: usize, column: usize) -> Self {
        self.location = Some(SourceLocation { line, column });
        self
    }

    /// Dotted name as it would appear in a snapshot.
    pub fn qualified(&self) -> String {
        match &self.schema {
            Some(schema) => format!("{}.{}", schema, self.name),
            None => self.name.clone(),
        }
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.qualified())
    }
}

/// Split `schema.name` on the first dot that is outside parentheses.
fn split_schema(qualified: &str) -> (Option<&str>, &str) {
    let head = qualified.split('(').next().unwrap_or(qualified);
    match head.find('.') {
        Some(pos) => (Some(&qualified[..pos]), &qualified[pos + 1..]),
        None => (None, qualified),
    }
}

/// Supplies the objects a definition refers to.
///
/// Implementations may be called lazily, once per object, in any order.
pub trait ReferenceAnalyzer {
    fn references(&self, snapshot: &Snapshot, id: ObjectId) -> Vec<Reference>;
}

/// Returns the references the loader stored on each object.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeclaredReferences;

impl ReferenceAnalyzer for DeclaredReferences {
    fn references(&self, snapshot: &Snapshot, id: ObjectId) -> Vec<Reference> {
        snapshot.get(id).references.clone()
    }
}

/// References implied by structured object bodies: foreign keys point at
/// their target table and columns, keys and indexes at the columns they
/// cover, triggers at their function, columns at user-defined types.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuralReferences;

impl ReferenceAnalyzer for StructuralReferences {
    fn references(&self, snapshot: &Snapshot, id: ObjectId) -> Vec<Reference> {
        let object = snapshot.get(id);
        let schema = schema_of(snapshot, id);
        let parent = object.parent();
        let mut out = Vec::new();

        let local_columns = |columns: &[String], out: &mut Vec<Reference>| {
            let Some(table) = parent else { return };
            for column in columns {
                if snapshot.child(table, ObjectKind::Column, column).is_some() {
                    let name = format!("{}.{}", snapshot.get(table).name, column);
                    out.push(Reference::new(schema, name, ObjectKind::Column));
                }
            }
        };

        match &object.body {
            ObjectBody::Constraint(def) => {
                local_columns(def.columns(), &mut out);
                if let ConstraintDef::ForeignKey {
                    references_schema,
                    references_table,
                    references_columns,
                    ..
                } = def
                {
                    let target_schema = references_schema.as_deref().or(schema);
                    out.push(Reference::new(
                        target_schema,
                        references_table.clone(),
                        ObjectKind::Table,
                    ));
                    for column in references_columns {
                        out.push(Reference::new(
                            target_schema,
                            format!("{}.{}", references_table, column),
                            ObjectKind::Column,
                        ));
                    }
                }
            }
            ObjectBody::Index(def) => local_columns(&def.columns, &mut out),
            ObjectBody::Trigger(def) => {
                let mut reference = Reference::parse_qualified(&def.function, ObjectKind::Function);
                if reference.schema.is_none() {
                    reference.schema = schema.map(str::to_string);
                }
                out.push(reference);
            }
            ObjectBody::Column(def) => {
                let candidate = Reference::parse_qualified(&def.data_type, ObjectKind::Type);
                if snapshot.resolve(&candidate).is_some() {
                    out.push(candidate);
                }
            }
            _ => {}
        }
        out
    }
}

/// Name of the schema containing `id`, if any.
pub fn schema_of(snapshot: &Snapshot, id: ObjectId) -> Option<&str> {
    std::iter::once(id)
        .chain(snapshot.ancestors(id))
        .find(|&a| snapshot.get(a).kind == ObjectKind::Schema)
        .map(|a| snapshot.get(a).name.as_str())
}

/// Concatenates the answers of several analyzers, dropping duplicates.
#[derive(Default)]
pub struct ChainedAnalyzer {
    analyzers: Vec<Box<dyn ReferenceAnalyzer>>,
}

impl ChainedAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, analyzer: impl ReferenceAnalyzer + 'static) -> Self {
        self.analyzers.push(Box::new(analyzer));
        self
    }
}

impl ReferenceAnalyzer for ChainedAnalyzer {
    fn references(&self, snapshot: &Snapshot, id: ObjectId) -> Vec<Reference> {
        let mut out: Vec<Reference> = Vec::new();
        for analyzer in &self.analyzers {
            for reference in analyzer.references(snapshot, id) {
                let duplicate = out.iter().any(|r| {
                    r.kind == reference.kind && r.schema == reference.schema && r.name == reference.name
                });
                if !duplicate {
                    out.push(reference);
                }
            }
        }
        out
    }
}
