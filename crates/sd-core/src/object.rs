//! Schema object records.
//!
//! Every object shares one [`SchemaObject`] record; the kind-specific part
//! lives in the [`ObjectBody`] variant. Containment is expressed through
//! [`ObjectId`] indices into the owning [`Snapshot`](crate::snapshot::Snapshot).

use crate::kind::ObjectKind;
use crate::reference::Reference;
use crate::serde_helpers::default_true;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of an object inside its snapshot arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ObjectId(pub(crate) usize);

impl ObjectId {
    /// Position of the object in load order.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One privilege granted on an object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Privilege {
    /// Role receiving the privilege
    pub grantee: String,
    /// Privilege keyword (SELECT, USAGE, EXECUTE, ...)
    pub privilege: String,
    /// WITH GRANT OPTION
    #[serde(default)]
    pub with_grant_option: bool,
}

impl Privilege {
    pub fn new(grantee: impl Into<String>, privilege: impl Into<String>) -> Self {
        Self {
            grantee: grantee.into(),
            privilege: privilege.into(),
            with_grant_option: false,
        }
    }
}

/// Table-level attributes. Columns and constraints are child objects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDef {
    /// Storage options in declaration order (e.g. `fillfactor=70`)
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub tablespace: Option<String>,
    #[serde(default)]
    pub unlogged: bool,
}

/// Column attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub data_type: String,
    #[serde(default = "default_true")]
    pub nullable: bool,
    #[serde(default)]
    pub default: Option<String>,
    #[serde(default)]
    pub collation: Option<String>,
    /// Expression of a generated (computed) column
    #[serde(default)]
    pub generated: Option<String>,
}

impl ColumnDef {
    pub fn new(data_type: impl Into<String>) -> Self {
        Self {
            data_type: data_type.into(),
            nullable: true,
            default: None,
            collation: None,
            generated: None,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn with_default(mut self, expression: impl Into<String>) -> Self {
        self.default = Some(expression.into());
        self
    }
}

/// Table constraint definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConstraintDef {
    PrimaryKey {
        columns: Vec<String>,
    },
    Unique {
        columns: Vec<String>,
    },
    Check {
        expression: String,
    },
    ForeignKey {
        columns: Vec<String>,
        #[serde(default)]
        references_schema: Option<String>,
        references_table: String,
        #[serde(default)]
        references_columns: Vec<String>,
        #[serde(default)]
        on_delete: Option<String>,
        #[serde(default)]
        on_update: Option<String>,
    },
}

impl ConstraintDef {
    /// Local columns covered by the constraint.
    pub fn columns(&self) -> &[String] {
        match self {
            ConstraintDef::PrimaryKey { columns }
            | ConstraintDef::Unique { columns }
            | ConstraintDef::ForeignKey { columns, .. } => columns,
            ConstraintDef::Check { .. } => &[],
        }
    }

    pub fn is_foreign_key(&self) -> bool {
        matches!(self, ConstraintDef::ForeignKey { .. })
    }
}

/// Index definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDef {
    /// Indexed columns or expressions, in key order
    pub columns: Vec<String>,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub method: Option<String>,
    /// Partial index predicate
    #[serde(default)]
    pub predicate: Option<String>,
}

/// View definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewDef {
    /// Normalized SELECT text
    pub query: String,
    /// Output columns, in order
    #[serde(default)]
    pub columns: Vec<String>,
    /// Types of the output columns, parallel to `columns`; empty when unknown
    #[serde(default)]
    pub column_types: Vec<String>,
    #[serde(default)]
    pub materialized: bool,
}

impl ViewDef {
    /// `(column, type)` pairs, when every output column has a recorded type.
    pub fn typed_columns(&self) -> Option<Vec<(&str, &str)>> {
        if self.columns.is_empty() || self.column_types.len() != self.columns.len() {
            return None;
        }
        Some(
            self.columns
                .iter()
                .zip(&self.column_types)
                .map(|(c, t)| (c.as_str(), t.as_str()))
                .collect(),
        )
    }
}

/// One function argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionArg {
    #[serde(default)]
    pub name: Option<String>,
    pub data_type: String,
    #[serde(default)]
    pub default: Option<String>,
}

/// Function or procedure definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionDef {
    #[serde(default)]
    pub arguments: Vec<FunctionArg>,
    pub returns: String,
    #[serde(default = "default_language")]
    pub language: String,
    pub body: String,
    #[serde(default)]
    pub volatility: Option<String>,
}

fn default_language() -> String {
    "sql".to_string()
}

/// Sequence definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceDef {
    #[serde(default)]
    pub data_type: Option<String>,
    #[serde(default = "default_one")]
    pub start: i64,
    #[serde(default = "default_one")]
    pub increment: i64,
    #[serde(default)]
    pub min_value: Option<i64>,
    #[serde(default)]
    pub max_value: Option<i64>,
    #[serde(default)]
    pub cycle: bool,
}

fn default_one() -> i64 {
    1
}

impl Default for SequenceDef {
    fn default() -> Self {
        Self {
            data_type: None,
            start: 1,
            increment: 1,
            min_value: None,
            max_value: None,
            cycle: false,
        }
    }
}

/// Trigger definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerDef {
    /// BEFORE, AFTER or INSTEAD OF
    pub timing: String,
    /// Firing events; order carries no meaning
    pub events: Vec<String>,
    /// Qualified name of the trigger function
    pub function: String,
    #[serde(default = "default_true")]
    pub for_each_row: bool,
    #[serde(default)]
    pub when: Option<String>,
}

/// Kind-specific payload of a schema object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectBody {
    /// Objects described entirely by the shared record (schemas, roles, ...)
    #[default]
    None,
    Table(TableDef),
    Column(ColumnDef),
    Constraint(ConstraintDef),
    Index(IndexDef),
    View(ViewDef),
    Function(FunctionDef),
    Sequence(SequenceDef),
    Trigger(TriggerDef),
    /// Opaque, already-normalized definition text (types, policies, extensions)
    Definition(String),
}

/// One database object as loaded from a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaObject {
    pub name: String,
    pub kind: ObjectKind,
    pub owner: Option<String>,
    pub comment: Option<String>,
    pub privileges: Vec<Privilege>,
    pub body: ObjectBody,
    /// References declared by the loader, consumed by
    /// [`DeclaredReferences`](crate::reference::DeclaredReferences)
    pub references: Vec<Reference>,
    pub(crate) parent: Option<ObjectId>,
    pub(crate) children: Vec<ObjectId>,
    pub(crate) qualified_name: String,
}

impl SchemaObject {
    pub fn new(kind: ObjectKind, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            owner: None,
            comment: None,
            privileges: Vec::new(),
            body: ObjectBody::None,
            references: Vec::new(),
            parent: None,
            children: Vec::new(),
            qualified_name: String::new(),
        }
    }

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn with_privilege(mut self, privilege: Privilege) -> Self {
        self.privileges.push(privilege);
        self
    }

    pub fn with_body(mut self, body: ObjectBody) -> Self {
        self.body = body;
        self
    }

    pub fn with_reference(mut self, reference: Reference) -> Self {
        self.references.push(reference);
        self
    }

    /// Dotted path of names below the database root.
    pub fn qualified_name(&self) -> &str {
        &self.qualified_name
    }

    pub fn parent(&self) -> Option<ObjectId> {
        self.parent
    }

    pub fn children(&self) -> &[ObjectId] {
        &self.children
    }

    pub fn column(&self) -> Option<&ColumnDef> {
        match &self.body {
            ObjectBody::Column(def) => Some(def),
            _ => None,
        }
    }

    pub fn constraint(&self) -> Option<&ConstraintDef> {
        match &self.body {
            ObjectBody::Constraint(def) => Some(def),
            _ => None,
        }
    }

    pub fn view(&self) -> Option<&ViewDef> {
        match &self.body {
            ObjectBody::View(def) => Some(def),
            _ => None,
        }
    }

    pub fn function(&self) -> Option<&FunctionDef> {
        match &self.body {
            ObjectBody::Function(def) => Some(def),
            _ => None,
        }
    }

    /// True when only the shared metadata (owner, comment, privileges) differs.
    pub fn same_definition(&self, other: &SchemaObject) -> bool {
        self.kind == other.kind && self.name == other.name && self.body == other.body
    }
}
