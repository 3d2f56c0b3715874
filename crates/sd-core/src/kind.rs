//! Object kind discriminator shared by every schema object.
//!
//! The declaration order of [`ObjectKind`] is the canonical kind rank: it
//! reflects the usual dependency direction between kinds and drives the
//! presentation order of diff trees and the tie-break of migration plans.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of a database object.
///
/// | kind         | lives under        | keyword             |
/// |--------------|--------------------|---------------------|
/// | `database`   | *(root)*           | `DATABASE`          |
/// | `role`       | database           | `ROLE`              |
/// | `schema`     | database           | `SCHEMA`            |
/// | `extension`  | database / schema  | `EXTENSION`         |
/// | `type`       | schema             | `TYPE`              |
/// | `sequence`   | schema             | `SEQUENCE`          |
/// | `table`      | schema             | `TABLE`             |
/// | `column`     | table              | `COLUMN`            |
/// | `constraint` | table              | `CONSTRAINT`        |
/// | `index`      | table              | `INDEX`             |
/// | `function`   | schema             | `FUNCTION`          |
/// | `view`       | schema             | `VIEW`              |
/// | `trigger`    | table / view       | `TRIGGER`           |
/// | `policy`     | table              | `POLICY`            |
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    Database,
    Role,
    Schema,
    Extension,
    Type,
    Sequence,
    Table,
    Column,
    Constraint,
    Index,
    Function,
    View,
    Trigger,
    Policy,
}

impl ObjectKind {
    /// Every kind, in rank order.
    pub const ALL: [ObjectKind; 14] = [
        ObjectKind::Database,
        ObjectKind::Role,
        ObjectKind::Schema,
        ObjectKind::Extension,
        ObjectKind::Type,
        ObjectKind::Sequence,
        ObjectKind::Table,
        ObjectKind::Column,
        ObjectKind::Constraint,
        ObjectKind::Index,
        ObjectKind::Function,
        ObjectKind::View,
        ObjectKind::Trigger,
        ObjectKind::Policy,
    ];

    /// Canonical rank of the kind (lower sorts first).
    pub fn rank(self) -> u8 {
        self as u8
    }

    /// Upper-case SQL keyword for the kind.
    pub fn keyword(self) -> &'static str {
        match self {
            ObjectKind::Database => "DATABASE",
            ObjectKind::Role => "ROLE",
            ObjectKind::Schema => "SCHEMA",
            ObjectKind::Extension => "EXTENSION",
            ObjectKind::Type => "TYPE",
            ObjectKind::Sequence => "SEQUENCE",
            ObjectKind::Table => "TABLE",
            ObjectKind::Column => "COLUMN",
            ObjectKind::Constraint => "CONSTRAINT",
            ObjectKind::Index => "INDEX",
            ObjectKind::Function => "FUNCTION",
            ObjectKind::View => "VIEW",
            ObjectKind::Trigger => "TRIGGER",
            ObjectKind::Policy => "POLICY",
        }
    }

    /// Kinds that only exist inside a table or view and disappear with it.
    pub fn is_sub_object(self) -> bool {
        matches!(
            self,
            ObjectKind::Column
                | ObjectKind::Constraint
                | ObjectKind::Index
                | ObjectKind::Trigger
                | ObjectKind::Policy
        )
    }

    /// Kinds written inline in their parent's CREATE statement.
    pub fn is_inline(self) -> bool {
        matches!(self, ObjectKind::Column | ObjectKind::Constraint)
    }

    /// Kinds whose definitions may mention other objects.
    pub fn can_reference(self) -> bool {
        matches!(
            self,
            ObjectKind::Column
                | ObjectKind::Constraint
                | ObjectKind::Index
                | ObjectKind::Function
                | ObjectKind::View
                | ObjectKind::Trigger
                | ObjectKind::Policy
                | ObjectKind::Sequence
        )
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

impl FromStr for ObjectKind {
    type Err = CoreError;

    /// Parse a kind keyword, case-insensitively.
    fn from_str(s: &str) -> CoreResult<Self> {
        let wanted = s.trim();
        ObjectKind::ALL
            .into_iter()
            .find(|kind| kind.keyword().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| CoreError::UnknownObjectKind {
                value: s.to_string(),
            })
    }
}

#[cfg(test)]
#[path = "kind_test.rs"]
mod tests;
