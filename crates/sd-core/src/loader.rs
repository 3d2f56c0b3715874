//! Snapshot files
//!
//! A snapshot file is a nested YAML or JSON document:
//!
//! ```yaml
//! name: appdb
//! objects:
//!   - kind: schema
//!     name: public
//!     children:
//!       - kind: table
//!         name: orders
//!         children:
//!           - kind: column
//!             name: id
//!             body: { column: { data_type: int, nullable: false } }
//!       - kind: view
//!         name: recent_orders
//!         body: { view: { query: "SELECT * FROM public.orders" } }
//!         references:
//!           - { schema: public, name: orders, kind: table }
//! ```

use crate::error::{CoreError, CoreResult};
use crate::kind::ObjectKind;
use crate::object::{ObjectBody, ObjectId, Privilege, SchemaObject};
use crate::reference::Reference;
use crate::snapshot::{Snapshot, SnapshotBuilder};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level snapshot document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SnapshotFile {
    /// Database name
    pub name: String,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub objects: Vec<ObjectSpec>,
}

/// One object and its children.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ObjectSpec {
    pub kind: ObjectKind,
    pub name: String,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub privileges: Vec<Privilege>,
    /// Written as a one-entry map, `{ table: {...} }`, in YAML as well as JSON
    #[serde(default, with = "serde_yaml::with::singleton_map")]
    pub body: ObjectBody,
    #[serde(default)]
    pub references: Vec<Reference>,
    #[serde(default)]
    pub children: Vec<ObjectSpec>,
}

impl SnapshotFile {
    /// Flatten the document into an arena snapshot.
    pub fn into_snapshot(self) -> CoreResult<Snapshot> {
        let mut builder = SnapshotBuilder::new(self.name);
        builder.root_mut().owner = self.owner;
        builder.root_mut().comment = self.comment;
        let root = builder.root();
        for spec in self.objects {
            add_spec(&mut builder, root, spec)?;
        }
        builder.build()
    }
}

fn add_spec(builder: &mut SnapshotBuilder, parent: ObjectId, spec: ObjectSpec) -> CoreResult<()> {
    if spec.kind == ObjectKind::Database {
        return Err(CoreError::InvalidSnapshot {
            message: format!("nested database '{}'", spec.name),
        });
    }
    let object = SchemaObject {
        owner: spec.owner,
        comment: spec.comment,
        privileges: spec.privileges,
        body: spec.body,
        references: spec.references,
        ..SchemaObject::new(spec.kind, spec.name)
    };
    let id = builder.add(parent, object);
    for child in spec.children {
        add_spec(builder, id, child)?;
    }
    Ok(())
}

impl Snapshot {
    /// Load a snapshot file; `.json` is read as JSON, anything else as YAML.
    pub fn load(path: &Path) -> CoreResult<Snapshot> {
        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let snapshot = if is_json {
            Self::from_json_str(&content)?
        } else {
            Self::from_yaml_str(&content)?
        };
        log::debug!(
            "Loaded snapshot '{}' from {} ({} objects)",
            snapshot.get(snapshot.root()).name,
            path.display(),
            snapshot.len()
        );
        Ok(snapshot)
    }

    pub fn from_yaml_str(content: &str) -> CoreResult<Snapshot> {
        let file: SnapshotFile = serde_yaml::from_str(content)?;
        file.into_snapshot()
    }

    pub fn from_json_str(content: &str) -> CoreResult<Snapshot> {
        let file: SnapshotFile = serde_json::from_str(content)?;
        file.into_snapshot()
    }
}

#[cfg(test)]
#[path = "loader_test.rs"]
mod tests;
