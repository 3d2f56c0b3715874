//! Immutable snapshot of one schema version.
//!
//! Objects live in an arena addressed by [`ObjectId`]; the first slot is
//! always the database root. A snapshot is assembled with
//! [`SnapshotBuilder`] and never changes afterwards, so it can be shared by
//! any number of concurrent readers.

use crate::error::{CoreError, CoreResult};
use crate::hasher::{combine_with_children, fingerprint_of, Fingerprint};
use crate::kind::ObjectKind;
use crate::object::{ObjectId, SchemaObject};
use crate::reference::Reference;
use std::collections::HashMap;

/// One loaded schema version.
#[derive(Debug, Clone)]
pub struct Snapshot {
    objects: Vec<SchemaObject>,
    /// Digest of each object's own content
    own_fingerprints: Vec<Fingerprint>,
    /// Digest of each object including its whole subtree
    fingerprints: Vec<Fingerprint>,
    /// (kind, qualified name) -> object
    index: HashMap<(ObjectKind, String), ObjectId>,
}

impl Snapshot {
    /// The database root.
    pub fn root(&self) -> ObjectId {
        ObjectId(0)
    }

    pub fn get(&self, id: ObjectId) -> &SchemaObject {
        &self.objects[id.0]
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.len() <= 1
    }

    /// All objects in load order (root first).
    pub fn iter(&self) -> impl Iterator<Item = (ObjectId, &SchemaObject)> {
        self.objects
            .iter()
            .enumerate()
            .map(|(i, object)| (ObjectId(i), object))
    }

    pub fn children(&self, id: ObjectId) -> &[ObjectId] {
        &self.objects[id.0].children
    }

    pub fn parent(&self, id: ObjectId) -> Option<ObjectId> {
        self.objects[id.0].parent
    }

    pub fn qualified_name(&self, id: ObjectId) -> &str {
        &self.objects[id.0].qualified_name
    }

    pub fn fingerprint(&self, id: ObjectId) -> Fingerprint {
        self.fingerprints[id.0]
    }

    pub fn own_fingerprint(&self, id: ObjectId) -> Fingerprint {
        self.own_fingerprints[id.0]
    }

    /// Look an object up by identity.
    pub fn find(&self, kind: ObjectKind, qualified_name: &str) -> Option<ObjectId> {
        self.index.get(&(kind, qualified_name.to_string())).copied()
    }

    /// Child of `parent` with the given identity.
    pub fn child(&self, parent: ObjectId, kind: ObjectKind, name: &str) -> Option<ObjectId> {
        self.children(parent)
            .iter()
            .copied()
            .find(|&c| self.get(c).kind == kind && self.get(c).name == name)
    }

    /// Proper ancestors of `id`, nearest first, excluding the root.
    pub fn ancestors(&self, id: ObjectId) -> Vec<ObjectId> {
        let mut out = Vec::new();
        let mut current = self.parent(id);
        while let Some(p) = current {
            if p == self.root() {
                break;
            }
            out.push(p);
            current = self.parent(p);
        }
        out
    }

    /// All descendants of `id` in pre-order.
    pub fn descendants(&self, id: ObjectId) -> Vec<ObjectId> {
        let mut out = Vec::new();
        let mut stack: Vec<ObjectId> = self.children(id).iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        out
    }

    /// True when `ancestor` contains `id` (directly or transitively).
    pub fn is_descendant_of(&self, id: ObjectId, ancestor: ObjectId) -> bool {
        let mut current = self.parent(id);
        while let Some(p) = current {
            if p == ancestor {
                return true;
            }
            current = self.parent(p);
        }
        false
    }

    /// Resolve a reference to an object of this snapshot.
    ///
    /// Qualified references must match exactly. Unqualified ones fall back to
    /// the first object (in load order) of the same kind whose simple name
    /// matches; function references match overloads by the name before `(`.
    pub fn resolve(&self, reference: &Reference) -> Option<ObjectId> {
        if let Some(id) = self.find(reference.kind, &reference.qualified()) {
            return Some(id);
        }
        let wanted = reference.qualified();
        let suffix = format!(".{}", wanted);
        self.iter()
            .filter(|(_, o)| o.kind == reference.kind)
            .find(|(_, o)| {
                let base = signature_base(&o.qualified_name);
                base == wanted || (reference.schema.is_none() && base.ends_with(&suffix))
            })
            .map(|(id, _)| id)
    }
}

/// Function name without its argument list.
fn signature_base(name: &str) -> &str {
    name.split('(').next().unwrap_or(name)
}

/// Incremental constructor for a [`Snapshot`].
#[derive(Debug)]
pub struct SnapshotBuilder {
    objects: Vec<SchemaObject>,
}

impl SnapshotBuilder {
    /// Start a snapshot whose root is the named database.
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            objects: vec![SchemaObject::new(ObjectKind::Database, database)],
        }
    }

    pub fn root(&self) -> ObjectId {
        ObjectId(0)
    }

    /// Attach `object` under `parent` and return its id.
    pub fn add(&mut self, parent: ObjectId, mut object: SchemaObject) -> ObjectId {
        let id = ObjectId(self.objects.len());
        object.parent = Some(parent);
        object.children.clear();
        self.objects.push(object);
        self.objects[parent.0].children.push(id);
        id
    }

    /// Mutable access to the root record (owner, comment, ...).
    pub fn root_mut(&mut self) -> &mut SchemaObject {
        &mut self.objects[0]
    }

    /// Freeze the arena: compute names, check identities, hash bottom-up.
    pub fn build(mut self) -> CoreResult<Snapshot> {
        let count = self.objects.len();
        self.objects[0].qualified_name = self.objects[0].name.clone();

        // Parents always precede children in the arena.
        for i in 1..count {
            let parent = self.objects[i].parent.ok_or_else(|| CoreError::InvalidSnapshot {
                message: format!("object '{}' has no parent", self.objects[i].name),
            })?;
            if self.objects[i].name.is_empty() {
                return Err(CoreError::InvalidSnapshot {
                    message: format!("{} with empty name", self.objects[i].kind),
                });
            }
            let qualified = if parent.0 == 0 {
                self.objects[i].name.clone()
            } else {
                format!("{}.{}", self.objects[parent.0].qualified_name, self.objects[i].name)
            };
            self.objects[i].qualified_name = qualified;
        }

        let mut index = HashMap::with_capacity(count);
        for (i, object) in self.objects.iter().enumerate() {
            let key = (object.kind, object.qualified_name.clone());
            if index.insert(key, ObjectId(i)).is_some() {
                return Err(CoreError::DuplicateObject {
                    kind: object.kind.to_string(),
                    name: object.qualified_name.clone(),
                });
            }
        }

        let own_fingerprints: Vec<Fingerprint> = self.objects.iter().map(fingerprint_of).collect();
        let mut fingerprints = own_fingerprints.clone();
        for i in (0..count).rev() {
            let children = self.objects[i]
                .children
                .iter()
                .map(|c| (self.objects[c.0].kind, fingerprints[c.0]))
                .collect::<Vec<_>>();
            fingerprints[i] = combine_with_children(own_fingerprints[i], children);
        }

        log::debug!(
            "Built snapshot '{}' with {} objects",
            self.objects[0].name,
            count
        );

        Ok(Snapshot {
            objects: self.objects,
            own_fingerprints,
            fingerprints,
            index,
        })
    }
}

#[cfg(test)]
#[path = "snapshot_test.rs"]
mod tests;
