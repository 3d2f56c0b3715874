//! Merged old/new object tree.
//!
//! [`build_diff_tree`] walks both snapshots in lock-step from the database
//! root, pairs children by identity (kind + name) and tags every node with
//! the side it exists on. Children are kept in canonical order: kind rank,
//! then side (`Left` < `Both` < `Right`), then name.

use crate::cancel::CancelFlag;
use crate::error::CoreResult;
use crate::ignore::{IgnoreList, Verdict};
use crate::kind::ObjectKind;
use crate::object::ObjectId;
use crate::snapshot::Snapshot;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;

/// Which snapshot(s) contain an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    /// Only in the old snapshot (removed)
    Left,
    /// In both snapshots
    Both,
    /// Only in the new snapshot (added)
    Right,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Side::Left => "LEFT",
            Side::Both => "BOTH",
            Side::Right => "RIGHT",
        })
    }
}

/// Comparison switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffOptions {
    /// Treat tables whose columns only moved as equal
    pub ignore_column_order: bool,
}

/// Identity of a diff node, stable across both snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeKey {
    pub kind: ObjectKind,
    pub qualified_name: String,
}

impl NodeKey {
    pub fn new(kind: ObjectKind, qualified_name: impl Into<String>) -> Self {
        Self {
            kind,
            qualified_name: qualified_name.into(),
        }
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.qualified_name)
    }
}

/// One merged tree entry.
#[derive(Debug, Clone, Serialize)]
pub struct DiffNode {
    pub kind: ObjectKind,
    pub name: String,
    pub qualified_name: String,
    pub side: Side,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old: Option<ObjectId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new: Option<ObjectId>,
    /// The object's own attributes differ (children not considered)
    pub own_changed: bool,
    /// Common columns changed relative order, or a column was inserted
    /// before an existing one
    pub reordered: bool,
    /// Anything in this subtree needs migrating
    pub changed: bool,
    /// Children hidden by a `CONTENT` ignore rule
    pub content_ignored: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<DiffNode>,
}

impl DiffNode {
    pub fn key(&self) -> NodeKey {
        NodeKey::new(self.kind, self.qualified_name.clone())
    }

    pub fn is_changed(&self) -> bool {
        self.changed
    }

    /// Pre-order traversal in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = &DiffNode> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.children.iter().rev());
            Some(node)
        })
    }

    /// Locate a node by identity.
    pub fn find(&self, kind: ObjectKind, qualified_name: &str) -> Option<&DiffNode> {
        self.iter()
            .find(|n| n.kind == kind && n.qualified_name == qualified_name)
    }

    /// Number of nodes on each side, root excluded: (left, both, right).
    pub fn side_counts(&self) -> (usize, usize, usize) {
        self.iter()
            .skip(1)
            .fold((0, 0, 0), |(l, b, r), n| match n.side {
                Side::Left => (l + 1, b, r),
                Side::Both => (l, b + 1, r),
                Side::Right => (l, b, r + 1),
            })
    }

    fn recompute_changed(&mut self, options: &DiffOptions) {
        for child in &mut self.children {
            child.recompute_changed(options);
        }
        self.changed = match self.side {
            Side::Left | Side::Right => true,
            Side::Both if self.content_ignored => false,
            Side::Both => {
                self.own_changed
                    || (self.reordered && !options.ignore_column_order)
                    || self.children.iter().any(|c| c.changed)
            }
        };
    }
}

/// Merge two snapshots into a diff tree without ignore rules.
pub fn build_diff_tree(
    old: &Snapshot,
    new: &Snapshot,
    options: &DiffOptions,
    cancel: &CancelFlag,
) -> CoreResult<DiffNode> {
    let builder = TreeBuilder {
        old,
        new,
        options,
        cancel,
    };
    let root = builder.both(old.root(), new.root())?;
    let (l, b, r) = root.side_counts();
    log::debug!(
        "Diff tree built: {} removed, {} common, {} added",
        l,
        b,
        r
    );
    Ok(root)
}

/// Merge two snapshots and prune the result with `rules`.
///
/// Excluded nodes disappear with their subtree. Nodes matched by a `CONTENT`
/// rule stay visible but lose their children and, when present on both
/// sides, are reported unchanged. The database root is never filtered.
pub fn diff_tree(
    old: &Snapshot,
    new: &Snapshot,
    rules: &IgnoreList,
    options: &DiffOptions,
    cancel: &CancelFlag,
) -> CoreResult<DiffNode> {
    let mut root = build_diff_tree(old, new, options, cancel)?;
    prune(&mut root, rules, cancel)?;
    root.recompute_changed(options);
    Ok(root)
}

fn prune(node: &mut DiffNode, rules: &IgnoreList, cancel: &CancelFlag) -> CoreResult<()> {
    let mut kept = Vec::with_capacity(node.children.len());
    for mut child in std::mem::take(&mut node.children) {
        cancel.check()?;
        match rules.classify(child.kind, &child.qualified_name) {
            Verdict::Exclude => {
                log::debug!("Ignoring {}", child.key());
            }
            Verdict::ExcludeContent => {
                child.children.clear();
                child.content_ignored = true;
                kept.push(child);
            }
            Verdict::Include => {
                prune(&mut child, rules, cancel)?;
                kept.push(child);
            }
        }
    }
    node.children = kept;
    Ok(())
}

struct TreeBuilder<'a> {
    old: &'a Snapshot,
    new: &'a Snapshot,
    options: &'a DiffOptions,
    cancel: &'a CancelFlag,
}

impl TreeBuilder<'_> {
    fn both(&self, old_id: ObjectId, new_id: ObjectId) -> CoreResult<DiffNode> {
        self.cancel.check()?;
        let old_obj = self.old.get(old_id);

        let new_children: HashMap<(ObjectKind, &str), ObjectId> = self
            .new
            .children(new_id)
            .iter()
            .map(|&c| ((self.new.get(c).kind, self.new.get(c).name.as_str()), c))
            .collect();

        let mut matched = HashSet::new();
        let mut children = Vec::new();
        for &oc in self.old.children(old_id) {
            let o = self.old.get(oc);
            match new_children.get(&(o.kind, o.name.as_str())) {
                Some(&nc) => {
                    matched.insert(nc);
                    children.push(self.both(oc, nc)?);
                }
                None => children.push(self.one_side(self.old, oc, Side::Left)?),
            }
        }
        for &nc in self.new.children(new_id) {
            if !matched.contains(&nc) {
                children.push(self.one_side(self.new, nc, Side::Right)?);
            }
        }
        sort_canonical(&mut children);

        let own_changed = self.old.own_fingerprint(old_id) != self.new.own_fingerprint(new_id);
        let reordered = old_obj.kind == ObjectKind::Table
            && self.old.fingerprint(old_id) != self.new.fingerprint(new_id)
            && columns_reordered(self.old, old_id, self.new, new_id);

        let mut node = DiffNode {
            kind: old_obj.kind,
            name: old_obj.name.clone(),
            qualified_name: old_obj.qualified_name().to_string(),
            side: Side::Both,
            old: Some(old_id),
            new: Some(new_id),
            own_changed,
            reordered,
            changed: false,
            content_ignored: false,
            children,
        };
        node.changed = if self.old.fingerprint(old_id) == self.new.fingerprint(new_id) {
            false
        } else {
            node.own_changed
                || (node.reordered && !self.options.ignore_column_order)
                || node.children.iter().any(|c| c.changed)
        };
        Ok(node)
    }

    fn one_side(&self, snapshot: &Snapshot, id: ObjectId, side: Side) -> CoreResult<DiffNode> {
        self.cancel.check()?;
        let object = snapshot.get(id);
        let mut children = snapshot
            .children(id)
            .iter()
            .map(|&c| self.one_side(snapshot, c, side))
            .collect::<CoreResult<Vec<_>>>()?;
        sort_canonical(&mut children);
        let (old, new) = match side {
            Side::Left => (Some(id), None),
            _ => (None, Some(id)),
        };
        Ok(DiffNode {
            kind: object.kind,
            name: object.name.clone(),
            qualified_name: object.qualified_name().to_string(),
            side,
            old,
            new,
            own_changed: false,
            reordered: false,
            changed: true,
            content_ignored: false,
            children,
        })
    }
}

fn sort_canonical(nodes: &mut [DiffNode]) {
    nodes.sort_by(|a, b| {
        a.kind
            .rank()
            .cmp(&b.kind.rank())
            .then(a.side.cmp(&b.side))
            .then_with(|| a.name.cmp(&b.name))
    });
}

fn column_names(snapshot: &Snapshot, table: ObjectId) -> Vec<&str> {
    snapshot
        .children(table)
        .iter()
        .map(|&c| snapshot.get(c))
        .filter(|o| o.kind == ObjectKind::Column)
        .map(|o| o.name.as_str())
        .collect()
}

/// True when common columns changed relative order, or a new column sits
/// before an existing one (so it cannot be appended).
fn columns_reordered(old: &Snapshot, old_table: ObjectId, new: &Snapshot, new_table: ObjectId) -> bool {
    let old_cols = column_names(old, old_table);
    let new_cols = column_names(new, new_table);
    let old_set: HashSet<&str> = old_cols.iter().copied().collect();
    let new_set: HashSet<&str> = new_cols.iter().copied().collect();

    let old_common: Vec<&str> = old_cols.iter().copied().filter(|c| new_set.contains(c)).collect();
    let new_common: Vec<&str> = new_cols.iter().copied().filter(|c| old_set.contains(c)).collect();
    if old_common != new_common {
        return true;
    }

    let mut seen_added = false;
    for col in &new_cols {
        if old_set.contains(col) {
            if seen_added {
                return true;
            }
        } else {
            seen_added = true;
        }
    }
    false
}

/// Diff nodes chosen for migration.
///
/// Selecting a node covers its whole subtree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    keys: BTreeSet<NodeKey>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every changed node of `tree`.
    pub fn all_changed(tree: &DiffNode) -> Self {
        let keys = tree.iter().filter(|n| n.changed).map(DiffNode::key).collect();
        Self { keys }
    }

    pub fn insert(&mut self, key: NodeKey) -> bool {
        self.keys.insert(key)
    }

    pub fn with(mut self, kind: ObjectKind, qualified_name: &str) -> Self {
        self.insert(NodeKey::new(kind, qualified_name));
        self
    }

    pub fn contains(&self, key: &NodeKey) -> bool {
        self.keys.contains(key)
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &NodeKey> {
        self.keys.iter()
    }
}

#[cfg(test)]
#[path = "diff_tree_test.rs"]
mod tests;
