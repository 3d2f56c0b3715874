//! Object dependency graph
//!
//! Edges point from the dependent object to the object it uses. Every
//! object except the database root also depends on its container, so a
//! column depends on its table and a table on its schema.

use crate::cancel::CancelFlag;
use crate::error::CoreResult;
use crate::object::ObjectId;
use crate::pattern::NamePattern;
use crate::reference::{Reference, ReferenceAnalyzer};
use crate::snapshot::Snapshot;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::{HashSet, VecDeque};

/// A reference the analyzer reported but the snapshot does not contain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedReference {
    pub object: ObjectId,
    pub reference: Reference,
}

/// One hit of [`DependencyGraph::find_dependents`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DependentMatch {
    pub id: ObjectId,
    /// Hops from the nearest starting object (0 for the starts themselves)
    pub depth: usize,
}

/// Dependency graph over the objects of one snapshot.
#[derive(Debug)]
pub struct DependencyGraph {
    /// Node `i` carries `ObjectId(i)`
    graph: DiGraph<ObjectId, ()>,
    unresolved: Vec<UnresolvedReference>,
}

impl DependencyGraph {
    /// Graph with one node per object and containment edges only.
    pub fn new(snapshot: &Snapshot) -> Self {
        let mut graph = DiGraph::with_capacity(snapshot.len(), snapshot.len());
        for (id, _) in snapshot.iter() {
            graph.add_node(id);
        }
        let mut dag = Self {
            graph,
            unresolved: Vec::new(),
        };
        for (id, object) in snapshot.iter() {
            if let Some(parent) = object.parent() {
                if parent != snapshot.root() {
                    dag.add_dependency(id, parent);
                }
            }
        }
        dag
    }

    /// Build the full graph, asking `analyzer` about every object.
    pub fn build(
        snapshot: &Snapshot,
        analyzer: &dyn ReferenceAnalyzer,
        cancel: &CancelFlag,
    ) -> CoreResult<Self> {
        let mut dag = Self::new(snapshot);
        for (id, _) in snapshot.iter() {
            cancel.check()?;
            dag.analyze_object(snapshot, analyzer, id);
        }
        log::debug!(
            "Dependency graph for '{}': {} objects, {} edges, {} unresolved references",
            snapshot.get(snapshot.root()).name,
            dag.graph.node_count(),
            dag.graph.edge_count(),
            dag.unresolved.len()
        );
        Ok(dag)
    }

    /// Add the edges for one object's references.
    pub fn analyze_object(
        &mut self,
        snapshot: &Snapshot,
        analyzer: &dyn ReferenceAnalyzer,
        id: ObjectId,
    ) {
        for reference in analyzer.references(snapshot, id) {
            match snapshot.resolve(&reference) {
                Some(target) => self.add_dependency(id, target),
                None => {
                    log::debug!(
                        "Unresolved reference from {}: {}",
                        snapshot.qualified_name(id),
                        reference
                    );
                    self.unresolved.push(UnresolvedReference {
                        object: id,
                        reference,
                    });
                }
            }
        }
    }

    /// Record that `dependent` uses `dependency`. Duplicate edges collapse.
    pub fn add_dependency(&mut self, dependent: ObjectId, dependency: ObjectId) {
        self.graph
            .update_edge(node(dependent), node(dependency), ());
    }

    pub fn contains_edge(&self, dependent: ObjectId, dependency: ObjectId) -> bool {
        self.graph
            .find_edge(node(dependent), node(dependency))
            .is_some()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Objects `id` uses directly, sorted.
    pub fn dependencies(&self, id: ObjectId) -> Vec<ObjectId> {
        self.neighbors(id, Direction::Outgoing)
    }

    /// Objects using `id` directly, sorted.
    pub fn dependents(&self, id: ObjectId) -> Vec<ObjectId> {
        self.neighbors(id, Direction::Incoming)
    }

    fn neighbors(&self, id: ObjectId, direction: Direction) -> Vec<ObjectId> {
        let mut out: Vec<ObjectId> = self
            .graph
            .edges_directed(node(id), direction)
            .map(|e| match direction {
                Direction::Outgoing => self.graph[e.target()],
                Direction::Incoming => self.graph[e.source()],
            })
            .collect();
        out.sort();
        out.dedup();
        out
    }

    /// Every object reachable from `id` along dependent edges.
    pub fn transitive_dependents(&self, id: ObjectId) -> Vec<ObjectId> {
        let mut visited = HashSet::new();
        let mut queue = VecDeque::from([id]);
        let mut out = Vec::new();
        while let Some(current) = queue.pop_front() {
            for next in self.dependents(current) {
                if next != id && visited.insert(next) {
                    out.push(next);
                    queue.push_back(next);
                }
            }
        }
        out
    }

    /// Strongly connected components with more than one member.
    /// Self-references are not cycles.
    pub fn cycles(&self) -> Vec<Vec<ObjectId>> {
        let mut out: Vec<Vec<ObjectId>> = tarjan_scc(&self.graph)
            .into_iter()
            .filter(|scc| scc.len() > 1)
            .map(|scc| {
                let mut ids: Vec<ObjectId> = scc.into_iter().map(|n| self.graph[n]).collect();
                ids.sort();
                ids
            })
            .collect();
        out.sort();
        out
    }

    pub fn has_cycle(&self) -> bool {
        !self.cycles().is_empty()
    }

    pub fn unresolved(&self) -> &[UnresolvedReference] {
        &self.unresolved
    }

    /// Bounded breadth-first search from every object matching `patterns`.
    ///
    /// With `reverse` unset the search follows dependents (who uses the
    /// matches); with `reverse` set it follows dependencies. Each object is
    /// reported once at the depth it was first reached, in traversal order.
    pub fn find_dependents(
        &self,
        snapshot: &Snapshot,
        patterns: &[NamePattern],
        max_depth: usize,
        reverse: bool,
        cancel: &CancelFlag,
    ) -> CoreResult<Vec<DependentMatch>> {
        let direction = if reverse {
            Direction::Outgoing
        } else {
            Direction::Incoming
        };

        let mut visited = HashSet::new();
        let mut queue = VecDeque::new();
        let mut out = Vec::new();
        for (id, object) in snapshot.iter().skip(1) {
            cancel.check()?;
            if patterns.iter().any(|p| p.matches(object.qualified_name())) && visited.insert(id) {
                out.push(DependentMatch { id, depth: 0 });
                queue.push_back((id, 0usize));
            }
        }

        while let Some((current, depth)) = queue.pop_front() {
            cancel.check()?;
            if depth >= max_depth {
                continue;
            }
            for next in self.neighbors(current, direction) {
                if next != snapshot.root() && visited.insert(next) {
                    out.push(DependentMatch {
                        id: next,
                        depth: depth + 1,
                    });
                    queue.push_back((next, depth + 1));
                }
            }
        }
        Ok(out)
    }
}

fn node(id: ObjectId) -> NodeIndex {
    NodeIndex::new(id.index())
}

#[cfg(test)]
#[path = "dag_test.rs"]
mod tests;
