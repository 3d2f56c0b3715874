//! Action planner
//!
//! Turns the selected part of a diff tree into an ordered list of actions:
//!
//! 1. Every selected, changed node becomes an intent: drop, create, or alter
//!    in place according to [`alter_policy`].
//! 2. Drops cascade: anything in the old snapshot that depends on a dropped
//!    object is dropped too. Surviving objects caught by the cascade are
//!    re-created (`REFRESH`), and pending in-place alters are promoted to
//!    re-creates.
//! 3. Drops are ordered dependents-first over the old dependency graph;
//!    creates and alters dependencies-first over the new one. Remaining
//!    cycles are broken one member at a time by skeleton/completion splits.
//!    Completions run after every other action.

use crate::action::{Action, ActionKind, ActionPart, MigrationPlan, PlanDiagnostic};
use crate::error::{PlanError, PlanResult};
use crate::policy::{alter_policy, changes_column_type, AlterPolicy};
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use sd_core::{
    CancelFlag, ConstraintDef, DependencyGraph, DiffNode, DiffOptions, ObjectBody, ObjectId,
    ObjectKind, Selection, Side, Snapshot,
};
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

/// Plans migrations from one snapshot to another.
///
/// Both snapshots and graphs are only read, so one planner (or many) may
/// run concurrently over the same inputs.
pub struct Planner<'a> {
    old: &'a Snapshot,
    new: &'a Snapshot,
    old_graph: &'a DependencyGraph,
    new_graph: &'a DependencyGraph,
    options: DiffOptions,
    cancel: &'a CancelFlag,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Drop,
    Create,
}

/// Planned operation on a new-snapshot object.
#[derive(Debug, Clone, Copy)]
struct Planned {
    kind: ActionKind,
    previous: Option<ObjectId>,
}

#[derive(Debug, Default)]
struct Intents {
    /// Old objects dropped as a whole
    drops: BTreeSet<ObjectId>,
    /// New objects created, altered or refreshed
    creates: BTreeMap<ObjectId, Planned>,
    /// Old columns whose type is changed in place
    type_changes: BTreeSet<ObjectId>,
}

/// One schedulable step. `owns` decides who satisfies other units'
/// dependencies on an object; `carries` decides whose dependencies the
/// unit itself must wait for.
#[derive(Debug, Clone)]
struct Unit {
    kind: ActionKind,
    part: ActionPart,
    target: ObjectId,
    previous: Option<ObjectId>,
    owns: BTreeSet<ObjectId>,
    carries: BTreeSet<ObjectId>,
    /// Objects depended on besides those reached through `carries`
    extra: Vec<ObjectId>,
    /// Units that must run first
    after: Vec<usize>,
    completion: bool,
}

impl Unit {
    fn new(kind: ActionKind, target: ObjectId, previous: Option<ObjectId>) -> Self {
        Self {
            kind,
            part: ActionPart::Whole,
            target,
            previous,
            owns: BTreeSet::from([target]),
            carries: BTreeSet::from([target]),
            extra: Vec::new(),
            after: Vec::new(),
            completion: false,
        }
    }
}

type UnitKey = (u8, String, u8);

impl<'a> Planner<'a> {
    pub fn new(
        old: &'a Snapshot,
        new: &'a Snapshot,
        old_graph: &'a DependencyGraph,
        new_graph: &'a DependencyGraph,
        options: DiffOptions,
        cancel: &'a CancelFlag,
    ) -> Self {
        Self {
            old,
            new,
            old_graph,
            new_graph,
            options,
            cancel,
        }
    }

    /// Plan the selected nodes of `tree`.
    pub fn plan(&self, tree: &DiffNode, selection: &Selection) -> PlanResult<MigrationPlan> {
        let mut intents = Intents::default();
        self.collect(tree, &mut Vec::new(), false, selection, &mut intents)?;
        let closure = self.cascade(&mut intents)?;
        self.refresh(&closure, &mut intents);

        let mut drop_units = self.drop_units(&intents);
        let drop_order = self.sequence(&mut drop_units, Phase::Drop)?;

        let mut create_units = self.create_units(&intents);
        let create_order = self.sequence(&mut create_units, Phase::Create)?;
        let completion_order = self.completions(&create_units);

        let mut actions = Vec::with_capacity(drop_order.len() + create_order.len());
        let ordered = drop_order
            .iter()
            .map(|&i| &drop_units[i])
            .chain(create_order.iter().map(|&i| &create_units[i]))
            .chain(completion_order.iter().map(|&i| &create_units[i]));
        for unit in ordered {
            actions.push(Action {
                kind: unit.kind,
                part: unit.part.clone(),
                target: unit.target,
                previous: unit.previous,
                rank: actions.len(),
            });
        }

        let diagnostics = self.diagnostics(&closure, &create_units);
        log::debug!(
            "Planned {} actions ({} drops, {} completions, {} diagnostics)",
            actions.len(),
            drop_order.len(),
            completion_order.len(),
            diagnostics.len()
        );
        Ok(MigrationPlan {
            actions,
            diagnostics,
        })
    }

    // ── Intents ─────────────────────────────────────────────────────────

    fn collect<'t>(
        &self,
        node: &'t DiffNode,
        ancestors: &mut Vec<&'t DiffNode>,
        selected_above: bool,
        selection: &Selection,
        intents: &mut Intents,
    ) -> PlanResult<()> {
        self.cancel.check()?;
        if !node.changed {
            return Ok(());
        }
        let selected = selected_above || selection.contains(&node.key());
        if selected {
            match node.side {
                Side::Left => {
                    if let Some(old) = node.old {
                        intents.drops.insert(old);
                    }
                }
                Side::Right => {
                    // An added object needs its added containers
                    for ancestor in ancestors.iter().filter(|a| a.side == Side::Right) {
                        if let Some(id) = ancestor.new {
                            intents.creates.entry(id).or_insert(Planned {
                                kind: ActionKind::Create,
                                previous: None,
                            });
                        }
                    }
                    if let Some(new) = node.new {
                        let parent_survives = ancestors.last().is_some_and(|p| p.side == Side::Both);
                        let kind = if node.kind.is_inline() && parent_survives {
                            ActionKind::Alter
                        } else {
                            ActionKind::Create
                        };
                        intents.creates.entry(new).or_insert(Planned {
                            kind,
                            previous: None,
                        });
                    }
                }
                Side::Both => self.collect_changed(node, intents),
            }
        }
        ancestors.push(node);
        for child in &node.children {
            self.collect(child, ancestors, selected, selection, intents)?;
        }
        ancestors.pop();
        Ok(())
    }

    fn collect_changed(&self, node: &DiffNode, intents: &mut Intents) {
        let (Some(old_id), Some(new_id)) = (node.old, node.new) else {
            return;
        };
        let reordered = node.reordered && !self.options.ignore_column_order;
        if !node.own_changed && !reordered {
            return;
        }
        let (old, new) = (self.old.get(old_id), self.new.get(new_id));
        let policy = if old_id == self.old.root() {
            AlterPolicy::InPlace
        } else if reordered {
            AlterPolicy::Recreate
        } else {
            alter_policy(old, new)
        };
        match policy {
            AlterPolicy::InPlace => {
                intents.creates.insert(
                    new_id,
                    Planned {
                        kind: ActionKind::Alter,
                        previous: Some(old_id),
                    },
                );
                if changes_column_type(old, new) {
                    intents.type_changes.insert(old_id);
                }
            }
            AlterPolicy::Recreate => {
                intents.drops.insert(old_id);
                intents.creates.insert(
                    new_id,
                    Planned {
                        kind: ActionKind::Create,
                        previous: Some(old_id),
                    },
                );
            }
        }
    }

    /// Extend the drops with everything that depends on them and return the
    /// set of old objects that disappear (drops plus their descendants).
    fn cascade(&self, intents: &mut Intents) -> PlanResult<BTreeSet<ObjectId>> {
        let mut closure = BTreeSet::new();
        let mut queue = VecDeque::new();
        for &dropped in &intents.drops {
            for id in std::iter::once(dropped).chain(self.old.descendants(dropped)) {
                if closure.insert(id) {
                    queue.push_back(id);
                }
            }
        }
        queue.extend(intents.type_changes.iter().copied());

        while let Some(source) = queue.pop_front() {
            self.cancel.check()?;
            let type_change_only = !closure.contains(&source);
            for dependent in self.old_graph.dependents(source) {
                if closure.contains(&dependent) {
                    continue;
                }
                let kind = self.old.get(dependent).kind;
                if type_change_only && !matches!(kind, ObjectKind::View | ObjectKind::Function) {
                    continue;
                }
                log::debug!(
                    "Dropping {} {} because it depends on {}",
                    kind,
                    self.old.qualified_name(dependent),
                    self.old.qualified_name(source)
                );
                intents.drops.insert(dependent);
                for id in std::iter::once(dependent).chain(self.old.descendants(dependent)) {
                    if closure.insert(id) {
                        queue.push_back(id);
                    }
                }
            }
        }
        Ok(closure)
    }

    /// Make sure every vanished object that still exists in the new
    /// snapshot is created again.
    fn refresh(&self, closure: &BTreeSet<ObjectId>, intents: &mut Intents) {
        for &old_id in closure {
            let object = self.old.get(old_id);
            let Some(new_id) = self.new.find(object.kind, object.qualified_name()) else {
                continue;
            };
            match intents.creates.get_mut(&new_id) {
                Some(planned) if planned.kind == ActionKind::Alter => {
                    planned.kind = ActionKind::Create;
                    planned.previous = Some(old_id);
                }
                Some(_) => {}
                None => {
                    intents.creates.insert(
                        new_id,
                        Planned {
                            kind: ActionKind::Refresh,
                            previous: Some(old_id),
                        },
                    );
                }
            }
        }
    }

    // ── Units ───────────────────────────────────────────────────────────

    fn drop_units(&self, intents: &Intents) -> Vec<Unit> {
        intents
            .drops
            .iter()
            .copied()
            .filter(|&d| !self.old.ancestors(d).iter().any(|a| intents.drops.contains(a)))
            .map(|d| {
                let mut unit = Unit::new(ActionKind::Drop, d, None);
                unit.owns.extend(self.old.descendants(d));
                unit.carries = unit.owns.clone();
                unit
            })
            .collect()
    }

    fn create_units(&self, intents: &Intents) -> Vec<Unit> {
        let whole = |id: ObjectId| {
            intents
                .creates
                .get(&id)
                .is_some_and(|p| matches!(p.kind, ActionKind::Create | ActionKind::Refresh))
        };
        intents
            .creates
            .iter()
            .filter(|(&id, _)| {
                let object = self.new.get(id);
                // Columns and constraints travel inside their table's CREATE
                !(object.kind.is_inline() && object.parent().is_some_and(whole))
            })
            .map(|(&id, planned)| {
                let mut unit = Unit::new(planned.kind, id, planned.previous);
                if whole(id) {
                    unit.owns.extend(self.inline_children(id));
                    unit.carries = unit.owns.clone();
                }
                unit
            })
            .collect()
    }

    fn inline_children(&self, id: ObjectId) -> Vec<ObjectId> {
        self.new
            .children(id)
            .iter()
            .copied()
            .filter(|&c| self.new.get(c).kind.is_inline())
            .collect()
    }

    // ── Ordering ────────────────────────────────────────────────────────

    fn snapshot(&self, phase: Phase) -> &Snapshot {
        match phase {
            Phase::Drop => self.old,
            Phase::Create => self.new,
        }
    }

    fn graph(&self, phase: Phase) -> &DependencyGraph {
        match phase {
            Phase::Drop => self.old_graph,
            Phase::Create => self.new_graph,
        }
    }

    fn key(&self, unit: &Unit, phase: Phase) -> UnitKey {
        let object = self.snapshot(phase).get(unit.target);
        let part = match unit.part {
            ActionPart::Stub => 0,
            ActionPart::Skeleton { .. } => 1,
            ActionPart::Whole => 2,
            ActionPart::Completion => 3,
        };
        let rank = match phase {
            Phase::Drop => u8::MAX - object.kind.rank(),
            Phase::Create => object.kind.rank(),
        };
        (rank, object.qualified_name().to_string(), part)
    }

    /// Order the non-completion units of a phase, splitting cycles as needed.
    fn sequence(&self, units: &mut Vec<Unit>, phase: Phase) -> PlanResult<Vec<usize>> {
        loop {
            self.cancel.check()?;
            let active: Vec<usize> = (0..units.len()).filter(|&i| !units[i].completion).collect();
            let edges = self.edges(units, &active, phase);
            let (order, remaining) = self.kahn(units, &active, &edges, phase);
            if remaining.is_empty() {
                return Ok(order);
            }
            let cycle = self.first_cycle(units, &remaining, &edges, phase);
            let split = cycle.iter().any(|&u| self.split(units, u, &cycle, phase));
            if !split {
                let snapshot = self.snapshot(phase);
                let mut objects: Vec<String> = cycle
                    .iter()
                    .map(|&u| snapshot.qualified_name(units[u].target).to_string())
                    .collect();
                objects.sort();
                objects.dedup();
                log::debug!("Unbreakable cycle: {}", objects.join(", "));
                return Err(PlanError::OrderingConflict { objects });
            }
        }
    }

    /// `(before, after)` pairs between active units.
    fn edges(&self, units: &[Unit], active: &[usize], phase: Phase) -> BTreeSet<(usize, usize)> {
        let mut owner: HashMap<ObjectId, usize> = HashMap::new();
        for &u in active {
            for &id in &units[u].owns {
                owner.insert(id, u);
            }
        }
        let graph = self.graph(phase);
        let mut edges = BTreeSet::new();
        for &u in active {
            let unit = &units[u];
            let deps = unit
                .carries
                .iter()
                .flat_map(|&c| graph.dependencies(c))
                .chain(unit.extra.iter().copied());
            for dep in deps {
                match owner.get(&dep) {
                    Some(&v) if v != u => {
                        edges.insert(match phase {
                            Phase::Drop => (u, v),
                            Phase::Create => (v, u),
                        });
                    }
                    _ => {}
                }
            }
            for &a in &unit.after {
                edges.insert((a, u));
            }
        }
        edges
    }

    /// Kahn's algorithm with a canonical tie-break. Returns the order and
    /// the units that could not be placed.
    fn kahn(
        &self,
        units: &[Unit],
        active: &[usize],
        edges: &BTreeSet<(usize, usize)>,
        phase: Phase,
    ) -> (Vec<usize>, Vec<usize>) {
        let mut indegree: BTreeMap<usize, usize> = active.iter().map(|&u| (u, 0)).collect();
        let mut successors: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for &(before, after) in edges {
            *indegree.entry(after).or_default() += 1;
            successors.entry(before).or_default().push(after);
        }

        let mut ready: BTreeSet<(UnitKey, usize)> = indegree
            .iter()
            .filter(|(_, &d)| d == 0)
            .map(|(&u, _)| (self.key(&units[u], phase), u))
            .collect();
        let mut order = Vec::with_capacity(active.len());
        while let Some(entry) = ready.pop_first() {
            let u = entry.1;
            order.push(u);
            for &next in successors.get(&u).map(Vec::as_slice).unwrap_or_default() {
                if let Some(d) = indegree.get_mut(&next) {
                    *d -= 1;
                    if *d == 0 {
                        ready.insert((self.key(&units[next], phase), next));
                    }
                }
            }
        }

        let placed: BTreeSet<usize> = order.iter().copied().collect();
        let remaining = active.iter().copied().filter(|u| !placed.contains(u)).collect();
        (order, remaining)
    }

    /// Members of the canonically first multi-unit cycle among `remaining`,
    /// in canonical order.
    fn first_cycle(
        &self,
        units: &[Unit],
        remaining: &[usize],
        edges: &BTreeSet<(usize, usize)>,
        phase: Phase,
    ) -> Vec<usize> {
        let mut graph: DiGraph<usize, ()> = DiGraph::new();
        let nodes: BTreeMap<usize, NodeIndex> =
            remaining.iter().map(|&u| (u, graph.add_node(u))).collect();
        for (before, after) in edges {
            if let (Some(&a), Some(&b)) = (nodes.get(before), nodes.get(after)) {
                graph.add_edge(a, b, ());
            }
        }

        let by_key = |members: &mut Vec<usize>| {
            members.sort_by_cached_key(|&u| self.key(&units[u], phase));
        };
        let mut cycles: Vec<Vec<usize>> = tarjan_scc(&graph)
            .into_iter()
            .filter(|scc| scc.len() > 1)
            .map(|scc| {
                let mut members: Vec<usize> = scc.into_iter().map(|n| graph[n]).collect();
                by_key(&mut members);
                members
            })
            .collect();
        cycles.sort_by_cached_key(|members| self.key(&units[members[0]], phase));
        cycles.into_iter().next().unwrap_or_else(|| {
            let mut all = remaining.to_vec();
            by_key(&mut all);
            all
        })
    }

    fn split(&self, units: &mut Vec<Unit>, u: usize, cycle: &[usize], phase: Phase) -> bool {
        match phase {
            Phase::Create => self.split_create(units, u, cycle),
            Phase::Drop => self.split_drop(units, u, cycle),
        }
    }

    /// Foreign keys owned by unit `u` whose references lead into another
    /// unit of `cycle`.
    fn cyclic_foreign_keys(&self, units: &[Unit], u: usize, cycle: &[usize], phase: Phase) -> Vec<ObjectId> {
        let snapshot = self.snapshot(phase);
        let graph = self.graph(phase);
        let others: BTreeSet<ObjectId> = cycle
            .iter()
            .filter(|&&v| v != u)
            .flat_map(|&v| units[v].owns.iter().copied())
            .collect();
        units[u]
            .owns
            .iter()
            .copied()
            .filter(|&id| id != units[u].target)
            .filter(|&id| {
                snapshot
                    .get(id)
                    .constraint()
                    .is_some_and(ConstraintDef::is_foreign_key)
            })
            .filter(|&id| graph.dependencies(id).iter().any(|d| others.contains(d)))
            .collect()
    }

    fn split_create(&self, units: &mut Vec<Unit>, u: usize, cycle: &[usize]) -> bool {
        let object = self.new.get(units[u].target);
        match object.kind {
            ObjectKind::Table
                if matches!(units[u].kind, ActionKind::Create | ActionKind::Refresh)
                    && !units[u].completion =>
            {
                let table = units[u].target;
                let deferrable: Vec<ObjectId> = self
                    .cyclic_foreign_keys(units, u, cycle, Phase::Create)
                    .into_iter()
                    .filter(|&fk| self.columns_nullable(table, fk))
                    .collect();
                if deferrable.is_empty() {
                    return false;
                }
                let mut deferred = match &units[u].part {
                    ActionPart::Skeleton { deferred } => deferred.clone(),
                    _ => Vec::new(),
                };
                for &fk in &deferrable {
                    log::debug!(
                        "Deferring foreign key {} to break a cycle",
                        self.new.qualified_name(fk)
                    );
                    units[u].owns.remove(&fk);
                    units[u].carries.remove(&fk);
                    deferred.push(fk);
                    let previous = self.old_counterpart(fk);
                    let mut completion = Unit::new(units[u].kind, fk, previous);
                    completion.part = ActionPart::Completion;
                    completion.completion = true;
                    units.push(completion);
                }
                deferred.sort();
                units[u].part = ActionPart::Skeleton { deferred };
                true
            }
            ObjectKind::Constraint
                if units[u].part == ActionPart::Whole
                    && object.constraint().is_some_and(ConstraintDef::is_foreign_key) =>
            {
                // Added to a surviving table: it can simply run last
                units[u].part = ActionPart::Completion;
                units[u].completion = true;
                true
            }
            ObjectKind::View | ObjectKind::Function
                if units[u].part == ActionPart::Whole
                    && units[u].carries.contains(&units[u].target)
                    && stubbable(self.new, units[u].target) =>
            {
                let target = units[u].target;
                log::debug!(
                    "Stubbing {} {} to break a cycle",
                    object.kind,
                    self.new.qualified_name(target)
                );
                let mut completion = Unit::new(units[u].kind, target, units[u].previous);
                completion.part = ActionPart::Completion;
                completion.owns.clear();
                completion.completion = true;

                let stub = &mut units[u];
                stub.part = ActionPart::Stub;
                stub.carries.remove(&target);
                stub.extra = object
                    .parent()
                    .filter(|&p| p != self.new.root())
                    .into_iter()
                    .collect();
                units.push(completion);
                true
            }
            _ => false,
        }
    }

    fn split_drop(&self, units: &mut Vec<Unit>, u: usize, cycle: &[usize]) -> bool {
        let object = self.old.get(units[u].target);
        match object.kind {
            ObjectKind::Table => {
                let fks = self.cyclic_foreign_keys(units, u, cycle, Phase::Drop);
                if fks.is_empty() {
                    return false;
                }
                for fk in fks {
                    log::debug!(
                        "Dropping foreign key {} first to break a cycle",
                        self.old.qualified_name(fk)
                    );
                    units[u].owns.remove(&fk);
                    units[u].carries.remove(&fk);
                    units.push(Unit::new(ActionKind::Drop, fk, None));
                }
                true
            }
            ObjectKind::View | ObjectKind::Function
                if units[u].part == ActionPart::Whole
                    && units[u].carries.contains(&units[u].target)
                    && stubbable(self.old, units[u].target) =>
            {
                let target = units[u].target;
                let mut stub = Unit::new(ActionKind::Drop, target, None);
                stub.part = ActionPart::Stub;
                stub.owns.clear();
                let stub_index = units.len();
                units[u].carries.remove(&target);
                units[u].after.push(stub_index);
                units.push(stub);
                true
            }
            _ => false,
        }
    }

    /// True when every local column of a foreign key accepts NULL.
    fn columns_nullable(&self, table: ObjectId, fk: ObjectId) -> bool {
        let Some(def) = self.new.get(fk).constraint() else {
            return false;
        };
        def.columns().iter().all(|column| {
            self.new
                .child(table, ObjectKind::Column, column)
                .and_then(|c| self.new.get(c).column())
                .is_some_and(|c| c.nullable)
        })
    }

    fn old_counterpart(&self, new_id: ObjectId) -> Option<ObjectId> {
        let object = self.new.get(new_id);
        self.old.find(object.kind, object.qualified_name())
    }

    /// Completion units in canonical order.
    fn completions(&self, units: &[Unit]) -> Vec<usize> {
        let mut out: Vec<usize> = (0..units.len()).filter(|&i| units[i].completion).collect();
        out.sort_by_cached_key(|&i| self.key(&units[i], Phase::Create));
        out
    }

    // ── Diagnostics ─────────────────────────────────────────────────────

    fn diagnostics(&self, closure: &BTreeSet<ObjectId>, create_units: &[Unit]) -> Vec<PlanDiagnostic> {
        let created: BTreeSet<ObjectId> = create_units
            .iter()
            .flat_map(|u| u.owns.iter().chain(u.carries.iter()).copied())
            .collect();
        let mut out = BTreeSet::new();
        for unresolved in self.new_graph.unresolved() {
            if created.contains(&unresolved.object) && self.old.resolve(&unresolved.reference).is_none() {
                out.insert(PlanDiagnostic::MissingReference {
                    object: self.new.qualified_name(unresolved.object).to_string(),
                    reference: unresolved.reference.clone(),
                });
            }
        }
        for unresolved in self.old_graph.unresolved() {
            if closure.contains(&unresolved.object) && self.new.resolve(&unresolved.reference).is_none() {
                out.insert(PlanDiagnostic::MissingReference {
                    object: self.old.qualified_name(unresolved.object).to_string(),
                    reference: unresolved.reference.clone(),
                });
            }
        }
        out.into_iter().collect()
    }
}

/// A view stub is replaced in place later, so it needs the real column types.
fn stubbable(snapshot: &Snapshot, id: ObjectId) -> bool {
    match &snapshot.get(id).body {
        ObjectBody::View(def) => def.typed_columns().is_some(),
        _ => true,
    }
}

#[cfg(test)]
#[path = "planner_test.rs"]
mod tests;
