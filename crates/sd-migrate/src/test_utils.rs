//! Shared test utilities for sd-migrate

use crate::emitter::GenericEmitter;
use crate::error::PlanResult;
use crate::planner::Planner;
use crate::render::{render, EmitContext, Script};
use crate::MigrationPlan;
use sd_core::{
    build_diff_tree, CancelFlag, ChainedAnalyzer, ColumnDef, ConstraintDef, DeclaredReferences,
    DependencyGraph, DiffNode, DiffOptions, FunctionDef, ObjectBody, ObjectId, ObjectKind,
    Reference, SchemaObject, Selection, Snapshot, SnapshotBuilder, StructuralReferences, TableDef,
    ViewDef,
};

/// Snapshot builder with one `public` schema, for terse fixtures.
pub struct Fixture {
    pub builder: SnapshotBuilder,
    pub schema: ObjectId,
}

impl Fixture {
    pub fn new() -> Self {
        let mut builder = SnapshotBuilder::new("db");
        let root = builder.root();
        let schema = builder.add(root, SchemaObject::new(ObjectKind::Schema, "public"));
        Self { builder, schema }
    }

    /// Table with `(name, type, nullable)` columns.
    pub fn table(&mut self, name: &str, columns: &[(&str, &str, bool)]) -> ObjectId {
        let table = self.builder.add(
            self.schema,
            SchemaObject::new(ObjectKind::Table, name).with_body(ObjectBody::Table(TableDef::default())),
        );
        for &(column, data_type, nullable) in columns {
            let mut def = ColumnDef::new(data_type);
            def.nullable = nullable;
            self.column(table, column, def);
        }
        table
    }

    pub fn column(&mut self, table: ObjectId, name: &str, def: ColumnDef) -> ObjectId {
        self.builder.add(
            table,
            SchemaObject::new(ObjectKind::Column, name).with_body(ObjectBody::Column(def)),
        )
    }

    pub fn primary_key(&mut self, table: ObjectId, name: &str, columns: &[&str]) -> ObjectId {
        self.builder.add(
            table,
            SchemaObject::new(ObjectKind::Constraint, name).with_body(ObjectBody::Constraint(
                ConstraintDef::PrimaryKey {
                    columns: columns.iter().map(|c| c.to_string()).collect(),
                },
            )),
        )
    }

    /// Foreign key from `table.column` to `target(id)` in the same schema.
    pub fn foreign_key(&mut self, table: ObjectId, name: &str, column: &str, target: &str) -> ObjectId {
        self.builder.add(
            table,
            SchemaObject::new(ObjectKind::Constraint, name).with_body(ObjectBody::Constraint(
                ConstraintDef::ForeignKey {
                    columns: vec![column.to_string()],
                    references_schema: None,
                    references_table: target.to_string(),
                    references_columns: vec!["id".to_string()],
                    on_delete: None,
                    on_update: None,
                },
            )),
        )
    }

    /// View over the listed tables and views of the `public` schema.
    pub fn view(&mut self, name: &str, query: &str, uses: &[(ObjectKind, &str)]) -> ObjectId {
        let mut object = SchemaObject::new(ObjectKind::View, name).with_body(ObjectBody::View(ViewDef {
            query: query.to_string(),
            columns: vec!["id".to_string()],
            column_types: vec!["int".to_string()],
            materialized: false,
        }));
        for &(kind, used) in uses {
            object = object.with_reference(Reference::new(Some("public"), used, kind));
        }
        self.builder.add(self.schema, object)
    }

    /// Argument-less SQL function returning `returns`.
    pub fn function(&mut self, name: &str, returns: &str, body: &str, uses: &[(ObjectKind, &str)]) -> ObjectId {
        let mut object = SchemaObject::new(ObjectKind::Function, format!("{}()", name)).with_body(
            ObjectBody::Function(FunctionDef {
                arguments: Vec::new(),
                returns: returns.to_string(),
                language: "sql".to_string(),
                body: body.to_string(),
                volatility: None,
            }),
        );
        for &(kind, used) in uses {
            object = object.with_reference(Reference::new(Some("public"), used, kind));
        }
        self.builder.add(self.schema, object)
    }

    pub fn add(&mut self, parent: ObjectId, object: SchemaObject) -> ObjectId {
        self.builder.add(parent, object)
    }

    pub fn build(self) -> Snapshot {
        self.builder.build().unwrap()
    }
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Declared plus structural references, as the CLI wires them without SQL parsing.
pub fn analyzer() -> ChainedAnalyzer {
    ChainedAnalyzer::new()
        .with(DeclaredReferences)
        .with(StructuralReferences)
}

pub fn graph(snapshot: &Snapshot) -> DependencyGraph {
    DependencyGraph::build(snapshot, &analyzer(), &CancelFlag::new()).unwrap()
}

pub fn tree(old: &Snapshot, new: &Snapshot) -> DiffNode {
    build_diff_tree(old, new, &DiffOptions::default(), &CancelFlag::new()).unwrap()
}

/// Plan every changed node of the diff between `old` and `new`.
pub fn plan_all(old: &Snapshot, new: &Snapshot) -> PlanResult<MigrationPlan> {
    let tree = tree(old, new);
    plan_selected(old, new, &tree, &Selection::all_changed(&tree))
}

pub fn plan_selected(
    old: &Snapshot,
    new: &Snapshot,
    tree: &DiffNode,
    selection: &Selection,
) -> PlanResult<MigrationPlan> {
    let (old_graph, new_graph) = (graph(old), graph(new));
    let cancel = CancelFlag::new();
    Planner::new(old, new, &old_graph, &new_graph, DiffOptions::default(), &cancel).plan(tree, selection)
}

/// Render with the generic emitter.
pub fn script(old: &Snapshot, new: &Snapshot, plan: &MigrationPlan) -> Script {
    render(plan, &GenericEmitter, &EmitContext { old, new })
}

/// `describe()` of every action, in plan order.
pub fn describe(old: &Snapshot, new: &Snapshot, plan: &MigrationPlan) -> Vec<String> {
    plan.actions.iter().map(|a| a.describe(old, new)).collect()
}

/// Plan position of the first action whose description equals `text`.
pub fn position(descriptions: &[String], text: &str) -> usize {
    descriptions
        .iter()
        .position(|d| d == text)
        .unwrap_or_else(|| panic!("no action '{}' in {:#?}", text, descriptions))
}
