//! Dependency graphs built from SQL definitions

use sd_core::{
    CancelFlag, ChainedAnalyzer, DeclaredReferences, DependencyGraph, Dialect, NamePattern,
    ObjectKind, Snapshot, StructuralReferences,
};
use sd_sql::SqlReferenceAnalyzer;

const SNAPSHOT: &str = r#"
name: shop
objects:
  - kind: schema
    name: public
    children:
      - kind: table
        name: orders
        body: { table: {} }
        children:
          - kind: column
            name: id
            body: { column: { data_type: bigint, nullable: false } }
          - kind: column
            name: customer_id
            body: { column: { data_type: bigint } }
      - kind: view
        name: order_ids
        body: { view: { query: "SELECT id FROM orders", columns: [id] } }
      - kind: view
        name: recent_orders
        body: { view: { query: "WITH o AS (SELECT * FROM order_ids) SELECT * FROM o", columns: [id] } }
      - kind: function
        name: order_count()
        body: { function: { returns: bigint, body: "SELECT count(*) FROM recent_orders" } }
"#;

fn graph(snapshot: &Snapshot) -> DependencyGraph {
    let analyzer = ChainedAnalyzer::new()
        .with(DeclaredReferences)
        .with(StructuralReferences)
        .with(SqlReferenceAnalyzer::new(Dialect::Postgres));
    DependencyGraph::build(snapshot, &analyzer, &CancelFlag::new()).unwrap()
}

// ── Edges ───────────────────────────────────────────────────────────────

#[test]
fn test_views_and_functions_depend_on_what_they_read() {
    let snapshot = Snapshot::from_yaml_str(SNAPSHOT).unwrap();
    let graph = graph(&snapshot);

    let id = |kind, name| snapshot.find(kind, name).unwrap();
    let orders = id(ObjectKind::Table, "public.orders");
    let order_ids = id(ObjectKind::View, "public.order_ids");
    let recent = id(ObjectKind::View, "public.recent_orders");
    let count = id(ObjectKind::Function, "public.order_count()");

    assert!(graph.contains_edge(order_ids, orders));
    assert!(graph.contains_edge(order_ids, id(ObjectKind::Column, "public.orders.id")));
    assert!(!graph.contains_edge(order_ids, id(ObjectKind::Column, "public.orders.customer_id")));
    assert!(graph.contains_edge(recent, order_ids));
    assert!(graph.contains_edge(count, recent));
    assert!(!graph.has_cycle());
    assert!(graph.unresolved().is_empty());
}

// ── Dependents ──────────────────────────────────────────────────────────

#[test]
fn test_dependents_of_table_reach_function() {
    let snapshot = Snapshot::from_yaml_str(SNAPSHOT).unwrap();
    let graph = graph(&snapshot);
    let found = graph
        .find_dependents(
            &snapshot,
            &[NamePattern::literal("public.orders")],
            10,
            false,
            &CancelFlag::new(),
        )
        .unwrap();

    let names: Vec<(&str, usize)> = found
        .iter()
        .map(|m| (snapshot.qualified_name(m.id), m.depth))
        .collect();
    assert!(names.contains(&("public.orders", 0)));
    assert!(names.contains(&("public.order_ids", 1)));
    assert!(names.contains(&("public.recent_orders", 2)));
    assert!(names.contains(&("public.order_count()", 3)));
}
