use super::*;
use sd_core::{ColumnDef, FunctionDef, SchemaObject, SequenceDef, SnapshotBuilder, TableDef, ViewDef};

fn view(name: &str, query: &str) -> SchemaObject {
    SchemaObject::new(ObjectKind::View, name).with_body(ObjectBody::View(ViewDef {
        query: query.to_string(),
        columns: Vec::new(),
        column_types: Vec::new(),
        materialized: false,
    }))
}

fn function(name: &str, language: &str, body: &str) -> SchemaObject {
    SchemaObject::new(ObjectKind::Function, name).with_body(ObjectBody::Function(FunctionDef {
        arguments: Vec::new(),
        returns: "bigint".to_string(),
        language: language.to_string(),
        body: body.to_string(),
        volatility: None,
    }))
}

fn fixture() -> Snapshot {
    let mut b = SnapshotBuilder::new("db");
    let root = b.root();
    let public = b.add(root, SchemaObject::new(ObjectKind::Schema, "public"));
    let audit = b.add(root, SchemaObject::new(ObjectKind::Schema, "audit"));
    b.add(
        public,
        SchemaObject::new(ObjectKind::Sequence, "order_seq").with_body(ObjectBody::Sequence(SequenceDef::default())),
    );
    let orders = b.add(
        public,
        SchemaObject::new(ObjectKind::Table, "orders").with_body(ObjectBody::Table(TableDef::default())),
    );
    b.add(
        orders,
        SchemaObject::new(ObjectKind::Column, "id").with_body(ObjectBody::Column(
            ColumnDef::new("bigint").not_null().with_default("nextval('public.order_seq'::regclass)"),
        )),
    );
    b.add(
        orders,
        SchemaObject::new(ObjectKind::Constraint, "positive_id").with_body(ObjectBody::Constraint(
            ConstraintDef::Check {
                expression: "id > 0 AND total() >= 0".to_string(),
            },
        )),
    );
    b.add(audit, SchemaObject::new(ObjectKind::Table, "events").with_body(ObjectBody::Table(TableDef::default())));
    b.add(public, view("recent", "SELECT o.id FROM orders o JOIN missing m ON o.id = m.id"));
    b.add(public, view("latest", "WITH r AS (SELECT * FROM recent) SELECT * FROM r, audit.events"));
    b.add(public, view("broken", "SELECT * FROM ("));
    b.add(public, function("total()", "sql", "SELECT count(*) FROM orders"));
    b.add(public, function("touch()", "plpgsql", "BEGIN PERFORM 1; END"));
    b.build().unwrap()
}

fn refs(snapshot: &Snapshot, kind: ObjectKind, name: &str) -> Vec<String> {
    let id = snapshot.find(kind, name).unwrap();
    SqlReferenceAnalyzer::default()
        .references(snapshot, id)
        .iter()
        .map(Reference::to_string)
        .collect()
}

#[test]
fn test_view_relations_keep_unresolved_tables() {
    let snapshot = fixture();
    assert_eq!(
        refs(&snapshot, ObjectKind::View, "public.recent"),
        vec!["TABLE public.missing", "TABLE public.orders", "COLUMN public.orders.id"]
    );
}

#[test]
fn test_view_over_view_and_other_schema() {
    let snapshot = fixture();
    assert_eq!(
        refs(&snapshot, ObjectKind::View, "public.latest"),
        vec!["TABLE audit.events", "VIEW public.recent"]
    );
}

#[test]
fn test_sql_function_body_skips_builtins() {
    let snapshot = fixture();
    assert_eq!(
        refs(&snapshot, ObjectKind::Function, "public.total()"),
        vec!["TABLE public.orders"]
    );
}

#[test]
fn test_non_sql_function_is_skipped() {
    let snapshot = fixture();
    assert!(refs(&snapshot, ObjectKind::Function, "public.touch()").is_empty());
}

#[test]
fn test_unparseable_view_yields_nothing() {
    let snapshot = fixture();
    assert!(refs(&snapshot, ObjectKind::View, "public.broken").is_empty());
}

#[test]
fn test_column_default_names_sequence() {
    let snapshot = fixture();
    assert_eq!(
        refs(&snapshot, ObjectKind::Column, "public.orders.id"),
        vec!["SEQUENCE public.order_seq"]
    );
}

#[test]
fn test_check_expression_calls_user_function() {
    let snapshot = fixture();
    assert_eq!(
        refs(&snapshot, ObjectKind::Constraint, "public.orders.positive_id"),
        vec!["FUNCTION public.total"]
    );
}

fn two_tables(views: &[(&str, &str)]) -> Snapshot {
    let mut b = SnapshotBuilder::new("db");
    let root = b.root();
    let public = b.add(root, SchemaObject::new(ObjectKind::Schema, "public"));
    for (table, columns) in [("orders", ["id", "total"]), ("customers", ["id", "name"])] {
        let table = b.add(
            public,
            SchemaObject::new(ObjectKind::Table, table).with_body(ObjectBody::Table(TableDef::default())),
        );
        for column in columns {
            b.add(
                table,
                SchemaObject::new(ObjectKind::Column, column)
                    .with_body(ObjectBody::Column(ColumnDef::new("bigint"))),
            );
        }
    }
    for &(name, query) in views {
        b.add(public, view(name, query));
    }
    b.build().unwrap()
}

#[test]
fn test_view_reads_columns_through_aliases() {
    let snapshot = two_tables(&[("v", "SELECT o.total FROM orders o JOIN customers c ON o.id = c.id")]);
    assert_eq!(
        refs(&snapshot, ObjectKind::View, "public.v"),
        vec![
            "TABLE public.customers",
            "TABLE public.orders",
            "COLUMN public.customers.id",
            "COLUMN public.orders.id",
            "COLUMN public.orders.total",
        ]
    );
}

#[test]
fn test_table_qualifier_picks_one_table() {
    let snapshot = two_tables(&[("v", "SELECT customers.id FROM customers, orders")]);
    assert_eq!(
        refs(&snapshot, ObjectKind::View, "public.v"),
        vec!["TABLE public.customers", "TABLE public.orders", "COLUMN public.customers.id"]
    );
}

#[test]
fn test_wildcard_reads_every_column() {
    let snapshot = two_tables(&[("v", "SELECT * FROM orders")]);
    assert_eq!(
        refs(&snapshot, ObjectKind::View, "public.v"),
        vec!["TABLE public.orders", "COLUMN public.orders.id", "COLUMN public.orders.total"]
    );
}

#[test]
fn test_references_carry_positions() {
    let snapshot = fixture();
    let id = snapshot.find(ObjectKind::View, "public.recent").unwrap();
    let references = SqlReferenceAnalyzer::default().references(&snapshot, id);
    assert!(references.iter().all(|r| r.location.is_some()));
}
