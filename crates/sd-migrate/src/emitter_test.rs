use super::*;
use crate::test_utils::Fixture;
use sd_core::{IndexDef, ViewDef};

fn action(kind: ActionKind, part: ActionPart, target: ObjectId, previous: Option<ObjectId>) -> Action {
    Action {
        kind,
        part,
        target,
        previous,
        rank: 0,
    }
}

fn emit(old: &Snapshot, new: &Snapshot, action: &Action) -> Vec<String> {
    GenericEmitter.emit(action, &EmitContext { old, new })
}

#[test]
fn test_quote_ident() {
    assert_eq!(quote_ident("orders"), "orders");
    assert_eq!(quote_ident("_tmp1"), "_tmp1");
    assert_eq!(quote_ident("Orders"), "\"Orders\"");
    assert_eq!(quote_ident("order items"), "\"order items\"");
    assert_eq!(quote_ident("a\"b"), "\"a\"\"b\"");
    assert_eq!(quote_ident("1st"), "\"1st\"");
}

#[test]
fn test_create_table_with_inline_children() {
    let mut f = Fixture::new();
    let t = f.table("orders", &[("id", "int", false), ("note", "text", true)]);
    f.primary_key(t, "orders_pkey", &["id"]);
    let snapshot = f.build();
    let table = snapshot.find(ObjectKind::Table, "public.orders").unwrap();

    let sql = emit(&snapshot, &snapshot, &action(ActionKind::Create, ActionPart::Whole, table, None));
    assert_eq!(
        sql,
        vec![
            "CREATE TABLE public.orders (\n    id int NOT NULL,\n    note text,\n    CONSTRAINT orders_pkey PRIMARY KEY (id)\n);"
        ]
    );
}

#[test]
fn test_skeleton_omits_deferred_keys() {
    let mut f = Fixture::new();
    f.table("a", &[("id", "int", false)]);
    let b = f.table("b", &[("id", "int", false), ("a_id", "int", true)]);
    f.foreign_key(b, "b_a", "a_id", "a");
    let snapshot = f.build();
    let table = snapshot.find(ObjectKind::Table, "public.b").unwrap();
    let fk = snapshot.find(ObjectKind::Constraint, "public.b.b_a").unwrap();

    let skeleton = action(
        ActionKind::Create,
        ActionPart::Skeleton { deferred: vec![fk] },
        table,
        None,
    );
    let sql = emit(&snapshot, &snapshot, &skeleton);
    assert!(!sql[0].contains("FOREIGN KEY"));

    let completion = action(ActionKind::Create, ActionPart::Completion, fk, None);
    assert_eq!(
        emit(&snapshot, &snapshot, &completion),
        vec!["ALTER TABLE public.b ADD CONSTRAINT b_a FOREIGN KEY (a_id) REFERENCES public.a (id);"]
    );
}

#[test]
fn test_sub_object_drops_use_parent() {
    let mut f = Fixture::new();
    let t = f.table("t1", &[("id", "int", false), ("old", "text", true)]);
    f.add(
        t,
        SchemaObject::new(ObjectKind::Index, "t1_old_idx").with_body(ObjectBody::Index(IndexDef {
            columns: vec!["old".into()],
            unique: false,
            method: None,
            predicate: None,
        })),
    );
    let snapshot = f.build();
    let column = snapshot.find(ObjectKind::Column, "public.t1.old").unwrap();
    let index = snapshot.find(ObjectKind::Index, "public.t1.t1_old_idx").unwrap();

    assert_eq!(
        emit(&snapshot, &snapshot, &action(ActionKind::Drop, ActionPart::Whole, column, None)),
        vec!["ALTER TABLE public.t1 DROP COLUMN old;"]
    );
    assert_eq!(
        emit(&snapshot, &snapshot, &action(ActionKind::Drop, ActionPart::Whole, index, None)),
        vec!["DROP INDEX public.t1_old_idx;"]
    );
    assert_eq!(
        emit(&snapshot, &snapshot, &action(ActionKind::Create, ActionPart::Whole, index, None)),
        vec!["CREATE INDEX t1_old_idx ON public.t1 (old);"]
    );
}

#[test]
fn test_alter_column_statements() {
    let mut f = Fixture::new();
    f.table("t1", &[("amount", "int", true)]);
    let old = f.build();
    let mut f = Fixture::new();
    let t = f.table("t1", &[]);
    f.column(t, "amount", ColumnDef::new("numeric").not_null().with_default("0"));
    let new = f.build();

    let o = old.find(ObjectKind::Column, "public.t1.amount").unwrap();
    let n = new.find(ObjectKind::Column, "public.t1.amount").unwrap();
    assert_eq!(
        emit(&old, &new, &action(ActionKind::Alter, ActionPart::Whole, n, Some(o))),
        vec![
            "ALTER TABLE public.t1 ALTER COLUMN amount TYPE numeric;",
            "ALTER TABLE public.t1 ALTER COLUMN amount SET DEFAULT 0;",
            "ALTER TABLE public.t1 ALTER COLUMN amount SET NOT NULL;",
        ]
    );
}

#[test]
fn test_alter_metadata_and_grants() {
    let mut f = Fixture::new();
    f.add(
        f.schema,
        SchemaObject::new(ObjectKind::Sequence, "seq")
            .with_owner("app")
            .with_privilege(Privilege::new("reader", "SELECT"))
            .with_body(ObjectBody::Sequence(SequenceDef::default())),
    );
    let old = f.build();
    let mut f = Fixture::new();
    f.add(
        f.schema,
        SchemaObject::new(ObjectKind::Sequence, "seq")
            .with_owner("admin")
            .with_comment("it's ours")
            .with_privilege(Privilege::new("writer", "UPDATE"))
            .with_body(ObjectBody::Sequence(SequenceDef::default())),
    );
    let new = f.build();

    let o = old.find(ObjectKind::Sequence, "public.seq").unwrap();
    let n = new.find(ObjectKind::Sequence, "public.seq").unwrap();
    assert_eq!(
        emit(&old, &new, &action(ActionKind::Alter, ActionPart::Whole, n, Some(o))),
        vec![
            "ALTER SEQUENCE public.seq OWNER TO admin;",
            "COMMENT ON SEQUENCE public.seq IS 'it''s ours';",
            "REVOKE SELECT ON SEQUENCE public.seq FROM reader;",
            "GRANT UPDATE ON SEQUENCE public.seq TO writer;",
        ]
    );
}

#[test]
fn test_view_stub_and_completion() {
    let mut f = Fixture::new();
    f.add(
        f.schema,
        SchemaObject::new(ObjectKind::View, "v1").with_body(ObjectBody::View(ViewDef {
            query: "SELECT id, total FROM v2;".into(),
            columns: vec!["id".into(), "total".into()],
            column_types: vec!["bigint".into(), "numeric(10,2)".into()],
            materialized: false,
        })),
    );
    f.add(
        f.schema,
        SchemaObject::new(ObjectKind::View, "untyped").with_body(ObjectBody::View(ViewDef {
            query: "SELECT id FROM v1".into(),
            columns: vec!["id".into()],
            column_types: Vec::new(),
            materialized: false,
        })),
    );
    let snapshot = f.build();
    let view = snapshot.find(ObjectKind::View, "public.v1").unwrap();
    let untyped = snapshot.find(ObjectKind::View, "public.untyped").unwrap();

    assert_eq!(
        emit(&snapshot, &snapshot, &action(ActionKind::Create, ActionPart::Stub, view, None)),
        vec!["CREATE VIEW public.v1 AS SELECT NULL::bigint AS id, NULL::numeric(10,2) AS total;"]
    );
    assert_eq!(
        emit(&snapshot, &snapshot, &action(ActionKind::Drop, ActionPart::Stub, view, None)),
        vec!["CREATE OR REPLACE VIEW public.v1 AS SELECT NULL::bigint AS id, NULL::numeric(10,2) AS total;"]
    );
    assert_eq!(
        emit(&snapshot, &snapshot, &action(ActionKind::Create, ActionPart::Stub, untyped, None)),
        vec!["CREATE VIEW public.untyped AS SELECT NULL::text AS id;"]
    );
    assert_eq!(
        emit(&snapshot, &snapshot, &action(ActionKind::Create, ActionPart::Completion, view, None)),
        vec!["CREATE OR REPLACE VIEW public.v1 AS SELECT id, total FROM v2;"]
    );
}

#[test]
fn test_function_signature_strips_name_suffix() {
    let mut f = Fixture::new();
    f.function("answer", "int", "SELECT 42", &[]);
    let snapshot = f.build();
    let function = snapshot.find(ObjectKind::Function, "public.answer()").unwrap();

    assert_eq!(
        emit(&snapshot, &snapshot, &action(ActionKind::Create, ActionPart::Whole, function, None)),
        vec!["CREATE FUNCTION public.answer() RETURNS int LANGUAGE sql AS $$SELECT 42$$;"]
    );
    assert_eq!(
        emit(&snapshot, &snapshot, &action(ActionKind::Drop, ActionPart::Whole, function, None)),
        vec!["DROP FUNCTION public.answer();"]
    );
    assert_eq!(
        emit(&snapshot, &snapshot, &action(ActionKind::Create, ActionPart::Stub, function, None)),
        vec!["CREATE FUNCTION public.answer() RETURNS int LANGUAGE sql AS $$SELECT NULL::int$$;"]
    );
}
