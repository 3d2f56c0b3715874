use super::*;
use crate::object::ConstraintDef;

const SAMPLE: &str = r#"
name: appdb
objects:
  - kind: schema
    name: public
    owner: admin
    children:
      - kind: table
        name: orders
        privileges:
          - { grantee: app, privilege: SELECT }
        children:
          - kind: column
            name: id
            body: { column: { data_type: int, nullable: false } }
          - kind: column
            name: note
            body: { column: { data_type: text } }
          - kind: constraint
            name: orders_pkey
            body: { constraint: { type: primary_key, columns: [id] } }
      - kind: view
        name: recent_orders
        body: { view: { query: "SELECT * FROM public.orders" } }
        references:
          - { schema: public, name: orders, kind: table }
"#;

#[test]
fn test_load_nested_yaml() {
    let snap = Snapshot::from_yaml_str(SAMPLE).unwrap();
    assert_eq!(snap.get(snap.root()).name, "appdb");
    assert_eq!(snap.len(), 7);

    let orders = snap.find(ObjectKind::Table, "public.orders").unwrap();
    assert_eq!(snap.get(orders).privileges.len(), 1);
    let note = snap.find(ObjectKind::Column, "public.orders.note").unwrap();
    assert!(snap.get(note).column().unwrap().nullable);

    let pkey = snap
        .find(ObjectKind::Constraint, "public.orders.orders_pkey")
        .unwrap();
    assert_eq!(
        snap.get(pkey).constraint(),
        Some(&ConstraintDef::PrimaryKey {
            columns: vec!["id".to_string()]
        })
    );

    let view = snap.find(ObjectKind::View, "public.recent_orders").unwrap();
    assert_eq!(snap.get(view).references[0].qualified(), "public.orders");
}

#[test]
fn test_load_json() {
    let json = r#"{
        "name": "db",
        "objects": [
            { "kind": "schema", "name": "s", "children": [
                { "kind": "function", "name": "f(int)",
                  "body": { "function": { "returns": "int", "body": "SELECT 1" } } }
            ] }
        ]
    }"#;
    let snap = Snapshot::from_json_str(json).unwrap();
    let f = snap.find(ObjectKind::Function, "s.f(int)").unwrap();
    assert_eq!(snap.get(f).function().unwrap().language, "sql");
}

#[test]
fn test_bodies_survive_yaml_round_trip() {
    let yaml = r#"
name: db
objects:
  - kind: schema
    name: s
    children:
      - kind: table
        name: t
        body: { table: { unlogged: true } }
        children:
          - { kind: column, name: c, body: { column: { data_type: bigint, nullable: false } } }
      - kind: view
        name: v
        body: { view: { query: "SELECT c FROM t", columns: [c] } }
"#;
    let file: SnapshotFile = serde_yaml::from_str(yaml).unwrap();
    let written = serde_yaml::to_string(&file).unwrap();
    assert!(written.contains("table:"), "{}", written);

    let snap = Snapshot::from_yaml_str(&written).unwrap();
    let table = snap.find(ObjectKind::Table, "s.t").unwrap();
    assert!(matches!(&snap.get(table).body, ObjectBody::Table(def) if def.unlogged));
    let schema = snap.find(ObjectKind::Schema, "s").unwrap();
    assert_eq!(snap.get(schema).body, ObjectBody::None);

    let column = snap.find(ObjectKind::Column, "s.t.c").unwrap();
    let column = snap.get(column).column().unwrap();
    assert_eq!(column.data_type, "bigint");
    assert!(!column.nullable);

    let view = snap.find(ObjectKind::View, "s.v").unwrap();
    let view = snap.get(view).view().unwrap();
    assert_eq!(view.query, "SELECT c FROM t");
    assert_eq!(view.columns, vec!["c".to_string()]);
}

#[test]
fn test_unknown_kind_rejected() {
    let yaml = "name: db\nobjects:\n  - { kind: widget, name: w }\n";
    assert!(matches!(
        Snapshot::from_yaml_str(yaml).unwrap_err(),
        CoreError::YamlParse(_)
    ));
}

#[test]
fn test_nested_database_rejected() {
    let yaml = "name: db\nobjects:\n  - { kind: database, name: other }\n";
    assert!(matches!(
        Snapshot::from_yaml_str(yaml).unwrap_err(),
        CoreError::InvalidSnapshot { .. }
    ));
}

#[test]
fn test_load_from_path_by_extension() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("old.yml");
    std::fs::write(&path, SAMPLE).unwrap();
    let snap = Snapshot::load(&path).unwrap();
    assert!(snap.find(ObjectKind::Schema, "public").is_some());

    let missing = Snapshot::load(&dir.path().join("nope.json")).unwrap_err();
    assert!(matches!(missing, CoreError::IoWithPath { .. }));
}

#[test]
fn test_same_file_same_fingerprints() {
    let a = Snapshot::from_yaml_str(SAMPLE).unwrap();
    let b = Snapshot::from_yaml_str(SAMPLE).unwrap();
    assert_eq!(a.fingerprint(a.root()), b.fingerprint(b.root()));
}
