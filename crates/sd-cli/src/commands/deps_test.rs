use super::*;
use sd_core::Dialect;

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
          - { kind: column, name: id, body: { column: { data_type: bigint } } }
      - kind: view
        name: recent
        body: { view: { query: "SELECT id FROM orders", columns: [id] } }
"#;

fn found(patterns: &[NamePattern], reverse: bool) -> (Snapshot, Vec<DependentMatch>) {
    let snapshot = Snapshot::from_yaml_str(SNAPSHOT).unwrap();
    let cancel = CancelFlag::new();
    let graph = build_graph(&snapshot, &analyzer(&Config::default()), &cancel).unwrap();
    let found = graph
        .find_dependents(&snapshot, patterns, 10, reverse, &cancel)
        .unwrap();
    (snapshot, found)
}

fn names(snapshot: &Snapshot, found: &[DependentMatch]) -> Vec<(String, usize)> {
    let mut out: Vec<(String, usize)> = found
        .iter()
        .map(|m| (snapshot.qualified_name(m.id).to_string(), m.depth))
        .collect();
    out.sort();
    out
}

#[test]
fn test_literal_patterns_follow_config_case() {
    let config = Config::default();
    let compiled = patterns(&["ORDERS".to_string()], false, &config).unwrap();
    assert!(!compiled[0].matches("public.orders"));

    let mut config = Config::default();
    config.dialect = Dialect::DuckDb;
    let compiled = patterns(&["ORDERS".to_string()], false, &config).unwrap();
    assert!(compiled[0].matches("public.orders"));
}

#[test]
fn test_regex_patterns() {
    let compiled = patterns(&["public\\.ord.*".to_string()], true, &Config::default()).unwrap();
    assert!(compiled[0].matches("public.orders"));
    assert!(patterns(&["(".to_string()], true, &Config::default()).is_err());
}

#[test]
fn test_dependents_of_table() {
    let (snapshot, found) = found(&[NamePattern::literal("orders")], false);
    assert_eq!(
        names(&snapshot, &found),
        vec![
            ("public.orders".to_string(), 0),
            ("public.orders.id".to_string(), 1),
            ("public.recent".to_string(), 1),
        ]
    );
}

#[test]
fn test_reverse_follows_dependencies() {
    let (snapshot, found) = found(&[NamePattern::literal("public.recent")], true);
    assert_eq!(
        names(&snapshot, &found),
        vec![
            ("public".to_string(), 1),
            ("public.orders".to_string(), 1),
            ("public.orders.id".to_string(), 1),
            ("public.recent".to_string(), 0),
        ]
    );
}

#[test]
fn test_format_table_aligns_kinds() {
    let snapshot = Snapshot::from_yaml_str(SNAPSHOT).unwrap();
    let found = vec![
        DependentMatch {
            id: snapshot.find(ObjectKind::Table, "public.orders").unwrap(),
            depth: 0,
        },
        DependentMatch {
            id: snapshot.find(ObjectKind::View, "public.recent").unwrap(),
            depth: 1,
        },
    ];
    assert_eq!(
        format_table(&found, &snapshot),
        "    0  TABLE  public.orders\n    1  VIEW   public.recent\n"
    );
}
