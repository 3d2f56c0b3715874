use super::*;
use sd_core::Dialect;
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

#[test]
fn test_parse_selector() {
    let key = parse_selector("table:public.orders").unwrap();
    assert_eq!(key, NodeKey::new(ObjectKind::Table, "public.orders"));

    let key = parse_selector("FUNCTION:public.total(integer)").unwrap();
    assert_eq!(key.qualified_name, "public.total(integer)");
}

#[test]
fn test_parse_selector_rejects_bad_input() {
    assert!(parse_selector("public.orders").is_err());
    assert!(parse_selector("WIDGET:public.orders").is_err());
    assert!(parse_selector("TABLE: ").is_err());
}

#[test]
fn test_explicit_config_and_dialect_override() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("schemadelta.yml");
    fs::write(&path, "dialect: duckdb\ndefault_depth: 3\n").unwrap();

    let global = GlobalArgs {
        config: Some(path.clone()),
        ..Default::default()
    };
    let config = load_config(&global).unwrap();
    assert_eq!(config.dialect, Dialect::DuckDb);
    assert_eq!(config.default_depth, 3);

    let global = GlobalArgs {
        config: Some(path),
        dialect: Some("snowflake".to_string()),
        ..Default::default()
    };
    assert_eq!(load_config(&global).unwrap().dialect, Dialect::Snowflake);
}

#[test]
fn test_missing_explicit_config_fails() {
    let global = GlobalArgs {
        config: Some(PathBuf::from("/nonexistent/schemadelta.yml")),
        ..Default::default()
    };
    assert!(load_config(&global).is_err());
}

#[test]
fn test_rules_flag_overrides_config() {
    let dir = tempdir().unwrap();
    let rules = dir.path().join("rules.txt");
    fs::write(&rules, "SHOW ALL\nHIDE audit SCHEMA\n").unwrap();

    let args = CompareArgs {
        rules: Some(rules),
        ..Default::default()
    };
    let list = ignore_list(&args, &Config::default()).unwrap();
    assert!(list.is_show_by_default());
    assert_eq!(list.rules().len(), 1);
}

#[test]
fn test_malformed_rules_report_file() {
    let dir = tempdir().unwrap();
    let rules = dir.path().join("rules.txt");
    fs::write(&rules, "SHOW ALL\nSHOW REGEX \"(\"\n").unwrap();

    let args = CompareArgs {
        rules: Some(rules),
        ..Default::default()
    };
    let err = ignore_list(&args, &Config::default()).unwrap_err();
    assert!(format!("{:#}", err).contains("rules.txt"));
}
