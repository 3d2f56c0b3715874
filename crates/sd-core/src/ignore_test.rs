use super::*;

#[test]
fn test_first_match_wins_over_specificity() {
    let list = IgnoreList::black()
        .with_rule(IgnoreRule::hide(NamePattern::literal("*")).with_kinds([ObjectKind::Table]))
        .with_rule(IgnoreRule::show(NamePattern::literal("emp")).with_kinds([ObjectKind::Table]));
    assert_eq!(list.classify(ObjectKind::Table, "emp"), Verdict::Exclude);
}

#[test]
fn test_rule_order_reversed_changes_outcome() {
    let list = IgnoreList::black()
        .with_rule(IgnoreRule::show(NamePattern::literal("emp")).with_kinds([ObjectKind::Table]))
        .with_rule(IgnoreRule::hide(NamePattern::literal("*")).with_kinds([ObjectKind::Table]));
    assert_eq!(list.classify(ObjectKind::Table, "emp"), Verdict::Include);
    assert_eq!(list.classify(ObjectKind::Table, "dept"), Verdict::Exclude);
}

#[test]
fn test_kind_filter() {
    let list = IgnoreList::black()
        .with_rule(IgnoreRule::hide(NamePattern::literal("*")).with_kinds([ObjectKind::View]));
    assert_eq!(list.classify(ObjectKind::Table, "t"), Verdict::Include);
    assert_eq!(list.classify(ObjectKind::View, "v"), Verdict::Exclude);
}

#[test]
fn test_default_polarity() {
    assert_eq!(
        IgnoreList::black().classify(ObjectKind::Table, "t"),
        Verdict::Include
    );
    assert_eq!(
        IgnoreList::white().classify(ObjectKind::Table, "t"),
        Verdict::Exclude
    );
}

#[test]
fn test_content_flag_on_show_rule() {
    let list = IgnoreList::white()
        .with_rule(IgnoreRule::show(NamePattern::literal("audit")).content_only());
    assert_eq!(
        list.classify(ObjectKind::Table, "public.audit"),
        Verdict::ExcludeContent
    );
}

#[test]
fn test_content_flag_on_hide_rule_still_excludes() {
    let list =
        IgnoreList::black().with_rule(IgnoreRule::hide(NamePattern::literal("audit")).content_only());
    assert_eq!(list.classify(ObjectKind::Table, "audit"), Verdict::Exclude);
}

#[test]
fn test_parse_rule_file() {
    let text = r#"
# keep only the billing objects
HIDE ALL
SHOW REGEX billing_.* TABLE,VIEW
SHOW CONTENT "public.audit log" TABLE
HIDE tmp
"#;
    let list = IgnoreList::parse(text).unwrap();
    assert!(!list.is_show_by_default());
    assert_eq!(list.rules().len(), 3);
    assert_eq!(
        list.classify(ObjectKind::Table, "public.billing_items"),
        Verdict::Include
    );
    assert_eq!(
        list.classify(ObjectKind::Function, "public.billing_total"),
        Verdict::Exclude
    );
    assert_eq!(
        list.classify(ObjectKind::Table, "public.audit log"),
        Verdict::ExcludeContent
    );
    assert_eq!(list.classify(ObjectKind::Table, "other"), Verdict::Exclude);
}

#[test]
fn test_parse_kinds_separated_by_spaces() {
    let list = IgnoreList::parse("HIDE x TABLE, VIEW").unwrap();
    let kinds: Vec<_> = list.rules()[0].kinds.iter().copied().collect();
    assert_eq!(kinds, vec![ObjectKind::Table, ObjectKind::View]);
}

#[test]
fn test_parse_case_insensitive_literals() {
    let list = IgnoreList::parse_with_case("HIDE ORDERS", true).unwrap();
    assert_eq!(list.classify(ObjectKind::Table, "public.orders"), Verdict::Exclude);
}

#[test]
fn test_parse_bad_regex_reports_line() {
    let err = IgnoreList::parse("SHOW ALL\nHIDE REGEX (broken").unwrap_err();
    match err {
        CoreError::MalformedRule { line, .. } => assert_eq!(line, 2),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_parse_unknown_verdict() {
    assert!(matches!(
        IgnoreList::parse("DROP everything").unwrap_err(),
        CoreError::MalformedRule { line: 1, .. }
    ));
}

#[test]
fn test_parse_unknown_kind() {
    assert!(matches!(
        IgnoreList::parse("HIDE x TABLES").unwrap_err(),
        CoreError::MalformedRule { .. }
    ));
}

#[test]
fn test_parse_missing_pattern() {
    assert!(IgnoreList::parse("HIDE REGEX").is_err());
}

#[test]
fn test_parse_unterminated_quote() {
    assert!(IgnoreList::parse("HIDE \"open").is_err());
}

#[test]
fn test_all_after_rules_rejected() {
    assert!(IgnoreList::parse("HIDE x\nHIDE ALL").is_err());
}

#[test]
fn test_quoted_all_is_a_literal() {
    let list = IgnoreList::parse("HIDE \"ALL\"").unwrap();
    assert!(list.is_show_by_default());
    assert_eq!(list.classify(ObjectKind::Table, "ALL"), Verdict::Exclude);
}

#[test]
fn test_load_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rules.txt");
    std::fs::write(&path, "HIDE REGEX .*_bak\n").unwrap();
    let list = IgnoreList::load(&path).unwrap();
    assert_eq!(list.classify(ObjectKind::Table, "s.t_bak"), Verdict::Exclude);
}
