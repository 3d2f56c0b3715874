use super::*;

#[test]
fn test_rank_follows_dependency_direction() {
    assert!(ObjectKind::Schema.rank() < ObjectKind::Table.rank());
    assert!(ObjectKind::Table.rank() < ObjectKind::Column.rank());
    assert!(ObjectKind::Column.rank() < ObjectKind::Constraint.rank());
    assert!(ObjectKind::Constraint.rank() < ObjectKind::Function.rank());
    assert!(ObjectKind::Function.rank() < ObjectKind::View.rank());
}

#[test]
fn test_rank_matches_ord() {
    let mut kinds = ObjectKind::ALL.to_vec();
    kinds.reverse();
    kinds.sort();
    assert_eq!(kinds, ObjectKind::ALL.to_vec());
}

#[test]
fn test_parse_keyword_case_insensitive() {
    assert_eq!("table".parse::<ObjectKind>().unwrap(), ObjectKind::Table);
    assert_eq!("VIEW".parse::<ObjectKind>().unwrap(), ObjectKind::View);
    assert_eq!(" Function ".parse::<ObjectKind>().unwrap(), ObjectKind::Function);
}

#[test]
fn test_parse_unknown_kind() {
    let err = "materialized".parse::<ObjectKind>().unwrap_err();
    assert!(matches!(err, CoreError::UnknownObjectKind { .. }));
}

#[test]
fn test_inline_kinds_are_sub_objects() {
    for kind in ObjectKind::ALL {
        if kind.is_inline() {
            assert!(kind.is_sub_object(), "{kind} should be a sub-object");
        }
    }
    assert!(!ObjectKind::Index.is_inline());
    assert!(ObjectKind::Index.is_sub_object());
}

#[test]
fn test_serde_lowercase() {
    let json = serde_json::to_string(&ObjectKind::Constraint).unwrap();
    assert_eq!(json, r#""constraint""#);
    let kind: ObjectKind = serde_yaml::from_str("policy").unwrap();
    assert_eq!(kind, ObjectKind::Policy);
}
