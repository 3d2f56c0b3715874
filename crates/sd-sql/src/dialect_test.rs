use super::*;

#[test]
fn test_every_dialect_parses_select() {
    for kind in [
        DialectKind::Generic,
        DialectKind::Postgres,
        DialectKind::DuckDb,
        DialectKind::MsSql,
        DialectKind::Snowflake,
    ] {
        let dialect = ParserDialect::new(kind);
        let stmts = dialect.parse("SELECT id FROM users").unwrap();
        assert_eq!(stmts.len(), 1, "dialect {}", dialect.name());
        assert_eq!(dialect.kind(), kind);
    }
}

#[test]
fn test_parse_expr() {
    let dialect = ParserDialect::new(DialectKind::Postgres);
    let expr = dialect.parse_expr("lower(name) <> ''").unwrap();
    assert!(matches!(expr, Expr::BinaryOp { .. }));
    assert!(dialect.parse_expr("lower(").is_err());
}

#[test]
fn test_folding() {
    assert!(ParserDialect::new(DialectKind::Postgres).folds_unquoted());
    assert!(!ParserDialect::new(DialectKind::Snowflake).folds_unquoted());
    assert_eq!(ParserDialect::default().name(), "postgres");
}

#[test]
fn test_parse_error_location() {
    let dialect = ParserDialect::new(DialectKind::DuckDb);
    let result = dialect.parse("SELECT\nFROM users");
    assert!(result.is_err());
    if let Err(SqlError::ParseError {
        line,
        column,
        message,
    }) = result
    {
        assert_eq!(
            line, 2,
            "Expected line 2, got line {} (message: {})",
            line, message
        );
        assert!(
            column > 0,
            "Expected non-zero column, got {} (message: {})",
            column,
            message
        );
    }
}

#[test]
fn test_parse_location_extraction() {
    let (line, col) =
        super::parse_location_from_error("Expected: something at Line: 5, Column: 10");
    assert_eq!(line, 5);
    assert_eq!(col, 10);

    let (line, col) = super::parse_location_from_error("Some error without location");
    assert_eq!(line, 0);
    assert_eq!(col, 0);
}
