use super::*;
use crate::parser::SqlParser;

fn extract(sql: &str) -> Extracted {
    let parser = SqlParser::default();
    let stmts = parser.parse(sql).unwrap();
    extract_references(&stmts, parser.folds_unquoted())
}

fn relations(sql: &str) -> Vec<String> {
    extract(sql).relations.iter().map(NameRef::dotted).collect()
}

fn expr(sql: &str) -> Extracted {
    let parser = SqlParser::default();
    extract_expr_references(&parser.parse_expr(sql).unwrap(), true)
}

#[test]
fn test_extract_from_simple_select() {
    assert_eq!(relations("SELECT * FROM users"), vec!["users"]);
}

#[test]
fn test_extract_from_join() {
    assert_eq!(
        relations("SELECT * FROM orders o JOIN customers c ON o.customer_id = c.id"),
        vec!["customers", "orders"]
    );
}

#[test]
fn test_extract_from_subquery() {
    let deps = relations(
        "SELECT * FROM (SELECT * FROM raw_data) AS sub JOIN other_table ON sub.id = other_table.id",
    );
    assert_eq!(deps, vec!["other_table", "raw_data"]);
}

#[test]
fn test_extract_schema_qualified() {
    let extracted = extract("SELECT * FROM raw.orders");
    assert_eq!(extracted.relations.len(), 1);
    assert_eq!(extracted.relations[0].schema(), Some("raw"));
    assert_eq!(extracted.relations[0].name(), "orders");
}

#[test]
fn test_ctes_are_not_relations() {
    let deps = relations(
        r#"
        WITH
            orders_cte AS (SELECT * FROM raw_orders),
            customers_cte AS (SELECT * FROM raw_customers)
        SELECT * FROM orders_cte
        JOIN customers_cte ON orders_cte.customer_id = customers_cte.id
        JOIN products ON orders_cte.product_id = products.id
        "#,
    );
    assert_eq!(deps, vec!["products", "raw_customers", "raw_orders"]);
}

#[test]
fn test_extract_from_union() {
    assert_eq!(
        relations("SELECT * FROM table1 UNION ALL SELECT * FROM table2 UNION SELECT * FROM table1"),
        vec!["table1", "table2"]
    );
}

#[test]
fn test_unquoted_names_fold() {
    assert_eq!(relations("SELECT * FROM Public.Orders"), vec!["public.orders"]);
    assert_eq!(relations("SELECT * FROM \"Orders\""), vec!["Orders"]);
}

#[test]
fn test_functions_are_collected() {
    let extracted = extract("SELECT app.total(o.id), count(*) FROM orders o WHERE lower(o.note) = ''");
    let functions: Vec<String> = extracted.functions.iter().map(NameRef::dotted).collect();
    assert_eq!(functions, vec!["app.total", "count", "lower"]);
}

#[test]
fn test_positions_are_recorded() {
    let extracted = extract("SELECT id\nFROM orders");
    assert_eq!(extracted.relations[0].line, 2);
    assert_eq!(extracted.relations[0].column, 6);
}

#[test]
fn test_nextval_names_sequence() {
    let extracted = expr("nextval('public.order_seq'::regclass)");
    let sequences: Vec<String> = extracted.sequences.iter().map(NameRef::dotted).collect();
    assert_eq!(sequences, vec!["public.order_seq"]);
    assert!(extracted.relations.is_empty());
}

#[test]
fn test_plain_expression_has_only_columns() {
    let extracted = expr("price * quantity > 0");
    assert!(extracted.relations.is_empty() && extracted.functions.is_empty());
    let columns: Vec<String> = extracted.columns.iter().map(NameRef::dotted).collect();
    assert_eq!(columns, vec!["price", "quantity"]);
    assert!(expr("1 + 2").is_empty());
}

#[test]
fn test_columns_keep_their_qualifier() {
    let extracted = extract("SELECT o.ID, note FROM orders o WHERE o.total > 0");
    let columns: Vec<String> = extracted.columns.iter().map(NameRef::dotted).collect();
    assert_eq!(columns, vec!["note", "o.id", "o.total"]);
    assert!(!extracted.wildcard);
}

#[test]
fn test_wildcards_are_flagged() {
    assert!(extract("SELECT * FROM orders").wildcard);
    assert!(extract("SELECT o.* FROM orders o").wildcard);
    assert!(extract("SELECT id FROM a UNION SELECT * FROM b").wildcard);
    assert!(!extract("SELECT count(*) FROM orders").wildcard);
}

#[test]
fn test_merge_all_dedups() {
    let merged = merge_all([expr("lower(a)"), expr("lower(b) || upper(c)")]);
    let functions: Vec<String> = merged.functions.iter().map(NameRef::dotted).collect();
    assert_eq!(functions, vec!["lower", "upper"]);
}
