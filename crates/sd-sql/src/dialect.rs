//! SQL dialect abstraction

use sd_core::Dialect as DialectKind;
use sqlparser::ast::{Expr, Statement};
use sqlparser::dialect::{
    Dialect, DuckDbDialect, GenericDialect, MsSqlDialect, PostgreSqlDialect, SnowflakeDialect,
};
use sqlparser::parser::{Parser, ParserError};

use crate::error::{SqlError, SqlResult};

/// Trait for SQL dialect implementations
pub trait SqlDialect: Send + Sync {
    /// Get the underlying sqlparser dialect
    fn parser_dialect(&self) -> &dyn Dialect;

    /// Parse SQL into AST statements
    fn parse(&self, sql: &str) -> SqlResult<Vec<Statement>> {
        Parser::parse_sql(self.parser_dialect(), sql).map_err(parse_error)
    }

    /// Parse a single scalar expression (column default, check, predicate)
    fn parse_expr(&self, sql: &str) -> SqlResult<Expr> {
        Parser::new(self.parser_dialect())
            .try_with_sql(sql)
            .and_then(|mut parser| parser.parse_expr())
            .map_err(parse_error)
    }

    /// Whether unquoted identifiers are folded to lower case before lookup
    fn folds_unquoted(&self) -> bool;

    /// Get the dialect name
    fn name(&self) -> &'static str;
}

fn parse_error(err: ParserError) -> SqlError {
    let message = err.to_string();
    let (line, column) = parse_location_from_error(&message);
    SqlError::ParseError {
        message,
        line,
        column,
    }
}

/// Parse line and column from sqlparser error message.
///
/// `ParserError` is a plain string wrapper with no structured location
/// data, so "Line: N, Column: M" is read back from the message text.
fn parse_location_from_error(msg: &str) -> (usize, usize) {
    let Some(line_idx) = msg.find("Line: ") else {
        return (0, 0);
    };
    let line_start = line_idx + 6;
    let Some(comma_idx) = msg[line_start..].find(',') else {
        return (0, 0);
    };
    let Ok(line) = msg[line_start..line_start + comma_idx]
        .trim()
        .parse::<usize>()
    else {
        return (0, 0);
    };
    let Some(col_idx) = msg.find("Column: ") else {
        return (0, 0);
    };
    let col_start = col_idx + 8;
    let col_end = msg[col_start..]
        .find(|c: char| !c.is_ascii_digit())
        .map(|i| col_start + i)
        .unwrap_or(msg.len());
    let Ok(column) = msg[col_start..col_end].trim().parse::<usize>() else {
        return (0, 0);
    };
    (line, column)
}

/// A configured dialect backed by the matching sqlparser dialect
pub struct ParserDialect {
    kind: DialectKind,
    dialect: Box<dyn Dialect + Send + Sync>,
}

impl ParserDialect {
    pub fn new(kind: DialectKind) -> Self {
        let dialect: Box<dyn Dialect + Send + Sync> = match kind {
            DialectKind::Generic => Box::new(GenericDialect {}),
            DialectKind::Postgres => Box::new(PostgreSqlDialect {}),
            DialectKind::DuckDb => Box::new(DuckDbDialect {}),
            DialectKind::MsSql => Box::new(MsSqlDialect {}),
            DialectKind::Snowflake => Box::new(SnowflakeDialect {}),
        };
        Self { kind, dialect }
    }

    pub fn kind(&self) -> DialectKind {
        self.kind
    }
}

impl Default for ParserDialect {
    fn default() -> Self {
        Self::new(DialectKind::default())
    }
}

impl SqlDialect for ParserDialect {
    fn parser_dialect(&self) -> &dyn Dialect {
        self.dialect.as_ref()
    }

    fn folds_unquoted(&self) -> bool {
        matches!(self.kind, DialectKind::Postgres | DialectKind::DuckDb)
    }

    fn name(&self) -> &'static str {
        match self.kind {
            DialectKind::Generic => "generic",
            DialectKind::Postgres => "postgres",
            DialectKind::DuckDb => "duckdb",
            DialectKind::MsSql => "mssql",
            DialectKind::Snowflake => "snowflake",
        }
    }
}

#[cfg(test)]
#[path = "dialect_test.rs"]
mod tests;
