//! SQL parser wrapper

use crate::dialect::{ParserDialect, SqlDialect};
use crate::error::{SqlError, SqlResult};
use sd_core::Dialect as DialectKind;
use sqlparser::ast::{Expr, Statement};

/// SQL parser that wraps sqlparser-rs with dialect support
pub struct SqlParser {
    dialect: Box<dyn SqlDialect>,
}

impl SqlParser {
    pub fn new(kind: DialectKind) -> Self {
        Self {
            dialect: Box::new(ParserDialect::new(kind)),
        }
    }

    /// Create a parser from dialect name
    pub fn from_dialect_name(name: &str) -> SqlResult<Self> {
        name.parse::<DialectKind>()
            .map(Self::new)
            .map_err(|_| SqlError::UnknownDialect(name.to_string()))
    }

    /// Parse SQL into AST statements
    pub fn parse(&self, sql: &str) -> SqlResult<Vec<Statement>> {
        let sql = sql.trim();
        if sql.is_empty() {
            return Err(SqlError::EmptySql);
        }

        self.dialect.parse(sql)
    }

    /// Parse a scalar expression
    pub fn parse_expr(&self, sql: &str) -> SqlResult<Expr> {
        let sql = sql.trim();
        if sql.is_empty() {
            return Err(SqlError::EmptySql);
        }

        self.dialect.parse_expr(sql)
    }

    /// Whether unquoted identifiers are folded to lower case
    pub fn folds_unquoted(&self) -> bool {
        self.dialect.folds_unquoted()
    }

    /// Get the dialect name
    pub fn dialect_name(&self) -> &'static str {
        self.dialect.name()
    }
}

impl Default for SqlParser {
    fn default() -> Self {
        Self::new(DialectKind::default())
    }
}

#[cfg(test)]
#[path = "parser_test.rs"]
mod tests;
