//! sd-sql - SQL reference analysis for Schemadelta
//!
//! This crate parses the SQL text stored in schema objects with sqlparser-rs
//! and reports the relations, functions and sequences it mentions, so the
//! dependency graph can order views and functions correctly.

pub mod analyzer;
pub mod dialect;
pub mod error;
pub mod extractor;
pub mod parser;

pub use analyzer::SqlReferenceAnalyzer;
pub use dialect::{ParserDialect, SqlDialect};
pub use error::{SqlError, SqlResult};
pub use extractor::{extract_expr_references, extract_references, Extracted, NameRef};
pub use parser::SqlParser;
