//! Relation and function extraction from SQL AST
//!
//! A single [`Visitor`] pass collects table/view relations, called functions,
//! `nextval('...')` sequence arguments and column identifiers. Names
//! introduced by `WITH` are dropped from the relations afterwards.

use sqlparser::ast::{
    Expr, Ident, ObjectName, ObjectNamePart, Query, SelectItem, SetExpr, Statement, Visit, Visitor,
};
use std::collections::HashSet;
use std::ops::ControlFlow;

/// A dotted name found in SQL text, with the position of its first part.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NameRef {
    pub parts: Vec<String>,
    /// 1-based; 0 when the parser had no position
    pub line: usize,
    pub column: usize,
}

impl NameRef {
    /// Last part of the name
    pub fn name(&self) -> &str {
        self.parts.last().map(String::as_str).unwrap_or_default()
    }

    /// Part before the name, if qualified
    pub fn schema(&self) -> Option<&str> {
        let n = self.parts.len();
        (n >= 2).then(|| self.parts[n - 2].as_str())
    }

    pub fn dotted(&self) -> String {
        self.parts.join(".")
    }
}

/// Everything one definition mentions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extracted {
    pub relations: Vec<NameRef>,
    pub functions: Vec<NameRef>,
    pub sequences: Vec<NameRef>,
    /// Column identifiers, possibly qualified by a table or alias
    pub columns: Vec<NameRef>,
    /// Some projection selects `*` or `alias.*`
    pub wildcard: bool,
}

impl Extracted {
    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
            && self.functions.is_empty()
            && self.sequences.is_empty()
            && self.columns.is_empty()
            && !self.wildcard
    }

    fn merge(&mut self, other: Extracted) {
        self.relations.extend(other.relations);
        self.functions.extend(other.functions);
        self.sequences.extend(other.sequences);
        self.columns.extend(other.columns);
        self.wildcard |= other.wildcard;
    }
}

struct Collector {
    fold: bool,
    ctes: HashSet<String>,
    out: Extracted,
}

impl Collector {
    fn new(fold: bool) -> Self {
        Self {
            fold,
            ctes: HashSet::new(),
            out: Extracted::default(),
        }
    }

    fn ident(&self, ident: &Ident) -> String {
        if self.fold && ident.quote_style.is_none() {
            ident.value.to_lowercase()
        } else {
            ident.value.clone()
        }
    }

    fn name_ref(&self, name: &ObjectName) -> Option<NameRef> {
        let mut parts = Vec::with_capacity(name.0.len());
        let mut position = (0, 0);
        for part in &name.0 {
            match part {
                ObjectNamePart::Identifier(ident) => {
                    if parts.is_empty() {
                        position = (ident.span.start.line as usize, ident.span.start.column as usize);
                    }
                    parts.push(self.ident(ident));
                }
                _ => return None,
            }
        }
        (!parts.is_empty()).then_some(NameRef {
            parts,
            line: position.0,
            column: position.1,
        })
    }

    fn ident_ref(&self, idents: &[Ident]) -> Option<NameRef> {
        let first = idents.first()?;
        Some(NameRef {
            parts: idents.iter().map(|i| self.ident(i)).collect(),
            line: first.span.start.line as usize,
            column: first.span.start.column as usize,
        })
    }

    /// `nextval('schema.seq'::regclass)` names a sequence in a string.
    fn sequence_argument(&self, function: &sqlparser::ast::Function, at: &NameRef) -> Option<NameRef> {
        let text = function.args.to_string();
        let inner = text.trim().trim_start_matches('(').trim_end_matches(')');
        let literal = inner.split("::").next()?.trim();
        if !(literal.starts_with('\'') && literal.ends_with('\'') && literal.len() >= 2) {
            return None;
        }
        let unquoted = &literal[1..literal.len() - 1];
        let parts: Vec<String> = unquoted
            .split('.')
            .map(|p| {
                let p = p.trim();
                if let Some(quoted) = p.strip_prefix('"').and_then(|p| p.strip_suffix('"')) {
                    quoted.to_string()
                } else if self.fold {
                    p.to_lowercase()
                } else {
                    p.to_string()
                }
            })
            .collect();
        if parts.iter().any(String::is_empty) {
            return None;
        }
        Some(NameRef {
            parts,
            line: at.line,
            column: at.column,
        })
    }

    fn finish(mut self) -> Extracted {
        let ctes = std::mem::take(&mut self.ctes);
        self.out
            .relations
            .retain(|r| !(r.parts.len() == 1 && ctes.contains(&r.parts[0])));
        for list in [
            &mut self.out.relations,
            &mut self.out.functions,
            &mut self.out.sequences,
            &mut self.out.columns,
        ] {
            list.sort();
            list.dedup_by(|a, b| a.parts == b.parts);
        }
        self.out
    }
}

impl Visitor for Collector {
    type Break = ();

    fn pre_visit_query(&mut self, query: &Query) -> ControlFlow<()> {
        if let Some(with) = &query.with {
            for cte in &with.cte_tables {
                let name = self.ident(&cte.alias.name);
                self.ctes.insert(name);
            }
        }
        if projects_wildcard(&query.body) {
            self.out.wildcard = true;
        }
        ControlFlow::Continue(())
    }

    fn pre_visit_relation(&mut self, relation: &ObjectName) -> ControlFlow<()> {
        if let Some(name) = self.name_ref(relation) {
            self.out.relations.push(name);
        }
        ControlFlow::Continue(())
    }

    fn pre_visit_expr(&mut self, expr: &Expr) -> ControlFlow<()> {
        match expr {
            Expr::Function(function) => {
                if let Some(name) = self.name_ref(&function.name) {
                    if name.name().eq_ignore_ascii_case("nextval") {
                        if let Some(sequence) = self.sequence_argument(function, &name) {
                            self.out.sequences.push(sequence);
                        }
                    }
                    self.out.functions.push(name);
                }
            }
            Expr::Identifier(ident) => {
                if let Some(column) = self.ident_ref(std::slice::from_ref(ident)) {
                    self.out.columns.push(column);
                }
            }
            Expr::CompoundIdentifier(idents) => {
                if let Some(column) = self.ident_ref(idents) {
                    self.out.columns.push(column);
                }
            }
            _ => {}
        }
        ControlFlow::Continue(())
    }
}

fn projects_wildcard(body: &SetExpr) -> bool {
    match body {
        SetExpr::Select(select) => select
            .projection
            .iter()
            .any(|item| matches!(item, SelectItem::Wildcard(_) | SelectItem::QualifiedWildcard(..))),
        SetExpr::SetOperation { left, right, .. } => projects_wildcard(left) || projects_wildcard(right),
        SetExpr::Query(query) => projects_wildcard(&query.body),
        _ => false,
    }
}

/// Collect the references of parsed statements.
pub fn extract_references(statements: &[Statement], fold_unquoted: bool) -> Extracted {
    let mut collector = Collector::new(fold_unquoted);
    for statement in statements {
        let _ = statement.visit(&mut collector);
    }
    collector.finish()
}

/// Collect the references of a standalone expression.
pub fn extract_expr_references(expr: &Expr, fold_unquoted: bool) -> Extracted {
    let mut collector = Collector::new(fold_unquoted);
    let _ = expr.visit(&mut collector);
    collector.finish()
}

/// Combine the extractions of several expressions.
pub fn merge_all(parts: impl IntoIterator<Item = Extracted>) -> Extracted {
    let mut out = Extracted::default();
    for part in parts {
        out.merge(part);
    }
    out.relations.sort();
    out.relations.dedup_by(|a, b| a.parts == b.parts);
    out.functions.sort();
    out.functions.dedup_by(|a, b| a.parts == b.parts);
    out.sequences.sort();
    out.sequences.dedup_by(|a, b| a.parts == b.parts);
    out.columns.sort();
    out.columns.dedup_by(|a, b| a.parts == b.parts);
    out
}

#[cfg(test)]
#[path = "extractor_test.rs"]
mod tests;
