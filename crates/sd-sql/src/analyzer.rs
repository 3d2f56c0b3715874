//! SQL-backed reference analysis.
//!
//! [`SqlReferenceAnalyzer`] reads the SQL text carried by view queries, SQL
//! function bodies, column defaults, check constraints and index predicates.
//! Relations are reported whether or not they resolve; called functions only
//! when the snapshot defines them, so built-ins never show up as missing.
//! Queries also depend on the columns they read from resolved tables, and
//! on every column of a table they select `*` from.

use crate::extractor::{extract_expr_references, extract_references, merge_all, Extracted, NameRef};
use crate::parser::SqlParser;
use sd_core::reference::schema_of;
use sd_core::{
    ConstraintDef, Dialect, ObjectBody, ObjectId, ObjectKind, Reference, ReferenceAnalyzer, Snapshot,
};

/// Reference analyzer that parses definitions with sqlparser.
pub struct SqlReferenceAnalyzer {
    parser: SqlParser,
}

impl SqlReferenceAnalyzer {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            parser: SqlParser::new(dialect),
        }
    }

    fn statements(&self, snapshot: &Snapshot, id: ObjectId, sql: &str) -> Extracted {
        match self.parser.parse(sql) {
            Ok(statements) => extract_references(&statements, self.parser.folds_unquoted()),
            Err(err) => {
                self.parse_failed(snapshot, id, &err);
                Extracted::default()
            }
        }
    }

    fn expressions<'a>(
        &self,
        snapshot: &Snapshot,
        id: ObjectId,
        texts: impl IntoIterator<Item = &'a String>,
    ) -> Extracted {
        merge_all(texts.into_iter().filter_map(|text| match self.parser.parse_expr(text) {
            Ok(expr) => Some(extract_expr_references(&expr, self.parser.folds_unquoted())),
            Err(err) => {
                self.parse_failed(snapshot, id, &err);
                None
            }
        }))
    }

    fn parse_failed(&self, snapshot: &Snapshot, id: ObjectId, err: &crate::SqlError) {
        log::warn!(
            "Could not parse {} {} ({}): {}",
            snapshot.get(id).kind,
            snapshot.qualified_name(id),
            self.parser.dialect_name(),
            err
        );
    }

    fn extract(&self, snapshot: &Snapshot, id: ObjectId) -> Extracted {
        let object = snapshot.get(id);
        match &object.body {
            ObjectBody::View(def) => self.statements(snapshot, id, &def.query),
            ObjectBody::Function(def) if def.language.eq_ignore_ascii_case("sql") => {
                self.statements(snapshot, id, &def.body)
            }
            ObjectBody::Function(def) => {
                log::debug!(
                    "Skipping {} body of {}",
                    def.language,
                    snapshot.qualified_name(id)
                );
                Extracted::default()
            }
            ObjectBody::Column(def) => {
                self.expressions(snapshot, id, def.default.iter().chain(def.generated.iter()))
            }
            ObjectBody::Constraint(ConstraintDef::Check { expression }) => {
                self.expressions(snapshot, id, [expression])
            }
            ObjectBody::Index(def) => self.expressions(snapshot, id, def.predicate.iter()),
            _ => Extracted::default(),
        }
    }
}

impl Default for SqlReferenceAnalyzer {
    fn default() -> Self {
        Self::new(Dialect::default())
    }
}

impl ReferenceAnalyzer for SqlReferenceAnalyzer {
    fn references(&self, snapshot: &Snapshot, id: ObjectId) -> Vec<Reference> {
        let schema = schema_of(snapshot, id);
        let extracted = self.extract(snapshot, id);
        let mut out = Vec::new();
        let mut tables = Vec::new();

        for relation in &extracted.relations {
            let Some(reference) =
                resolve(snapshot, schema, relation, &[ObjectKind::Table, ObjectKind::View], true)
            else {
                continue;
            };
            if reference.kind == ObjectKind::Table {
                if let Some(table) = snapshot.resolve(&reference) {
                    tables.push((table, relation));
                }
            }
            out.push(reference);
        }
        for function in &extracted.functions {
            out.extend(resolve(snapshot, schema, function, &[ObjectKind::Function], false));
        }
        for sequence in &extracted.sequences {
            out.extend(resolve(snapshot, schema, sequence, &[ObjectKind::Sequence], true));
        }
        if let ObjectBody::Constraint(ConstraintDef::ForeignKey {
            references_schema,
            references_table,
            ..
        }) = &snapshot.get(id).body
        {
            out.push(Reference::new(
                references_schema.as_deref().or(schema),
                references_table.clone(),
                ObjectKind::Table,
            ));
        }
        out.extend(column_references(snapshot, &tables, &extracted));
        out
    }
}

/// Columns of the resolved `tables` that the query reads.
///
/// A column identifier qualified by a name that is not one of the tables
/// is taken to be an alias and may match any of them.
fn column_references(snapshot: &Snapshot, tables: &[(ObjectId, &NameRef)], extracted: &Extracted) -> Vec<Reference> {
    let table_names: Vec<&str> = tables.iter().map(|&(t, _)| snapshot.get(t).name.as_str()).collect();
    let mut out = Vec::new();
    for &(table, relation) in tables {
        let table_name = snapshot.get(table).name.as_str();
        let reads = |column: &NameRef, name: &str| {
            column.name() == name
                && match column.schema() {
                    None => true,
                    Some(qualifier) => qualifier == table_name || !table_names.contains(&qualifier),
                }
        };
        for &column in snapshot.children(table) {
            let object = snapshot.get(column);
            if object.kind != ObjectKind::Column {
                continue;
            }
            let used = extracted.columns.iter().find(|c| reads(*c, object.name.as_str()));
            let position = match used {
                Some(c) => c,
                None if extracted.wildcard => relation,
                None => continue,
            };
            let reference = Reference::parse_qualified(snapshot.qualified_name(column), ObjectKind::Column);
            out.push(located(reference, position));
        }
    }
    out
}

fn located(reference: Reference, name: &NameRef) -> Reference {
    if name.line > 0 {
        reference.at(name.line, name.column)
    } else {
        reference
    }
}

/// Turn an extracted name into a reference of the first kind that resolves.
///
/// Unqualified names are tried in the object's own schema first, then
/// anywhere. When nothing resolves the reference is kept (as the first
/// kind, in the object's schema) only if `keep_unresolved`.
fn resolve(
    snapshot: &Snapshot,
    own_schema: Option<&str>,
    name: &NameRef,
    kinds: &[ObjectKind],
    keep_unresolved: bool,
) -> Option<Reference> {
    let qualified = name.parts.len() > 1;
    let schema = if qualified { name.schema() } else { own_schema };

    for &kind in kinds {
        let candidate = located(Reference::new(schema, name.name(), kind), name);
        if snapshot.resolve(&candidate).is_some() {
            return Some(candidate);
        }
        if !qualified {
            let loose = located(Reference::new(None, name.name(), kind), name);
            if snapshot.resolve(&loose).is_some() {
                return Some(loose);
            }
        }
    }
    let kind = kinds.first().copied()?;
    keep_unresolved.then(|| located(Reference::new(schema, name.name(), kind), name))
}

#[cfg(test)]
#[path = "analyzer_test.rs"]
mod tests;
