//! ANSI/PostgreSQL-flavoured DDL emitter.

use crate::action::{Action, ActionKind, ActionPart, Origin};
use crate::render::{EmitContext, ScriptEmitter};
use sd_core::reference::schema_of;
use sd_core::{
    ColumnDef, ConstraintDef, FunctionDef, ObjectBody, ObjectId, ObjectKind, Privilege,
    SchemaObject, SequenceDef, Snapshot, TableDef,
};

/// Renders actions as plain DDL statements, one string per statement.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericEmitter;

impl ScriptEmitter for GenericEmitter {
    fn emit(&self, action: &Action, ctx: &EmitContext<'_>) -> Vec<String> {
        let snapshot = match action.origin() {
            Origin::Old => ctx.old,
            Origin::New => ctx.new,
        };
        let w = Writer { snapshot };
        let id = action.target;
        match (action.kind, &action.part) {
            (ActionKind::Drop, ActionPart::Stub) => w.stub(id, true),
            (ActionKind::Drop, _) => vec![w.drop(id)],
            (_, ActionPart::Stub) => w.stub(id, action.kind == ActionKind::Alter),
            (_, ActionPart::Completion) => w.completion(id),
            (_, ActionPart::Skeleton { deferred }) => w.create(id, deferred),
            (ActionKind::Alter, ActionPart::Whole) => match action.previous {
                Some(previous) => {
                    let before = Writer { snapshot: ctx.old };
                    w.alter(&before, previous, id)
                }
                None => w.create(id, &[]),
            },
            (_, ActionPart::Whole) => w.create(id, &[]),
        }
    }
}

/// Quote an identifier unless it is a plain lower-case name.
pub fn quote_ident(name: &str) -> String {
    let mut chars = name.chars();
    let plain = chars
        .next()
        .is_some_and(|c| c.is_ascii_lowercase() || c == '_')
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if plain {
        name.to_string()
    } else {
        format!("\"{}\"", name.replace('"', "\"\""))
    }
}

fn quote_literal(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

/// Function names carry their signature (`f(integer)`); DDL wants the bare name.
fn bare_name(object: &SchemaObject) -> &str {
    match object.kind {
        ObjectKind::Function => object.name.split('(').next().unwrap_or(object.name.as_str()),
        _ => &object.name,
    }
}

struct Writer<'a> {
    snapshot: &'a Snapshot,
}

impl Writer<'_> {
    fn object(&self, id: ObjectId) -> &SchemaObject {
        self.snapshot.get(id)
    }

    fn table_of(&self, id: ObjectId) -> String {
        match self.object(id).parent() {
            Some(parent) => self.name(parent),
            None => String::new(),
        }
    }

    /// Quoted path below the database.
    fn name(&self, id: ObjectId) -> String {
        let root = self.snapshot.root();
        let mut parts: Vec<String> = self
            .snapshot
            .ancestors(id)
            .into_iter()
            .filter(|&a| a != root)
            .rev()
            .map(|a| quote_ident(bare_name(self.object(a))))
            .collect();
        parts.push(quote_ident(bare_name(self.object(id))));
        parts.join(".")
    }

    /// Name for objects that live in a schema but hang off a table.
    fn schema_scoped(&self, id: ObjectId) -> String {
        let object = self.object(id);
        match schema_of(self.snapshot, id) {
            Some(schema) => format!("{}.{}", quote_ident(schema), quote_ident(&object.name)),
            None => quote_ident(&object.name),
        }
    }

    fn signature(&self, id: ObjectId, def: &FunctionDef, with_names: bool) -> String {
        let args: Vec<String> = def
            .arguments
            .iter()
            .map(|arg| {
                let mut out = String::new();
                if with_names {
                    if let Some(name) = &arg.name {
                        out.push_str(&quote_ident(name));
                        out.push(' ');
                    }
                }
                out.push_str(&arg.data_type);
                if with_names {
                    if let Some(default) = &arg.default {
                        out.push_str(" DEFAULT ");
                        out.push_str(default);
                    }
                }
                out
            })
            .collect();
        format!("{}({})", self.name(id), args.join(", "))
    }

    /// How COMMENT ON / ALTER ... OWNER address the object.
    fn addressed(&self, id: ObjectId) -> String {
        let object = self.object(id);
        match object.kind {
            ObjectKind::Constraint | ObjectKind::Trigger | ObjectKind::Policy => format!(
                "{} {} ON {}",
                object.kind.keyword(),
                quote_ident(&object.name),
                self.table_of(id)
            ),
            ObjectKind::Index => format!("INDEX {}", self.schema_scoped(id)),
            ObjectKind::Function => match object.function() {
                Some(def) => format!("FUNCTION {}", self.signature(id, def, false)),
                None => format!("FUNCTION {}", self.name(id)),
            },
            ObjectKind::View if object.view().is_some_and(|v| v.materialized) => {
                format!("MATERIALIZED VIEW {}", self.name(id))
            }
            _ => format!("{} {}", object.kind.keyword(), self.name(id)),
        }
    }

    // ── Create ──────────────────────────────────────────────────────────

    fn create(&self, id: ObjectId, deferred: &[ObjectId]) -> Vec<String> {
        let object = self.object(id);
        let mut out = Vec::new();
        match &object.body {
            ObjectBody::Table(def) => out.push(self.create_table(id, def, deferred)),
            ObjectBody::Column(def) => out.push(format!(
                "ALTER TABLE {} ADD COLUMN {};",
                self.table_of(id),
                column_clause(&object.name, def)
            )),
            ObjectBody::Constraint(def) => out.push(self.add_constraint(id, def)),
            ObjectBody::Index(def) => {
                let mut sql = format!(
                    "CREATE {}INDEX {} ON {}",
                    if def.unique { "UNIQUE " } else { "" },
                    quote_ident(&object.name),
                    self.table_of(id)
                );
                if let Some(method) = &def.method {
                    sql.push_str(&format!(" USING {}", method));
                }
                sql.push_str(&format!(" ({})", def.columns.join(", ")));
                if let Some(predicate) = &def.predicate {
                    sql.push_str(&format!(" WHERE {}", predicate));
                }
                sql.push(';');
                out.push(sql);
            }
            ObjectBody::View(def) => out.push(format!(
                "CREATE {}VIEW {} AS {};",
                if def.materialized { "MATERIALIZED " } else { "" },
                self.name(id),
                def.query.trim_end_matches(';')
            )),
            ObjectBody::Function(def) => out.push(self.function(id, def, false)),
            ObjectBody::Sequence(def) => out.push(format!(
                "CREATE SEQUENCE {}{};",
                self.name(id),
                sequence_options(def)
            )),
            ObjectBody::Trigger(def) => {
                let mut sql = format!(
                    "CREATE TRIGGER {} {} {} ON {} FOR EACH {}",
                    quote_ident(&object.name),
                    def.timing,
                    def.events.join(" OR "),
                    self.table_of(id),
                    if def.for_each_row { "ROW" } else { "STATEMENT" }
                );
                if let Some(when) = &def.when {
                    sql.push_str(&format!(" WHEN ({})", when));
                }
                sql.push_str(&format!(" EXECUTE FUNCTION {}();", def.function));
                out.push(sql);
            }
            ObjectBody::Definition(text) => out.push(match object.kind {
                ObjectKind::Type => format!("CREATE TYPE {} AS {};", self.name(id), text),
                ObjectKind::Policy => format!(
                    "CREATE POLICY {} ON {} {};",
                    quote_ident(&object.name),
                    self.table_of(id),
                    text
                ),
                _ => format!("CREATE {} {} {};", object.kind.keyword(), self.name(id), text),
            }),
            ObjectBody::None => out.push(format!("CREATE {} {};", object.kind.keyword(), self.name(id))),
        }

        self.metadata(id, &mut out);
        if object.kind == ObjectKind::Table {
            for &child in object.children() {
                if self.object(child).kind.is_inline() && !deferred.contains(&child) {
                    self.metadata(child, &mut out);
                }
            }
        }
        out
    }

    fn create_table(&self, id: ObjectId, def: &TableDef, deferred: &[ObjectId]) -> String {
        let object = self.object(id);
        let mut items = Vec::new();
        for &child in object.children() {
            let child_object = self.object(child);
            match &child_object.body {
                ObjectBody::Column(column) => items.push(column_clause(&child_object.name, column)),
                ObjectBody::Constraint(constraint) if !deferred.contains(&child) => items.push(format!(
                    "CONSTRAINT {} {}",
                    quote_ident(&child_object.name),
                    self.constraint_clause(child, constraint)
                )),
                _ => {}
            }
        }
        let mut sql = format!(
            "CREATE {}TABLE {} (",
            if def.unlogged { "UNLOGGED " } else { "" },
            self.name(id)
        );
        if !items.is_empty() {
            sql.push_str("\n    ");
            sql.push_str(&items.join(",\n    "));
            sql.push('\n');
        }
        sql.push(')');
        if !def.options.is_empty() {
            sql.push_str(&format!(" WITH ({})", def.options.join(", ")));
        }
        if let Some(tablespace) = &def.tablespace {
            sql.push_str(&format!(" TABLESPACE {}", quote_ident(tablespace)));
        }
        sql.push(';');
        sql
    }

    fn constraint_clause(&self, id: ObjectId, def: &ConstraintDef) -> String {
        let list = |columns: &[String]| {
            columns
                .iter()
                .map(|c| quote_ident(c))
                .collect::<Vec<_>>()
                .join(", ")
        };
        match def {
            ConstraintDef::PrimaryKey { columns } => format!("PRIMARY KEY ({})", list(columns)),
            ConstraintDef::Unique { columns } => format!("UNIQUE ({})", list(columns)),
            ConstraintDef::Check { expression } => format!("CHECK ({})", expression),
            ConstraintDef::ForeignKey {
                columns,
                references_schema,
                references_table,
                references_columns,
                on_delete,
                on_update,
            } => {
                let schema = references_schema
                    .as_deref()
                    .or_else(|| schema_of(self.snapshot, id));
                let target = match schema {
                    Some(schema) => format!("{}.{}", quote_ident(schema), quote_ident(references_table)),
                    None => quote_ident(references_table),
                };
                let mut sql = format!("FOREIGN KEY ({}) REFERENCES {}", list(columns), target);
                if !references_columns.is_empty() {
                    sql.push_str(&format!(" ({})", list(references_columns)));
                }
                if let Some(action) = on_delete {
                    sql.push_str(&format!(" ON DELETE {}", action));
                }
                if let Some(action) = on_update {
                    sql.push_str(&format!(" ON UPDATE {}", action));
                }
                sql
            }
        }
    }

    fn add_constraint(&self, id: ObjectId, def: &ConstraintDef) -> String {
        format!(
            "ALTER TABLE {} ADD CONSTRAINT {} {};",
            self.table_of(id),
            quote_ident(&self.object(id).name),
            self.constraint_clause(id, def)
        )
    }

    fn function(&self, id: ObjectId, def: &FunctionDef, replace: bool) -> String {
        let mut sql = format!(
            "CREATE {}FUNCTION {} RETURNS {} LANGUAGE {}",
            if replace { "OR REPLACE " } else { "" },
            self.signature(id, def, true),
            def.returns,
            def.language
        );
        if let Some(volatility) = &def.volatility {
            sql.push(' ');
            sql.push_str(volatility);
        }
        sql.push_str(&format!(" AS $${}$$;", def.body));
        sql
    }

    /// Owner, comment and grants of a freshly created object.
    fn metadata(&self, id: ObjectId, out: &mut Vec<String>) {
        let object = self.object(id);
        if let Some(owner) = &object.owner {
            if has_owner(object.kind) {
                out.push(format!("ALTER {} OWNER TO {};", self.addressed(id), quote_ident(owner)));
            }
        }
        if let Some(comment) = &object.comment {
            out.push(self.comment(id, Some(comment)));
        }
        for privilege in &object.privileges {
            out.push(self.grant(id, privilege));
        }
    }

    fn comment(&self, id: ObjectId, text: Option<&String>) -> String {
        let target = match self.object(id).kind {
            ObjectKind::Column => format!("COLUMN {}", self.name(id)),
            _ => self.addressed(id),
        };
        let value = text.map_or_else(|| "NULL".to_string(), |t| quote_literal(t));
        format!("COMMENT ON {} IS {};", target, value)
    }

    fn grant(&self, id: ObjectId, privilege: &Privilege) -> String {
        format!(
            "GRANT {} ON {} TO {}{};",
            privilege.privilege,
            self.addressed(id),
            quote_ident(&privilege.grantee),
            if privilege.with_grant_option { " WITH GRANT OPTION" } else { "" }
        )
    }

    fn revoke(&self, id: ObjectId, privilege: &Privilege) -> String {
        format!(
            "REVOKE {} ON {} FROM {};",
            privilege.privilege,
            self.addressed(id),
            quote_ident(&privilege.grantee)
        )
    }

    // ── Drop ────────────────────────────────────────────────────────────

    fn drop(&self, id: ObjectId) -> String {
        let object = self.object(id);
        match object.kind {
            ObjectKind::Column | ObjectKind::Constraint => format!(
                "ALTER TABLE {} DROP {} {};",
                self.table_of(id),
                object.kind.keyword(),
                quote_ident(&object.name)
            ),
            ObjectKind::Index => format!("DROP INDEX {};", self.schema_scoped(id)),
            ObjectKind::Trigger | ObjectKind::Policy => format!(
                "DROP {} {} ON {};",
                object.kind.keyword(),
                quote_ident(&object.name),
                self.table_of(id)
            ),
            _ => format!("DROP {};", self.addressed(id)),
        }
    }

    // ── Cycle parts ─────────────────────────────────────────────────────

    /// Placeholder with the right shape and no dependencies.
    fn stub(&self, id: ObjectId, replace: bool) -> Vec<String> {
        let object = self.object(id);
        let or_replace = if replace { "OR REPLACE " } else { "" };
        match &object.body {
            ObjectBody::View(def) => {
                // Column types must match the real definition for OR REPLACE
                let select = match def.typed_columns() {
                    Some(columns) => columns
                        .iter()
                        .map(|(c, t)| format!("NULL::{} AS {}", t, quote_ident(c)))
                        .collect::<Vec<_>>()
                        .join(", "),
                    None if def.columns.is_empty() => "NULL".to_string(),
                    None => def
                        .columns
                        .iter()
                        .map(|c| format!("NULL::text AS {}", quote_ident(c)))
                        .collect::<Vec<_>>()
                        .join(", "),
                };
                vec![format!("CREATE {}VIEW {} AS SELECT {};", or_replace, self.name(id), select)]
            }
            ObjectBody::Function(def) => {
                let body = if def.returns.eq_ignore_ascii_case("void") {
                    String::new()
                } else {
                    format!("SELECT NULL::{}", def.returns)
                };
                vec![format!(
                    "CREATE {}FUNCTION {} RETURNS {} LANGUAGE sql AS $${}$$;",
                    or_replace,
                    self.signature(id, def, true),
                    def.returns,
                    body
                )]
            }
            _ => self.create(id, &[]),
        }
    }

    fn completion(&self, id: ObjectId) -> Vec<String> {
        let object = self.object(id);
        match &object.body {
            ObjectBody::Constraint(def) => vec![self.add_constraint(id, def)],
            ObjectBody::View(def) => vec![format!(
                "CREATE OR REPLACE VIEW {} AS {};",
                self.name(id),
                def.query.trim_end_matches(';')
            )],
            ObjectBody::Function(def) => vec![self.function(id, def, true)],
            _ => self.create(id, &[]),
        }
    }

    // ── Alter ───────────────────────────────────────────────────────────

    fn alter(&self, before: &Writer<'_>, old_id: ObjectId, id: ObjectId) -> Vec<String> {
        let old = before.object(old_id);
        let new = self.object(id);
        let mut out = Vec::new();
        match (&old.body, &new.body) {
            (ObjectBody::Column(o), ObjectBody::Column(n)) => self.alter_column(id, o, n, &mut out),
            (ObjectBody::Table(o), ObjectBody::Table(n)) => self.alter_table(id, o, n, &mut out),
            (ObjectBody::Sequence(o), ObjectBody::Sequence(n)) if o != n => {
                out.push(format!("ALTER SEQUENCE {}{};", self.name(id), sequence_options(n)))
            }
            (ObjectBody::View(o), ObjectBody::View(n)) if o != n => out.push(format!(
                "CREATE OR REPLACE VIEW {} AS {};",
                self.name(id),
                n.query.trim_end_matches(';')
            )),
            (ObjectBody::Function(o), ObjectBody::Function(n)) if o != n => {
                out.push(self.function(id, n, true))
            }
            _ => {}
        }

        if old.owner != new.owner && has_owner(new.kind) {
            if let Some(owner) = &new.owner {
                out.push(format!("ALTER {} OWNER TO {};", self.addressed(id), quote_ident(owner)));
            }
        }
        if old.comment != new.comment {
            out.push(self.comment(id, new.comment.as_ref()));
        }
        for privilege in old.privileges.iter().filter(|p| !new.privileges.contains(p)) {
            out.push(self.revoke(id, privilege));
        }
        for privilege in new.privileges.iter().filter(|p| !old.privileges.contains(p)) {
            out.push(self.grant(id, privilege));
        }
        out
    }

    fn alter_column(&self, id: ObjectId, old: &ColumnDef, new: &ColumnDef, out: &mut Vec<String>) {
        let prefix = format!(
            "ALTER TABLE {} ALTER COLUMN {}",
            self.table_of(id),
            quote_ident(&self.object(id).name)
        );
        if old.data_type != new.data_type || old.collation != new.collation {
            let mut sql = format!("{} TYPE {}", prefix, new.data_type);
            if let Some(collation) = &new.collation {
                sql.push_str(&format!(" COLLATE {}", quote_ident(collation)));
            }
            sql.push(';');
            out.push(sql);
        }
        if old.default != new.default {
            out.push(match &new.default {
                Some(default) => format!("{} SET DEFAULT {};", prefix, default),
                None => format!("{} DROP DEFAULT;", prefix),
            });
        }
        if old.nullable != new.nullable {
            out.push(format!(
                "{} {} NOT NULL;",
                prefix,
                if new.nullable { "DROP" } else { "SET" }
            ));
        }
    }

    fn alter_table(&self, id: ObjectId, old: &TableDef, new: &TableDef, out: &mut Vec<String>) {
        let name = self.name(id);
        let removed: Vec<&str> = old
            .options
            .iter()
            .filter(|o| !new.options.contains(o))
            .map(|o| o.split('=').next().unwrap_or(o.as_str()).trim())
            .filter(|key| !new.options.iter().any(|n| n.split('=').next().map(str::trim) == Some(*key)))
            .collect();
        if !removed.is_empty() {
            out.push(format!("ALTER TABLE {} RESET ({});", name, removed.join(", ")));
        }
        let added: Vec<&str> = new
            .options
            .iter()
            .filter(|o| !old.options.contains(o))
            .map(String::as_str)
            .collect();
        if !added.is_empty() {
            out.push(format!("ALTER TABLE {} SET ({});", name, added.join(", ")));
        }
        if old.tablespace != new.tablespace {
            let tablespace = new.tablespace.as_deref().unwrap_or("pg_default");
            out.push(format!("ALTER TABLE {} SET TABLESPACE {};", name, quote_ident(tablespace)));
        }
        if old.unlogged != new.unlogged {
            out.push(format!(
                "ALTER TABLE {} SET {};",
                name,
                if new.unlogged { "UNLOGGED" } else { "LOGGED" }
            ));
        }
    }
}

fn has_owner(kind: ObjectKind) -> bool {
    matches!(
        kind,
        ObjectKind::Database
            | ObjectKind::Schema
            | ObjectKind::Type
            | ObjectKind::Sequence
            | ObjectKind::Table
            | ObjectKind::Function
            | ObjectKind::View
    )
}

fn column_clause(name: &str, def: &ColumnDef) -> String {
    let mut sql = format!("{} {}", quote_ident(name), def.data_type);
    if let Some(collation) = &def.collation {
        sql.push_str(&format!(" COLLATE {}", quote_ident(collation)));
    }
    if let Some(expression) = &def.generated {
        sql.push_str(&format!(" GENERATED ALWAYS AS ({}) STORED", expression));
    } else if let Some(default) = &def.default {
        sql.push_str(&format!(" DEFAULT {}", default));
    }
    if !def.nullable {
        sql.push_str(" NOT NULL");
    }
    sql
}

fn sequence_options(def: &SequenceDef) -> String {
    let mut sql = String::new();
    if let Some(data_type) = &def.data_type {
        sql.push_str(&format!(" AS {}", data_type));
    }
    sql.push_str(&format!(" INCREMENT BY {} START WITH {}", def.increment, def.start));
    if let Some(min) = def.min_value {
        sql.push_str(&format!(" MINVALUE {}", min));
    }
    if let Some(max) = def.max_value {
        sql.push_str(&format!(" MAXVALUE {}", max));
    }
    if def.cycle {
        sql.push_str(" CYCLE");
    }
    sql
}

#[cfg(test)]
#[path = "emitter_test.rs"]
mod tests;
