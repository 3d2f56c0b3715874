//! Structural fingerprints for schema objects.
//!
//! A [`Fingerprint`] is a 64-bit non-cryptographic digest of an object's
//! semantic content. Ordered collections are folded in sequence; unordered
//! collections are combined with a commutative sum so that permuting them
//! leaves the digest untouched. Absent values contribute [`NULL_SENTINEL`],
//! which keeps "missing" apart from "empty".

use crate::kind::ObjectKind;
use crate::object::{
    ColumnDef, ConstraintDef, FunctionArg, FunctionDef, IndexDef, ObjectBody, Privilege,
    SchemaObject, SequenceDef, TableDef, TriggerDef, ViewDef,
};
use serde::Serialize;
use std::fmt;

const SEED: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;
const GOLDEN: u64 = 0x9e37_79b9_7f4a_7c15;

/// Contribution of an absent optional value.
pub const NULL_SENTINEL: u64 = 0x6e75_6c6c_6e75_6c6c;

/// Digest of an object's semantic content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Fingerprint(u64);

impl Fingerprint {
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Anything that can feed its semantic content into an [`ObjectHasher`].
pub trait Hashable {
    fn compute_hash(&self, hasher: &mut ObjectHasher);
}

/// Order-sensitive 64-bit accumulator.
#[derive(Debug, Clone)]
pub struct ObjectHasher {
    state: u64,
}

impl Default for ObjectHasher {
    fn default() -> Self {
        Self::new()
    }
}

/// splitmix64 finalizer
fn avalanche(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

fn hash_bytes(bytes: &[u8]) -> u64 {
    let mut h = SEED;
    for b in bytes {
        h ^= u64::from(*b);
        h = h.wrapping_mul(FNV_PRIME);
    }
    avalanche(h ^ bytes.len() as u64)
}

impl ObjectHasher {
    pub fn new() -> Self {
        Self { state: SEED }
    }

    fn mix(&mut self, value: u64) {
        self.state = avalanche(self.state.rotate_left(27) ^ value.wrapping_add(GOLDEN));
    }

    pub fn put_bool(&mut self, value: bool) -> &mut Self {
        self.mix(if value { 0x7472_7565 } else { 0x6661_6c73 });
        self
    }

    pub fn put_u64(&mut self, value: u64) -> &mut Self {
        self.mix(value);
        self
    }

    pub fn put_i64(&mut self, value: i64) -> &mut Self {
        self.mix(value as u64);
        self
    }

    pub fn put_opt_i64(&mut self, value: Option<i64>) -> &mut Self {
        match value {
            Some(v) => {
                self.mix(1);
                self.mix(v as u64)
            }
            None => self.mix(NULL_SENTINEL),
        }
        self
    }

    pub fn put_str(&mut self, value: &str) -> &mut Self {
        self.mix(hash_bytes(value.as_bytes()));
        self
    }

    pub fn put_opt_str(&mut self, value: Option<&str>) -> &mut Self {
        match value {
            Some(v) => {
                self.mix(1);
                self.put_str(v);
            }
            None => self.mix(NULL_SENTINEL),
        }
        self
    }

    /// Enum tags hash by their stable keyword, never by discriminant.
    pub fn put_tag(&mut self, tag: &str) -> &mut Self {
        self.mix(hash_bytes(tag.as_bytes()).rotate_left(7));
        self
    }

    pub fn put_kind(&mut self, kind: ObjectKind) -> &mut Self {
        self.put_tag(kind.keyword())
    }

    pub fn put_hashable<H: Hashable + ?Sized>(&mut self, value: &H) -> &mut Self {
        let digest = fingerprint_of(value);
        self.mix(digest.0);
        self
    }

    pub fn put_fingerprint(&mut self, value: Fingerprint) -> &mut Self {
        self.mix(value.0);
        self
    }

    /// Fold a sequence in order.
    pub fn put_ordered<'a, H, I>(&mut self, items: I) -> &mut Self
    where
        H: Hashable + 'a,
        I: IntoIterator<Item = &'a H>,
    {
        let mut count = 0u64;
        for item in items {
            self.put_hashable(item);
            count += 1;
        }
        self.mix(count);
        self
    }

    pub fn put_ordered_strs<S: AsRef<str>>(&mut self, items: &[S]) -> &mut Self {
        for item in items {
            self.put_str(item.as_ref());
        }
        self.mix(items.len() as u64);
        self
    }

    /// Combine a set; the result does not depend on iteration order.
    pub fn put_unordered<'a, H, I>(&mut self, items: I) -> &mut Self
    where
        H: Hashable + 'a,
        I: IntoIterator<Item = &'a H>,
    {
        self.put_unordered_fingerprints(items.into_iter().map(|item| fingerprint_of(item)))
    }

    pub fn put_unordered_strs<S: AsRef<str>>(&mut self, items: &[S]) -> &mut Self {
        let mut sum = 0u64;
        for item in items {
            sum = sum.wrapping_add(hash_bytes(item.as_ref().as_bytes()));
        }
        self.mix(sum);
        self.mix(items.len() as u64);
        self
    }

    pub fn put_unordered_fingerprints<I>(&mut self, items: I) -> &mut Self
    where
        I: IntoIterator<Item = Fingerprint>,
    {
        let mut sum = 0u64;
        let mut count = 0u64;
        for item in items {
            sum = sum.wrapping_add(avalanche(item.0));
            count += 1;
        }
        self.mix(sum);
        self.mix(count);
        self
    }

    pub fn finish(&self) -> Fingerprint {
        Fingerprint(avalanche(self.state))
    }
}

/// Fingerprint a single hashable value.
pub fn fingerprint_of<H: Hashable + ?Sized>(value: &H) -> Fingerprint {
    let mut hasher = ObjectHasher::new();
    value.compute_hash(&mut hasher);
    hasher.finish()
}

impl Hashable for str {
    fn compute_hash(&self, hasher: &mut ObjectHasher) {
        hasher.put_str(self);
    }
}

impl Hashable for String {
    fn compute_hash(&self, hasher: &mut ObjectHasher) {
        hasher.put_str(self);
    }
}

impl Hashable for Privilege {
    fn compute_hash(&self, hasher: &mut ObjectHasher) {
        hasher
            .put_str(&self.grantee)
            .put_str(&self.privilege.to_ascii_uppercase())
            .put_bool(self.with_grant_option);
    }
}

impl Hashable for TableDef {
    fn compute_hash(&self, hasher: &mut ObjectHasher) {
        hasher
            .put_unordered_strs(&self.options)
            .put_opt_str(self.tablespace.as_deref())
            .put_bool(self.unlogged);
    }
}

impl Hashable for ColumnDef {
    fn compute_hash(&self, hasher: &mut ObjectHasher) {
        hasher
            .put_str(&self.data_type)
            .put_bool(self.nullable)
            .put_opt_str(self.default.as_deref())
            .put_opt_str(self.collation.as_deref())
            .put_opt_str(self.generated.as_deref());
    }
}

impl Hashable for ConstraintDef {
    fn compute_hash(&self, hasher: &mut ObjectHasher) {
        match self {
            ConstraintDef::PrimaryKey { columns } => {
                hasher.put_tag("PRIMARY KEY").put_ordered_strs(columns);
            }
            ConstraintDef::Unique { columns } => {
                hasher.put_tag("UNIQUE").put_ordered_strs(columns);
            }
            ConstraintDef::Check { expression } => {
                hasher.put_tag("CHECK").put_str(expression);
            }
            ConstraintDef::ForeignKey {
                columns,
                references_schema,
                references_table,
                references_columns,
                on_delete,
                on_update,
            } => {
                hasher
                    .put_tag("FOREIGN KEY")
                    .put_ordered_strs(columns)
                    .put_opt_str(references_schema.as_deref())
                    .put_str(references_table)
                    .put_ordered_strs(references_columns)
                    .put_opt_str(on_delete.as_deref())
                    .put_opt_str(on_update.as_deref());
            }
        }
    }
}

impl Hashable for IndexDef {
    fn compute_hash(&self, hasher: &mut ObjectHasher) {
        hasher
            .put_ordered_strs(&self.columns)
            .put_bool(self.unique)
            .put_opt_str(self.method.as_deref())
            .put_opt_str(self.predicate.as_deref());
    }
}

impl Hashable for ViewDef {
    fn compute_hash(&self, hasher: &mut ObjectHasher) {
        hasher
            .put_str(&self.query)
            .put_ordered_strs(&self.columns)
            .put_ordered_strs(&self.column_types)
            .put_bool(self.materialized);
    }
}

impl Hashable for FunctionArg {
    fn compute_hash(&self, hasher: &mut ObjectHasher) {
        hasher
            .put_opt_str(self.name.as_deref())
            .put_str(&self.data_type)
            .put_opt_str(self.default.as_deref());
    }
}

impl Hashable for FunctionDef {
    fn compute_hash(&self, hasher: &mut ObjectHasher) {
        hasher
            .put_ordered(&self.arguments)
            .put_str(&self.returns)
            .put_str(&self.language.to_ascii_lowercase())
            .put_str(&self.body)
            .put_opt_str(self.volatility.as_deref());
    }
}

impl Hashable for SequenceDef {
    fn compute_hash(&self, hasher: &mut ObjectHasher) {
        hasher
            .put_opt_str(self.data_type.as_deref())
            .put_i64(self.start)
            .put_i64(self.increment)
            .put_opt_i64(self.min_value)
            .put_opt_i64(self.max_value)
            .put_bool(self.cycle);
    }
}

impl Hashable for TriggerDef {
    fn compute_hash(&self, hasher: &mut ObjectHasher) {
        hasher
            .put_str(&self.timing.to_ascii_uppercase())
            .put_unordered_strs(&self.events)
            .put_str(&self.function)
            .put_bool(self.for_each_row)
            .put_opt_str(self.when.as_deref());
    }
}

impl Hashable for ObjectBody {
    fn compute_hash(&self, hasher: &mut ObjectHasher) {
        match self {
            ObjectBody::None => {
                hasher.put_tag("none");
            }
            ObjectBody::Table(def) => {
                hasher.put_tag("table").put_hashable(def);
            }
            ObjectBody::Column(def) => {
                hasher.put_tag("column").put_hashable(def);
            }
            ObjectBody::Constraint(def) => {
                hasher.put_tag("constraint").put_hashable(def);
            }
            ObjectBody::Index(def) => {
                hasher.put_tag("index").put_hashable(def);
            }
            ObjectBody::View(def) => {
                hasher.put_tag("view").put_hashable(def);
            }
            ObjectBody::Function(def) => {
                hasher.put_tag("function").put_hashable(def);
            }
            ObjectBody::Sequence(def) => {
                hasher.put_tag("sequence").put_hashable(def);
            }
            ObjectBody::Trigger(def) => {
                hasher.put_tag("trigger").put_hashable(def);
            }
            ObjectBody::Definition(text) => {
                hasher.put_tag("definition").put_str(text);
            }
        }
    }
}

/// Own content of an object: identity, metadata and body, without children.
impl Hashable for SchemaObject {
    fn compute_hash(&self, hasher: &mut ObjectHasher) {
        hasher
            .put_kind(self.kind)
            .put_str(&self.name)
            .put_opt_str(self.owner.as_deref())
            .put_opt_str(self.comment.as_deref())
            .put_unordered(&self.privileges)
            .put_hashable(&self.body);
    }
}

/// Full fingerprint of an object given the fingerprints of its children.
///
/// Column children are folded in declaration order; every other child kind
/// is combined as a set.
pub fn combine_with_children(
    own: Fingerprint,
    children: impl IntoIterator<Item = (ObjectKind, Fingerprint)>,
) -> Fingerprint {
    let mut hasher = ObjectHasher::new();
    hasher.put_fingerprint(own);
    let mut columns = ObjectHasher::new();
    let mut column_count = 0u64;
    let mut others = Vec::new();
    for (kind, fingerprint) in children {
        if kind == ObjectKind::Column {
            columns.put_fingerprint(fingerprint);
            column_count += 1;
        } else {
            others.push(fingerprint);
        }
    }
    columns.put_u64(column_count);
    hasher
        .put_fingerprint(columns.finish())
        .put_unordered_fingerprints(others);
    hasher.finish()
}

#[cfg(test)]
#[path = "hasher_test.rs"]
mod tests;
