//! sd-core - Core library for Schemadelta
//!
//! This crate provides the schema object model and snapshot arena, content
//! fingerprints, ignore rules, the merged diff tree and the dependency graph
//! used by the migration planner and the CLI.

pub mod cancel;
pub mod checksum;
pub mod config;
pub mod dag;
pub mod diff_tree;
pub mod error;
pub mod hasher;
pub mod ignore;
pub mod kind;
pub mod loader;
pub mod object;
pub mod pattern;
pub mod reference;
pub(crate) mod serde_helpers;
pub mod snapshot;

pub use cancel::CancelFlag;
pub use checksum::{checksum_statements, compute_checksum};
pub use config::{Config, Dialect};
pub use dag::{DependencyGraph, DependentMatch, UnresolvedReference};
pub use diff_tree::{build_diff_tree, diff_tree, DiffNode, DiffOptions, NodeKey, Selection, Side};
pub use error::{CoreError, CoreResult};
pub use hasher::{fingerprint_of, Fingerprint, Hashable, ObjectHasher};
pub use ignore::{IgnoreList, IgnoreRule, Verdict};
pub use kind::ObjectKind;
pub use loader::{ObjectSpec, SnapshotFile};
pub use object::{
    ColumnDef, ConstraintDef, FunctionArg, FunctionDef, IndexDef, ObjectBody, ObjectId,
    Privilege, SchemaObject, SequenceDef, TableDef, TriggerDef, ViewDef,
};
pub use pattern::NamePattern;
pub use reference::{
    ChainedAnalyzer, DeclaredReferences, Reference, ReferenceAnalyzer, SourceLocation,
    StructuralReferences,
};
pub use snapshot::{Snapshot, SnapshotBuilder};
