//! CLI command implementations

pub(crate) mod common;
pub(crate) mod deps;
pub(crate) mod diff;
pub(crate) mod plan;
