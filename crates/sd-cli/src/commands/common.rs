//! Shared utilities for CLI commands

use anyhow::{bail, Context, Result};
use sd_core::{
    diff_tree, CancelFlag, ChainedAnalyzer, Config, CoreError, DeclaredReferences,
    DependencyGraph, DiffNode, DiffOptions, IgnoreList, NodeKey, ObjectKind, Snapshot,
    StructuralReferences,
};
use sd_sql::SqlReferenceAnalyzer;
use std::fmt;
use std::path::Path;

use crate::cli::{CompareArgs, GlobalArgs};

/// Error type representing a non-zero process exit code.
///
/// Use `return Err(ExitCode(N).into())` instead of `std::process::exit(N)`
/// so that destructors run before the process ends.
#[derive(Debug)]
pub(crate) struct ExitCode(pub(crate) i32);

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Control flow only; main prints nothing for it.
        write!(f, "")
    }
}

impl std::error::Error for ExitCode {}

/// Load the config named by `--config`, else `schemadelta.yml` in the
/// current directory, else defaults. `--dialect` overrides the file.
pub(crate) fn load_config(global: &GlobalArgs) -> Result<Config> {
    let mut config = match &global.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => {
            let cwd = std::env::current_dir().context("Failed to read current directory")?;
            match Config::load_from_dir(&cwd) {
                Ok(config) => config,
                Err(CoreError::ConfigNotFound { .. }) => Config::default(),
                Err(err) => return Err(err).context("Failed to load config"),
            }
        }
    };
    if let Some(dialect) = &global.dialect {
        config.dialect = dialect.parse().context("Invalid --dialect")?;
    }
    log::debug!("Using dialect {}", config.dialect);
    Ok(config)
}

/// Load a YAML or JSON snapshot file.
pub(crate) fn load_snapshot(path: &Path) -> Result<Snapshot> {
    Snapshot::load(path).with_context(|| format!("Failed to load snapshot {}", path.display()))
}

/// Declared references, structural references and SQL analysis combined.
pub(crate) fn analyzer(config: &Config) -> ChainedAnalyzer {
    ChainedAnalyzer::new()
        .with(DeclaredReferences)
        .with(StructuralReferences)
        .with(SqlReferenceAnalyzer::new(config.dialect))
}

/// Build the dependency graph of one snapshot.
pub(crate) fn build_graph(
    snapshot: &Snapshot,
    analyzer: &ChainedAnalyzer,
    cancel: &CancelFlag,
) -> Result<DependencyGraph> {
    let graph = DependencyGraph::build(snapshot, analyzer, cancel).with_context(|| {
        format!(
            "Failed to analyze dependencies of {}",
            snapshot.get(snapshot.root()).name
        )
    })?;
    for unresolved in graph.unresolved() {
        log::debug!(
            "{} references unknown {}",
            snapshot.qualified_name(unresolved.object),
            unresolved.reference
        );
    }
    Ok(graph)
}

/// Ignore rules from `--rules`, else from the config.
pub(crate) fn ignore_list(args: &CompareArgs, config: &Config) -> Result<IgnoreList> {
    match &args.rules {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read rules {}", path.display()))?;
            IgnoreList::parse_with_case(&content, config.names_case_insensitive())
                .with_context(|| format!("Invalid rules in {}", path.display()))
        }
        None => config.ignore_list().context("Failed to load ignore rules"),
    }
}

/// Two loaded snapshots and their filtered diff tree.
pub(crate) struct Comparison {
    pub(crate) old: Snapshot,
    pub(crate) new: Snapshot,
    pub(crate) tree: DiffNode,
    pub(crate) options: DiffOptions,
}

pub(crate) fn compare(args: &CompareArgs, config: &Config, cancel: &CancelFlag) -> Result<Comparison> {
    let old = load_snapshot(&args.old)?;
    let new = load_snapshot(&args.new)?;
    let rules = ignore_list(args, config)?;
    let mut options = config.diff_options();
    options.ignore_column_order |= args.ignore_column_order;

    let tree = diff_tree(&old, &new, &rules, &options, cancel).context("Failed to compare snapshots")?;
    Ok(Comparison {
        old,
        new,
        tree,
        options,
    })
}

/// Parse a `KIND:qualified.name` selector.
pub(crate) fn parse_selector(text: &str) -> Result<NodeKey> {
    let Some((kind, name)) = text.split_once(':') else {
        bail!("Selector '{}' must look like KIND:qualified.name", text);
    };
    let kind: ObjectKind = kind
        .parse()
        .with_context(|| format!("Invalid selector '{}'", text))?;
    let name = name.trim();
    if name.is_empty() {
        bail!("Selector '{}' has no object name", text);
    }
    Ok(NodeKey::new(kind, name))
}

#[cfg(test)]
#[path = "common_test.rs"]
mod tests;
