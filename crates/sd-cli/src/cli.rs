//! CLI argument definitions using clap derive API

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Schemadelta - compare schema snapshots and plan ordered migrations
#[derive(Parser, Debug)]
#[command(name = "sdelta")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file (default: schemadelta.yml in the current directory, if any)
    #[arg(short, long, global = true, env = "SDELTA_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override the SQL dialect used to analyze definitions
    #[arg(short, long, global = true)]
    pub dialect: Option<String>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compare two snapshots and show the merged tree
    Diff(DiffArgs),

    /// Plan and render a migration from one snapshot to another
    Plan(PlanArgs),

    /// List objects that depend on (or are depended on by) matching objects
    Deps(DepsArgs),
}

/// Options shared by commands that compare two snapshots
#[derive(Args, Debug, Clone, Default)]
pub struct CompareArgs {
    /// Snapshot describing the current schema (YAML or JSON)
    pub old: PathBuf,

    /// Snapshot describing the desired schema (YAML or JSON)
    pub new: PathBuf,

    /// Ignore-rule file (overrides the config's ignore_rules)
    #[arg(short, long)]
    pub rules: Option<PathBuf>,

    /// Treat tables whose columns only moved as unchanged
    #[arg(long)]
    pub ignore_column_order: bool,
}

/// Arguments for the diff command
#[derive(Args, Debug)]
pub struct DiffArgs {
    #[command(flatten)]
    pub compare: CompareArgs,

    /// Show unchanged objects too
    #[arg(short, long)]
    pub all: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "tree")]
    pub output: DiffOutput,

    /// Exit with status 1 when the snapshots differ
    #[arg(long)]
    pub exit_code: bool,
}

/// Diff output formats
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffOutput {
    /// Indented tree with +/-/~ markers
    Tree,
    /// JSON tree
    Json,
}

/// Arguments for the plan command
#[derive(Args, Debug)]
pub struct PlanArgs {
    #[command(flatten)]
    pub compare: CompareArgs,

    /// Objects to migrate as KIND:qualified.name (repeatable; default: every change)
    #[arg(short, long = "select", value_name = "KIND:NAME")]
    pub select: Vec<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "sql")]
    pub output: PlanOutput,

    /// Write the script to a file instead of stdout
    #[arg(long)]
    pub out: Option<PathBuf>,
}

/// Plan output formats
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanOutput {
    /// Migration script
    Sql,
    /// One line per planned action
    Actions,
    /// Actions, diagnostics and script as JSON
    Json,
}

/// Arguments for the deps command
#[derive(Args, Debug)]
pub struct DepsArgs {
    /// Snapshot to analyze (YAML or JSON)
    pub snapshot: PathBuf,

    /// Object names to start from (qualified or simple; `*` for all)
    #[arg(required = true)]
    pub patterns: Vec<String>,

    /// Maximum number of hops (default: the config's default_depth)
    #[arg(long)]
    pub depth: Option<usize>,

    /// Follow dependencies instead of dependents
    #[arg(long)]
    pub reverse: bool,

    /// Treat patterns as regular expressions
    #[arg(long)]
    pub regex: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub output: DepsOutput,
}

/// Deps output formats
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepsOutput {
    /// Depth, kind and name per line
    Table,
    /// JSON list
    Json,
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
