//! Configuration types and parsing for schemadelta.yml

use crate::diff_tree::DiffOptions;
use crate::error::{CoreError, CoreResult};
use crate::ignore::IgnoreList;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file names probed by [`Config::load_from_dir`], in order.
pub const CONFIG_FILE_NAMES: [&str; 2] = ["schemadelta.yml", "schemadelta.yaml"];

/// Project configuration from schemadelta.yml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Dialect used to analyze view queries and function bodies
    #[serde(default)]
    pub dialect: Dialect,

    /// Treat tables whose columns only moved as unchanged
    #[serde(default)]
    pub ignore_column_order: bool,

    /// Path of an ignore-rule file, relative to the config file
    #[serde(default)]
    pub ignore_rules: Option<String>,

    /// Default traversal depth for dependency queries
    #[serde(default = "default_depth")]
    pub default_depth: usize,

    /// Match ignore-rule names without regard to case.
    /// Defaults to the dialect's identifier folding.
    #[serde(default)]
    pub case_insensitive_names: Option<bool>,

    /// Directory the config was loaded from
    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

/// SQL dialect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// ANSI SQL
    Generic,
    /// PostgreSQL
    #[default]
    Postgres,
    /// DuckDB SQL dialect
    DuckDb,
    /// Microsoft SQL Server
    MsSql,
    /// Snowflake SQL dialect
    Snowflake,
}

impl Dialect {
    /// Whether unquoted identifiers compare case-insensitively.
    pub fn case_insensitive(self) -> bool {
        match self {
            Dialect::Generic | Dialect::Postgres => false,
            Dialect::DuckDb | Dialect::MsSql | Dialect::Snowflake => true,
        }
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dialect::Generic => write!(f, "generic"),
            Dialect::Postgres => write!(f, "postgres"),
            Dialect::DuckDb => write!(f, "duckdb"),
            Dialect::MsSql => write!(f, "mssql"),
            Dialect::Snowflake => write!(f, "snowflake"),
        }
    }
}

impl std::str::FromStr for Dialect {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "generic" | "ansi" => Ok(Dialect::Generic),
            "postgres" | "postgresql" => Ok(Dialect::Postgres),
            "duckdb" => Ok(Dialect::DuckDb),
            "mssql" | "sqlserver" => Ok(Dialect::MsSql),
            "snowflake" => Ok(Dialect::Snowflake),
            other => Err(CoreError::ConfigInvalid {
                message: format!("unknown dialect '{}'", other),
            }),
        }
    }
}

fn default_depth() -> usize {
    DEFAULT_DEPTH
}

const DEFAULT_DEPTH: usize = 10;

impl Default for Config {
    fn default() -> Self {
        Self {
            dialect: Dialect::default(),
            ignore_column_order: false,
            ignore_rules: None,
            default_depth: DEFAULT_DEPTH,
            case_insensitive_names: None,
            base_dir: None,
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        let mut config: Config = serde_yaml::from_str(&content)?;
        config.validate()?;
        config.base_dir = path.parent().map(Path::to_path_buf);
        Ok(config)
    }

    /// Load configuration from a directory (looks for schemadelta.yml or schemadelta.yaml)
    pub fn load_from_dir(dir: &Path) -> CoreResult<Self> {
        CONFIG_FILE_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.exists())
            .map(|path| Self::load(&path))
            .unwrap_or_else(|| {
                Err(CoreError::ConfigNotFound {
                    path: dir.join(CONFIG_FILE_NAMES[0]).display().to_string(),
                })
            })
    }

    fn validate(&self) -> CoreResult<()> {
        if self.default_depth == 0 {
            return Err(CoreError::ConfigInvalid {
                message: "default_depth must be at least 1".to_string(),
            });
        }
        if matches!(&self.ignore_rules, Some(p) if p.trim().is_empty()) {
            return Err(CoreError::ConfigInvalid {
                message: "ignore_rules cannot be an empty path".to_string(),
            });
        }
        Ok(())
    }

    /// Effective name case-folding for ignore rules.
    pub fn names_case_insensitive(&self) -> bool {
        self.case_insensitive_names
            .unwrap_or_else(|| self.dialect.case_insensitive())
    }

    /// Absolute path of the configured rule file, if any.
    pub fn ignore_rules_path(&self) -> Option<PathBuf> {
        let rules = self.ignore_rules.as_ref()?;
        let path = Path::new(rules);
        Some(match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        })
    }

    /// Load the configured ignore list; a black list when none is set.
    pub fn ignore_list(&self) -> CoreResult<IgnoreList> {
        match self.ignore_rules_path() {
            Some(path) => {
                let content =
                    std::fs::read_to_string(&path).map_err(|e| CoreError::IoWithPath {
                        path: path.display().to_string(),
                        source: e,
                    })?;
                IgnoreList::parse_with_case(&content, self.names_case_insensitive())
            }
            None => Ok(IgnoreList::black()),
        }
    }

    pub fn diff_options(&self) -> DiffOptions {
        DiffOptions {
            ignore_column_order: self.ignore_column_order,
        }
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
