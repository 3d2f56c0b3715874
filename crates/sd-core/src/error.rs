//! Error types for sd-core

use thiserror::Error;

/// Core error type for Schemadelta
#[derive(Error, Debug)]
pub enum CoreError {
    /// E001: Configuration file not found
    #[error("[E001] Config file not found: {path}")]
    ConfigNotFound { path: String },

    /// E002: Invalid configuration value
    #[error("[E002] Invalid config: {message}")]
    ConfigInvalid { message: String },

    /// E003: An ignore rule could not be parsed or its pattern does not compile
    #[error("[E003] Malformed ignore rule at line {line} ('{rule}'): {reason}")]
    MalformedRule {
        line: usize,
        rule: String,
        reason: String,
    },

    /// E004: Two siblings share the same identity (kind + name)
    #[error("[E004] Duplicate {kind} '{name}' in snapshot")]
    DuplicateObject { kind: String, name: String },

    /// E005: Snapshot structure is invalid
    #[error("[E005] Invalid snapshot: {message}")]
    InvalidSnapshot { message: String },

    /// E006: Unknown object kind keyword
    #[error("[E006] Unknown object kind '{value}'")]
    UnknownObjectKind { value: String },

    /// E007: Cooperative cancellation was observed
    #[error("[E007] Operation cancelled")]
    Cancelled,

    /// E008: IO error
    #[error("[E008] IO error: {0}")]
    Io(#[from] std::io::Error),

    /// E009: IO error with file path context
    #[error("[E009] Failed to read '{path}': {source}")]
    IoWithPath {
        path: String,
        source: std::io::Error,
    },

    /// E010: YAML parse error
    #[error("[E010] YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CoreError {
    /// Returns `true` when this value signals cancellation rather than a failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, CoreError::Cancelled)
    }
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;
