use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RulegenError {
    #[error("Invalid selection: {0}")]
    InvalidSelection(String),

    #[error("Unknown target: {0}")]
    UnknownTarget(String),

    #[error("Failed to create generated root for target '{target}' at {path}: {reason}")]
    RootCreate {
        target: String,
        path: PathBuf,
        reason: String,
    },

    #[error("Fragment store error: {0}")]
    Store(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml_bw::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, RulegenError>;

/// Recoverable conditions collected during a run.
///
/// Warnings never abort a run; they leave a gap in the output and are
/// aggregated into the per-target summary instead of propagating as errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Warning {
    /// A selected category had no fragments in the store.
    FragmentNotFound { category: String },

    /// A fragment declared a glob that failed to parse; the fragment is
    /// excluded from the run.
    InvalidPathScope {
        fragment: String,
        pattern: String,
        reason: String,
    },

    /// An adapter had no mapping rule for a fragment's category; the
    /// fragment is skipped for that target only.
    UnmappedCategory { target: String, fragment: String },

    /// Two fragments at the same precedence tier claimed the same override
    /// key. Neither suppresses the other.
    AmbiguousOverride {
        key: String,
        first: String,
        second: String,
    },

    /// A file in the fragments directory could not be loaded as a fragment.
    InvalidFragment { path: String, reason: String },

    /// A single file write failed; remaining writes proceeded.
    WriteFailed { path: String, reason: String },
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FragmentNotFound { category } => {
                write!(f, "No fragments found for category: {}", category)
            }
            Self::InvalidPathScope {
                fragment,
                pattern,
                reason,
            } => {
                write!(
                    f,
                    "Invalid path scope '{}' on fragment {}: {}",
                    pattern, fragment, reason
                )
            }
            Self::UnmappedCategory { target, fragment } => {
                write!(
                    f,
                    "No mapping in target '{}' for fragment {}",
                    target, fragment
                )
            }
            Self::AmbiguousOverride { key, first, second } => {
                write!(
                    f,
                    "Override key '{}' claimed by both {} and {} at the same tier",
                    key, first, second
                )
            }
            Self::InvalidFragment { path, reason } => {
                write!(f, "Skipped fragment file {}: {}", path, reason)
            }
            Self::WriteFailed { path, reason } => {
                write!(f, "Failed to write {}: {}", path, reason)
            }
        }
    }
}
