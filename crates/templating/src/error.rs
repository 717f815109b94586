//! Error types for templating

use std::path::PathBuf;
use thiserror::Error;

/// Which input a structural mismatch was found in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Template,
    Existing,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Template => f.write_str("template"),
            Self::Existing => f.write_str("existing document"),
        }
    }
}

/// Merge failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MergeError {
    #[error("at '{path}' in {side}: expected {expected}, found {found}")]
    Structural {
        path: String,
        expected: &'static str,
        found: String,
        side: Side,
    },
}

/// Render failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("missing template parameters: {}", .0.join(", "))]
    MissingParameters(Vec<String>),
}

/// Catalog loading and lookup errors
#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to read catalog {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid catalog: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid catalog template: {0}")]
    Document(#[from] manifest::Error),

    #[error("Catalog has no models variant for alignment '{0}'")]
    MissingVariant(String),

    #[error("Catalog section '{section}' must be a mapping")]
    NotAMapping { section: String },

    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Result type for catalog operations
pub type Result<T> = std::result::Result<T, Error>;
