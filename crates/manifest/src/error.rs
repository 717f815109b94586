//! Error types for the manifest crate

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading or writing configuration documents
#[derive(Error, Debug)]
pub enum Error {
    /// The text is not valid YAML
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A mapping key is a sequence or mapping, which the document model cannot represent
    #[error("mapping key at {path} is not a scalar")]
    NonScalarKey { path: String },

    /// Failed to read a document from disk
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for manifest operations
pub type Result<T> = std::result::Result<T, Error>;
