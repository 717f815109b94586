//! Error types for package migration

use std::path::PathBuf;
use templating::{MergeError, RenderError};
use thiserror::Error;

/// Why a single package could not be migrated
///
/// These never abort a batch: the executor records them as the package's
/// `Failed` outcome and moves on.
#[derive(Error, Debug)]
pub enum MigrationError {
    #[error("invalid parameters: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("cannot infer alignment for {0}")]
    InferenceAmbiguous(PathBuf),

    #[error("merge failed {0}")]
    Structural(#[from] MergeError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unreadable manifest: {0}")]
    Parse(#[from] manifest::Error),

    #[error("template catalog: {0}")]
    Catalog(#[from] templating::Error),

    #[error("{} already exists", .0.display())]
    AlreadyExists(PathBuf),

    #[error("confirmation failed: {0}")]
    Prompt(String),
}

impl MigrationError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for migration operations
pub type Result<T> = std::result::Result<T, MigrationError>;
