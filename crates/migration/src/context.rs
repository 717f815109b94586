//! Provider traits and run context
//!
//! These traits let the migration crate run without depending on a
//! terminal, a particular prompt library or a particular package layout.

use crate::diff::ManifestDiff;
use crate::types::{Candidate, Outcome};
use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use templating::Alignment;

/// Source of candidate packages
pub trait PackageSource: Send + Sync {
    /// Candidate packages, optionally restricted to one alignment
    ///
    /// A package whose manifest cannot be parsed is still returned, with
    /// the parse error in place of the document.
    fn list_candidates(&self, filter: Option<Alignment>) -> Result<Vec<Candidate>>;
}

/// Confirmation callback for interactive runs
pub trait Confirmer: Send {
    /// Show the pending change for a package before `confirm` is asked
    fn review(&mut self, _package: &Path, _diff: &ManifestDiff) {}

    /// Ask the user to confirm an action
    ///
    /// Returns `true` if the user confirmed.
    fn confirm(&mut self, prompt: &str) -> Result<bool>;
}

/// Progress callback for batch runs
pub trait ProgressCallback: Send {
    /// Called once with the number of packages about to be processed
    fn on_batch_start(&mut self, count: usize);

    /// Called when a package finishes, in completion order
    fn on_package_complete(&mut self, path: &Path, outcome: &Outcome);

    /// Called when the batch completes
    fn on_batch_complete(&mut self);
}

/// No-op progress callback
pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn on_batch_start(&mut self, _count: usize) {}
    fn on_package_complete(&mut self, _path: &Path, _outcome: &Outcome) {}
    fn on_batch_complete(&mut self) {}
}

/// Auto-confirm callback (always returns true)
pub struct AutoConfirm;

impl Confirmer for AutoConfirm {
    fn confirm(&mut self, _prompt: &str) -> Result<bool> {
        Ok(true)
    }
}

/// Auto-decline callback (always returns false)
pub struct AutoDecline;

impl Confirmer for AutoDecline {
    fn confirm(&mut self, _prompt: &str) -> Result<bool> {
        Ok(false)
    }
}

/// Shared cancellation flag
///
/// Checked before each package starts; packages already written stay
/// written.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_token_is_shared() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }
}
