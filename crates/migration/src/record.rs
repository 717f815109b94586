//! Per-package migration records

use crate::diff::ManifestDiff;
use crate::types::Outcome;
use manifest::Node;
use serde::Serialize;
use std::path::PathBuf;
use templating::{Alignment, ParameterSet};

/// Everything one package went through in one run
///
/// Created per package per run and never persisted. The documents are
/// kept for callers that want to inspect them but left out of reports.
#[derive(Debug, Clone, Serialize)]
pub struct MigrationRecord {
    pub path: PathBuf,
    pub alignment: Option<Alignment>,
    pub params: ParameterSet,
    #[serde(skip)]
    pub rendered: Option<Node>,
    #[serde(skip)]
    pub existing: Option<Node>,
    #[serde(skip)]
    pub merged: Option<Node>,
    /// Fingerprint of the manifest before and after merging
    pub fingerprint_before: Option<String>,
    pub fingerprint_after: Option<String>,
    pub diff: Option<ManifestDiff>,
    pub applied: bool,
    pub backups: Vec<PathBuf>,
    pub outcome: Outcome,
}

impl MigrationRecord {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            alignment: None,
            params: ParameterSet::new(),
            rendered: None,
            existing: None,
            merged: None,
            fingerprint_before: None,
            fingerprint_after: None,
            diff: None,
            applied: false,
            backups: Vec::new(),
            outcome: Outcome::skipped("not started"),
        }
    }

    /// Finish the record with an outcome
    pub fn finish(mut self, outcome: Outcome) -> Self {
        self.applied = outcome.is_change();
        self.outcome = outcome;
        self
    }

    /// Package name, falling back to the directory name
    pub fn display_name(&self) -> String {
        self.params
            .get_str("package_name")
            .map(str::to_string)
            .or_else(|| {
                self.path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
            })
            .unwrap_or_else(|| self.path.display().to_string())
    }
}
