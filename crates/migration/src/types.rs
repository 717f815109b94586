//! Core types for package migration

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Manifest file name inside a package directory
pub const MANIFEST_FILE: &str = "dbt_project.yml";

/// Artifacts backed up before a manifest is rewritten, relative to the package
pub const BACKUP_ARTIFACTS: [&str; 3] = [MANIFEST_FILE, "packages.yml", "groups/_group.yml"];

/// Terminal state of one package in a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// Not migrated (no alignment signal, declined, cancelled)
    Skipped { reason: String },
    /// Already conforms
    NoOp,
    /// Dry run: a change was computed but not written
    Previewed,
    /// Manifest rewritten
    Applied,
    /// Package-level error
    Failed { reason: String },
}

impl Outcome {
    pub fn skipped(reason: impl Into<String>) -> Self {
        Self::Skipped {
            reason: reason.into(),
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
        }
    }

    /// Check if the outcome represents a change on disk
    pub fn is_change(&self) -> bool {
        matches!(self, Self::Applied)
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Skipped { .. } => f.write_str("SKIPPED"),
            Self::NoOp => f.write_str("NO_OP"),
            Self::Previewed => f.write_str("PREVIEW"),
            Self::Applied => f.write_str("APPLIED"),
            Self::Failed { reason } => write!(f, "FAILED:{reason}"),
        }
    }
}

/// How changes are handled once detected
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationMode {
    /// Compute and show diffs, write nothing
    DryRun,
    /// Ask before each write
    #[default]
    Interactive,
    /// Write without asking
    Forced,
}

/// Options for a migration run
#[derive(Debug, Clone)]
pub struct MigrateOptions {
    pub mode: MigrationMode,
    /// Number of parallel jobs (ignored when interactive)
    pub jobs: usize,
    /// Suffix appended to backed-up artifacts
    pub backup_suffix: String,
}

impl Default for MigrateOptions {
    fn default() -> Self {
        Self {
            mode: MigrationMode::default(),
            jobs: 4,
            backup_suffix: ".bak".to_string(),
        }
    }
}

impl MigrateOptions {
    pub fn with_mode(mut self, mode: MigrationMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    /// Effective parallelism: prompts are serialized, so interactive runs
    /// use one worker
    pub fn effective_jobs(&self) -> usize {
        match self.mode {
            MigrationMode::Interactive => 1,
            _ => self.jobs.max(1),
        }
    }
}

/// Counts per outcome
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub applied: usize,
    pub previewed: usize,
    pub no_op: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl BatchSummary {
    /// Add an outcome to the summary
    pub fn add(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Applied => self.applied += 1,
            Outcome::Previewed => self.previewed += 1,
            Outcome::NoOp => self.no_op += 1,
            Outcome::Skipped { .. } => self.skipped += 1,
            Outcome::Failed { .. } => self.failed += 1,
        }
    }

    /// Total number of packages processed
    pub fn total(&self) -> usize {
        self.applied + self.previewed + self.no_op + self.skipped + self.failed
    }

    /// Check if the run had no failures
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

/// Result of a batch run
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub template_version: String,
    pub mode: MigrationMode,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub summary: BatchSummary,
    /// One record per package, in discovery order
    pub records: Vec<crate::record::MigrationRecord>,
}

/// A package found by discovery
#[derive(Debug, Clone)]
pub struct Candidate {
    /// Package directory
    pub dir: PathBuf,
    /// Parsed manifest, or why it could not be read
    pub document: std::result::Result<manifest::Node, String>,
}

impl Candidate {
    pub fn manifest_path(&self) -> PathBuf {
        self.dir.join(MANIFEST_FILE)
    }
}
