//! # Migration
//!
//! Brings dbt packages into conformance with the template catalog while
//! keeping every customization their owners made.
//!
//! ## Pipeline
//!
//! Each package goes through:
//!
//! ```text
//! DISCOVER -> INFER -> RENDER -> MERGE -> DETECT -> { NO_OP | PREVIEW | CONFIRM -> APPLY }
//! ```
//!
//! - **Discover**: a [`PackageSource`] lists candidate packages
//! - **Infer**: alignment and template parameters from path and name
//! - **Render**: the catalog's template for that alignment
//! - **Merge**: [`templating::merge`] with the catalog's policy table
//! - **Detect**: [`manifest::equivalent`] against the manifest on disk
//! - **Apply**: back up artifacts, then atomically rewrite the manifest
//!
//! Package-level problems become a `Failed` outcome; a batch always runs
//! to the end.
//!
//! ## Provider Traits
//!
//! - [`PackageSource`]: where packages come from
//! - [`Confirmer`]: asks before each write in interactive runs
//! - [`ProgressCallback`]: receives per-package completion
//!
//! ## Example
//!
//! ```no_run
//! use migration::{FsPackageSource, MigrateOptions, MigrationMode, MigrationPlan, execute_simple};
//! use templating::TemplateCatalog;
//!
//! let catalog = TemplateCatalog::embedded()?;
//! let plan = MigrationPlan::discover(&FsPackageSource::new("."), None)?;
//! let opts = MigrateOptions::default().with_mode(MigrationMode::DryRun);
//! let report = execute_simple(&plan, &catalog, &opts)?;
//! println!("{} package(s) would change", report.summary.previewed);
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod backup;
pub mod context;
pub mod diff;
pub mod error;
pub mod executor;
pub mod inference;
pub mod planner;
pub mod record;
pub mod scaffold;
pub mod types;

// Re-export main types at crate root
pub use context::{
    AutoConfirm, AutoDecline, CancelToken, Confirmer, NoProgress, PackageSource, ProgressCallback,
};
pub use diff::{DiffLine, LineTag, ManifestDiff};
pub use error::{MigrationError, Result};
pub use executor::{conforms, execute, execute_simple, execute_with_cancel, migrate_package};
pub use inference::infer;
pub use planner::{FsPackageSource, MigrationPlan};
pub use record::MigrationRecord;
pub use scaffold::{ScaffoldReport, scaffold};
pub use types::{
    BACKUP_ARTIFACTS, BatchReport, BatchSummary, Candidate, MANIFEST_FILE, MigrateOptions,
    MigrationMode, Outcome,
};
