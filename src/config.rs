//! `conform.toml` settings
//!
//! Lookup order: `--config` flag, `./conform.toml`, then
//! `<config_dir>/config.toml`. A missing file means defaults.

use anyhow::{Context, Result, bail};
use migration::{MigrateOptions, MigrationMode};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use templating::TemplateCatalog;

use crate::paths;

/// Config file looked up in the working directory
pub const LOCAL_FILE: &str = "conform.toml";

/// Environment variable overriding the catalog path
pub const ENV_CATALOG: &str = "CONFORM_CATALOG";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Repository root containing `packages/`
    pub packages_root: Option<String>,
    /// Template catalog file; the embedded catalog when unset
    pub catalog: Option<String>,
    /// Suffix appended to backed-up artifacts
    pub backup_suffix: Option<String>,
    /// Parallel packages for non-interactive batch runs
    pub jobs: Option<usize>,
}

impl Config {
    /// Load settings, returning the file they came from (if any)
    pub fn load(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>)> {
        let Some(path) = locate(explicit)? else {
            log::debug!("No config file found, using defaults");
            return Ok((Self::default(), None));
        };

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        let config = Self::parse(&content)
            .with_context(|| format!("Invalid config in {}", path.display()))?;
        log::debug!("Loaded config from {}", path.display());
        Ok((config, Some(path)))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Repository root, `.` when unset
    pub fn packages_root(&self) -> PathBuf {
        self.packages_root
            .as_deref()
            .map_or_else(|| PathBuf::from("."), paths::expand)
    }

    /// Catalog path: `CONFORM_CATALOG`, then the config file
    pub fn catalog_path(&self) -> Option<PathBuf> {
        std::env::var(ENV_CATALOG)
            .ok()
            .filter(|v| !v.is_empty())
            .or_else(|| self.catalog.clone())
            .map(|p| paths::expand(&p))
    }

    /// The catalog every command runs against
    pub fn load_catalog(&self) -> Result<TemplateCatalog> {
        match self.catalog_path() {
            Some(path) => {
                log::info!("Using template catalog {}", path.display());
                TemplateCatalog::load(&path)
                    .with_context(|| format!("Could not load template catalog {}", path.display()))
            }
            None => TemplateCatalog::embedded().context("Embedded template catalog is invalid"),
        }
    }

    /// Run options for a migration in `mode`
    pub fn migrate_options(&self, mode: MigrationMode, jobs: Option<usize>) -> MigrateOptions {
        let mut opts = MigrateOptions::default().with_mode(mode);
        if let Some(jobs) = jobs.or(self.jobs) {
            opts = opts.with_jobs(jobs);
        }
        if let Some(suffix) = &self.backup_suffix {
            opts.backup_suffix.clone_from(suffix);
        }
        opts
    }
}

/// First existing config file in lookup order
///
/// An explicit path must exist.
fn locate(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
    if let Some(path) = explicit {
        if !path.is_file() {
            bail!("Config file not found: {}", path.display());
        }
        return Ok(Some(path.to_path_buf()));
    }

    let local = PathBuf::from(LOCAL_FILE);
    if local.is_file() {
        return Ok(Some(local));
    }

    let global = paths::config_dir()?.join("config.toml");
    Ok(global.is_file().then_some(global))
}

// ============================================================================
// Tests
// ============================================================================
