//! Migration planning - package discovery and alignment filtering

use crate::context::PackageSource;
use crate::inference::infer;
use crate::types::{Candidate, MANIFEST_FILE};
use anyhow::{Context, Result};
use manifest::Node;
use std::path::{Path, PathBuf};
use templating::Alignment;
use walkdir::WalkDir;

/// Finds packages under `<root>/packages/**/dbt_project.yml`
#[derive(Debug, Clone)]
pub struct FsPackageSource {
    root: PathBuf,
}

impl FsPackageSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// A single package directory
    pub fn candidate(dir: &Path) -> Candidate {
        let document = manifest::load(&dir.join(MANIFEST_FILE)).map_err(|e| e.to_string());
        Candidate {
            dir: dir.to_path_buf(),
            document,
        }
    }
}

impl PackageSource for FsPackageSource {
    fn list_candidates(&self, filter: Option<Alignment>) -> Result<Vec<Candidate>> {
        let packages = self.root.join("packages");
        if !packages.is_dir() {
            log::debug!("No packages directory at {}", packages.display());
            return Ok(Vec::new());
        }

        let mut dirs = Vec::new();
        for entry in WalkDir::new(&packages).follow_links(false).sort_by_file_name() {
            let entry = entry.with_context(|| format!("Failed to walk {}", packages.display()))?;
            if entry.file_type().is_file() && entry.file_name() == MANIFEST_FILE {
                // dbt installs dependencies with their own manifests here
                if entry.path().components().any(|c| c.as_os_str() == "dbt_packages") {
                    continue;
                }
                if let Some(dir) = entry.path().parent() {
                    dirs.push(dir.to_path_buf());
                }
            }
        }

        let candidates = dirs
            .iter()
            .map(|dir| Self::candidate(dir))
            .filter(|candidate| matches_filter(candidate, filter))
            .collect();
        Ok(candidates)
    }
}

/// Whether a candidate belongs to the requested alignment
///
/// Unparsable manifests are judged by their path alone.
pub fn matches_filter(candidate: &Candidate, filter: Option<Alignment>) -> bool {
    let Some(wanted) = filter else {
        return true;
    };
    let null = Node::null();
    let document = candidate.document.as_ref().unwrap_or(&null);
    infer(&candidate.dir, document).0 == Some(wanted)
}

/// The ordered set of packages one run will process
#[derive(Debug, Default)]
pub struct MigrationPlan {
    pub candidates: Vec<Candidate>,
}

impl MigrationPlan {
    /// Discover candidates from a source
    pub fn discover<S: PackageSource + ?Sized>(
        source: &S,
        filter: Option<Alignment>,
    ) -> Result<Self> {
        let candidates = source.list_candidates(filter)?;
        log::info!("Discovered {} package(s)", candidates.len());
        Ok(Self { candidates })
    }

    /// A plan for exactly one package directory
    pub fn single(dir: &Path) -> Self {
        Self {
            candidates: vec![FsPackageSource::candidate(dir)],
        }
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}
