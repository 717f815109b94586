//! First-time package scaffolding
//!
//! Creates a package directory that already conforms to the catalog:
//! directory layout, `dbt_project.yml`, `packages.yml` and
//! `groups/_group.yml`, all rendered from the same parameters a later
//! migration would infer.

use crate::backup::write_atomic;
use crate::error::{MigrationError, Result};
use crate::inference::infer;
use crate::types::MANIFEST_FILE;
use manifest::Node;
use std::fs;
use std::path::{Path, PathBuf};
use templating::{Alignment, ParameterSet, TemplateCatalog};

/// What a scaffold run created (or would create)
#[derive(Debug, Clone)]
pub struct ScaffoldReport {
    pub alignment: Alignment,
    pub params: ParameterSet,
    pub directories: Vec<PathBuf>,
    pub files: Vec<PathBuf>,
}

/// Rendered contents of a new package
struct Rendered {
    project: String,
    packages: String,
    group: String,
}

/// Scaffold a new package named `name` at `dir`
///
/// The alignment comes from `dir` exactly as migration would infer it, so
/// the path must contain an alignment marker (or the name a `utils_`
/// prefix). Refuses to touch a directory that already has a manifest.
pub fn scaffold(
    dir: &Path,
    name: &str,
    catalog: &TemplateCatalog,
    dry_run: bool,
) -> Result<ScaffoldReport> {
    let manifest_path = dir.join(MANIFEST_FILE);
    if manifest_path.exists() {
        return Err(MigrationError::AlreadyExists(manifest_path));
    }

    let identity = Node::from_iter([("name".to_string(), Node::from(name))]);
    let (alignment, params) = infer(dir, &identity);
    let alignment = alignment.ok_or_else(|| MigrationError::InferenceAmbiguous(dir.to_path_buf()))?;

    let violations = catalog.validate_params(&params);
    if !violations.is_empty() {
        return Err(MigrationError::Validation(violations));
    }

    let rendered = Rendered {
        project: manifest::to_string(&catalog.render_project(alignment, &params)?)?,
        packages: manifest::to_string(&catalog.render_packages(alignment, &params)?)?,
        group: manifest::to_string(&catalog.render_group(&params)?)?,
    };

    let directories: Vec<PathBuf> = catalog
        .directory_structure(alignment)
        .iter()
        .map(|d| dir.join(d))
        .collect();
    let files = vec![
        manifest_path,
        dir.join("packages.yml"),
        dir.join("groups").join("_group.yml"),
    ];

    if dry_run {
        log::info!("Dry run: would scaffold {name} at {}", dir.display());
    } else {
        write_package(dir, &directories, &files, &rendered)?;
        log::info!("Scaffolded {name} ({alignment}) at {}", dir.display());
    }

    Ok(ScaffoldReport {
        alignment,
        params,
        directories,
        files,
    })
}

fn write_package(
    dir: &Path,
    directories: &[PathBuf],
    files: &[PathBuf],
    rendered: &Rendered,
) -> Result<()> {
    fs::create_dir_all(dir).map_err(|e| MigrationError::io(dir, e))?;
    for directory in directories {
        fs::create_dir_all(directory).map_err(|e| MigrationError::io(directory, e))?;
    }

    let contents = [&rendered.project, &rendered.packages, &rendered.group];
    for (path, text) in files.iter().zip(contents) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| MigrationError::io(parent, e))?;
        }
        write_atomic(path, text)?;
    }
    Ok(())
}
