//! Catalog commands - inspect and check template catalogs

use anyhow::{Context as _, Result, bail};
use std::path::Path;
use templating::{Alignment, TemplateCatalog};

use crate::Context;
use crate::cli::CatalogCommand;
use crate::ui;

pub fn run(ctx: &Context, cmd: CatalogCommand) -> Result<()> {
    match cmd {
        CatalogCommand::Show => show(ctx),
        CatalogCommand::Validate { path } => validate(&path),
    }
}

fn show(ctx: &Context) -> Result<()> {
    let catalog = ctx.config.load_catalog()?;
    let source = ctx
        .config
        .catalog_path()
        .map_or_else(|| "embedded".to_string(), |p| p.display().to_string());

    ui::header("Template Catalog");
    ui::kv("Version", catalog.version());
    ui::kv("Source", &source);
    ui::kv("Exemptions", &catalog.exemptions.markers().join(", "));
    ui::kv(
        "Managed variables",
        &catalog.policy().template_vars.len().to_string(),
    );

    ui::section("Variables");
    for (name, spec) in catalog.schema().iter() {
        let requirement = if spec.required {
            "required".to_string()
        } else if let Some(condition) = &spec.required_when {
            format!("required when {condition}")
        } else {
            "optional".to_string()
        };
        ui::kv(name, &requirement);
    }

    ui::section("Alignments");
    for alignment in Alignment::ALL {
        let layout = catalog.directory_structure(alignment);
        ui::kv(alignment.as_str(), &format!("{} directories", layout.len()));
        if ctx.verbose > 0 {
            for dir in layout {
                ui::dim(dir);
            }
        }
    }
    Ok(())
}

fn validate(path: &Path) -> Result<()> {
    let catalog =
        TemplateCatalog::load(path).with_context(|| format!("Invalid catalog {}", path.display()))?;

    let problems = catalog.check();
    if !problems.is_empty() {
        for problem in &problems {
            ui::error(problem);
        }
        bail!("{} problem(s) in {}", problems.len(), path.display());
    }

    ui::success(&format!(
        "{} is a valid catalog (template v{})",
        path.display(),
        catalog.version()
    ));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_validate_embedded_copy() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("catalog.yml");
        fs::write(&path, include_str!("../../crates/templating/catalog/default.yml")).unwrap();
        assert!(validate(&path).is_ok());
    }

    #[test]
    fn test_validate_reports_missing_variants() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("catalog.yml");
        fs::write(
            &path,
            concat!(
                "template_version: '0.1.0'\n",
                "templates:\n  dbt_project_yml:\n    base_config:\n",
                "      name: '{{ package_name }}'\n",
            ),
        )
        .unwrap();
        assert!(validate(&path).is_err());
    }

    #[test]
    fn test_validate_unreadable_file() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(validate(&tmp.path().join("missing.yml")).is_err());
    }
}
