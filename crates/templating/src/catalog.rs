//! The template catalog: the organization's current manifest standard
//!
//! A catalog is loaded once (embedded default or a file) and passed around
//! by reference. It owns the templates, the parameter schema, the merge
//! policy and the changelog of standard revisions.

use crate::alignment::Alignment;
use crate::error::{Error, Result};
use crate::params::ParameterSet;
use crate::policy::PolicyTable;
use crate::render::{ExemptionList, Renderer};
use crate::schema::Schema;
use indexmap::IndexMap;
use manifest::{Mapping, Node};
use serde::Deserialize;
use std::path::Path;

const DEFAULT_CATALOG: &str = include_str!("../catalog/default.yml");

/// Parsed template catalog
#[derive(Debug, Clone, Deserialize)]
pub struct TemplateCatalog {
    pub template_version: String,
    #[serde(default)]
    pub variables: Schema,
    #[serde(default)]
    pub exemptions: ExemptionList,
    pub templates: Templates,
    #[serde(default)]
    pub merge_policy: PolicyTable,
    #[serde(default)]
    pub directory_structures: IndexMap<String, Vec<String>>,
    #[serde(default)]
    pub migrations: Vec<MigrationEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Templates {
    pub dbt_project_yml: ProjectTemplates,
    #[serde(default)]
    pub packages_yml: PackagesTemplates,
    #[serde(default)]
    pub group_yml: GroupTemplate,
}

/// Pieces of `dbt_project.yml`
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectTemplates {
    pub base_config: Node,
    /// `base` plus one variant per alignment
    #[serde(default)]
    pub models: IndexMap<String, Node>,
    #[serde(default)]
    pub vars: Node,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PackagesTemplates {
    pub base_packages: Vec<Node>,
    pub alignment_specific: IndexMap<String, Vec<Node>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GroupTemplate {
    pub template: Node,
}

/// One revision of the standard
#[derive(Debug, Clone, Deserialize)]
pub struct MigrationEntry {
    pub version: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub changes: Vec<Node>,
}

impl MigrationEntry {
    pub fn change_count(&self) -> usize {
        self.changes.len()
    }
}

impl TemplateCatalog {
    /// The catalog compiled into the binary
    pub fn embedded() -> Result<Self> {
        Self::from_str(DEFAULT_CATALOG)
    }

    /// Parse catalog YAML
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(text: &str) -> Result<Self> {
        let catalog: Self = serde_yaml::from_str(text)?;
        catalog.ensure_mappings()?;
        log::debug!("Loaded template catalog v{}", catalog.template_version);
        Ok(catalog)
    }

    /// Read and parse a catalog file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| Error::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_str(&text)
    }

    pub fn version(&self) -> &str {
        &self.template_version
    }

    pub fn policy(&self) -> &PolicyTable {
        &self.merge_policy
    }

    pub fn schema(&self) -> &Schema {
        &self.variables
    }

    pub fn renderer(&self) -> Renderer {
        Renderer::new(self.exemptions.clone())
    }

    /// Check a parameter set against the catalog's schema
    pub fn validate_params(&self, params: &ParameterSet) -> Vec<String> {
        self.variables.validate(params)
    }

    /// Unrendered `dbt_project.yml` template for an alignment
    ///
    /// `models` is the `base` section updated key by key with the
    /// alignment's variant; `vars` is appended last.
    pub fn project_template(&self, alignment: Alignment) -> Result<Node> {
        let project = &self.templates.dbt_project_yml;
        let mut doc = mapping_of(&project.base_config, "templates.dbt_project_yml.base_config")?;

        let mut models = match project.models.get("base") {
            Some(base) => mapping_of(base, "templates.dbt_project_yml.models.base")?,
            None => Mapping::new(),
        };
        let variant = project
            .models
            .get(alignment.as_str())
            .ok_or_else(|| Error::MissingVariant(alignment.to_string()))?;
        models.extend(mapping_of(variant, "templates.dbt_project_yml.models")?);

        doc.insert("models".to_string(), Node::Mapping(models));
        if !project.vars.is_null() {
            doc.insert("vars".to_string(), project.vars.clone());
        }
        Ok(Node::Mapping(doc))
    }

    /// Rendered `dbt_project.yml` for an alignment
    pub fn render_project(&self, alignment: Alignment, params: &ParameterSet) -> Result<Node> {
        let template = self.project_template(alignment)?;
        Ok(self.renderer().render(&template, params)?)
    }

    /// Rendered `packages.yml`: base packages then alignment-specific ones
    pub fn render_packages(&self, alignment: Alignment, params: &ParameterSet) -> Result<Node> {
        let packages = &self.templates.packages_yml;
        let mut items = packages.base_packages.clone();
        if let Some(extra) = packages.alignment_specific.get(alignment.as_str()) {
            items.extend(extra.iter().cloned());
        }
        let template = Node::from_iter([("packages".to_string(), Node::Sequence(items))]);
        Ok(self.renderer().render(&template, params)?)
    }

    /// Rendered `groups/_group.yml`
    pub fn render_group(&self, params: &ParameterSet) -> Result<Node> {
        Ok(self.renderer().render(&self.templates.group_yml.template, params)?)
    }

    /// Directories created when scaffolding a package
    pub fn directory_structure(&self, alignment: Alignment) -> &[String] {
        self.directory_structures
            .get(alignment.as_str())
            .map_or(&[], Vec::as_slice)
    }

    pub fn migrations(&self) -> &[MigrationEntry] {
        &self.migrations
    }

    /// Consistency problems that loading alone does not catch
    pub fn check(&self) -> Vec<String> {
        let mut problems = Vec::new();
        for alignment in Alignment::ALL {
            if !self.templates.dbt_project_yml.models.contains_key(alignment.as_str()) {
                problems.push(format!("No models variant for alignment '{alignment}'"));
            }
            if !self.directory_structures.contains_key(alignment.as_str()) {
                problems.push(format!("No directory structure for alignment '{alignment}'"));
            }
        }
        if self.merge_policy.root.keys.is_empty() && self.merge_policy.root.children.is_empty() {
            problems.push("merge_policy is empty; every key falls back to 'default'".to_string());
        }
        problems
    }

    fn ensure_mappings(&self) -> Result<()> {
        let project = &self.templates.dbt_project_yml;
        mapping_of(&project.base_config, "templates.dbt_project_yml.base_config")?;
        for (name, variant) in &project.models {
            mapping_of(variant, &format!("templates.dbt_project_yml.models.{name}"))?;
        }
        if !project.vars.is_null() {
            mapping_of(&project.vars, "templates.dbt_project_yml.vars")?;
        }
        Ok(())
    }
}

/// Clone a mapping section; null counts as empty
fn mapping_of(node: &Node, section: &str) -> Result<Mapping> {
    match node {
        Node::Mapping(map) => Ok(map.clone()),
        _ if node.is_null() => Ok(Mapping::new()),
        _ => Err(Error::NotAMapping {
            section: section.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RenderError;
    use crate::merge::merge;
    use manifest::equivalent;

    fn source_params() -> ParameterSet {
        ParameterSet::new()
            .with("package_name", "databricks_systems_data")
            .with("alignment", "source-aligned")
            .with("source_system", "databricks")
            .with("domain_name", "systems_data")
            .with("description", "Source-aligned package for databricks systems_data")
            .with("group_name", "databricks")
            .with("group_description", "Databricks source data group")
            .with("schema_name", "databricks")
    }

    #[test]
    fn test_embedded_catalog_is_consistent() {
        let catalog = TemplateCatalog::embedded().unwrap();
        assert!(catalog.check().is_empty(), "{:?}", catalog.check());
        assert!(!catalog.migrations().is_empty());
        assert_eq!(catalog.policy().variables_section, "vars");
        assert_eq!(catalog.policy().template_vars.len(), 9);
    }

    #[test]
    fn test_render_source_aligned_project() {
        let catalog = TemplateCatalog::embedded().unwrap();
        let project = catalog
            .render_project(Alignment::SourceAligned, &source_params())
            .unwrap();

        assert_eq!(project.get("name").and_then(Node::as_str), Some("databricks_systems_data"));
        assert_eq!(
            project
                .get_path(&["models", "databricks_systems_data", "+schema"])
                .and_then(Node::as_str),
            Some("databricks")
        );
        assert_eq!(
            project.get_path(&["models", "+tags"]),
            Some(&Node::string_list(["source-aligned"]))
        );
        assert_eq!(
            project
                .get_path(&["vars", "disable_run_results"])
                .and_then(Node::as_str),
            Some("{{ target.name != 'prod' }}")
        );
    }

    #[test]
    fn test_render_reports_missing_parameters() {
        let catalog = TemplateCatalog::embedded().unwrap();
        let params = ParameterSet::new()
            .with("package_name", "x")
            .with("alignment", "source-aligned");
        match catalog.render_project(Alignment::SourceAligned, &params) {
            Err(Error::Render(RenderError::MissingParameters(names))) => {
                assert_eq!(names, vec!["group_name", "schema_name"]);
            }
            other => panic!("expected missing parameters, got {other:?}"),
        }
    }

    #[test]
    fn test_packages_and_group() {
        let catalog = TemplateCatalog::embedded().unwrap();
        let params = source_params();

        let packages = catalog.render_packages(Alignment::Utility, &params).unwrap();
        let names: Vec<_> = packages
            .get("packages")
            .and_then(Node::as_sequence)
            .unwrap()
            .iter()
            .filter_map(|p| p.get("package").and_then(Node::as_str))
            .collect();
        assert_eq!(
            names,
            vec!["dbt-labs/dbt_utils", "elementary-data/elementary", "dbt-labs/codegen"]
        );

        let group = catalog.render_group(&params).unwrap();
        let first = &group.get("groups").and_then(Node::as_sequence).unwrap()[0];
        assert_eq!(first.get("name").and_then(Node::as_str), Some("databricks"));
    }

    #[test]
    fn test_directory_structure() {
        let catalog = TemplateCatalog::embedded().unwrap();
        assert!(
            catalog
                .directory_structure(Alignment::ConsumerAligned)
                .iter()
                .any(|d| d == "models/marts")
        );
    }

    #[test]
    fn test_rendered_project_merges_idempotently() {
        let catalog = TemplateCatalog::embedded().unwrap();
        let rendered = catalog
            .render_project(Alignment::SourceAligned, &source_params())
            .unwrap();
        let existing = manifest::from_str(concat!(
            "name: databricks_systems_data\nversion: '0.9.0'\n",
            "models:\n  +tags: [custom_tag]\n",
            "  databricks_systems_data:\n    +schema: legacy\n",
            "    intermediate:\n      +materialized: ephemeral\n",
            "vars:\n  PROD_CATALOG: old\n  team_var: keep\n",
        ))
        .unwrap();

        let once = merge(&rendered, &existing, catalog.policy()).unwrap();
        let twice = merge(&rendered, &once, catalog.policy()).unwrap();
        assert!(equivalent(&once, &twice));

        assert_eq!(
            once.get_path(&["models", "+tags"]),
            Some(&Node::string_list(["custom_tag", "source-aligned"]))
        );
        assert_eq!(
            once.get_path(&["models", "databricks_systems_data", "+schema"])
                .and_then(Node::as_str),
            Some("databricks")
        );
        assert!(once
            .get_path(&["models", "databricks_systems_data", "intermediate"])
            .is_some());
        assert_eq!(
            once.get_path(&["vars", "PROD_CATALOG"]).and_then(Node::as_str),
            Some("data_prod")
        );
        assert_eq!(once.get_path(&["vars", "team_var"]).and_then(Node::as_str), Some("keep"));
        assert_eq!(once.get("version").and_then(Node::as_str), Some("1.0.0"));
    }

    #[test]
    fn test_catalog_rejects_non_mapping_sections() {
        let err = TemplateCatalog::from_str(
            "template_version: '1'\ntemplates:\n  dbt_project_yml:\n    base_config: [a]\n",
        )
        .unwrap_err();
        assert!(matches!(err, Error::NotAMapping { .. }));
    }

    #[test]
    fn test_check_reports_missing_variants() {
        let catalog = TemplateCatalog::from_str(concat!(
            "template_version: '1'\n",
            "templates:\n  dbt_project_yml:\n    base_config:\n      name: x\n",
            "    models:\n      source-aligned: {}\n",
        ))
        .unwrap();
        let problems = catalog.check();
        assert!(problems.iter().any(|p| p.contains("consumer-aligned")));
        assert!(matches!(
            catalog.project_template(Alignment::Utility),
            Err(Error::MissingVariant(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.yml");
        std::fs::write(&path, DEFAULT_CATALOG).unwrap();
        let catalog = TemplateCatalog::load(&path).unwrap();
        assert_eq!(catalog.version(), "2.1.0");

        assert!(matches!(
            TemplateCatalog::load(&dir.path().join("missing.yml")),
            Err(Error::Read { .. })
        ));
    }
}
