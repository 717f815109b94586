//! Templating - render the organization's manifest standard and merge it
//! into existing package manifests
//!
//! Three pieces:
//!
//! - [`TemplateCatalog`]: templates, parameter [`Schema`] and
//!   [`PolicyTable`], loaded from YAML (an embedded default ships with the
//!   crate)
//! - [`Renderer`]: `{{ name }}` substitution that leaves runtime-only dbt
//!   expressions alone
//! - [`merge`]: keyed-policy merge deciding, per key, whether the template
//!   or the package owns the value
//!
//! # Example
//!
//! ```
//! use templating::{Alignment, ParameterSet, TemplateCatalog, merge};
//!
//! let catalog = TemplateCatalog::embedded().unwrap();
//! let params = ParameterSet::new()
//!     .with("package_name", "platform_helpers")
//!     .with("alignment", "utils")
//!     .with("domain_name", "platform_helpers");
//! assert!(catalog.validate_params(&params).is_empty());
//!
//! let rendered = catalog.render_project(Alignment::Utility, &params).unwrap();
//! let existing = manifest::from_str("name: platform_helpers\nvars:\n  mine: 1\n").unwrap();
//! let merged = merge(&rendered, &existing, catalog.policy()).unwrap();
//! assert_eq!(merged.get_path(&["vars", "mine"]), Some(&manifest::Node::from(1_i64)));
//! ```

mod alignment;
mod catalog;
mod error;
mod merge;
mod params;
mod policy;
mod render;
mod schema;

pub use alignment::Alignment;
pub use catalog::{
    GroupTemplate, MigrationEntry, PackagesTemplates, ProjectTemplates, TemplateCatalog, Templates,
};
pub use error::{Error, MergeError, RenderError, Result, Side};
pub use merge::merge;
pub use params::ParameterSet;
pub use policy::{MergePolicy, PolicyScope, PolicyTable};
pub use render::{ExemptionList, Renderer, render};
pub use schema::{Condition, Schema, VariableSpec};
