//! Merge policy tables
//!
//! A [`PolicyTable`] says, for every key the template emits, who owns the
//! value: the template, the package, or both (union). Tables are plain data
//! so catalogs can ship their own under `merge_policy`.

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a single key is reconciled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergePolicy {
    /// Template value replaces the existing one
    AlwaysTemplate,
    /// Existing list plus template elements not already present
    UnionList,
    /// Existing value wins; template only fills a gap
    PreserveExisting,
    /// Template wins here and in every nested scope
    TemplateManagedScalar,
    /// Merge mappings key by key with the child scope
    Recurse,
    /// Existing value if present, else template
    #[default]
    Default,
}

impl MergePolicy {
    /// Whether the template value replaces the existing one
    pub fn template_wins(self) -> bool {
        matches!(self, Self::AlwaysTemplate | Self::TemplateManagedScalar)
    }
}

impl fmt::Display for MergePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::AlwaysTemplate => "always_template",
            Self::UnionList => "union_list",
            Self::PreserveExisting => "preserve_existing",
            Self::TemplateManagedScalar => "template_managed_scalar",
            Self::Recurse => "recurse",
            Self::Default => "default",
        };
        f.write_str(name)
    }
}

/// Policies for one mapping level
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyScope {
    /// Exact key overrides
    pub keys: IndexMap<String, MergePolicy>,
    /// Policy for unlisted keys carrying the scope prefix
    pub prefixed: MergePolicy,
    /// Policy for unlisted keys without the prefix
    pub plain: MergePolicy,
    /// Scopes for named child mappings
    pub children: IndexMap<String, PolicyScope>,
    /// Scope for any other child mapping; the current scope when unset
    pub nested: Option<Box<PolicyScope>>,
}

impl PolicyScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key(mut self, name: impl Into<String>, policy: MergePolicy) -> Self {
        self.keys.insert(name.into(), policy);
        self
    }

    pub fn prefixed(mut self, policy: MergePolicy) -> Self {
        self.prefixed = policy;
        self
    }

    pub fn plain(mut self, policy: MergePolicy) -> Self {
        self.plain = policy;
        self
    }

    pub fn child(mut self, name: impl Into<String>, scope: PolicyScope) -> Self {
        self.children.insert(name.into(), scope);
        self
    }

    pub fn nested(mut self, scope: PolicyScope) -> Self {
        self.nested = Some(Box::new(scope));
        self
    }

    /// Scope used for the mapping stored under `key`
    pub fn child_scope(&self, key: &str) -> &PolicyScope {
        self.children
            .get(key)
            .or(self.nested.as_deref())
            .unwrap_or(self)
    }

    /// Keys this scope marks as template-managed
    pub fn managed_keys(&self) -> impl Iterator<Item = &str> {
        self.keys
            .iter()
            .filter(|(_, policy)| **policy == MergePolicy::TemplateManagedScalar)
            .map(|(key, _)| key.as_str())
    }
}

/// A complete policy description for one manifest kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyTable {
    /// Key prefix marking scoped config keys (`+tags`)
    pub scope_prefix: String,
    /// Top-level key holding template variables
    pub variables_section: String,
    /// Variables the template owns; all others belong to the package
    pub template_vars: IndexSet<String>,
    pub root: PolicyScope,
}

impl Default for PolicyTable {
    fn default() -> Self {
        Self {
            scope_prefix: "+".to_string(),
            variables_section: "vars".to_string(),
            template_vars: IndexSet::new(),
            root: PolicyScope::default(),
        }
    }
}

impl PolicyTable {
    pub fn new(root: PolicyScope) -> Self {
        Self {
            root,
            ..Self::default()
        }
    }

    pub fn with_template_vars<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.template_vars = names.into_iter().map(Into::into).collect();
        self
    }

    /// Policy for a key in the variables section
    pub fn variable_policy(&self, name: &str) -> MergePolicy {
        if self.template_vars.contains(name) {
            MergePolicy::AlwaysTemplate
        } else {
            MergePolicy::Default
        }
    }

    /// Resolve a key's policy in `scope`
    ///
    /// Exact key first, then template-managed keys inherited from
    /// enclosing scopes, then the key class.
    pub fn resolve(
        &self,
        scope: &PolicyScope,
        inherited: &IndexSet<String>,
        key: &str,
    ) -> MergePolicy {
        if let Some(policy) = scope.keys.get(key) {
            return *policy;
        }
        if inherited.contains(key) {
            return MergePolicy::TemplateManagedScalar;
        }
        if !self.scope_prefix.is_empty() && key.starts_with(&self.scope_prefix) {
            scope.prefixed
        } else {
            scope.plain
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> PolicyTable {
        let package = PolicyScope::new()
            .key("+group", MergePolicy::TemplateManagedScalar)
            .key("+tags", MergePolicy::UnionList)
            .plain(MergePolicy::Recurse);
        let models = PolicyScope::new()
            .key("+group", MergePolicy::PreserveExisting)
            .plain(MergePolicy::Recurse)
            .nested(package);
        PolicyTable::new(
            PolicyScope::new()
                .key("name", MergePolicy::AlwaysTemplate)
                .child("models", models),
        )
        .with_template_vars(["PROD_CATALOG"])
    }

    #[test]
    fn test_resolution_order() {
        let table = table();
        let none = IndexSet::new();
        let models = table.root.child_scope("models");

        assert_eq!(table.resolve(&table.root, &none, "name"), MergePolicy::AlwaysTemplate);
        assert_eq!(table.resolve(&table.root, &none, "profile"), MergePolicy::Default);
        assert_eq!(table.resolve(models, &none, "+group"), MergePolicy::PreserveExisting);
        assert_eq!(table.resolve(models, &none, "+schema"), MergePolicy::Default);
        assert_eq!(table.resolve(models, &none, "my_pkg"), MergePolicy::Recurse);

        let inherited: IndexSet<String> = ["+group".to_string()].into_iter().collect();
        let package = models.child_scope("my_pkg");
        let staging = package.child_scope("staging");
        assert_eq!(
            table.resolve(staging, &inherited, "+group"),
            MergePolicy::TemplateManagedScalar
        );
    }

    #[test]
    fn test_unconfigured_child_scope_is_self() {
        let scope = PolicyScope::new().plain(MergePolicy::Recurse);
        assert_eq!(scope.child_scope("anything"), &scope);
    }

    #[test]
    fn test_variable_policy() {
        let table = table();
        assert_eq!(table.variable_policy("PROD_CATALOG"), MergePolicy::AlwaysTemplate);
        assert_eq!(table.variable_policy("custom_var"), MergePolicy::Default);
    }

    #[test]
    fn test_table_deserializes_from_yaml() {
        let table: PolicyTable = serde_yaml::from_str(
            r"
template_vars: [PROD_CATALOG]
root:
  keys:
    name: always_template
    models: recurse
  children:
    models:
      keys:
        +tags: union_list
      plain: recurse
      nested:
        keys:
          +schema: template_managed_scalar
",
        )
        .unwrap();

        assert_eq!(table.scope_prefix, "+");
        assert_eq!(table.variables_section, "vars");
        let models = table.root.child_scope("models");
        assert_eq!(models.keys["+tags"], MergePolicy::UnionList);
        let nested = models.child_scope("pkg");
        assert_eq!(nested.managed_keys().collect::<Vec<_>>(), vec!["+schema"]);
    }
}
