//! Keyed-policy merge of a rendered template into an existing manifest
//!
//! The merge walks the template's mappings. At each level the result starts
//! as a copy of the existing mapping, so keys the template never mentions
//! survive untouched; every template key is then reconciled according to
//! the policy the [`PolicyTable`] resolves for it.

use crate::error::{MergeError, Side};
use crate::policy::{MergePolicy, PolicyScope, PolicyTable};
use indexmap::IndexSet;
use manifest::{KeyPath, Mapping, Node};

/// Merge `template` into `existing`
///
/// A null existing document is treated as an empty mapping. Errors when
/// either side holds the wrong kind of node where a mapping or list is
/// required; nothing is partially merged in that case.
pub fn merge(template: &Node, existing: &Node, policy: &PolicyTable) -> Result<Node, MergeError> {
    let empty = Mapping::new();
    let root = KeyPath::root();

    let tmap = as_mapping(template, &root, Side::Template)?.unwrap_or(&empty);
    let emap = as_mapping(existing, &root, Side::Existing)?.unwrap_or(&empty);

    let merger = Merger { table: policy };
    merger
        .level(tmap, emap, &policy.root, &IndexSet::new(), &root)
        .map(Node::Mapping)
}

struct Merger<'a> {
    table: &'a PolicyTable,
}

/// How a level resolves its keys
#[derive(Clone, Copy)]
enum Scope<'s> {
    Keyed(&'s PolicyScope),
    Variables,
}

impl Merger<'_> {
    fn level(
        &self,
        template: &Mapping,
        existing: &Mapping,
        scope: &PolicyScope,
        inherited: &IndexSet<String>,
        path: &KeyPath,
    ) -> Result<Mapping, MergeError> {
        let mut out = existing.clone();

        let mut managed = inherited.clone();
        managed.extend(scope.managed_keys().map(str::to_string));

        for (key, tval) in template {
            let key_path = path.child(key);
            let present = existing.get(key);
            // Containers treat an explicit null as absent; scalars keep it
            let current = present.filter(|v| !v.is_null());

            let kind = if path.is_root() && *key == self.table.variables_section {
                Scope::Variables
            } else {
                Scope::Keyed(scope)
            };

            let policy = match kind {
                Scope::Variables => MergePolicy::Recurse,
                Scope::Keyed(scope) => self.table.resolve(scope, inherited, key),
            };

            let merged = match policy {
                MergePolicy::AlwaysTemplate | MergePolicy::TemplateManagedScalar => tval.clone(),
                MergePolicy::PreserveExisting | MergePolicy::Default => {
                    present.unwrap_or(tval).clone()
                }
                MergePolicy::UnionList => union(tval, current, &key_path)?,
                MergePolicy::Recurse => match kind {
                    Scope::Variables => self.variables(tval, current, &key_path)?,
                    Scope::Keyed(scope) => {
                        self.recurse(tval, current, scope.child_scope(key), &managed, &key_path)?
                    }
                },
            };

            log::trace!("{key_path}: {policy}");
            out.insert(key.clone(), merged);
        }

        Ok(out)
    }

    fn recurse(
        &self,
        template: &Node,
        existing: Option<&Node>,
        scope: &PolicyScope,
        inherited: &IndexSet<String>,
        path: &KeyPath,
    ) -> Result<Node, MergeError> {
        let Some(tmap) = as_mapping(template, path, Side::Template)? else {
            // A null template entry asks for nothing.
            return Ok(existing.cloned().unwrap_or_else(Node::null));
        };

        let empty = Mapping::new();
        let Some(existing) = existing else {
            // Validated like any other subtree, but kept exactly as written
            self.level(tmap, &empty, scope, inherited, path)?;
            return Ok(template.clone());
        };
        let emap = as_mapping(existing, path, Side::Existing)?.unwrap_or(&empty);

        self.level(tmap, emap, scope, inherited, path).map(Node::Mapping)
    }

    /// The variables section: template-owned names win, the rest are the package's
    fn variables(
        &self,
        template: &Node,
        existing: Option<&Node>,
        path: &KeyPath,
    ) -> Result<Node, MergeError> {
        let Some(tmap) = as_mapping(template, path, Side::Template)? else {
            return Ok(existing.cloned().unwrap_or_else(Node::null));
        };

        let empty = Mapping::new();
        let emap = match existing {
            Some(node) => as_mapping(node, path, Side::Existing)?.unwrap_or(&empty),
            None => &empty,
        };

        let mut out = emap.clone();
        for (name, tval) in tmap {
            let value = if self.table.variable_policy(name).template_wins() {
                tval.clone()
            } else {
                emap.get(name).unwrap_or(tval).clone()
            };
            out.insert(name.clone(), value);
        }
        Ok(Node::Mapping(out))
    }
}

/// Existing items followed by template items not already present
fn union(template: &Node, existing: Option<&Node>, path: &KeyPath) -> Result<Node, MergeError> {
    let mut items = match existing {
        Some(node) => as_list(node, path, Side::Existing)?,
        None => Vec::new(),
    };

    for item in as_list(template, path, Side::Template)? {
        if !items.iter().any(|present| manifest::equivalent(present, &item)) {
            items.push(item);
        }
    }

    Ok(Node::Sequence(items))
}

fn as_list(node: &Node, path: &KeyPath, side: Side) -> Result<Vec<Node>, MergeError> {
    match node {
        Node::Sequence(items) => Ok(items.clone()),
        Node::Scalar(_) if node.is_null() => Ok(Vec::new()),
        Node::Scalar(_) => Ok(vec![node.clone()]),
        Node::Mapping(_) => Err(structural(path, "sequence", node, side)),
    }
}

/// `Ok(None)` for null, the mapping otherwise, an error for any other kind
fn as_mapping<'n>(
    node: &'n Node,
    path: &KeyPath,
    side: Side,
) -> Result<Option<&'n Mapping>, MergeError> {
    match node {
        Node::Mapping(map) => Ok(Some(map)),
        _ if node.is_null() => Ok(None),
        _ => Err(structural(path, "mapping", node, side)),
    }
}

fn structural(path: &KeyPath, expected: &'static str, found: &Node, side: Side) -> MergeError {
    MergeError::Structural {
        path: path.to_string(),
        expected,
        found: found.kind().to_string(),
        side,
    }
}
