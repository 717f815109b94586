//! Package context inference
//!
//! Derives a package's alignment and template parameters from where it
//! lives (`.../source-aligned/<source_system>/<pkg>`) and what its
//! manifest calls it. Pure: no filesystem access.

use manifest::Node;
use std::path::{Component, Path};
use templating::{Alignment, ParameterSet};

const UTILS_PREFIX: &str = "utils_";

/// Infer alignment and parameters for a package
///
/// Returns `(None, empty)` when neither the path nor the name carries an
/// alignment signal. A path marker beats a conflicting name prefix.
pub fn infer(path: &Path, existing: &Node) -> (Option<Alignment>, ParameterSet) {
    let name = existing.get("name").and_then(scalar_text);
    let segments: Vec<String> = path
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();

    let from_path = Alignment::ALL.into_iter().find_map(|alignment| {
        segments
            .iter()
            .position(|s| s == alignment.as_str())
            .map(|i| (alignment, segments.get(i + 1).cloned()))
    });
    let from_name = name
        .as_deref()
        .filter(|n| n.starts_with(UTILS_PREFIX))
        .map(|_| Alignment::Utility);

    let (alignment, after_marker) = match (from_path, from_name) {
        (Some((alignment, next)), hint) => {
            if let Some(hint) = hint
                && hint != alignment
            {
                log::warn!(
                    "{}: path says {alignment} but name suggests {hint}; using {alignment}",
                    path.display()
                );
            }
            (alignment, next)
        }
        (None, Some(alignment)) => (alignment, None),
        (None, None) => {
            log::debug!("{}: no alignment signal", path.display());
            return (None, ParameterSet::new());
        }
    };

    let mut params = ParameterSet::new();
    if let Some(name) = &name {
        params.insert("package_name", name.as_str());
    }
    params.insert("alignment", alignment.as_str());

    match alignment.primary_parameter() {
        Some(primary_key) => {
            let primary = after_marker.or_else(|| name_prefix(name.as_deref()));

            let domain = domain_name(name.as_deref(), primary.as_deref());
            if let Some(domain) = &domain {
                params.insert("domain_name", domain.as_str());
            }

            if let Some(primary) = primary {
                params.insert(primary_key, primary.as_str());
                params.insert("group_name", primary.as_str());
                let (description, group_description, schema) = match alignment {
                    Alignment::SourceAligned => (
                        format!("Source-aligned package for {primary}"),
                        format!("{} system data group", title_case(&primary)),
                        primary.clone(),
                    ),
                    _ => (
                        format!("Consumer-aligned package for {primary}"),
                        format!("{} analytics group", title_case(&primary)),
                        format!(
                            "{primary}_{}",
                            domain.as_deref().unwrap_or("data").replace('-', "_")
                        ),
                    ),
                };
                params.insert("description", description);
                params.insert("group_description", group_description);
                params.insert("schema_name", schema);
            }
        }
        None => {
            let domain = name
                .as_deref()
                .map(|n| n.strip_prefix(UTILS_PREFIX).unwrap_or(n).to_string());
            if let Some(domain) = domain {
                params.insert("description", format!("Utility package for {domain}"));
                params.insert("domain_name", domain);
            }
            params.insert("group_name", "data_platform");
            params.insert("group_description", "Data platform utilities group");
        }
    }

    (Some(alignment), params)
}

/// Primary parameter taken from the name when the path has none
fn name_prefix(name: Option<&str>) -> Option<String> {
    name.and_then(|n| n.split_once('_'))
        .map(|(head, _)| head.to_string())
        .filter(|head| !head.is_empty())
}

/// Name with `<primary>_` stripped, else the text after the first
/// underscore, else the whole name
fn domain_name(name: Option<&str>, primary: Option<&str>) -> Option<String> {
    let name = name?;
    if let Some(primary) = primary
        && let Some(rest) = name.strip_prefix(&format!("{primary}_"))
        && !rest.is_empty()
    {
        return Some(rest.to_string());
    }
    match name.split_once('_') {
        Some((_, rest)) if !rest.is_empty() => Some(rest.to_string()),
        _ => Some(name.to_string()),
    }
}

fn scalar_text(node: &Node) -> Option<String> {
    match node {
        Node::Scalar(_) if !node.is_null() => Some(node.to_string()),
        _ => None,
    }
}

/// Capitalize the first letter of every alphanumeric run
fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;
    for c in text.chars() {
        if c.is_alphanumeric() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(name: &str) -> Node {
        manifest::from_str(&format!("name: {name}\n")).unwrap()
    }

    #[test]
    fn test_source_aligned_from_path() {
        let (alignment, params) = infer(
            Path::new("packages/domains/source-aligned/databricks/databricks_systems_data"),
            &named("databricks_systems_data"),
        );
        assert_eq!(alignment, Some(Alignment::SourceAligned));
        assert_eq!(params.get_str("source_system"), Some("databricks"));
        assert_eq!(params.get_str("domain_name"), Some("systems_data"));
        assert_eq!(params.get_str("group_name"), Some("databricks"));
        assert_eq!(params.get_str("group_description"), Some("Databricks system data group"));
        assert_eq!(params.get_str("schema_name"), Some("databricks"));
        assert_eq!(params.get_str("package_name"), Some("databricks_systems_data"));
    }

    #[test]
    fn test_consumer_aligned_from_path() {
        let (alignment, params) = infer(
            Path::new("packages/domains/consumer-aligned/marketing/marketing_customer-analytics"),
            &named("marketing_customer-analytics"),
        );
        assert_eq!(alignment, Some(Alignment::ConsumerAligned));
        assert_eq!(params.get_str("business_area"), Some("marketing"));
        assert_eq!(params.get_str("domain_name"), Some("customer-analytics"));
        assert_eq!(params.get_str("schema_name"), Some("marketing_customer_analytics"));
        assert_eq!(params.get_str("description"), Some("Consumer-aligned package for marketing"));
    }

    #[test]
    fn test_marker_as_last_segment_uses_name_prefix() {
        let (alignment, params) =
            infer(Path::new("packages/source-aligned"), &named("stripe_payments"));
        assert_eq!(alignment, Some(Alignment::SourceAligned));
        assert_eq!(params.get_str("source_system"), Some("stripe"));
        assert_eq!(params.get_str("domain_name"), Some("payments"));
    }

    #[test]
    fn test_utils_by_name_prefix() {
        let (alignment, params) =
            infer(Path::new("packages/shared/utils_dates"), &named("utils_dates"));
        assert_eq!(alignment, Some(Alignment::Utility));
        assert_eq!(params.get_str("domain_name"), Some("dates"));
        assert_eq!(params.get_str("group_name"), Some("data_platform"));
        assert_eq!(params.get_str("group_description"), Some("Data platform utilities group"));
        assert!(!params.contains("source_system"));
    }

    #[test]
    fn test_no_signal_is_none() {
        let (alignment, params) = infer(Path::new("packages/misc/thing"), &named("thing"));
        assert_eq!(alignment, None);
        assert!(params.is_empty());
    }

    #[test]
    fn test_path_beats_name_prefix() {
        let (alignment, _) = infer(
            Path::new("packages/source-aligned/erp/utils_erp"),
            &named("utils_erp"),
        );
        assert_eq!(alignment, Some(Alignment::SourceAligned));
    }

    #[test]
    fn test_missing_name_leaves_package_name_unset() {
        let (alignment, params) = infer(Path::new("packages/utils/helpers"), &Node::null());
        assert_eq!(alignment, Some(Alignment::Utility));
        assert!(!params.contains("package_name"));
        assert_eq!(params.get_str("alignment"), Some("utils"));
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("salesforce"), "Salesforce");
        assert_eq!(title_case("big-query"), "Big-Query");
    }
}
