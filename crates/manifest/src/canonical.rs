//! Canonical form and semantic equality of documents
//!
//! Two documents are equivalent when they differ only in formatting:
//! mapping key order, quoting style, or the spelling of a number or
//! boolean (`2` vs `"2"`, `1.0` vs `1`, `True` vs `true`).

use crate::node::{Node, Scalar};
use std::collections::BTreeMap;

/// Order-independent, representation-normalized view of a node
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Canonical {
    Null,
    Bool(bool),
    Number(String),
    Text(String),
    List(Vec<Canonical>),
    Map(BTreeMap<String, Canonical>),
}

/// Compute the canonical form of a node
pub fn canonicalize(node: &Node) -> Canonical {
    match node {
        Node::Scalar(scalar) => canonical_scalar(scalar),
        Node::Sequence(items) => Canonical::List(items.iter().map(canonicalize).collect()),
        Node::Mapping(map) => Canonical::Map(
            map.iter()
                .map(|(k, v)| (k.clone(), canonicalize(v)))
                .collect(),
        ),
    }
}

/// Whether two documents are semantically identical
pub fn equivalent(a: &Node, b: &Node) -> bool {
    canonicalize(a) == canonicalize(b)
}

/// BLAKE3 digest (hex) of the canonical form
///
/// Equivalent documents always share a fingerprint.
pub fn fingerprint(node: &Node) -> String {
    let mut hasher = blake3::Hasher::new();
    canonicalize(node).hash_into(&mut hasher);
    hasher.finalize().to_hex().to_string()
}

impl Canonical {
    fn hash_into(&self, hasher: &mut blake3::Hasher) {
        match self {
            Self::Null => {
                hasher.update(b"n");
            }
            Self::Bool(b) => {
                hasher.update(if *b { b"t" } else { b"f" });
            }
            Self::Number(n) => {
                hasher.update(b"#");
                hash_str(hasher, n);
            }
            Self::Text(s) => {
                hasher.update(b"s");
                hash_str(hasher, s);
            }
            Self::List(items) => {
                hasher.update(b"[");
                hasher.update(&(items.len() as u64).to_le_bytes());
                for item in items {
                    item.hash_into(hasher);
                }
            }
            Self::Map(map) => {
                hasher.update(b"{");
                hasher.update(&(map.len() as u64).to_le_bytes());
                for (key, value) in map {
                    hash_str(hasher, key);
                    value.hash_into(hasher);
                }
            }
        }
    }
}

fn hash_str(hasher: &mut blake3::Hasher, s: &str) {
    hasher.update(&(s.len() as u64).to_le_bytes());
    hasher.update(s.as_bytes());
}

fn canonical_scalar(scalar: &Scalar) -> Canonical {
    match scalar {
        Scalar::Null => Canonical::Null,
        Scalar::Bool(b) => Canonical::Bool(*b),
        Scalar::Int(i) => Canonical::Number(i.to_string()),
        Scalar::Float(x) => Canonical::Number(float_form(*x)),
        Scalar::String(s) => canonical_text(s),
    }
}

/// Strings that a YAML reader would resolve to another type share its form
fn canonical_text(s: &str) -> Canonical {
    match s {
        "~" | "null" | "Null" | "NULL" => return Canonical::Null,
        "true" | "True" | "TRUE" => return Canonical::Bool(true),
        "false" | "False" | "FALSE" => return Canonical::Bool(false),
        _ => {}
    }

    if let Ok(i) = s.parse::<i64>() {
        return Canonical::Number(i.to_string());
    }
    if looks_numeric(s)
        && let Ok(x) = s.parse::<f64>()
    {
        return Canonical::Number(float_form(x));
    }

    Canonical::Text(s.to_string())
}

/// Digits with an optional sign, decimal point and exponent
///
/// Rejects `inf`/`nan` spellings that `f64::from_str` would accept.
fn looks_numeric(s: &str) -> bool {
    !s.is_empty()
        && s.chars().any(|c| c.is_ascii_digit())
        && s
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'))
}

fn float_form(x: f64) -> String {
    if x.is_nan() {
        "nan".to_string()
    } else if x.is_infinite() {
        (if x > 0.0 { "inf" } else { "-inf" }).to_string()
    } else if x.fract() == 0.0 && x.abs() < 9.0e15 {
        format!("{}", x as i64)
    } else {
        format!("{x}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::yaml;

    #[test]
    fn test_key_order_is_ignored() {
        let a = yaml::from_str("name: pkg\nversion: '1.0.0'\nmodels:\n  x: 1\n  y: 2\n").unwrap();
        let b = yaml::from_str("models:\n  y: 2\n  x: 1\nversion: '1.0.0'\nname: pkg\n").unwrap();
        assert!(equivalent(&a, &b));
        assert_eq!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn test_quoting_style_is_ignored() {
        let a = yaml::from_str("config-version: 2\nflag: true\nratio: 1.0\n").unwrap();
        let b = yaml::from_str("config-version: '2'\nflag: \"true\"\nratio: 1\n").unwrap();
        assert!(equivalent(&a, &b));
    }

    #[test]
    fn test_semantic_differences_are_detected() {
        let a = yaml::from_str("+tags: [a, b]\n").unwrap();
        let b = yaml::from_str("+tags: [b, a]\n").unwrap();
        assert!(!equivalent(&a, &b), "sequence order is meaningful");

        let c = yaml::from_str("version: 1.0.0\n").unwrap();
        let d = yaml::from_str("version: 1.0.1\n").unwrap();
        assert!(!equivalent(&c, &d));
        assert_ne!(fingerprint(&c), fingerprint(&d));
    }

    #[test]
    fn test_empty_string_differs_from_null() {
        let a = yaml::from_str("k: ''\n").unwrap();
        let b = yaml::from_str("k: ~\n").unwrap();
        assert!(!equivalent(&a, &b));
    }

    #[test]
    fn test_non_numeric_text_stays_text() {
        assert_eq!(canonical_text("1.0.0"), Canonical::Text("1.0.0".into()));
        assert_eq!(canonical_text("inf"), Canonical::Text("inf".into()));
        assert_eq!(canonical_text("+"), Canonical::Text("+".into()));
        assert_eq!(canonical_text("1e3"), Canonical::Number("1000".into()));
    }

    #[test]
    fn test_reserialized_document_is_equivalent() {
        let doc = yaml::from_str(concat!(
            "name: pkg\n",
            "models:\n  +tags:\n    - custom_tag\n    - std_tag\n",
            "vars:\n  CATALOG: prod\n",
        ))
        .unwrap();
        let reparsed = yaml::from_str(&yaml::to_string(&doc).unwrap()).unwrap();
        assert!(equivalent(&doc, &reparsed));
    }
}
