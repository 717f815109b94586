//! YAML parsing and emission

use crate::error::{Error, Result};
use crate::node::{KeyPath, Mapping, Node, Scalar};
use serde_yaml::Value;
use std::path::Path;

/// Parse YAML text into a document
///
/// An empty document parses to the null scalar.
pub fn from_str(text: &str) -> Result<Node> {
    if text.trim().is_empty() {
        return Ok(Node::null());
    }
    let value: Value = serde_yaml::from_str(text)?;
    convert(value, &KeyPath::root())
}

/// Read and parse a YAML file
pub fn load(path: &Path) -> Result<Node> {
    let text = std::fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;
    from_str(&text)
}

/// Serialize a document to block-style YAML, preserving key order
pub fn to_string(node: &Node) -> Result<String> {
    Ok(serde_yaml::to_string(&to_value(node))?)
}

/// Convert a `serde_yaml` value into a document
pub fn from_value(value: Value) -> Result<Node> {
    convert(value, &KeyPath::root())
}

fn convert(value: Value, path: &KeyPath) -> Result<Node> {
    let node = match value {
        Value::Null => Node::null(),
        Value::Bool(b) => Node::Scalar(Scalar::Bool(b)),
        Value::Number(n) => Node::Scalar(number(&n)),
        Value::String(s) => Node::Scalar(Scalar::String(s)),
        Value::Sequence(items) => Node::Sequence(
            items
                .into_iter()
                .enumerate()
                .map(|(i, item)| convert(item, &path.child(&i.to_string())))
                .collect::<Result<_>>()?,
        ),
        Value::Mapping(entries) => {
            let mut map = Mapping::with_capacity(entries.len());
            for (key, value) in entries {
                let key = scalar_key(key, path)?;
                let child = convert(value, &path.child(&key))?;
                map.insert(key, child);
            }
            Node::Mapping(map)
        }
        // Application tags carry no meaning for the merge; keep the tagged value.
        Value::Tagged(tagged) => convert(tagged.value, path)?,
    };
    Ok(node)
}

fn number(n: &serde_yaml::Number) -> Scalar {
    if let Some(i) = n.as_i64() {
        Scalar::Int(i)
    } else {
        Scalar::Float(n.as_f64().unwrap_or(f64::NAN))
    }
}

fn scalar_key(key: Value, path: &KeyPath) -> Result<String> {
    match key {
        Value::String(s) => Ok(s),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Ok("null".to_string()),
        Value::Tagged(tagged) => scalar_key(tagged.value, path),
        Value::Sequence(_) | Value::Mapping(_) => Err(Error::NonScalarKey {
            path: path.to_string(),
        }),
    }
}

fn to_value(node: &Node) -> Value {
    match node {
        Node::Scalar(Scalar::Null) => Value::Null,
        Node::Scalar(Scalar::Bool(b)) => Value::Bool(*b),
        Node::Scalar(Scalar::Int(i)) => Value::Number((*i).into()),
        Node::Scalar(Scalar::Float(x)) => Value::Number((*x).into()),
        Node::Scalar(Scalar::String(s)) => Value::String(s.clone()),
        Node::Sequence(items) => Value::Sequence(items.iter().map(to_value).collect()),
        Node::Mapping(map) => Value::Mapping(
            map.iter()
                .map(|(k, v)| (Value::String(k.clone()), to_value(v)))
                .collect(),
        ),
    }
}
