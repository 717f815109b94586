//! Placeholder substitution over template documents

use crate::error::RenderError;
use crate::params::ParameterSet;
use manifest::{Mapping, Node, Scalar};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").expect("placeholder pattern is valid")
});

/// Any `{{ ... }}` expression, placeholder or not
static EXPRESSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{(.*?)\}\}").expect("expression pattern is valid"));

/// Substrings marking a leaf as a runtime expression for dbt, not for us
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExemptionList(Vec<String>);

impl Default for ExemptionList {
    fn default() -> Self {
        Self::new(["target.", "var(", "env_var(", "{%"])
    }
}

impl ExemptionList {
    pub fn new<I, S>(markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(markers.into_iter().map(Into::into).collect())
    }

    pub fn is_exempt(&self, text: &str) -> bool {
        self.0.iter().any(|marker| text.contains(marker.as_str()))
    }

    pub fn markers(&self) -> &[String] {
        &self.0
    }
}

/// Renders template documents against a parameter set
#[derive(Debug, Clone, Default)]
pub struct Renderer {
    exemptions: ExemptionList,
}

impl Renderer {
    pub fn new(exemptions: ExemptionList) -> Self {
        Self { exemptions }
    }

    /// Substitute every placeholder in `template`
    ///
    /// Missing parameters do not stop the walk; all of them are reported
    /// together, in first-seen order.
    pub fn render(&self, template: &Node, params: &ParameterSet) -> Result<Node, RenderError> {
        let mut missing = Vec::new();
        let rendered = self.node(template, params, &mut missing);
        if missing.is_empty() {
            Ok(rendered)
        } else {
            Err(RenderError::MissingParameters(missing))
        }
    }

    fn node(&self, node: &Node, params: &ParameterSet, missing: &mut Vec<String>) -> Node {
        match node {
            Node::Scalar(Scalar::String(text)) => self.leaf(text, params, missing),
            Node::Scalar(_) => node.clone(),
            Node::Sequence(items) => Node::Sequence(
                items
                    .iter()
                    .map(|item| self.node(item, params, missing))
                    .collect(),
            ),
            Node::Mapping(map) => {
                let mut out = Mapping::with_capacity(map.len());
                for (key, value) in map {
                    let key = self.text(key, params, missing);
                    out.insert(key, self.node(value, params, missing));
                }
                Node::Mapping(out)
            }
        }
    }

    fn leaf(&self, text: &str, params: &ParameterSet, missing: &mut Vec<String>) -> Node {
        if self.exemptions.is_exempt(text) {
            return Node::string(text);
        }

        // A lone placeholder takes the parameter's structure, not its text.
        if let Some(caps) = PLACEHOLDER.captures(text)
            && caps.get(0).is_some_and(|m| m.as_str() == text)
        {
            let name = &caps[1];
            return match params.get(name) {
                Some(value) => value.clone(),
                None => {
                    note_missing(missing, name);
                    Node::string(text)
                }
            };
        }

        Node::string(self.text(text, params, missing))
    }

    fn text(&self, text: &str, params: &ParameterSet, missing: &mut Vec<String>) -> String {
        if self.exemptions.is_exempt(text) {
            return text.to_string();
        }

        // Anything we cannot resolve is reported, including expressions
        // that are not simple names
        for expr in EXPRESSION.captures_iter(text) {
            match PLACEHOLDER.captures(&expr[0]) {
                Some(caps) if params.get(&caps[1]).is_some() => {}
                Some(caps) => note_missing(missing, &caps[1]),
                None => note_missing(missing, expr[1].trim()),
            }
        }

        PLACEHOLDER
            .replace_all(text, |caps: &regex::Captures<'_>| match params.get(&caps[1]) {
                Some(value) => value.to_inline_string(),
                None => caps[0].to_string(),
            })
            .into_owned()
    }
}

fn note_missing(missing: &mut Vec<String>, name: &str) {
    if !missing.iter().any(|m| m == name) {
        missing.push(name.to_string());
    }
}

/// Render with the default exemption list
pub fn render(template: &Node, params: &ParameterSet) -> Result<Node, RenderError> {
    Renderer::default().render(template, params)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(text: &str) -> Node {
        manifest::from_str(text).unwrap()
    }

    #[test]
    fn test_simple_substitution() {
        let params = ParameterSet::new().with("name", "World");
        let rendered = render(&Node::from("Hello {{ name }}"), &params).unwrap();
        assert_eq!(rendered, Node::from("Hello World"));
    }

    #[test]
    fn test_runtime_expressions_are_exempt() {
        let template = doc(concat!(
            "a: \"{{ target.name != 'prod' }}\"\n",
            "b: \"{{ var('x') }}\"\n",
            "c: \"{{ env_var('HOME') }}\"\n",
        ));
        let rendered = render(&template, &ParameterSet::new()).unwrap();
        assert_eq!(rendered, template);
    }

    #[test]
    fn test_nested_structures_and_keys() {
        let template = doc(concat!(
            "name: \"{{ package_name }}\"\n",
            "models:\n  \"{{ package_name }}\":\n    +tags: [\"{{ package_name }}\", test]\n",
        ));
        let params = ParameterSet::new().with("package_name", "my_package");
        let rendered = render(&template, &params).unwrap();
        assert_eq!(rendered.get("name"), Some(&Node::from("my_package")));
        assert_eq!(
            rendered.get_path(&["models", "my_package", "+tags"]),
            Some(&Node::string_list(["my_package", "test"]))
        );
    }

    #[test]
    fn test_whole_leaf_placeholder_keeps_structure() {
        let params = ParameterSet::new().with("owners", Node::string_list(["a", "b"]));
        let rendered = render(&Node::from("{{owners}}"), &params).unwrap();
        assert_eq!(rendered, Node::string_list(["a", "b"]));

        let rendered = render(&Node::from("owners: {{ owners }}"), &params).unwrap();
        assert_eq!(rendered, Node::from("owners: [a, b]"));
    }

    #[test]
    fn test_missing_parameters_are_collected() {
        let template = doc("a: \"{{ x }}\"\nb: \"{{ y }}-{{ x }}\"\nc: \"{{ z }}\"\n");
        let err = render(&template, &ParameterSet::new().with("z", "ok")).unwrap_err();
        assert_eq!(err, RenderError::MissingParameters(vec!["x".into(), "y".into()]));
    }

    #[test]
    fn test_non_string_scalars_untouched() {
        let template = doc("config-version: 2\nenabled: true\nnothing: ~\n");
        assert_eq!(render(&template, &ParameterSet::new()).unwrap(), template);
    }

    #[test]
    fn test_custom_exemptions() {
        let renderer = Renderer::new(ExemptionList::new(["@@"]));
        let params = ParameterSet::new().with("x", "1");
        assert_eq!(
            renderer.render(&Node::from("@@ {{ x }}"), &params).unwrap(),
            Node::from("@@ {{ x }}")
        );
        // Without the default markers, runtime expressions are unresolved
        assert_eq!(
            renderer.render(&Node::from("{{ target.name }}"), &params).unwrap_err(),
            RenderError::MissingParameters(vec!["target.name".into()])
        );
    }

    #[test]
    fn test_unresolvable_expressions_are_reported() {
        let template = doc("a: \"{{ foo.bar }}\"\nb: \"prefix {{ x | upper }}\"\nc: \"{{ y }}\"\n");
        let err = render(&template, &ParameterSet::new().with("y", "ok")).unwrap_err();
        assert_eq!(
            err,
            RenderError::MissingParameters(vec!["foo.bar".into(), "x | upper".into()])
        );
    }

    #[test]
    fn test_exempt_expressions_are_not_reported() {
        let template = doc("a: \"{{ target.schema }}_{{ foo.bar }}\"\n");
        assert_eq!(render(&template, &ParameterSet::new()).unwrap(), template);
    }
}
