//! Parameter schema and validation
//!
//! Validation never fails: it returns every violation as a human-readable
//! message so all problems surface at once.

use crate::params::ParameterSet;
use indexmap::IndexMap;
use manifest::Node;
use serde::Deserialize;
use std::fmt;

/// Declared parameters, keyed by name
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct Schema {
    variables: IndexMap<String, VariableSpec>,
}

/// Constraints on a single parameter
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct VariableSpec {
    /// Declared type, informational only
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub description: Option<String>,
    pub required: bool,
    pub required_when: Option<Condition>,
    /// Allowed values; empty means unrestricted
    pub choices: Vec<String>,
}

/// A `required_when` predicate
///
/// Only `name == 'value'` and `name != 'value'` are understood. Anything
/// else is kept verbatim and evaluates to false.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum Condition {
    Equals { variable: String, value: String },
    NotEquals { variable: String, value: String },
    Unsupported(String),
}

impl Condition {
    pub fn parse(text: &str) -> Self {
        let build = |op: &str| {
            text.split_once(op).map(|(var, value)| {
                (
                    var.trim().to_string(),
                    value.trim().trim_matches(|c| c == '\'' || c == '"').to_string(),
                )
            })
        };

        if let Some((variable, value)) = build("!=") {
            Self::NotEquals { variable, value }
        } else if let Some((variable, value)) = build("==") {
            Self::Equals { variable, value }
        } else {
            Self::Unsupported(text.to_string())
        }
    }

    pub fn evaluate(&self, params: &ParameterSet) -> bool {
        match self {
            Self::Equals { variable, value } => params.get_str(variable) == Some(value.as_str()),
            Self::NotEquals { variable, value } => {
                params.get_str(variable) != Some(value.as_str())
            }
            Self::Unsupported(text) => {
                log::debug!("Unsupported required_when condition: {text}");
                false
            }
        }
    }
}

impl From<String> for Condition {
    fn from(text: String) -> Self {
        Self::parse(&text)
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equals { variable, value } => write!(f, "{variable} == '{value}'"),
            Self::NotEquals { variable, value } => write!(f, "{variable} != '{value}'"),
            Self::Unsupported(text) => f.write_str(text),
        }
    }
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a parameter
    pub fn with(mut self, name: impl Into<String>, spec: VariableSpec) -> Self {
        self.variables.insert(name.into(), spec);
        self
    }

    pub fn get(&self, name: &str) -> Option<&VariableSpec> {
        self.variables.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// Declared variables in catalog order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &VariableSpec)> {
        self.variables.iter()
    }

    /// Check a parameter set, returning every violation
    pub fn validate(&self, params: &ParameterSet) -> Vec<String> {
        let mut errors = Vec::new();

        for (name, spec) in &self.variables {
            let value = params.get(name);

            if spec.required && value.is_none() {
                errors.push(format!("Required variable '{name}' is missing"));
            }

            if let Some(condition) = &spec.required_when
                && value.is_none()
                && condition.evaluate(params)
            {
                errors.push(format!("Variable '{name}' is required when {condition}"));
            }

            if let Some(value) = value
                && !spec.choices.is_empty()
            {
                let text = display_value(value);
                if !spec.choices.iter().any(|choice| *choice == text) {
                    errors.push(format!(
                        "Variable '{name}' must be one of: {} (got '{text}')",
                        spec.choices.join(", ")
                    ));
                }
            }
        }

        errors
    }
}

fn display_value(node: &Node) -> String {
    node.to_inline_string()
}

impl VariableSpec {
    pub fn required() -> Self {
        Self {
            required: true,
            ..Self::default()
        }
    }

    pub fn required_when(condition: &str) -> Self {
        Self {
            required_when: Some(Condition::parse(condition)),
            ..Self::default()
        }
    }

    pub fn with_choices<I, S>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.choices = choices.into_iter().map(Into::into).collect();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> Schema {
        Schema::new()
            .with("package_name", VariableSpec::required())
            .with(
                "alignment",
                VariableSpec::required().with_choices([
                    "source-aligned",
                    "consumer-aligned",
                    "utils",
                ]),
            )
            .with(
                "source_system",
                VariableSpec::required_when("alignment == 'source-aligned'"),
            )
            .with(
                "business_area",
                VariableSpec::required_when("alignment == \"consumer-aligned\""),
            )
    }

    #[test]
    fn test_valid_params_have_no_violations() {
        let params = ParameterSet::new()
            .with("package_name", "databricks_systems_data")
            .with("alignment", "source-aligned")
            .with("source_system", "databricks");
        assert!(schema().validate(&params).is_empty());
    }

    #[test]
    fn test_all_violations_are_reported() {
        let params = ParameterSet::new().with("alignment", "invalid-alignment");
        let errors = schema().validate(&params);
        assert_eq!(errors.len(), 2, "{errors:?}");
        assert!(errors[0].contains("'package_name' is missing"));
        assert!(errors[1].contains("alignment") && errors[1].contains("must be one of"));
    }

    #[test]
    fn test_conditional_requirement() {
        let params = ParameterSet::new()
            .with("package_name", "marketing_customer_analytics")
            .with("alignment", "consumer-aligned");
        let errors = schema().validate(&params);
        assert_eq!(
            errors,
            vec!["Variable 'business_area' is required when alignment == 'consumer-aligned'"]
        );
    }

    #[test]
    fn test_condition_parsing() {
        assert_eq!(
            Condition::parse("alignment == 'source-aligned'"),
            Condition::Equals {
                variable: "alignment".into(),
                value: "source-aligned".into()
            }
        );
        assert_eq!(
            Condition::parse("alignment != utils"),
            Condition::NotEquals {
                variable: "alignment".into(),
                value: "utils".into()
            }
        );
        let unsupported = Condition::parse("alignment in ['a']");
        assert!(matches!(unsupported, Condition::Unsupported(_)));
        assert!(!unsupported.evaluate(&ParameterSet::new()));
    }

    #[test]
    fn test_not_equals_condition() {
        let condition = Condition::parse("alignment != 'utils'");
        let params = ParameterSet::new().with("alignment", "source-aligned");
        assert!(condition.evaluate(&params));
        let params = ParameterSet::new().with("alignment", "utils");
        assert!(!condition.evaluate(&params));
    }

    #[test]
    fn test_schema_deserializes_from_yaml() {
        let schema: Schema = serde_yaml::from_str(concat!(
            "package_name:\n  type: string\n  required: true\n",
            "source_system:\n  required_when: \"alignment == 'source-aligned'\"\n",
        ))
        .unwrap();
        assert!(schema.get("package_name").unwrap().required);
        assert!(matches!(
            schema.get("source_system").unwrap().required_when,
            Some(Condition::Equals { .. })
        ));
    }
}
