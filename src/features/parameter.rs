//! Parameter templates (editable, catalog-derived) and parameter instances
//! (committed values stored in dashboard targets and serialized into queries).

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Number, Value};

use super::expr::ExprValue;
use super::validation::Validation;
use crate::format::{display_value, format_number};
use crate::request::metric_tags::MetricTags;
use crate::templating::VariableExpander;

pub const FLOAT_VALIDATION_EXPRESSION: &str = "!Number.isNaN(+value) && Number.isFinite(value)";
pub const FLOAT_VALIDATION_MESSAGE: &str = "Value must be a number";
pub const INTEGER_VALIDATION_EXPRESSION: &str =
    "!Number.isNaN(value) && Number.isFinite(value) && Number.isInteger(value)";
pub const INTEGER_VALIDATION_MESSAGE: &str = "Value must be an integer";

/// Autocomplete source resolving to the current metric's tag keys
pub const TAGS_SOURCE: &str = "tags";

/// Largest integer a double holds exactly (2^53).
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Scalar value of a parameter. Numeric parameters hold text while a template
/// variable reference (`$var`) is typed in place of a number.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl Scalar {
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Bool(b) => Scalar::Bool(*b),
            Value::Number(n) => n.as_f64().map(Scalar::Number).unwrap_or_default(),
            Value::String(s) => Scalar::Text(s.clone()),
            Value::Null => Scalar::default(),
            other => Scalar::Text(display_value(other)),
        }
    }

    pub fn to_text(&self) -> String {
        match self {
            Scalar::Bool(b) => b.to_string(),
            Scalar::Number(n) => format_number(*n),
            Scalar::Text(s) => s.clone(),
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Scalar::Text(_))
    }
}

impl Default for Scalar {
    fn default() -> Self {
        Scalar::Text(String::new())
    }
}

impl From<f64> for Scalar {
    fn from(n: f64) -> Self {
        Scalar::Number(n)
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Scalar::Bool(b)
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::Text(s.to_string())
    }
}

impl<'de> Deserialize<'de> for Scalar {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Scalar::from_json(&value))
    }
}

/// Reads a string list from catalog defaults and stored targets.
///
/// Accepts a JSON array, a JSON-encoded array inside a string (`"[]"`) or a
/// single plain string.
pub fn string_list_from_json(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().map(display_value).collect(),
        Value::String(s) if s.trim().is_empty() => Vec::new(),
        Value::String(s) => match serde_json::from_str::<Value>(s) {
            Ok(Value::Array(items)) => items.iter().map(display_value).collect(),
            _ => vec![s.clone()],
        },
        Value::Null => Vec::new(),
        other => vec![display_value(other)],
    }
}

fn deserialize_string_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(string_list_from_json(&value))
}

/// Where an array parameter takes its choice list from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArraySource {
    /// Tag keys of the metric being edited
    Tags,
    #[default]
    Default,
}

impl ArraySource {
    pub fn from_autocomplete(autocomplete: Option<&str>) -> Self {
        match autocomplete {
            Some(source) if source.eq_ignore_ascii_case(TAGS_SOURCE) => ArraySource::Tags,
            _ => ArraySource::Default,
        }
    }

    pub fn resolve(&self, tags: &MetricTags) -> Option<Vec<String>> {
        match self {
            ArraySource::Tags => Some(tags.keys()),
            ArraySource::Default => None,
        }
    }
}

/// Kind-specific state of a parameter template, including its editable value.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateKind {
    Boolean {
        value: bool,
    },
    Integer {
        value: Scalar,
    },
    Float {
        value: Scalar,
    },
    String {
        value: String,
        multiline: bool,
    },
    /// `value` stays unset when the catalog declares no options.
    Enum {
        value: Option<String>,
        values: Vec<String>,
    },
    Array {
        value: Vec<String>,
        source: ArraySource,
        /// Choice list resolved by the last [`ParameterTemplate::refresh`]
        values: Option<Vec<String>>,
    },
    Object {
        parameters: Vec<ParameterTemplate>,
    },
}

impl TemplateKind {
    /// Instance type tag produced by this kind.
    pub fn type_name(&self) -> &'static str {
        match self {
            TemplateKind::Boolean { .. } => "bool",
            TemplateKind::Integer { .. } | TemplateKind::Float { .. } => "number",
            TemplateKind::String { .. } => "string",
            TemplateKind::Enum { .. } => "enum",
            TemplateKind::Array { .. } => "array",
            TemplateKind::Object { .. } => "object",
        }
    }
}

/// Editable parameter built from a catalog node.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterTemplate {
    pub name: String,
    own_label: String,
    /// Resolved label of the enclosing object parameter, if nested
    parent_label: Option<String>,
    pub description: Option<String>,
    pub optional: bool,
    pub validations: Vec<Validation>,
    pub kind: TemplateKind,
}

impl ParameterTemplate {
    /// Numeric kinds get their format check ahead of `validations`.
    pub fn new(
        name: impl Into<String>,
        label: impl Into<String>,
        parent_label: Option<&str>,
        kind: TemplateKind,
        validations: Vec<Validation>,
    ) -> Self {
        let builtin = match kind {
            TemplateKind::Integer { .. } => Some(Validation::new(
                INTEGER_VALIDATION_EXPRESSION,
                INTEGER_VALIDATION_MESSAGE,
            )),
            TemplateKind::Float { .. } => Some(Validation::new(
                FLOAT_VALIDATION_EXPRESSION,
                FLOAT_VALIDATION_MESSAGE,
            )),
            _ => None,
        };

        Self {
            name: name.into(),
            own_label: label.into(),
            parent_label: parent_label.map(str::to_string),
            description: None,
            optional: false,
            validations: builtin.into_iter().chain(validations).collect(),
            kind,
        }
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    pub fn with_optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    /// Display label, prefixed by the parent's label when nested.
    pub fn label(&self) -> String {
        match &self.parent_label {
            Some(parent) => format!("{} {}", parent, self.own_label),
            None => self.own_label.clone(),
        }
    }

    pub fn own_label(&self) -> &str {
        &self.own_label
    }

    pub fn type_name(&self) -> &'static str {
        self.kind.type_name()
    }

    /// Snapshot of the current value.
    pub fn extract(&self) -> Parameter {
        let name = self.name.clone();
        match &self.kind {
            TemplateKind::Boolean { value } => Parameter::Bool {
                name,
                value: Scalar::Bool(*value),
            },
            TemplateKind::Integer { value } | TemplateKind::Float { value } => Parameter::Number {
                name,
                value: value.clone(),
            },
            TemplateKind::String { value, .. } => Parameter::String {
                name,
                value: Scalar::Text(value.clone()),
            },
            TemplateKind::Enum { value, .. } => Parameter::Enum {
                name,
                value: value.clone(),
            },
            TemplateKind::Array { value, .. } => Parameter::Array {
                name,
                value: value.clone(),
            },
            TemplateKind::Object { parameters } => Parameter::Object {
                name,
                parameters: parameters.iter().map(ParameterTemplate::extract).collect(),
            },
        }
    }

    /// Message of the first rule the current value breaks.
    ///
    /// Object parameters report the first failing child.
    pub fn validate(&self, expander: &VariableExpander) -> Option<String> {
        if let TemplateKind::Object { parameters } = &self.kind {
            return self
                .validate_value(&ExprValue::Undefined)
                .or_else(|| parameters.iter().find_map(|p| p.validate(expander)));
        }
        self.validate_value(&self.validation_candidate(expander))
    }

    /// Checks `candidate` against the rules in declaration order.
    pub fn validate_value(&self, candidate: &ExprValue) -> Option<String> {
        self.validations
            .iter()
            .find(|validation| !validation.validate(candidate))
            .map(|validation| validation.message.clone())
    }

    fn validation_candidate(&self, expander: &VariableExpander) -> ExprValue {
        match &self.kind {
            TemplateKind::Boolean { value } => ExprValue::Bool(*value),
            TemplateKind::Integer { value } | TemplateKind::Float { value } => {
                let text = expander.replace_first(&value.to_text());
                match parse_number(&text) {
                    Some(n) => ExprValue::Number(n),
                    None => ExprValue::Str(text),
                }
            }
            TemplateKind::String { value, .. } => ExprValue::Str(expander.replace_first(value)),
            TemplateKind::Enum { value, .. } => value
                .as_deref()
                .map(|v| ExprValue::Str(expander.replace_first(v)))
                .unwrap_or(ExprValue::Undefined),
            TemplateKind::Array { value, .. } => ExprValue::Array(
                expander
                    .replace_all(value)
                    .into_iter()
                    .map(ExprValue::Str)
                    .collect(),
            ),
            TemplateKind::Object { .. } => ExprValue::Undefined,
        }
    }

    /// Re-resolves dynamic choice lists against the current metric tags.
    pub fn refresh(&mut self, tags: &MetricTags) {
        match &mut self.kind {
            TemplateKind::Array { source, values, .. } => *values = source.resolve(tags),
            TemplateKind::Object { parameters } => {
                parameters.iter_mut().for_each(|p| p.refresh(tags));
            }
            _ => {}
        }
    }

    /// Enum options as shown to the user: underscores to spaces, lowercase.
    pub fn format_options(&self) -> Vec<String> {
        match &self.kind {
            TemplateKind::Enum { values, .. } => values
                .iter()
                .map(|option| option.replace('_', " ").to_lowercase())
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Assigns a value typed in by the user.
    ///
    /// Enum values outside the option list and object values that are not JSON
    /// objects are ignored.
    pub fn set_value(&mut self, value: &Value) {
        match &mut self.kind {
            TemplateKind::Boolean { value: current } => *current = is_true(value),
            TemplateKind::Integer { value: current } | TemplateKind::Float { value: current } => {
                *current = Scalar::from_json(value);
            }
            TemplateKind::String { value: current, .. } => *current = display_value(value),
            TemplateKind::Enum {
                value: current,
                values,
            } => {
                let wanted = display_value(value);
                if let Some(option) = values.iter().find(|o| o.eq_ignore_ascii_case(&wanted)) {
                    *current = Some(option.clone());
                }
            }
            TemplateKind::Array { value: current, .. } => *current = string_list_from_json(value),
            TemplateKind::Object { parameters } => {
                if let Value::Object(fields) = value {
                    for parameter in parameters.iter_mut() {
                        if let Some(field) = fields.get(&parameter.name) {
                            parameter.set_value(field);
                        }
                    }
                }
            }
        }
    }
}

/// `true` or `"true"`.
pub(crate) fn is_true(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => s == "true",
        _ => false,
    }
}

/// Parses user text as a finite or infinite double; empty text is not a number.
fn parse_number(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    match trimmed {
        "Infinity" | "+Infinity" => Some(f64::INFINITY),
        "-Infinity" => Some(f64::NEG_INFINITY),
        // Rust accepts "inf" and "nan" spellings that are not numbers here
        _ if trimmed.chars().any(|c| c.is_ascii_alphabetic() && !matches!(c, 'e' | 'E')) => None,
        _ => trimmed.parse::<f64>().ok(),
    }
}

fn number_to_json(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
        return Value::from(n as i64);
    }
    Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
}

/// Committed parameter value, tagged by `type` in stored targets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Parameter {
    Bool {
        name: String,
        #[serde(default)]
        value: Scalar,
    },
    Number {
        name: String,
        #[serde(default)]
        value: Scalar,
    },
    String {
        name: String,
        #[serde(default)]
        value: Scalar,
    },
    Enum {
        name: String,
        #[serde(default)]
        value: Option<String>,
    },
    Array {
        name: String,
        #[serde(default, deserialize_with = "deserialize_string_list")]
        value: Vec<String>,
    },
    Object {
        name: String,
        #[serde(default)]
        parameters: Vec<Parameter>,
    },
}

impl Parameter {
    pub fn name(&self) -> &str {
        match self {
            Parameter::Bool { name, .. }
            | Parameter::Number { name, .. }
            | Parameter::String { name, .. }
            | Parameter::Enum { name, .. }
            | Parameter::Array { name, .. }
            | Parameter::Object { name, .. } => name,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Parameter::Bool { .. } => "bool",
            Parameter::Number { .. } => "number",
            Parameter::String { .. } => "string",
            Parameter::Enum { .. } => "enum",
            Parameter::Array { .. } => "array",
            Parameter::Object { .. } => "object",
        }
    }

    /// Wire value of the parameter, keyed by its name.
    pub fn serialize(&self, expander: &VariableExpander) -> (String, Value) {
        let value = match self {
            Parameter::Bool { value, .. } => {
                let first = expander.replace_first(&value.to_text());
                match first.as_str() {
                    "true" => Value::Bool(true),
                    "false" => Value::Bool(false),
                    other => Value::Bool(!other.is_empty()),
                }
            }
            Parameter::Number { value, .. } => {
                let first = expander.replace_first(&value.to_text());
                parse_number(&first)
                    .map(number_to_json)
                    .unwrap_or(Value::Null)
            }
            Parameter::String { value, .. } => {
                Value::String(expander.replace_first(&value.to_text()))
            }
            Parameter::Enum { value, .. } => value
                .as_deref()
                .map(|v| Value::String(expander.replace_first(v)))
                .unwrap_or(Value::Null),
            Parameter::Array { value, .. } => Value::Array(
                expander
                    .replace_all(value)
                    .into_iter()
                    .map(Value::String)
                    .collect(),
            ),
            Parameter::Object { parameters, .. } => Value::Object(
                parameters
                    .iter()
                    .map(|p| p.serialize(expander))
                    .collect::<Map<String, Value>>(),
            ),
        };
        (self.name().to_string(), value)
    }

    /// Substitutes template variables in text values, keeping the first candidate.
    pub fn expand_values(&mut self, expander: &VariableExpander) {
        match self {
            Parameter::Bool { value, .. }
            | Parameter::Number { value, .. }
            | Parameter::String { value, .. } => {
                if let Scalar::Text(text) = value {
                    *text = expander.replace_first(text);
                }
            }
            Parameter::Enum {
                value: Some(text), ..
            } => *text = expander.replace_first(text),
            Parameter::Object { parameters, .. } => {
                parameters.iter_mut().for_each(|p| p.expand_values(expander));
            }
            Parameter::Enum { value: None, .. } | Parameter::Array { .. } => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::templating::{ScopedVars, StaticTemplateService};
    use serde_json::json;
    use std::sync::Arc;

    fn integer(value: Scalar) -> ParameterTemplate {
        ParameterTemplate::new(
            "value",
            "Value",
            None,
            TemplateKind::Integer { value },
            vec![Validation::new("value > 0", "Value must be greater than 0.")],
        )
    }

    fn float(value: Scalar) -> ParameterTemplate {
        ParameterTemplate::new("factor", "Factor", None, TemplateKind::Float { value }, vec![])
    }

    fn expander_with(name: &str, values: &[&str]) -> VariableExpander {
        let service = StaticTemplateService::default()
            .with_variable(name, values.iter().map(|v| v.to_string()).collect());
        VariableExpander::new(Arc::new(service), ScopedVars::new())
    }

    #[test]
    fn test_nested_label() {
        let child = ParameterTemplate::new(
            "unit",
            "Unit",
            Some("Sampling"),
            TemplateKind::String {
                value: String::new(),
                multiline: false,
            },
            vec![],
        );
        assert_eq!(child.label(), "Sampling Unit");
        assert_eq!(child.own_label(), "Unit");
    }

    #[test]
    fn test_integer_validation_order() {
        let expander = VariableExpander::noop();

        assert_eq!(integer(Scalar::Number(3.0)).validate(&expander), None);
        assert_eq!(
            integer(Scalar::Number(1.5)).validate(&expander).as_deref(),
            Some(INTEGER_VALIDATION_MESSAGE)
        );
        assert_eq!(
            integer(Scalar::Number(0.0)).validate(&expander).as_deref(),
            Some("Value must be greater than 0.")
        );
        assert_eq!(
            integer(Scalar::from("abc")).validate(&expander).as_deref(),
            Some(INTEGER_VALIDATION_MESSAGE)
        );
    }

    #[test]
    fn test_integer_replaces_float_check() {
        let template = integer(Scalar::Number(1.0));
        assert_eq!(template.validations.len(), 2);
        assert_eq!(template.validations[0].message, INTEGER_VALIDATION_MESSAGE);
    }

    #[test]
    fn test_float_validation_uses_expanded_value() {
        assert_eq!(float(Scalar::from("0.5")).validate(&VariableExpander::noop()), None);
        assert_eq!(
            float(Scalar::from("$factor"))
                .validate(&VariableExpander::noop())
                .as_deref(),
            Some(FLOAT_VALIDATION_MESSAGE)
        );
        assert_eq!(
            float(Scalar::from("$factor")).validate(&expander_with("factor", &["2.5"])),
            None
        );
    }

    #[test]
    fn test_array_validation_binds_list() {
        let template = ParameterTemplate::new(
            "tags",
            "Tags",
            None,
            TemplateKind::Array {
                value: vec![],
                source: ArraySource::Tags,
                values: None,
            },
            vec![Validation::new("value.length > 0", "Tags can't be empty.")],
        );
        let expander = VariableExpander::noop();
        assert_eq!(
            template.validate(&expander).as_deref(),
            Some("Tags can't be empty.")
        );

        let mut filled = template.clone();
        filled.set_value(&json!(["host"]));
        assert_eq!(filled.validate(&expander), None);
    }

    #[test]
    fn test_object_reports_child_failure() {
        let template = ParameterTemplate::new(
            "sampling",
            "Sampling",
            None,
            TemplateKind::Object {
                parameters: vec![integer(Scalar::Number(0.0))],
            },
            vec![],
        );
        assert_eq!(
            template.validate(&VariableExpander::noop()).as_deref(),
            Some("Value must be greater than 0.")
        );
    }

    #[test]
    fn test_extract_object_recurses() {
        let template = ParameterTemplate::new(
            "sampling",
            "Sampling",
            None,
            TemplateKind::Object {
                parameters: vec![
                    integer(Scalar::Number(1.0)),
                    ParameterTemplate::new(
                        "unit",
                        "Unit",
                        Some("Sampling"),
                        TemplateKind::Enum {
                            value: Some("MINUTES".to_string()),
                            values: vec!["MINUTES".to_string()],
                        },
                        vec![],
                    ),
                ],
            },
            vec![],
        );

        assert_eq!(
            template.extract(),
            Parameter::Object {
                name: "sampling".to_string(),
                parameters: vec![
                    Parameter::Number {
                        name: "value".to_string(),
                        value: Scalar::Number(1.0)
                    },
                    Parameter::Enum {
                        name: "unit".to_string(),
                        value: Some("MINUTES".to_string())
                    },
                ],
            }
        );
    }

    #[test]
    fn test_serialize_coercions() {
        let expander = expander_with("n", &["5"]);

        let boolean = Parameter::Bool {
            name: "align".to_string(),
            value: Scalar::from("false"),
        };
        assert_eq!(boolean.serialize(&expander), ("align".to_string(), json!(false)));

        let number = Parameter::Number {
            name: "value".to_string(),
            value: Scalar::from("$n"),
        };
        assert_eq!(number.serialize(&expander).1, json!(5));

        let fraction = Parameter::Number {
            name: "factor".to_string(),
            value: Scalar::Number(0.25),
        };
        assert_eq!(fraction.serialize(&expander).1, json!(0.25));

        let garbage = Parameter::Number {
            name: "value".to_string(),
            value: Scalar::from("abc"),
        };
        assert_eq!(garbage.serialize(&expander).1, Value::Null);

        let array = Parameter::Array {
            name: "tags".to_string(),
            value: vec!["{host,dc}".to_string(), "app".to_string()],
        };
        assert_eq!(array.serialize(&expander).1, json!(["host", "dc", "app"]));
    }

    #[test]
    fn test_serialize_object_merges_children() {
        let object = Parameter::Object {
            name: "sampling".to_string(),
            parameters: vec![
                Parameter::Number {
                    name: "value".to_string(),
                    value: Scalar::from("1"),
                },
                Parameter::Enum {
                    name: "unit".to_string(),
                    value: Some("MILLISECONDS".to_string()),
                },
            ],
        };
        assert_eq!(
            object.serialize(&VariableExpander::noop()),
            (
                "sampling".to_string(),
                json!({"value": 1, "unit": "MILLISECONDS"})
            )
        );
    }

    #[test]
    fn test_stored_parameters_deserialize() {
        let stored = json!([
            {"name": "tags", "label": "Tags", "type": "array", "value": "[]"},
            {"name": "value", "label": "Value", "type": "number", "value": "1"},
            {"name": "sampling", "type": "object", "value": null, "parameters": [
                {"name": "unit", "type": "enum", "value": "HOURS"}
            ]}
        ]);
        let parameters: Vec<Parameter> = serde_json::from_value(stored).unwrap();

        assert_eq!(
            parameters[0],
            Parameter::Array {
                name: "tags".to_string(),
                value: vec![]
            }
        );
        assert_eq!(parameters[1].type_name(), "number");
        assert_eq!(parameters[2].name(), "sampling");
    }

    #[test]
    fn test_expand_values_only_touches_text() {
        let expander = expander_with("unit", &["hours", "days"]);
        let mut object = Parameter::Object {
            name: "sampling".to_string(),
            parameters: vec![
                Parameter::Enum {
                    name: "unit".to_string(),
                    value: Some("$unit".to_string()),
                },
                Parameter::Number {
                    name: "value".to_string(),
                    value: Scalar::Number(2.0),
                },
            ],
        };
        object.expand_values(&expander);

        match object {
            Parameter::Object { parameters, .. } => {
                assert_eq!(
                    parameters[0],
                    Parameter::Enum {
                        name: "unit".to_string(),
                        value: Some("hours".to_string())
                    }
                );
                assert_eq!(
                    parameters[1],
                    Parameter::Number {
                        name: "value".to_string(),
                        value: Scalar::Number(2.0)
                    }
                );
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_format_options() {
        let template = ParameterTemplate::new(
            "unit",
            "Unit",
            None,
            TemplateKind::Enum {
                value: None,
                values: vec!["MILLI_SECONDS".to_string(), "HOURS".to_string()],
            },
            vec![],
        );
        assert_eq!(template.format_options(), vec!["milli seconds", "hours"]);
    }

    #[test]
    fn test_refresh_resolves_tag_source() {
        let mut tags = MetricTags::new();
        tags.update_tags(
            [("host".to_string(), vec!["a".to_string()])]
                .into_iter()
                .collect(),
        );
        let mut template = ParameterTemplate::new(
            "tags",
            "Tags",
            None,
            TemplateKind::Array {
                value: vec![],
                source: ArraySource::Tags,
                values: None,
            },
            vec![],
        );
        template.refresh(&tags);

        match &template.kind {
            TemplateKind::Array { values, .. } => {
                assert_eq!(values.as_deref(), Some(&["host".to_string()][..]))
            }
            _ => unreachable!(),
        }
    }
}
