use serde_json::Value;
use tracing::warn;

use super::catalog::JsonParameter;
use super::parameter::{
    is_true, string_list_from_json, ArraySource, ParameterTemplate, Scalar, TemplateKind,
};
use super::validation::Validation;
use crate::format::display_value;
use crate::observability::metrics;

/// Builds the template for one catalog parameter.
///
/// Types are matched case-insensitively (`boolean`, `int`, `long`, `double`,
/// `string`, `enum`, `array`, `object`). Unknown types are reported and yield
/// `None` so the rest of the catalog still loads.
pub fn build_parameter(json: &JsonParameter, parent_label: Option<&str>) -> Option<ParameterTemplate> {
    let kind = match json.kind.to_lowercase().as_str() {
        "boolean" => TemplateKind::Boolean {
            value: json.default_value.as_ref().map(is_true).unwrap_or(false),
        },
        "int" | "long" => TemplateKind::Integer {
            value: numeric_default(json.default_value.as_ref()),
        },
        "double" => TemplateKind::Float {
            value: numeric_default(json.default_value.as_ref()),
        },
        "string" => TemplateKind::String {
            value: json
                .default_value
                .as_ref()
                .filter(|v| is_truthy(v))
                .map(display_value)
                .unwrap_or_default(),
            multiline: json.multiline,
        },
        "enum" => enum_kind(json),
        "array" => TemplateKind::Array {
            value: json
                .default_value
                .as_ref()
                .map(string_list_from_json)
                .unwrap_or_default(),
            source: ArraySource::from_autocomplete(json.autocomplete.as_deref()),
            values: None,
        },
        "object" => {
            let label = match parent_label {
                Some(parent) => format!("{} {}", parent, json.label),
                None => json.label.clone(),
            };
            TemplateKind::Object {
                parameters: json
                    .properties
                    .iter()
                    .flatten()
                    .filter_map(|child| build_parameter(child, Some(&label)))
                    .collect(),
            }
        }
        _ => {
            warn!("Unknown parameter type {} from {}", json.kind, json.label);
            metrics::catalog::unknown_parameter_type(&json.kind);
            return None;
        }
    };

    let validations = json
        .validations
        .iter()
        .flatten()
        .map(Validation::from_json)
        .collect();

    Some(
        ParameterTemplate::new(&json.name, &json.label, parent_label, kind, validations)
            .with_description(json.description.clone())
            .with_optional(json.optional),
    )
}

/// Catalog default or `0`. Numeric strings (`"0.1"`) become numbers.
fn numeric_default(default_value: Option<&Value>) -> Scalar {
    match default_value.filter(|v| is_truthy(v)) {
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map(Scalar::Number)
            .unwrap_or_else(|_| Scalar::Text(s.clone())),
        Some(other) => Scalar::from_json(other),
        None => Scalar::Number(0.0),
    }
}

/// Case-insensitive match of the default against the options, else the first option.
fn enum_kind(json: &JsonParameter) -> TemplateKind {
    let values = json.options.clone().unwrap_or_default();
    let Some(first) = values.first().cloned() else {
        return TemplateKind::Enum {
            value: None,
            values,
        };
    };

    let wanted = json
        .default_value
        .as_ref()
        .filter(|v| is_truthy(v))
        .map(display_value)
        .unwrap_or_else(|| first.clone());
    let value = values
        .iter()
        .find(|option| option.to_lowercase() == wanted.to_lowercase())
        .cloned()
        .unwrap_or(first);

    TemplateKind::Enum {
        value: Some(value),
        values,
    }
}

/// Truthiness of a catalog default (`""`, `0`, `false` and `null` are unset).
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(false),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
