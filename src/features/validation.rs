use serde::{Deserialize, Serialize};
use tracing::debug;

use super::expr::{ExprValue, Expression};

/// Only validations of this kind are evaluated; any other kind always passes.
pub const EXPRESSION_VALIDATION_TYPE: &str = "js";

/// JSON model of a catalog validation rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonValidation {
    pub expression: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Advisory constraint attached to a parameter template.
///
/// Validation never blocks query construction: a rule that cannot be evaluated
/// (malformed expression, unsupported operation) counts as satisfied.
#[derive(Debug, Clone, PartialEq)]
pub struct Validation {
    pub expression: String,
    pub message: String,
    pub kind: String,
}

impl Validation {
    pub fn new(expression: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
            message: message.into(),
            kind: EXPRESSION_VALIDATION_TYPE.to_string(),
        }
    }

    pub fn from_json(json: &JsonValidation) -> Self {
        Self {
            expression: json.expression.clone(),
            message: json.message.clone(),
            kind: json.kind.clone(),
        }
    }

    /// Returns whether `value` satisfies the rule.
    pub fn validate(&self, value: &ExprValue) -> bool {
        if !self.kind.eq_ignore_ascii_case(EXPRESSION_VALIDATION_TYPE) {
            return true;
        }

        let outcome = Expression::parse(&self.expression).and_then(|expr| expr.evaluate(value));
        match outcome {
            Ok(result) => result.is_truthy(),
            Err(e) => {
                debug!("Ignoring validation '{}': {}", self.expression, e);
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expression_validation() {
        let validation = Validation::new("value > 0", "Must be positive");
        assert!(validation.validate(&ExprValue::Number(2.0)));
        assert!(!validation.validate(&ExprValue::Number(-1.0)));
    }

    #[test]
    fn test_invalid_expression_is_valid() {
        let validation = Validation::new("value >>>= (", "never shown");
        assert!(validation.validate(&ExprValue::Number(2.0)));
        assert!(validation.validate(&ExprValue::Str("anything".into())));
    }

    #[test]
    fn test_runtime_error_is_valid() {
        let validation = Validation::new("value.length > 0", "Tags can't be empty.");
        assert!(validation.validate(&ExprValue::Undefined));
    }

    #[test]
    fn test_other_kinds_always_pass() {
        let validation = Validation {
            expression: "value > 100".to_string(),
            message: "server-side rule".to_string(),
            kind: "regex".to_string(),
        };
        assert!(validation.validate(&ExprValue::Number(1.0)));
    }

    #[test]
    fn test_kind_is_case_insensitive() {
        let validation = Validation::from_json(&JsonValidation {
            expression: "value < 1".to_string(),
            message: "Must be lower than 1".to_string(),
            kind: "JS".to_string(),
        });
        assert!(!validation.validate(&ExprValue::Number(5.0)));
    }
}
