//! Variable expansion on top of the host templating engine.
//!
//! The host substitutes `$var` / `[[var]]` references; multi-valued variables come
//! back as bracketed groups (`{a,b,c}`). [`VariableExpander`] turns such a string
//! into every concrete candidate.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::constants::MULTI_VALUE_SEPARATOR;

static MULTI_VALUE_GROUP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{.*?\}").expect("multi-value pattern is valid"));

/// Variables scoped to a single panel/repeat, `name -> value`
pub type ScopedVars = BTreeMap<String, String>;

/// Host templating engine seam.
pub trait TemplateService: Send + Sync {
    /// Substitutes template variable references in `expression`.
    fn replace(&self, expression: &str, scoped_vars: &ScopedVars) -> String;

    /// Names of the variables currently defined on the dashboard (without `$`).
    fn variables(&self) -> Vec<String>;
}

/// Template service backed by a fixed variable table.
///
/// Multi-valued variables render as `{v1,v2}` like the dashboard host does.
#[derive(Debug, Clone, Default)]
pub struct StaticTemplateService {
    variables: BTreeMap<String, Vec<String>>,
}

impl StaticTemplateService {
    pub fn new(variables: BTreeMap<String, Vec<String>>) -> Self {
        Self { variables }
    }

    pub fn with_variable(mut self, name: impl Into<String>, values: Vec<String>) -> Self {
        self.variables.insert(name.into(), values);
        self
    }
}

impl TemplateService for StaticTemplateService {
    fn replace(&self, expression: &str, scoped_vars: &ScopedVars) -> String {
        let mut replaced = expression.to_string();

        // Scoped variables shadow dashboard ones
        for (name, value) in scoped_vars {
            replaced = replaced
                .replace(&format!("[[{}]]", name), value)
                .replace(&format!("${}", name), value);
        }

        // Longest names first so `$host` does not eat into `$hostname`
        let mut names: Vec<&String> = self.variables.keys().collect();
        names.sort_by_key(|name| std::cmp::Reverse(name.len()));
        for name in names {
            let values = &self.variables[name];
            let rendered = match values.len() {
                0 => continue,
                1 => values[0].clone(),
                _ => format!("{{{}}}", values.join(&MULTI_VALUE_SEPARATOR.to_string())),
            };
            replaced = replaced
                .replace(&format!("[[{}]]", name), &rendered)
                .replace(&format!("${}", name), &rendered);
        }
        replaced
    }

    fn variables(&self) -> Vec<String> {
        self.variables.keys().cloned().collect()
    }
}

/// Expands templated strings into all of their concrete candidates.
#[derive(Clone)]
pub struct VariableExpander {
    service: Arc<dyn TemplateService>,
    scoped_vars: ScopedVars,
}

impl std::fmt::Debug for VariableExpander {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VariableExpander")
            .field("scoped_vars", &self.scoped_vars)
            .finish()
    }
}

impl VariableExpander {
    pub fn new(service: Arc<dyn TemplateService>, scoped_vars: ScopedVars) -> Self {
        Self {
            service,
            scoped_vars,
        }
    }

    /// Expander whose host substitution is the identity.
    pub fn noop() -> Self {
        Self::new(Arc::new(StaticTemplateService::default()), ScopedVars::new())
    }

    /// Returns every candidate string for `expression`.
    ///
    /// Each `{..}` group multiplies the candidate list by its alternative count. A
    /// string without groups yields itself, after host substitution.
    pub fn replace(&self, expression: &str) -> Vec<String> {
        let replaced = self.service.replace(expression, &self.scoped_vars);
        let groups: Vec<&str> = MULTI_VALUE_GROUP
            .find_iter(&replaced)
            .map(|m| m.as_str())
            .collect();

        if groups.is_empty() {
            return vec![replaced];
        }

        let mut candidates = vec![replaced.clone()];
        for group in groups {
            // Nested braces are dropped, not matched
            let inner = group.replace(['{', '}'], "");
            candidates = inner
                .split(MULTI_VALUE_SEPARATOR)
                .flat_map(|alternative| {
                    candidates
                        .iter()
                        .map(move |candidate| candidate.replacen(group, alternative, 1))
                        .collect::<Vec<_>>()
                })
                .collect();
        }
        candidates
    }

    /// First candidate of [`replace`](Self::replace).
    pub fn replace_first(&self, expression: &str) -> String {
        self.replace(expression)
            .into_iter()
            .next()
            .unwrap_or_default()
    }

    /// Expands each expression and concatenates the candidates in order.
    pub fn replace_all<S: AsRef<str>>(&self, expressions: &[S]) -> Vec<String> {
        expressions
            .iter()
            .flat_map(|expression| self.replace(expression.as_ref()))
            .collect()
    }

    /// Dashboard variables as they appear in expressions (`$name`).
    pub fn template_variables(&self) -> Vec<String> {
        self.service
            .variables()
            .into_iter()
            .map(|name| format!("${}", name))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn expander_with(variables: &[(&str, &[&str])]) -> VariableExpander {
        let table = variables
            .iter()
            .map(|(name, values)| {
                (
                    name.to_string(),
                    values.iter().map(|v| v.to_string()).collect(),
                )
            })
            .collect();
        VariableExpander::new(
            Arc::new(StaticTemplateService::new(table)),
            ScopedVars::new(),
        )
    }

    #[test]
    fn test_plain_string_is_single_candidate() {
        let expander = VariableExpander::noop();
        assert_eq!(expander.replace("cpu.load"), vec!["cpu.load"]);
    }

    #[test]
    fn test_single_value_variable() {
        let expander = expander_with(&[("metric", &["cpu.load"])]);
        assert_eq!(expander.replace("$metric"), vec!["cpu.load"]);
        assert_eq!(expander.replace("[[metric]].avg"), vec!["cpu.load.avg"]);
    }

    #[test]
    fn test_cartesian_product_of_two_groups() {
        let expander = expander_with(&[("dc", &["eu", "us"]), ("host", &["a", "b", "c"])]);
        let candidates = expander.replace("$dc-$host");

        assert_eq!(candidates.len(), 6);
        let distinct: HashSet<_> = candidates.iter().collect();
        assert_eq!(distinct.len(), 6);
        // The group matched last varies slowest
        assert_eq!(
            candidates,
            vec!["eu-a", "us-a", "eu-b", "us-b", "eu-c", "us-c"]
        );
    }

    #[test]
    fn test_literal_groups_are_expanded() {
        let expander = VariableExpander::noop();
        assert_eq!(expander.replace("web-{1,2}"), vec!["web-1", "web-2"]);
    }

    #[test]
    fn test_inner_braces_are_stripped() {
        let expander = VariableExpander::noop();
        assert_eq!(expander.replace("x.{a{b,c}"), vec!["x.ab", "x.c"]);
    }

    #[test]
    fn test_repeated_group_is_substituted_per_occurrence() {
        let expander = VariableExpander::noop();
        let candidates = expander.replace("{a,b}/{a,b}");
        assert_eq!(candidates, vec!["a/a", "b/a", "a/b", "b/b"]);
    }

    #[test]
    fn test_scoped_vars_take_precedence() {
        let mut scoped = ScopedVars::new();
        scoped.insert("host".to_string(), "repeat-1".to_string());
        let service = StaticTemplateService::default()
            .with_variable("host", vec!["a".to_string(), "b".to_string()]);
        let expander = VariableExpander::new(Arc::new(service), scoped);

        assert_eq!(expander.replace("$host"), vec!["repeat-1"]);
    }

    #[test]
    fn test_replace_all_flattens() {
        let expander = expander_with(&[("host", &["a", "b"])]);
        assert_eq!(
            expander.replace_all(&["$host", "c"]),
            vec!["a", "b", "c"]
        );
    }

    #[test]
    fn test_template_variables_are_prefixed() {
        let expander = expander_with(&[("host", &["a"]), ("dc", &["eu"])]);
        assert_eq!(expander.template_variables(), vec!["$dc", "$host"]);
    }
}
