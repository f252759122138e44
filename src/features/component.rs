use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::catalog::JsonComponent;
use super::factory::build_parameter;
use super::parameter::{Parameter, ParameterTemplate};
use crate::request::metric_tags::MetricTags;
use crate::templating::VariableExpander;

/// One operation of a feature (e.g. a single aggregator) with committed parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub name: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
}

impl Component {
    pub fn new(name: impl Into<String>, label: impl Into<String>, parameters: Vec<Parameter>) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            parameters,
        }
    }

    /// `{"name": <component>, <parameter>: <value>, ...}`
    pub fn serialize(&self, expander: &VariableExpander) -> Map<String, Value> {
        let mut serialized = Map::new();
        serialized.insert("name".to_string(), Value::String(self.name.clone()));
        for parameter in &self.parameters {
            let (name, value) = parameter.serialize(expander);
            serialized.insert(name, value);
        }
        serialized
    }

    pub fn expand_values(&mut self, expander: &VariableExpander) {
        self.parameters
            .iter_mut()
            .for_each(|parameter| parameter.expand_values(expander));
    }
}

/// Catalog-derived, editable component.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentTemplate {
    pub name: String,
    pub label: String,
    pub description: String,
    pub parameters: Vec<ParameterTemplate>,
}

impl ComponentTemplate {
    pub fn from_json(json: &JsonComponent) -> Self {
        Self {
            name: json.name.clone(),
            label: json.label.clone(),
            description: json.description.clone(),
            parameters: json
                .properties
                .iter()
                .filter_map(|parameter| build_parameter(parameter, None))
                .collect(),
        }
    }

    pub fn extract(&self) -> Component {
        Component::new(
            &self.name,
            &self.label,
            self.parameters.iter().map(ParameterTemplate::extract).collect(),
        )
    }

    pub fn refresh(&mut self, tags: &MetricTags) {
        self.parameters.iter_mut().for_each(|p| p.refresh(tags));
    }

    /// First validation message among the parameters, in order.
    pub fn validate(&self, expander: &VariableExpander) -> Option<String> {
        self.parameters.iter().find_map(|p| p.validate(expander))
    }

    pub fn parameter_mut(&mut self, name: &str) -> Option<&mut ParameterTemplate> {
        self.parameters.iter_mut().find(|p| p.name == name)
    }
}
