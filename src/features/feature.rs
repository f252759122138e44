use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::catalog::JsonFeature;
use super::component::{Component, ComponentTemplate};
use crate::request::metric_tags::MetricTags;
use crate::templating::VariableExpander;

/// Pipeline stage (e.g. `aggregators`) holding an ordered list of components.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Feature {
    pub name: String,
    #[serde(default)]
    pub components: Vec<Component>,
}

impl Feature {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            components: Vec::new(),
        }
    }

    /// Inserts at `position`, or appends when the position is past the end.
    pub fn insert_component(&mut self, position: usize, component: Component) {
        let position = position.min(self.components.len());
        self.components.insert(position, component);
    }

    pub fn remove_component(&mut self, index: usize) -> Option<Component> {
        (index < self.components.len()).then(|| self.components.remove(index))
    }

    /// `{<feature>: [<component>, ...]}`
    pub fn serialize(&self, expander: &VariableExpander) -> Map<String, Value> {
        let components = self
            .components
            .iter()
            .map(|component| Value::Object(component.serialize(expander)))
            .collect();

        let mut serialized = Map::new();
        serialized.insert(self.name.clone(), Value::Array(components));
        serialized
    }

    pub fn expand_values(&mut self, expander: &VariableExpander) {
        self.components
            .iter_mut()
            .for_each(|component| component.expand_values(expander));
    }
}

/// Catalog-derived feature with the components the user may add to it.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTemplate {
    pub name: String,
    pub label: String,
    pub components: Vec<ComponentTemplate>,
}

impl FeatureTemplate {
    pub fn from_json(json: &JsonFeature) -> Self {
        Self {
            name: json.name.clone(),
            label: json.label.clone(),
            components: json.properties.iter().map(ComponentTemplate::from_json).collect(),
        }
    }

    pub fn component(&self, name: &str) -> Option<&ComponentTemplate> {
        self.components.iter().find(|c| c.name == name)
    }

    pub fn refresh(&mut self, tags: &MetricTags) {
        self.components.iter_mut().for_each(|c| c.refresh(tags));
    }
}
