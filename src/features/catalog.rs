//! Serde model of the feature catalog served by `/features`, and the built-in
//! catalog used with backends that do not serve one.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use super::feature::FeatureTemplate;
use super::validation::JsonValidation;
use crate::error::Result;

const LEGACY_FEATURES: &str = include_str!("legacy_features.json");

/// Catalog node describing one parameter (possibly an object with nested parameters).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonParameter {
    pub name: String,
    #[serde(default)]
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub optional: bool,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autocomplete: Option<String>,
    #[serde(default)]
    pub multiline: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validations: Option<Vec<JsonValidation>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Vec<JsonParameter>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonComponent {
    pub name: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub properties: Vec<JsonParameter>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonFeature {
    pub name: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub properties: Vec<JsonComponent>,
}

/// Builds feature templates from a catalog document.
pub fn parse_catalog(json: &str) -> Result<Vec<FeatureTemplate>> {
    let features: Vec<JsonFeature> = serde_json::from_str(json)?;
    Ok(features.iter().map(FeatureTemplate::from_json).collect())
}

/// Built-in catalog: `group_by` (tag, time, value) and the standard aggregators.
pub fn legacy_features() -> Vec<FeatureTemplate> {
    match parse_catalog(LEGACY_FEATURES) {
        Ok(features) => features,
        Err(e) => {
            warn!("Built-in feature catalog is unreadable: {}", e);
            Vec::new()
        }
    }
}
