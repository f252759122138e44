use serde::Serialize;
use serde_json::{Map, Value};

use super::metric_tags::Tags;
use crate::features::Feature;
use crate::templating::VariableExpander;
use crate::time::TimeOverride;

/// One metric of a datapoints request.
///
/// Features are flattened into the metric object (`"aggregators": [...]`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricQuery {
    pub name: String,
    pub tags: Tags,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_limit: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_override: Option<TimeOverride>,
    #[serde(flatten)]
    pub features: Map<String, Value>,
}

impl MetricQuery {
    /// `remove_limits` omits both `limit` and `group_limit` from the wire form.
    pub fn new(
        name: impl Into<String>,
        remove_limits: bool,
        tags: Tags,
        features: &[Feature],
        group_limit: Option<u64>,
        time_override: Option<TimeOverride>,
        expander: &VariableExpander,
    ) -> Self {
        let (limit, group_limit) = if remove_limits {
            (None, None)
        } else {
            (Some(0), Some(group_limit.unwrap_or(0)))
        };

        let mut serialized = Map::new();
        for feature in features {
            serialized.extend(feature.serialize(expander));
        }

        Self {
            name: name.into(),
            tags,
            limit,
            group_limit,
            time_override,
            features: serialized,
        }
    }
}
