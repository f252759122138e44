//! Dashboard target model as stored by the dashboard host.

use serde::{Deserialize, Serialize};

use super::metric_tags::Tags;
use crate::constants::{
    DEFAULT_SAFEGUARD_AFTER_AGGREGATION, DEFAULT_SAFEGUARD_BEFORE_AGGREGATION,
    DEFAULT_SAFEGUARD_GROUP_LIMIT, DEFAULT_SAFEGUARD_LIMIT,
};
use crate::features::Feature;
use crate::time::TimeOffset;

/// Query part of a target: what to fetch and how to process it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct KairosDBTarget {
    #[serde(rename = "metricName", default, skip_serializing_if = "Option::is_none")]
    pub metric_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(default)]
    pub tags: Tags,
    #[serde(default)]
    pub features: Vec<Feature>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_limit: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_offset: Option<TimeOffset>,
}

impl KairosDBTarget {
    pub fn new(metric_name: impl Into<String>) -> Self {
        Self {
            metric_name: Some(metric_name.into()),
            ..Self::default()
        }
    }
}

/// Extra tag constraint typed in by the user, folded into the query tags.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TagFilter {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub values: Vec<String>,
}

/// Request-wide previous-sample directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchPreviousSample {
    pub merge_groups: bool,
    pub time_align: bool,
    pub for_empty_results_only: bool,
}

impl Default for FetchPreviousSample {
    fn default() -> Self {
        Self {
            merge_groups: true,
            time_align: true,
            for_empty_results_only: false,
        }
    }
}

/// Safeguard limit as typed in the editor; a cleared input is stored as `""`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SafeguardLimit {
    Value(u64),
    Text(String),
}

impl SafeguardLimit {
    fn normalized(self) -> Option<SafeguardLimit> {
        match self {
            SafeguardLimit::Text(text) if text.trim().is_empty() => None,
            SafeguardLimit::Text(text) => match text.trim().parse::<u64>() {
                Ok(value) => Some(SafeguardLimit::Value(value)),
                Err(_) => Some(SafeguardLimit::Text(text)),
            },
            value => Some(value),
        }
    }
}

impl From<u64> for SafeguardLimit {
    fn from(value: u64) -> Self {
        SafeguardLimit::Value(value)
    }
}

/// Request-wide limits protecting the backend.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Safeguard {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_limit: Option<SafeguardLimit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before_aggregation: Option<SafeguardLimit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after_aggregation: Option<SafeguardLimit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<SafeguardLimit>,
}

impl Safeguard {
    /// Limits applied when the user has not changed them.
    pub fn default_limits() -> Self {
        Self {
            group_limit: Some(DEFAULT_SAFEGUARD_GROUP_LIMIT.into()),
            before_aggregation: Some(DEFAULT_SAFEGUARD_BEFORE_AGGREGATION.into()),
            after_aggregation: Some(DEFAULT_SAFEGUARD_AFTER_AGGREGATION.into()),
            limit: Some(DEFAULT_SAFEGUARD_LIMIT.into()),
        }
    }

    /// Drops cleared (empty string) limits.
    pub fn normalized(self) -> Self {
        Self {
            group_limit: self.group_limit.and_then(SafeguardLimit::normalized),
            before_aggregation: self.before_aggregation.and_then(SafeguardLimit::normalized),
            after_aggregation: self.after_aggregation.and_then(SafeguardLimit::normalized),
            limit: self.limit.and_then(SafeguardLimit::normalized),
        }
    }
}

/// One dashboard query row.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasourceTarget {
    #[serde(default)]
    pub ref_id: String,
    #[serde(default)]
    pub query: KairosDBTarget,
    #[serde(default)]
    pub hide: bool,
    /// Datasource type of the row, when the dashboard mixes datasources
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datasource: Option<String>,
    #[serde(default)]
    pub filters: Vec<TagFilter>,
    #[serde(default, alias = "safeGuard", skip_serializing_if = "Option::is_none")]
    pub safeguard: Option<Safeguard>,
    #[serde(
        default,
        rename = "fetch_previous_sample",
        skip_serializing_if = "Option::is_none"
    )]
    pub fetch_previous_sample: Option<FetchPreviousSample>,
    #[serde(default)]
    pub auto_sync: bool,
}

impl DatasourceTarget {
    pub fn new(ref_id: impl Into<String>, query: KairosDBTarget) -> Self {
        Self {
            ref_id: ref_id.into(),
            query,
            ..Self::default()
        }
    }

    /// Whether the row takes part in the request: visible and naming a metric.
    pub fn is_enabled(&self) -> bool {
        !self.hide
            && self
                .query
                .metric_name
                .as_deref()
                .is_some_and(|name| !name.is_empty())
    }
}
