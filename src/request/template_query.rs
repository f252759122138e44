//! Metric-find queries used by dashboard template variables.
//!
//! The query is the inside of a JSON object: `"metric": "cpu", "tagKey": "host"`.
//! The number of keys selects the lookup.

use serde_json::{Map, Value};

use super::metric_tags::Tags;
use crate::error::{DatasourceError, Result};
use crate::format::display_value;

pub const METRIC_KEY: &str = "metric";
pub const TAG_KEY: &str = "tagKey";

#[derive(Debug, Clone, PartialEq)]
pub enum TemplateQuery {
    /// No key: every metric name
    MetricNames,
    /// `metric`: tag keys of the metric
    TagKeys { metric: String },
    /// `metric` and `tagKey`: values of one tag
    TagValues { metric: String, tag_key: String },
    /// Any further key constrains the tag values
    FilteredTagValues {
        metric: String,
        tag_key: String,
        filters: Tags,
    },
}

impl TemplateQuery {
    pub fn parse(query: &str) -> Result<Self> {
        let object: Map<String, Value> = serde_json::from_str(&format!("{{{}}}", query))
            .map_err(|e| DatasourceError::TemplateQuery(format!("{}: {}", query, e)))?;

        match object.len() {
            0 => Ok(TemplateQuery::MetricNames),
            1 => Ok(TemplateQuery::TagKeys {
                metric: required(&object, METRIC_KEY)?,
            }),
            2 => Ok(TemplateQuery::TagValues {
                metric: required(&object, METRIC_KEY)?,
                tag_key: required(&object, TAG_KEY)?,
            }),
            _ => {
                let filters = object
                    .iter()
                    .filter(|(key, _)| key.as_str() != METRIC_KEY && key.as_str() != TAG_KEY)
                    .map(|(key, value)| (key.clone(), filter_values(value)))
                    .collect();
                Ok(TemplateQuery::FilteredTagValues {
                    metric: required(&object, METRIC_KEY)?,
                    tag_key: required(&object, TAG_KEY)?,
                    filters,
                })
            }
        }
    }
}

fn required(object: &Map<String, Value>, key: &str) -> Result<String> {
    object
        .get(key)
        .map(display_value)
        .ok_or_else(|| DatasourceError::TemplateQuery(format!("missing key '{}'", key)))
}

fn filter_values(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().map(display_value).collect(),
        other => vec![display_value(other)],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_modes() {
        assert_eq!(TemplateQuery::parse("").unwrap(), TemplateQuery::MetricNames);
        assert_eq!(
            TemplateQuery::parse(r#""metric": "cpu""#).unwrap(),
            TemplateQuery::TagKeys {
                metric: "cpu".to_string()
            }
        );
        assert_eq!(
            TemplateQuery::parse(r#""metric": "cpu", "tagKey": "host""#).unwrap(),
            TemplateQuery::TagValues {
                metric: "cpu".to_string(),
                tag_key: "host".to_string()
            }
        );
    }

    #[test]
    fn test_filtered_tag_values() {
        let query = TemplateQuery::parse(r#""metric": "cpu", "tagKey": "host", "dc": "eu", "rack": ["1", "2"]"#).unwrap();
        let TemplateQuery::FilteredTagValues { filters, tag_key, .. } = query else {
            panic!("expected filtered query");
        };
        assert_eq!(tag_key, "host");
        assert_eq!(filters["dc"], vec!["eu"]);
        assert_eq!(filters["rack"], vec!["1", "2"]);
        assert!(!filters.contains_key("metric"));
    }

    #[test]
    fn test_invalid_queries() {
        assert!(matches!(
            TemplateQuery::parse("metric: cpu"),
            Err(DatasourceError::TemplateQuery(_))
        ));
        assert!(TemplateQuery::parse(r#""tagKey": "host""#).is_err());
    }
}
