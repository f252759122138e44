use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::model::{DataPoint, QueryResult, ResponseBody};
use super::series_name::SeriesNameBuilder;
use crate::format::display_value;
use crate::observability::metrics;
use crate::request::AnnotationOptions;

/// Graphable series: `datapoints` are `[value, timestamp]` pairs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    pub target: String,
    pub datapoints: Vec<DataPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationSource {
    pub name: String,
    pub enabled: bool,
    pub datasource: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub annotation: AnnotationSource,
    pub title: String,
    pub time: Value,
    pub text: String,
    pub tags: Vec<String>,
}

/// Converts datapoints responses into series and annotations.
///
/// `aliases` line up with the response queries; a missing or empty alias falls
/// back to the result name.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseHandler;

impl ResponseHandler {
    pub fn new() -> Self {
        Self
    }

    pub fn convert_to_datapoints(&self, body: &ResponseBody, aliases: &[Option<String>]) -> Vec<TimeSeries> {
        let series: Vec<TimeSeries> = body
            .queries
            .iter()
            .enumerate()
            .flat_map(|(index, query)| {
                let alias = alias_at(aliases, index);
                query.results.iter().map(move |result| TimeSeries {
                    target: series_name(alias, result),
                    datapoints: result
                        .values
                        .iter()
                        .map(|(timestamp, value)| (value.clone(), timestamp.clone()))
                        .collect(),
                })
            })
            .collect();

        debug!("Converted response into {} series", series.len());
        metrics::responses::series_produced(series.len());
        series
    }

    /// One annotation per datapoint: time from the timestamp, text from the value.
    pub fn convert_to_annotations(
        &self,
        body: &ResponseBody,
        options: &AnnotationOptions,
        aliases: &[Option<String>],
    ) -> Vec<Annotation> {
        let mut annotations = Vec::new();
        for (index, query) in body.queries.iter().enumerate() {
            let alias = alias_at(aliases, index);
            for result in &query.results {
                let title = series_name(alias, result);
                let tags = annotation_tags(result);
                for (timestamp, value) in &result.values {
                    annotations.push(Annotation {
                        annotation: AnnotationSource {
                            name: options.name.clone(),
                            enabled: true,
                            datasource: options.datasource.clone(),
                        },
                        title: title.clone(),
                        time: timestamp.clone(),
                        text: display_value(value),
                        tags: tags.clone(),
                    });
                }
            }
        }

        metrics::responses::annotations_produced(annotations.len());
        annotations
    }
}

fn alias_at(aliases: &[Option<String>], index: usize) -> Option<&str> {
    aliases
        .get(index)
        .and_then(|alias| alias.as_deref())
        .filter(|alias| !alias.is_empty())
}

fn series_name(alias: Option<&str>, result: &QueryResult) -> String {
    SeriesNameBuilder::new(alias.unwrap_or(&result.name))
        .with_group_by(&result.group_by)
        .build()
}

/// `"key: value"` for every value of every tag.
fn annotation_tags(result: &QueryResult) -> Vec<String> {
    result
        .tags
        .iter()
        .flat_map(|(key, values)| {
            let values = match values {
                Value::Array(items) => items.clone(),
                other => vec![other.clone()],
            };
            values
                .into_iter()
                .map(move |value| format!("{}: {}", key, display_value(&value)))
        })
        .collect()
}
