use serde_json::{Map, Value};

use super::model::GroupByResult;
use crate::format::display_value;

const TAG_GROUP: &str = "tag";
const NAME_KEY: &str = "name";

/// Builds the display name of a series from its base name and group-by results.
///
/// Each group contributes one clause, in input order:
/// `(k1: v1, k2: v2)` for tag groups and `(value: k=v)` / `(time: k=v)` otherwise.
#[derive(Debug, Clone)]
pub struct SeriesNameBuilder<'a> {
    series_name: String,
    group_by: Vec<&'a GroupByResult>,
}

impl<'a> SeriesNameBuilder<'a> {
    pub fn new(series_name: impl Into<String>) -> Self {
        Self {
            series_name: series_name.into(),
            group_by: Vec::new(),
        }
    }

    /// Adds the groups that carry a `group` payload.
    pub fn with_group_by(mut self, group_by: &'a [GroupByResult]) -> Self {
        self.group_by
            .extend(group_by.iter().filter(|group| group.group.is_some()));
        self
    }

    pub fn build(&self) -> String {
        let mut name = self.series_name.clone();
        for group in &self.group_by {
            let Some(values) = &group.group else {
                continue;
            };
            let is_tag_group = group.name == TAG_GROUP;

            name.push('(');
            if !is_tag_group {
                name.push_str(&group.name);
                name.push_str(": ");
            }
            name.push_str(&extract_values(values, is_tag_group));
            name.push(')');
        }
        name
    }
}

fn extract_values(values: &Map<String, Value>, is_tag_group: bool) -> String {
    let separator = if is_tag_group { ": " } else { "=" };
    property_order(values)
        .into_iter()
        .map(|(key, value)| {
            if key == NAME_KEY {
                display_value(value)
            } else {
                format!("{}{}{}", key, separator, display_value(value))
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Group entries in the order the plugin enumerates object keys: array-index
/// keys first, ascending, then the remaining keys in response order.
fn property_order(values: &Map<String, Value>) -> Vec<(&String, &Value)> {
    let mut entries: Vec<(&String, &Value)> = values.iter().collect();
    // Stable, so non-index keys keep their response order
    entries.sort_by_key(|(key, _)| array_index(key).map_or((1, 0), |index| (0, index)));
    entries
}

/// Canonical decimal below 2^32 - 1, e.g. `"7"` but not `"07"` or `"-1"`.
fn array_index(key: &str) -> Option<u32> {
    key.parse::<u32>()
        .ok()
        .filter(|index| *index != u32::MAX && index.to_string() == key)
}
