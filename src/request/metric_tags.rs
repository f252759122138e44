use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Tag key to the list of values, as returned by the tags endpoint.
pub type Tags = BTreeMap<String, Vec<String>>;

/// Tags known for the metric currently being edited.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricTags {
    pub tags: Tags,
    pub size: usize,
    pub initialized: bool,
    /// Number of distinct series selectable through tags (product over non-empty tags).
    pub combinations: u64,
    pub multi_valued_tags: Vec<String>,
}

impl MetricTags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update_tags(&mut self, tags: Tags) {
        self.tags = tags;
        self.update_info();
        self.initialized = true;
    }

    /// Tag keys, used as the choice list of `tags`-sourced array parameters.
    pub fn keys(&self) -> Vec<String> {
        self.tags.keys().cloned().collect()
    }

    fn update_info(&mut self) {
        let non_empty: Vec<(&String, &Vec<String>)> =
            self.tags.iter().filter(|(_, values)| !values.is_empty()).collect();

        self.combinations = if non_empty.is_empty() {
            0
        } else {
            non_empty
                .iter()
                .map(|(_, values)| values.len() as u64)
                .product()
        };
        self.multi_valued_tags = non_empty
            .iter()
            .filter(|(_, values)| values.len() > 1)
            .map(|(key, _)| key.to_string())
            .collect();
        self.size = self.tags.len();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(entries: &[(&str, &[&str])]) -> Tags {
        entries
            .iter()
            .map(|(k, vs)| (k.to_string(), vs.iter().map(|v| v.to_string()).collect()))
            .collect()
    }

    #[test]
    fn test_update_tags_computes_info() {
        let mut metric_tags = MetricTags::new();
        assert!(!metric_tags.initialized);

        metric_tags.update_tags(tags(&[
            ("host", &["a", "b", "c"]),
            ("dc", &["eu", "us"]),
            ("empty", &[]),
            ("app", &["kairosdb"]),
        ]));

        assert!(metric_tags.initialized);
        assert_eq!(metric_tags.size, 4);
        assert_eq!(metric_tags.combinations, 6);
        assert_eq!(metric_tags.multi_valued_tags, vec!["dc", "host"]);
        assert_eq!(metric_tags.keys(), vec!["app", "dc", "empty", "host"]);
    }

    #[test]
    fn test_no_values_no_combinations() {
        let mut metric_tags = MetricTags::new();
        metric_tags.update_tags(tags(&[("empty", &[])]));
        assert_eq!(metric_tags.combinations, 0);
        assert!(metric_tags.multi_valued_tags.is_empty());
    }
}
