//! Editing state of one dashboard query row, independent of any UI toolkit.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::app::ports::QuerySource;
use crate::constants::{SELECT_A_METRIC, SKYMINER_DATASOURCE_TYPE, TIME_OVERRIDE_MISSING_OFFSET};
use crate::error::{DatasourceError, Result};
use crate::features::{legacy_features, Feature, FeatureTemplate};
use crate::observability::metrics;
use crate::request::{
    DatasourceTarget, FetchPreviousSample, KairosDBTarget, MetricTags, Safeguard, TagFilter, Tags,
};
use crate::time::{TimeOffset, TimeUnit};

/// Monotonic request tokens; only the latest token is current.
#[derive(Debug, Clone, Default)]
pub struct RequestSequence(Arc<AtomicU64>);

impl RequestSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&self) -> u64 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn is_current(&self, token: u64) -> bool {
        self.0.load(Ordering::SeqCst) == token
    }
}

#[derive(Debug)]
pub struct QueryContext {
    pub target: DatasourceTarget,
    datasource_type: String,
    pub features: Option<Vec<FeatureTemplate>>,
    pub tags: MetricTags,
    pub tags_initialization_error: Option<String>,
    pub time_override_error: Option<String>,
    pub enabled_time_override: bool,
    pub enabled_fetch_previous_sample: bool,
    pub expand_safeguard: bool,
    pub is_metric_name_template_variable: bool,
    tag_requests: RequestSequence,
}

impl QueryContext {
    pub fn new(target: DatasourceTarget, datasource_type: impl Into<String>) -> Self {
        Self {
            target,
            datasource_type: datasource_type.into(),
            features: None,
            tags: MetricTags::new(),
            tags_initialization_error: None,
            time_override_error: None,
            enabled_time_override: false,
            enabled_fetch_previous_sample: false,
            expand_safeguard: false,
            is_metric_name_template_variable: false,
            tag_requests: RequestSequence::new(),
        }
    }

    fn is_skyminer(&self) -> bool {
        self.datasource_type == SKYMINER_DATASOURCE_TYPE
    }

    /// Normalizes the target for the datasource flavour.
    ///
    /// With `force` the query is replaced by an empty one naming `metric_name`.
    /// Previous-sample and safeguard settings only exist on skyminer; there the
    /// safeguard defaults to [`Safeguard::default_limits`]. An empty feature
    /// pipeline gets one empty feature per loaded template.
    pub fn reset(&mut self, metric_name: Option<String>, force: bool) {
        if force {
            self.target.query = KairosDBTarget {
                metric_name,
                ..KairosDBTarget::default()
            };
        }

        if self.is_skyminer() {
            let safeguard = self
                .target
                .safeguard
                .get_or_insert_with(Safeguard::default_limits);
            self.expand_safeguard = *safeguard != Safeguard::default_limits();
            self.enabled_time_override = self.target.query.time_offset.is_some();
            self.enabled_fetch_previous_sample = self.target.fetch_previous_sample.is_some();
        } else {
            self.target.safeguard = None;
            self.target.fetch_previous_sample = None;
        }

        if self.target.query.features.is_empty() {
            if let Some(templates) = &self.features {
                self.target.query.features = templates.iter().map(|t| Feature::new(&t.name)).collect();
            }
        }
    }

    /// [`reset`](Self::reset), then loads the tags of the metric unless it is a
    /// template variable.
    pub async fn initialize(&mut self, metric_name: Option<String>, force: bool, source: &dyn QuerySource) {
        self.reset(metric_name, force);
        if !self.is_metric_name_template_variable {
            self.initialize_tags(source).await;
        }
    }

    /// Feature templates from the backend, or the built-in catalog.
    pub async fn load_features(&mut self, source: &dyn QuerySource) {
        let features = match source.features().await {
            Ok(features) => features,
            Err(e) => {
                warn!("Falling back to built-in features: {}", e);
                metrics::catalog::legacy_fallback();
                legacy_features()
            }
        };
        self.features = Some(features);
        self.refresh_templates();
    }

    pub fn refresh_templates(&mut self) {
        if let Some(features) = &mut self.features {
            for feature in features.iter_mut() {
                feature.refresh(&self.tags);
            }
        }
    }

    /// Handle on the tag request counter, for completions delivered elsewhere.
    pub fn tag_requests(&self) -> RequestSequence {
        self.tag_requests.clone()
    }

    /// Clears the previous tag state and returns the token of a new tag request,
    /// or `None` when the target names no metric.
    pub fn begin_tags_request(&mut self) -> Option<u64> {
        self.tags_initialization_error = None;
        self.tags = MetricTags::new();
        self.target.query.metric_name.as_deref().filter(|m| !m.is_empty())?;
        Some(self.tag_requests.next())
    }

    /// Applies a tag request outcome. Returns `false` when a newer request was
    /// started in between and the outcome was discarded.
    pub fn complete_tags_request(&mut self, token: u64, outcome: Result<Tags>) -> bool {
        if !self.tag_requests.is_current(token) {
            debug!("Discarding stale tags result (request {})", token);
            metrics::tags::stale_result_discarded();
            return false;
        }

        match outcome {
            Ok(tags) => self.tags.update_tags(tags),
            Err(e) => {
                warn!("Failed to load tags: {}", e);
                self.tags_initialization_error = Some(error_message(&e));
            }
        }
        self.refresh_templates();
        true
    }

    pub async fn initialize_tags(&mut self, source: &dyn QuerySource) {
        let Some(token) = self.begin_tags_request() else {
            return;
        };
        let metric_name = self.target.query.metric_name.clone().unwrap_or_default();
        let outcome = source.metric_tags(&metric_name, &Tags::new()).await;
        self.complete_tags_request(token, outcome);
    }

    /// Reacts to an edited metric name: tag constraints are dropped and the
    /// target is reinitialized. Returns `false` when the name did not change.
    pub async fn on_metric_name_changed(
        &mut self,
        metric_name: Option<String>,
        is_template_variable: bool,
        source: &dyn QuerySource,
    ) -> bool {
        if self.target.query.metric_name == metric_name {
            return false;
        }
        self.target.query.metric_name = metric_name.clone();
        self.is_metric_name_template_variable = is_template_variable;
        self.initialize(metric_name, false, source).await;
        self.target.query.tags.clear();
        true
    }

    pub fn validate_time_override(&mut self) -> Option<&str> {
        let missing_offset = self.enabled_time_override
            && self.target.query.time_offset.map_or(true, |offset| offset.value.is_none());
        self.time_override_error = missing_offset.then(|| TIME_OVERRIDE_MISSING_OFFSET.to_string());
        self.time_override_error.as_deref()
    }

    /// One-line summary: `metric as alias { (c1 > c2) > (c3) }`.
    pub fn collapsed_text(&self) -> String {
        let Some(metric_name) = &self.target.query.metric_name else {
            return SELECT_A_METRIC.to_string();
        };

        let alias = match self.target.query.alias.as_deref() {
            Some(alias) if !alias.is_empty() => format!(" as {}", alias),
            _ => String::new(),
        };
        let flow = self
            .target
            .query
            .features
            .iter()
            .filter(|feature| !feature.components.is_empty())
            .map(|feature| {
                let names: Vec<&str> = feature.components.iter().map(|c| c.name.as_str()).collect();
                format!("({})", names.join(" > "))
            })
            .collect::<Vec<_>>()
            .join(" > ");
        format!("{}{} {{ {} }}", metric_name, alias, flow)
    }

    pub fn show_features(&self) -> bool {
        self.target.query.metric_name.as_deref().is_some_and(|m| !m.is_empty())
            && !self.target.query.features.is_empty()
    }

    pub fn toggle_auto_sync(&mut self) {
        self.target.auto_sync = !self.target.auto_sync;
    }

    pub fn toggle_safeguard(&mut self) {
        self.expand_safeguard = !self.expand_safeguard;
    }

    pub fn toggle_time_override(&mut self) {
        self.enabled_time_override = !self.enabled_time_override;
        self.target.query.time_offset = self
            .enabled_time_override
            .then(|| TimeOffset::new(1.0, TimeUnit::Hours));
    }

    pub fn toggle_fetch_previous_sample(&mut self) {
        self.enabled_fetch_previous_sample = !self.enabled_fetch_previous_sample;
        self.target.fetch_previous_sample = self
            .enabled_fetch_previous_sample
            .then(FetchPreviousSample::default);
    }

    pub fn toggle_merge_groups(&mut self) {
        if let Some(fps) = &mut self.target.fetch_previous_sample {
            fps.merge_groups = !fps.merge_groups;
        }
    }

    pub fn toggle_time_align(&mut self) {
        if let Some(fps) = &mut self.target.fetch_previous_sample {
            fps.time_align = !fps.time_align;
        }
    }

    pub fn toggle_for_empty_results_only(&mut self) {
        if let Some(fps) = &mut self.target.fetch_previous_sample {
            fps.for_empty_results_only = !fps.for_empty_results_only;
        }
    }

    pub fn add_filter(&mut self) {
        self.target.filters.push(TagFilter::default());
    }

    pub fn set_filter_name(&mut self, index: usize, name: impl Into<String>) {
        if let Some(filter) = self.target.filters.get_mut(index) {
            filter.name = name.into();
        }
    }

    /// Adds a value to a filter, ignoring blanks and duplicates.
    pub fn add_filter_value(&mut self, index: usize, value: &str) -> bool {
        let Some(filter) = self.target.filters.get_mut(index) else {
            return false;
        };
        if value.is_empty() || filter.values.iter().any(|v| v == value) {
            return false;
        }
        filter.values.push(value.to_string());
        true
    }

    pub fn remove_filter(&mut self, index: usize) -> Option<TagFilter> {
        (index < self.target.filters.len()).then(|| self.target.filters.remove(index))
    }

    pub fn remove_filter_value(&mut self, filter_index: usize, value_index: usize) -> Option<String> {
        let filter = self.target.filters.get_mut(filter_index)?;
        (value_index < filter.values.len()).then(|| filter.values.remove(value_index))
    }

    pub fn time_unit_options() -> Vec<&'static str> {
        TimeUnit::all().iter().map(TimeUnit::as_str).collect()
    }
}

/// Backend message of a failed request, without the error-kind prefix.
fn error_message(error: &DatasourceError) -> String {
    match error {
        DatasourceError::Transport { message } | DatasourceError::Request { message } => message.clone(),
        other => other.to_string(),
    }
}
