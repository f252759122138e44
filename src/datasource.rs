//! Datasource facade: the operations the dashboard host calls.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::app::ports::{HttpResponse, MetricNamesFetcher, QuerySource, Transport, TransportError};
use crate::config::DatasourceConfig;
use crate::constants::{HEALTH_CHECK_FAILED, HEALTH_CHECK_OK_STATUS};
use crate::error::{DatasourceError, Result};
use crate::features::{legacy_features, parse_catalog, FeatureTemplate};
use crate::metric_names::MetricNamesStore;
use crate::observability::metrics;
use crate::request::{
    DatasourceTarget, FetchPreviousSample, HttpRequest, QueryBuilder, QueryOptions, Safeguard,
    Tags, TargetValidator, TemplateQuery,
};
use crate::response::{Annotation, ResponseBody, ResponseHandler, TimeSeries};
use crate::templating::{ScopedVars, TemplateService, VariableExpander};

/// Targets ready for the query builder, with the request-wide settings they declare.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UnpackedTargets {
    pub targets: Vec<DatasourceTarget>,
    pub aliases: Vec<Option<String>>,
    pub fetch_previous_sample: Option<FetchPreviousSample>,
    pub safeguard: Option<Safeguard>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl HealthStatus {
    pub fn success() -> Self {
        Self {
            status: "success".to_string(),
            message: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

/// Entry of a metric-find result list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplatingValue {
    pub text: String,
    pub value: String,
}

impl TemplatingValue {
    fn new(entry: impl Into<String>) -> Self {
        let entry = entry.into();
        Self {
            text: entry.clone(),
            value: entry,
        }
    }
}

pub struct KairosDBDatasource {
    settings: DatasourceConfig,
    transport: Arc<dyn Transport>,
    template_service: Arc<dyn TemplateService>,
    metric_names: Arc<MetricNamesStore>,
    response_handler: ResponseHandler,
    target_validator: TargetValidator,
    initialized: AtomicBool,
    initialization_error: AtomicBool,
}

impl KairosDBDatasource {
    pub fn new(
        settings: DatasourceConfig,
        transport: Arc<dyn Transport>,
        template_service: Arc<dyn TemplateService>,
    ) -> Self {
        let metric_names = Arc::new(MetricNamesStore::new(&settings.url));
        Self {
            settings,
            transport,
            template_service,
            metric_names,
            response_handler: ResponseHandler::new(),
            target_validator: TargetValidator::new(),
            initialized: AtomicBool::new(false),
            initialization_error: AtomicBool::new(false),
        }
    }

    pub fn settings(&self) -> &DatasourceConfig {
        &self.settings
    }

    pub fn datasource_type(&self) -> &str {
        &self.settings.datasource_type
    }

    pub fn metric_names_store(&self) -> &Arc<MetricNamesStore> {
        &self.metric_names
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    pub fn has_initialization_error(&self) -> bool {
        self.initialization_error.load(Ordering::SeqCst)
    }

    pub fn expander(&self, scoped_vars: &ScopedVars) -> VariableExpander {
        VariableExpander::new(Arc::clone(&self.template_service), scoped_vars.clone())
    }

    fn query_builder(&self, scoped_vars: &ScopedVars) -> QueryBuilder {
        QueryBuilder::new(
            &self.settings.url,
            &self.settings.api_path,
            self.settings.with_credentials,
            self.expander(scoped_vars),
        )
    }

    /// Loads the metric-name cache, recording the outcome in the initialization flags.
    pub async fn initialize(&self) {
        let template_variables = self.get_template_variables();
        let outcome = self.metric_names.initialize(&template_variables, self).await;
        self.record_initialization(outcome);
    }

    /// Refetches metric names regardless of the cache state.
    pub async fn fetch_metric_names(&self) {
        let template_variables = self.get_template_variables();
        let outcome = self.metric_names.fetch(&template_variables, self).await;
        self.record_initialization(outcome);
    }

    fn record_initialization(&self, outcome: Result<Vec<String>>) {
        match outcome {
            Ok(names) => {
                debug!("Metric names ready ({} entries)", names.len());
                self.initialized.store(true, Ordering::SeqCst);
            }
            Err(e) => {
                warn!("Failed to load metric names: {}", e);
                self.initialization_error.store(true, Ordering::SeqCst);
            }
        }
    }

    /// Prepares targets for the query builder.
    ///
    /// Hidden and metric-less targets are dropped. Template variables are expanded
    /// in metric names, filters and feature values; filters are folded into the
    /// tags. The last target declaring a previous-sample directive or a safeguard
    /// provides it for the whole request. Returns `None` when a remaining target
    /// is invalid.
    pub fn unpack_targets(
        &self,
        targets: &[DatasourceTarget],
        expander: &VariableExpander,
    ) -> Option<UnpackedTargets> {
        let enabled: Vec<DatasourceTarget> = targets
            .iter()
            .filter(|target| target.is_enabled())
            .cloned()
            .map(|mut target| {
                target.safeguard = target.safeguard.take().map(Safeguard::normalized);
                target
            })
            .collect();

        if !self.target_validator.are_valid_targets(&enabled) {
            warn!("Dropping request with invalid targets");
            return None;
        }

        let mut unpacked = UnpackedTargets {
            aliases: enabled.iter().map(|t| t.query.alias.clone()).collect(),
            ..UnpackedTargets::default()
        };

        for mut target in enabled {
            target.query.metric_name = target
                .query
                .metric_name
                .as_deref()
                .map(|name| expander.replace_first(name));

            for filter in &mut target.filters {
                filter.name = expander.replace_first(&filter.name);
                filter.values = expander.replace_all(&filter.values);
            }
            for filter in &target.filters {
                target
                    .query
                    .tags
                    .insert(filter.name.clone(), filter.values.clone());
            }

            for feature in &mut target.query.features {
                feature.expand_values(expander);
            }

            if let Some(fetch_previous_sample) = target.fetch_previous_sample.take() {
                unpacked.fetch_previous_sample = Some(fetch_previous_sample);
            }
            if let Some(safeguard) = target.safeguard.take() {
                unpacked.safeguard = Some(safeguard);
            }
            unpacked.targets.push(target);
        }

        Some(unpacked)
    }

    /// Datapoints of the enabled targets, one series per result.
    #[instrument(skip(self, options), fields(targets = options.targets.len()))]
    pub async fn query(&self, options: &QueryOptions) -> Result<Vec<TimeSeries>> {
        let expander = self.expander(&options.scoped_vars);
        let Some(unpacked) = self.unpack_targets(&options.targets, &expander) else {
            return Ok(Vec::new());
        };
        if unpacked.targets.is_empty() {
            return Ok(Vec::new());
        }

        let request = self.query_builder(&options.scoped_vars).build_datapoints_query(
            &unpacked.targets,
            options,
            unpacked.fetch_previous_sample,
            unpacked.safeguard,
        );

        match self.fetch_datapoints(&request).await? {
            Some(body) => Ok(self
                .response_handler
                .convert_to_datapoints(&body, &unpacked.aliases)),
            None => Ok(Vec::new()),
        }
    }

    /// Annotations built from the datapoints of the annotation's target.
    #[instrument(skip(self, options))]
    pub async fn annotation_query(&self, options: &QueryOptions) -> Result<Vec<Annotation>> {
        let Some(annotation) = &options.annotation else {
            return Err(DatasourceError::MissingField("annotation".to_string()));
        };

        let expander = self.expander(&options.scoped_vars);
        let Some(unpacked) = self.unpack_targets(std::slice::from_ref(&annotation.target), &expander) else {
            return Ok(Vec::new());
        };
        if unpacked.targets.is_empty() {
            return Ok(Vec::new());
        }

        let request = self.query_builder(&options.scoped_vars).build_datapoints_query(
            &unpacked.targets,
            options,
            unpacked.fetch_previous_sample,
            unpacked.safeguard,
        );

        match self.fetch_datapoints(&request).await? {
            Some(body) => Ok(self
                .response_handler
                .convert_to_annotations(&body, annotation, &unpacked.aliases)),
            None => Ok(Vec::new()),
        }
    }

    /// `Ok(None)` stands for "no data": cancelled requests and unreadable bodies.
    async fn fetch_datapoints(&self, request: &HttpRequest) -> Result<Option<ResponseBody>> {
        let response = match self.execute(request, "datapoints").await {
            Ok(response) => response,
            Err(e) => {
                return match e.backend_errors() {
                    Some(errors) => Err(DatasourceError::from_backend_errors(&errors)),
                    None => {
                        info!("Datapoints request returned no data: {}", e);
                        Ok(None)
                    }
                };
            }
        };

        match serde_json::from_value::<ResponseBody>(response.data) {
            Ok(body) => Ok(Some(body)),
            Err(e) => {
                warn!("Unreadable datapoints response: {}", e);
                Ok(None)
            }
        }
    }

    /// Health check: the backend answers 204 when healthy.
    pub async fn test_datasource(&self) -> HealthStatus {
        let request = self.query_builder(&ScopedVars::new()).build_health_check_query();
        match self.execute(&request, "health").await {
            Ok(response) if response.status == HEALTH_CHECK_OK_STATUS => HealthStatus::success(),
            Ok(response) => {
                debug!("Health check answered {}", response.status);
                HealthStatus::error(HEALTH_CHECK_FAILED)
            }
            Err(e) => {
                debug!("Health check failed: {}", e.display_message());
                HealthStatus::error(HEALTH_CHECK_FAILED)
            }
        }
    }

    /// Metric names known to the backend (`data.results`).
    pub async fn get_metric_names(&self) -> Result<Vec<String>> {
        let request = self.query_builder(&ScopedVars::new()).build_metric_names_query();
        let response = self
            .execute(&request, "metric_names")
            .await
            .map_err(transport_error)?;

        let results = response
            .data
            .get("results")
            .cloned()
            .ok_or_else(|| DatasourceError::MissingField("results".to_string()))?;
        Ok(serde_json::from_value(results)?)
    }

    /// Tags of the (template-expanded) metric, optionally constrained by `filters`.
    pub async fn get_metric_tags(&self, metric_name_template: &str, filters: &Tags) -> Result<Tags> {
        let metric_name = self.expander(&ScopedVars::new()).replace_first(metric_name_template);
        let request = self
            .query_builder(&ScopedVars::new())
            .build_metric_tags_query(&metric_name, filters);
        let response = self
            .execute(&request, "metric_tags")
            .await
            .map_err(transport_error)?;

        let tags = response
            .data
            .pointer("/queries/0/results/0/tags")
            .cloned()
            .ok_or_else(|| DatasourceError::MissingField("queries[0].results[0].tags".to_string()))?;
        Ok(serde_json::from_value(tags)?)
    }

    /// Resolves a template-variable query (see [`TemplateQuery`]).
    pub async fn metric_find_query(&self, query: &str) -> Result<Vec<TemplatingValue>> {
        let entries = match TemplateQuery::parse(query)? {
            TemplateQuery::MetricNames => self.get_metric_names().await?,
            TemplateQuery::TagKeys { metric } => {
                self.get_metric_tags(&metric, &Tags::new()).await?.into_keys().collect()
            }
            TemplateQuery::TagValues { metric, tag_key } => self
                .get_metric_tags(&metric, &Tags::new())
                .await?
                .remove(&tag_key)
                .unwrap_or_default(),
            TemplateQuery::FilteredTagValues {
                metric,
                tag_key,
                filters,
            } => self
                .get_metric_tags(&metric, &filters)
                .await?
                .remove(&tag_key)
                .unwrap_or_default(),
        };
        Ok(entries.into_iter().map(TemplatingValue::new).collect())
    }

    /// Feature catalog served by the backend, or the built-in one.
    pub async fn get_features(&self) -> Vec<FeatureTemplate> {
        match self.fetch_features().await {
            Ok(features) => features,
            Err(e) => {
                info!("Using built-in feature catalog: {}", e);
                metrics::catalog::legacy_fallback();
                legacy_features()
            }
        }
    }

    async fn fetch_features(&self) -> Result<Vec<FeatureTemplate>> {
        let request = self.query_builder(&ScopedVars::new()).build_features_query();
        let response = self
            .execute(&request, "features")
            .await
            .map_err(transport_error)?;
        parse_catalog(&response.data.to_string())
    }

    /// Dashboard variables as `$name`.
    pub fn get_template_variables(&self) -> Vec<String> {
        self.expander(&ScopedVars::new()).template_variables()
    }

    pub fn is_template_variable(&self, name: &str) -> bool {
        self.get_template_variables().iter().any(|v| v == name)
    }

    async fn execute(
        &self,
        request: &HttpRequest,
        kind: &'static str,
    ) -> std::result::Result<HttpResponse, TransportError> {
        debug!("{} {}", request.method.as_str(), request.url);
        metrics::requests::issued(kind);
        let started = Instant::now();

        let outcome = self.transport.request(request).await;
        metrics::requests::duration(kind, started.elapsed().as_secs_f64());
        if let Err(e) = &outcome {
            warn!("{} request to {} failed: {}", kind, request.url, e);
            metrics::requests::failed(kind);
        }
        outcome
    }
}

fn transport_error(e: TransportError) -> DatasourceError {
    DatasourceError::Transport {
        message: e.display_message(),
    }
}

#[async_trait]
impl MetricNamesFetcher for KairosDBDatasource {
    async fn fetch_metric_names(&self) -> Result<Vec<String>> {
        self.get_metric_names().await
    }
}

#[async_trait]
impl QuerySource for KairosDBDatasource {
    async fn metric_tags(&self, metric_name: &str, filters: &Tags) -> Result<Tags> {
        self.get_metric_tags(metric_name, filters).await
    }

    async fn features(&self) -> Result<Vec<FeatureTemplate>> {
        Ok(self.get_features().await)
    }
}

impl std::fmt::Debug for KairosDBDatasource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KairosDBDatasource")
            .field("settings", &self.settings)
            .field("initialized", &self.is_initialized())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{KairosDBTarget, TagFilter};
    use crate::templating::StaticTemplateService;

    struct NoTransport;

    #[async_trait]
    impl Transport for NoTransport {
        async fn request(&self, _request: &HttpRequest) -> std::result::Result<HttpResponse, TransportError> {
            Err(TransportError::new("offline"))
        }
    }

    fn datasource() -> KairosDBDatasource {
        let service = StaticTemplateService::default()
            .with_variable("metric", vec!["cpu".to_string(), "mem".to_string()])
            .with_variable("dc", vec!["eu".to_string(), "us".to_string()]);
        KairosDBDatasource::new(
            DatasourceConfig::new("http://kairosdb:8080"),
            Arc::new(NoTransport),
            Arc::new(service),
        )
    }

    #[test]
    fn test_unpack_targets_filters_and_expands() {
        let datasource = datasource();
        let expander = datasource.expander(&ScopedVars::new());

        let mut first = DatasourceTarget::new("A", KairosDBTarget::new("$metric"));
        first.query.alias = Some("load".to_string());
        first.filters = vec![TagFilter {
            name: "datacenter".to_string(),
            values: vec!["$dc".to_string()],
        }];
        first.fetch_previous_sample = Some(FetchPreviousSample::default());

        let mut hidden = DatasourceTarget::new("B", KairosDBTarget::new("disk"));
        hidden.hide = true;
        let unnamed = DatasourceTarget::new("C", KairosDBTarget::default());

        let mut last = DatasourceTarget::new("D", KairosDBTarget::new("net"));
        last.safeguard = Some(Safeguard::default_limits());

        let unpacked = datasource
            .unpack_targets(&[first, hidden, unnamed, last], &expander)
            .unwrap();

        assert_eq!(unpacked.targets.len(), 2);
        assert_eq!(unpacked.aliases, vec![Some("load".to_string()), None]);
        assert_eq!(unpacked.targets[0].query.metric_name.as_deref(), Some("cpu"));
        assert_eq!(unpacked.targets[0].query.tags["datacenter"], vec!["eu", "us"]);
        assert_eq!(unpacked.fetch_previous_sample, Some(FetchPreviousSample::default()));
        assert_eq!(unpacked.safeguard, Some(Safeguard::default_limits()));
        assert!(unpacked.targets.iter().all(|t| t.safeguard.is_none()));
    }

    #[test]
    fn test_template_variables() {
        let datasource = datasource();
        assert_eq!(datasource.get_template_variables(), vec!["$dc", "$metric"]);
        assert!(datasource.is_template_variable("$metric"));
        assert!(!datasource.is_template_variable("metric"));
    }

    #[tokio::test]
    async fn test_offline_backend_degrades() {
        let datasource = datasource();

        let health = datasource.test_datasource().await;
        assert_eq!(health.status, "error");
        assert_eq!(health.message.as_deref(), Some("Health check fail"));

        assert_eq!(datasource.get_features().await.len(), 2);

        datasource.initialize().await;
        assert!(!datasource.is_initialized());
        assert!(datasource.has_initialization_error());
    }
}
