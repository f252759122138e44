use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::debug;

use super::datapoints_query::DatapointsQuery;
use super::metric_query::MetricQuery;
use super::metric_tags::Tags;
use super::options::QueryOptions;
use super::target::{DatasourceTarget, FetchPreviousSample, KairosDBTarget, Safeguard};
use crate::constants::{
    DATAPOINTS_PATH, DATAPOINTS_REQUEST_ID_PREFIX, FEATURES_PATH, HEALTH_CHECK_PATH,
    METRIC_NAMES_PATH, METRIC_TAGS_PATH, SKYMINER_DATASOURCE_TYPE,
};
use crate::templating::VariableExpander;
use crate::time::{time_override_from_offset, TimeOverride};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

/// Transport-agnostic request description.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    pub with_credentials: bool,
    /// Lets the host cancel a superseded request with the same id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// Builds the backend requests of one datasource connection.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    url: String,
    api_path: String,
    with_credentials: bool,
    expander: VariableExpander,
}

impl QueryBuilder {
    pub fn new(
        url: impl Into<String>,
        api_path: impl Into<String>,
        with_credentials: bool,
        expander: VariableExpander,
    ) -> Self {
        Self {
            url: url.into(),
            api_path: api_path.into(),
            with_credentials,
            expander,
        }
    }

    pub fn build_metric_names_query(&self) -> HttpRequest {
        self.build_request(HttpMethod::Get, METRIC_NAMES_PATH, None, None)
    }

    pub fn build_features_query(&self) -> HttpRequest {
        self.build_request(HttpMethod::Get, FEATURES_PATH, None, None)
    }

    pub fn build_health_check_query(&self) -> HttpRequest {
        self.build_request(HttpMethod::Get, HEALTH_CHECK_PATH, None, None)
    }

    pub fn build_metric_tags_query(&self, metric_name: &str, filters: &Tags) -> HttpRequest {
        let data = json!({
            "cache_time": 0,
            "metrics": [{"name": metric_name, "tags": filters}],
            "start_absolute": 0,
        });
        self.build_request(HttpMethod::Post, METRIC_TAGS_PATH, Some(data), None)
    }

    pub fn build_datapoints_query(
        &self,
        targets: &[DatasourceTarget],
        options: &QueryOptions,
        fetch_previous_sample: Option<FetchPreviousSample>,
        safeguard: Option<Safeguard>,
    ) -> HttpRequest {
        self.build_datapoints_query_at(targets, options, fetch_previous_sample, safeguard, Utc::now())
    }

    /// Same as [`build_datapoints_query`](Self::build_datapoints_query) with calendar
    /// offsets measured from `now`.
    pub fn build_datapoints_query_at(
        &self,
        targets: &[DatasourceTarget],
        options: &QueryOptions,
        fetch_previous_sample: Option<FetchPreviousSample>,
        safeguard: Option<Safeguard>,
        now: DateTime<Utc>,
    ) -> HttpRequest {
        let metrics = targets
            .iter()
            .map(|target| {
                let remove_limits = match &options.annotation {
                    Some(annotation) => annotation.datasource != SKYMINER_DATASOURCE_TYPE,
                    None => target.datasource.as_deref() != Some(SKYMINER_DATASOURCE_TYPE),
                };
                self.build_metric_query(&target.query, options, remove_limits, now)
            })
            .collect::<Vec<_>>();
        debug!("Built datapoints query with {} metrics", metrics.len());

        let query = DatapointsQuery::new(
            options.range.from,
            options.range.to,
            metrics,
            fetch_previous_sample,
            safeguard,
        );
        let request_id = options
            .panel_id
            .map(|panel_id| format!("{}{}", DATAPOINTS_REQUEST_ID_PREFIX, panel_id));

        self.build_request(
            HttpMethod::Post,
            DATAPOINTS_PATH,
            serde_json::to_value(&query).ok(),
            request_id,
        )
    }

    fn build_metric_query(
        &self,
        target: &KairosDBTarget,
        options: &QueryOptions,
        remove_limits: bool,
        now: DateTime<Utc>,
    ) -> MetricQuery {
        MetricQuery::new(
            target.metric_name.clone().unwrap_or_default(),
            remove_limits,
            self.unpack_tags(&target.tags),
            &target.features,
            target.group_limit,
            self.time_override(target, options, now),
            &self.expander,
        )
    }

    fn time_override(
        &self,
        target: &KairosDBTarget,
        options: &QueryOptions,
        now: DateTime<Utc>,
    ) -> Option<TimeOverride> {
        time_override_from_offset(
            target.time_offset.as_ref(),
            options.range.from,
            options.range.to,
            now,
        )
    }

    /// Keeps non-empty tag lists, expanding every value.
    fn unpack_tags(&self, tags: &Tags) -> Tags {
        tags.iter()
            .filter(|(_, values)| !values.is_empty())
            .map(|(key, values)| (key.clone(), self.expander.replace_all(values)))
            .collect()
    }

    fn build_request(
        &self,
        method: HttpMethod,
        path: &str,
        data: Option<Value>,
        request_id: Option<String>,
    ) -> HttpRequest {
        HttpRequest {
            method,
            url: format!("{}{}{}", self.url, self.api_path, path),
            data,
            with_credentials: self.with_credentials,
            request_id,
        }
    }
}
