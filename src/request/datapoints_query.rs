use serde::Serialize;

use super::metric_query::MetricQuery;
use super::target::{FetchPreviousSample, Safeguard};

/// Body of `POST /datapoints/query`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatapointsQuery {
    pub start_absolute: i64,
    pub end_absolute: i64,
    pub metrics: Vec<MetricQuery>,
    pub cache_time: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fetch_previous_sample: Option<FetchPreviousSample>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub safeguard: Option<Safeguard>,
}

impl DatapointsQuery {
    /// `from` and `to` are Unix seconds; the body carries milliseconds.
    pub fn new(
        from: i64,
        to: i64,
        metrics: Vec<MetricQuery>,
        fetch_previous_sample: Option<FetchPreviousSample>,
        safeguard: Option<Safeguard>,
    ) -> Self {
        Self {
            start_absolute: from * 1000,
            end_absolute: to * 1000,
            metrics,
            cache_time: 0,
            fetch_previous_sample,
            safeguard,
        }
    }
}
