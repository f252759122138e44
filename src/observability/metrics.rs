//! Metrics for the datasource
//!
//! Counters and histograms are recorded through the `metrics` facade. The
//! embedding application decides whether (and where) they are exported.

use std::fmt;

/// Enum representing all metric names used by the datasource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    // Backend requests
    RequestsIssued,
    RequestsFailed,
    RequestDuration,

    // Responses
    SeriesProduced,
    AnnotationsProduced,

    // Feature catalog
    CatalogUnknownParameterType,
    CatalogLegacyFallback,

    // Metric tags
    TagsStaleResultsDiscarded,

    // Metric names cache
    MetricNamesCacheHits,
    MetricNamesCacheMisses,
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::RequestsIssued => "kairosdb_datasource_requests_total",
            MetricName::RequestsFailed => "kairosdb_datasource_requests_failed_total",
            MetricName::RequestDuration => "kairosdb_datasource_request_duration_seconds",
            MetricName::SeriesProduced => "kairosdb_datasource_series_produced_total",
            MetricName::AnnotationsProduced => "kairosdb_datasource_annotations_produced_total",
            MetricName::CatalogUnknownParameterType => {
                "kairosdb_datasource_catalog_unknown_parameter_type_total"
            }
            MetricName::CatalogLegacyFallback => "kairosdb_datasource_catalog_legacy_fallback_total",
            MetricName::TagsStaleResultsDiscarded => {
                "kairosdb_datasource_tags_stale_results_discarded_total"
            }
            MetricName::MetricNamesCacheHits => "kairosdb_datasource_metric_names_cache_hits_total",
            MetricName::MetricNamesCacheMisses => {
                "kairosdb_datasource_metric_names_cache_misses_total"
            }
        }
    }

    /// Get all metric names as an iterator
    pub fn all_metrics() -> impl Iterator<Item = MetricName> {
        use MetricName::*;
        [
            RequestsIssued,
            RequestsFailed,
            RequestDuration,
            SeriesProduced,
            AnnotationsProduced,
            CatalogUnknownParameterType,
            CatalogLegacyFallback,
            TagsStaleResultsDiscarded,
            MetricNamesCacheHits,
            MetricNamesCacheMisses,
        ]
        .into_iter()
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Request Metrics
// ============================================================================

pub mod requests {
    use super::MetricName;

    /// Record a request sent to the backend, labelled by endpoint kind
    pub fn issued(kind: &'static str) {
        ::metrics::counter!(MetricName::RequestsIssued.as_str(), "kind" => kind).increment(1);
    }

    /// Record a transport or backend failure
    pub fn failed(kind: &'static str) {
        ::metrics::counter!(MetricName::RequestsFailed.as_str(), "kind" => kind).increment(1);
    }

    pub fn duration(kind: &'static str, seconds: f64) {
        ::metrics::histogram!(MetricName::RequestDuration.as_str(), "kind" => kind).record(seconds);
    }
}

// ============================================================================
// Response Metrics
// ============================================================================

pub mod responses {
    use super::MetricName;

    pub fn series_produced(count: usize) {
        ::metrics::counter!(MetricName::SeriesProduced.as_str()).increment(count as u64);
    }

    pub fn annotations_produced(count: usize) {
        ::metrics::counter!(MetricName::AnnotationsProduced.as_str()).increment(count as u64);
    }
}

// ============================================================================
// Catalog Metrics
// ============================================================================

pub mod catalog {
    use super::MetricName;

    /// Record a catalog parameter dropped because its type is not supported
    pub fn unknown_parameter_type(parameter_type: &str) {
        ::metrics::counter!(
            MetricName::CatalogUnknownParameterType.as_str(),
            "type" => parameter_type.to_lowercase()
        )
        .increment(1);
    }

    /// Record a fallback to the built-in feature catalog
    pub fn legacy_fallback() {
        ::metrics::counter!(MetricName::CatalogLegacyFallback.as_str()).increment(1);
    }
}

// ============================================================================
// Tags / Metric Names Metrics
// ============================================================================

pub mod tags {
    use super::MetricName;

    pub fn stale_result_discarded() {
        ::metrics::counter!(MetricName::TagsStaleResultsDiscarded.as_str()).increment(1);
    }
}

pub mod metric_names {
    use super::MetricName;

    pub fn cache_hit() {
        ::metrics::counter!(MetricName::MetricNamesCacheHits.as_str()).increment(1);
    }

    pub fn cache_miss() {
        ::metrics::counter!(MetricName::MetricNamesCacheMisses.as_str()).increment(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_metric_names_are_unique_and_prefixed() {
        let names: HashSet<&str> = MetricName::all_metrics().map(|m| m.as_str()).collect();
        assert_eq!(names.len(), MetricName::all_metrics().count());
        assert!(names.iter().all(|n| n.starts_with("kairosdb_datasource_")));
    }

    #[test]
    fn test_recording_without_recorder_is_noop() {
        requests::issued("datapoints");
        catalog::unknown_parameter_type("Color");
        responses::series_produced(3);
    }
}
