/// Datasource-level constants shared across the request and response layers

// REST API layout of the backend
pub const DEFAULT_API_PATH: &str = "/api/v1";
pub const METRIC_NAMES_PATH: &str = "/metricnames";
pub const FEATURES_PATH: &str = "/features";
pub const HEALTH_CHECK_PATH: &str = "/health/check";
pub const METRIC_TAGS_PATH: &str = "/datapoints/query/tags";
pub const DATAPOINTS_PATH: &str = "/datapoints/query";

/// Status returned by a healthy backend on the health check endpoint
pub const HEALTH_CHECK_OK_STATUS: u16 = 204;

// Datasource type identifiers
pub const KAIROSDB_DATASOURCE_TYPE: &str = "grafana-kairosdb-datasource";
/// Backend flavour that understands safeguards, previous-sample fetches and limits
pub const SKYMINER_DATASOURCE_TYPE: &str = "grafana-skyminer-datasource";

/// Prefix of the metric-name cache key; the connection URL is appended
pub const METRIC_NAMES_CACHE_PREFIX: &str = "KAIROSDB_METRIC_NAMES_";

/// Request id prefix for datapoints queries; the panel id is appended
pub const DATAPOINTS_REQUEST_ID_PREFIX: &str = "metric_names_";

pub const TIME_OVERRIDE_MISSING_OFFSET: &str = "You must define an offset for time override feature";
pub const HEALTH_CHECK_FAILED: &str = "Health check fail";
pub const SELECT_A_METRIC: &str = "Select a metric";

/// Safeguard limits applied when a target does not declare its own
pub const DEFAULT_SAFEGUARD_GROUP_LIMIT: u64 = 30;
pub const DEFAULT_SAFEGUARD_BEFORE_AGGREGATION: u64 = 5_000_000;
pub const DEFAULT_SAFEGUARD_AFTER_AGGREGATION: u64 = 10_000;
pub const DEFAULT_SAFEGUARD_LIMIT: u64 = 0;

/// Separator used by the host templating engine inside `{a,b}` groups
pub const MULTI_VALUE_SEPARATOR: char = ',';
