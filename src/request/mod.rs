//! Request side: dashboard targets and the wire requests built from them.

pub mod datapoints_query;
pub mod metric_query;
pub mod metric_tags;
pub mod options;
pub mod query_builder;
pub mod target;
pub mod target_validator;
pub mod template_query;

pub use datapoints_query::DatapointsQuery;
pub use metric_query::MetricQuery;
pub use metric_tags::{MetricTags, Tags};
pub use options::{AnnotationOptions, QueryOptions, TimeRange};
pub use query_builder::{HttpMethod, HttpRequest, QueryBuilder};
pub use target::{DatasourceTarget, FetchPreviousSample, KairosDBTarget, Safeguard, TagFilter};
pub use target_validator::TargetValidator;
pub use template_query::TemplateQuery;
