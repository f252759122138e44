pub mod config;
pub mod constants;
pub mod error;
pub mod format;
pub mod logging;
pub mod observability;

// Feature catalog, templating and the request/response model
pub mod features;
pub mod request;
pub mod response;
pub mod templating;
pub mod time;

pub mod context;
pub mod datasource;
pub mod metric_names;

// Ports and their adapters
pub mod app;
pub mod infra;

pub use context::QueryContext;
pub use datasource::{HealthStatus, KairosDBDatasource, TemplatingValue, UnpackedTargets};
pub use error::{DatasourceError, Result};
