//! Response side: wire model, series naming and conversion for the host.

pub mod handler;
pub mod model;
pub mod series_name;

pub use handler::{Annotation, ResponseHandler, TimeSeries};
pub use model::{GroupByResult, QueryResponse, QueryResult, ResponseBody};
pub use series_name::SeriesNameBuilder;
