use serde::{Deserialize, Serialize};

use super::target::DatasourceTarget;
use crate::templating::ScopedVars;

/// Dashboard time range in Unix seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub from: i64,
    pub to: i64,
}

/// Annotation definition driving an annotation query.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnnotationOptions {
    pub name: String,
    /// Datasource type the annotation is defined against
    #[serde(default)]
    pub datasource: String,
    #[serde(default)]
    pub target: DatasourceTarget,
}

/// Per-request options passed by the dashboard host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryOptions {
    pub range: TimeRange,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub panel_id: Option<u64>,
    #[serde(default)]
    pub targets: Vec<DatasourceTarget>,
    #[serde(default)]
    pub scoped_vars: ScopedVars,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotation: Option<AnnotationOptions>,
}

impl QueryOptions {
    pub fn new(range: TimeRange, targets: Vec<DatasourceTarget>) -> Self {
        Self {
            range,
            panel_id: None,
            targets,
            scoped_vars: ScopedVars::new(),
            annotation: None,
        }
    }

    pub fn with_panel_id(mut self, panel_id: u64) -> Self {
        self.panel_id = Some(panel_id);
        self
    }

    pub fn with_annotation(mut self, annotation: AnnotationOptions) -> Self {
        self.annotation = Some(annotation);
        self
    }
}
