use super::target::{DatasourceTarget, KairosDBTarget};

/// Decides whether targets are complete enough to be queried.
#[derive(Debug, Clone, Copy, Default)]
pub struct TargetValidator;

impl TargetValidator {
    pub fn new() -> Self {
        Self
    }

    /// A target needs a non-blank metric name.
    pub fn is_valid_target(&self, target: &KairosDBTarget) -> bool {
        target
            .metric_name
            .as_deref()
            .is_some_and(|name| !name.trim().is_empty())
    }

    pub fn are_valid_targets(&self, targets: &[DatasourceTarget]) -> bool {
        targets.iter().all(|target| self.is_valid_target(&target.query))
    }
}
