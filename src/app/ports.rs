use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::error::Result;
use crate::features::FeatureTemplate;
use crate::request::{HttpRequest, Tags};

/// Response of the host transport; `data` is the decoded JSON body (`Null` when empty).
#[derive(Clone, Debug, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub data: Value,
}

/// Failed or cancelled request. `data` carries the error body when the backend sent one.
#[derive(Clone, Debug, PartialEq, Error)]
#[error("{message}")]
pub struct TransportError {
    pub status: Option<u16>,
    pub data: Option<Value>,
    pub message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: None,
            data: None,
            message: message.into(),
        }
    }

    pub fn with_response(status: u16, data: Value) -> Self {
        Self {
            status: Some(status),
            message: format!("HTTP {}", status),
            data: Some(data),
        }
    }

    /// Entries of `data.errors`, if the body carries such a list.
    pub fn backend_errors(&self) -> Option<Vec<String>> {
        let errors = self.data.as_ref()?.get("errors")?.as_array()?;
        Some(
            errors
                .iter()
                .map(|e| e.as_str().map(str::to_string).unwrap_or_else(|| e.to_string()))
                .collect(),
        )
    }

    /// `data.message`, falling back to the transport message.
    pub fn display_message(&self) -> String {
        self.data
            .as_ref()
            .and_then(|data| data.get("message"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| self.message.clone())
    }
}

// Backend-side ports
#[async_trait]
pub trait Transport: Send + Sync {
    async fn request(&self, request: &HttpRequest) -> std::result::Result<HttpResponse, TransportError>;
}

#[async_trait]
pub trait MetricNamesFetcher: Send + Sync {
    async fn fetch_metric_names(&self) -> Result<Vec<String>>;
}

// Editor-side ports
#[async_trait]
pub trait QuerySource: Send + Sync {
    async fn metric_tags(&self, metric_name: &str, filters: &Tags) -> Result<Tags>;

    async fn features(&self) -> Result<Vec<FeatureTemplate>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_backend_errors() {
        let error = TransportError::with_response(400, json!({"errors": ["metric[0] invalid", "bad range"]}));
        assert_eq!(
            error.backend_errors(),
            Some(vec!["metric[0] invalid".to_string(), "bad range".to_string()])
        );
        assert!(TransportError::new("cancelled").backend_errors().is_none());
    }

    #[test]
    fn test_display_message_prefers_body() {
        let error = TransportError::with_response(500, json!({"message": "Tag query failed"}));
        assert_eq!(error.display_message(), "Tag query failed");
        assert_eq!(TransportError::new("timeout").display_message(), "timeout");
    }
}
