use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatasourceError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    /// Aggregated error list returned by the backend.
    #[error("{message}")]
    Request { message: String },

    #[error("Transport error: {message}")]
    Transport { message: String },

    #[error("Invalid template query: {0}")]
    TemplateQuery(String),
}

impl DatasourceError {
    /// Builds the aggregate error surfaced when the backend answers with an `errors` list.
    pub fn from_backend_errors(errors: &[String]) -> Self {
        DatasourceError::Request {
            message: format!("Request Error: {}", errors.join(", ")),
        }
    }
}

pub type Result<T> = std::result::Result<T, DatasourceError>;
