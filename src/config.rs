use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::constants::{DEFAULT_API_PATH, KAIROSDB_DATASOURCE_TYPE};
use crate::error::{DatasourceError, Result};

const DEFAULT_CONFIG_PATH: &str = "datasource.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub datasource: DatasourceConfig,
    /// Host template variables, `name -> values`
    #[serde(default)]
    pub variables: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatasourceConfig {
    #[serde(default = "default_name")]
    pub name: String,
    pub url: String,
    #[serde(default = "default_api_path")]
    pub api_path: String,
    #[serde(rename = "type", default = "default_type")]
    pub datasource_type: String,
    #[serde(default)]
    pub with_credentials: bool,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl DatasourceConfig {
    /// Connection with default settings for `url`.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            name: default_name(),
            url: url.into(),
            api_path: default_api_path(),
            datasource_type: default_type(),
            with_credentials: false,
            timeout_seconds: default_timeout(),
        }
    }

    pub fn with_type(mut self, datasource_type: impl Into<String>) -> Self {
        self.datasource_type = datasource_type.into();
        self
    }
}

fn default_name() -> String {
    "kairosdb".to_string()
}

fn default_api_path() -> String {
    DEFAULT_API_PATH.to_string()
}

fn default_type() -> String {
    KAIROSDB_DATASOURCE_TYPE.to_string()
}

fn default_timeout() -> u64 {
    30
}

impl Config {
    /// Loads `datasource.toml` (or `$KAIROSDB_CONFIG`), then applies `KAIROSDB_URL`.
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();

        let config_path =
            std::env::var("KAIROSDB_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let mut config = Self::from_file(&config_path)?;

        if let Ok(url) = std::env::var("KAIROSDB_URL") {
            config.datasource.url = url;
        }
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            DatasourceError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        if config.datasource.url.trim().is_empty() {
            return Err(DatasourceError::MissingField("datasource.url".into()));
        }
        Ok(config)
    }
}
