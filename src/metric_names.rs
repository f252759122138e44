//! Metric-name cache of one datasource connection.

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use crate::app::ports::MetricNamesFetcher;
use crate::constants::METRIC_NAMES_CACHE_PREFIX;
use crate::error::Result;
use crate::observability::metrics;

#[derive(Debug, Default)]
struct CacheState {
    metric_names: Option<Vec<String>>,
    template_variables: Vec<String>,
    /// Bumped on every completed fetch
    generation: u64,
}

/// Cached metric names, prefixed by the dashboard template variables in use
/// when they were fetched.
///
/// At most one fetch runs at a time; callers arriving while a fetch is in flight
/// wait for it and share its result.
#[derive(Debug)]
pub struct MetricNamesStore {
    cache_key: String,
    state: RwLock<CacheState>,
    fetch_lock: Mutex<()>,
}

impl MetricNamesStore {
    pub fn new(connection_url: &str) -> Self {
        Self {
            cache_key: format!("{}{}", METRIC_NAMES_CACHE_PREFIX, connection_url),
            state: RwLock::new(CacheState::default()),
            fetch_lock: Mutex::new(()),
        }
    }

    pub fn cache_key(&self) -> &str {
        &self.cache_key
    }

    /// Returns the cached names, fetching them when the cache is empty or was
    /// filled under a different set of template variables.
    pub async fn initialize<F>(&self, template_variables: &[String], fetcher: &F) -> Result<Vec<String>>
    where
        F: MetricNamesFetcher + ?Sized,
    {
        {
            let state = self.state.read().await;
            if let Some(names) = &state.metric_names {
                if same_variables(&state.template_variables, template_variables) {
                    metrics::metric_names::cache_hit();
                    return Ok(names.clone());
                }
                debug!("Template variables changed for {}, refetching", self.cache_key);
            }
        }
        self.fetch(template_variables, fetcher).await
    }

    /// Fetches the names unconditionally, unless another caller completes a fetch
    /// while this one waits for its turn.
    pub async fn fetch<F>(&self, template_variables: &[String], fetcher: &F) -> Result<Vec<String>>
    where
        F: MetricNamesFetcher + ?Sized,
    {
        let observed = self.state.read().await.generation;
        let _in_flight = self.fetch_lock.lock().await;

        {
            let state = self.state.read().await;
            if state.generation != observed {
                if let Some(names) = &state.metric_names {
                    return Ok(names.clone());
                }
            }
        }

        metrics::metric_names::cache_miss();
        let fetched = fetcher.fetch_metric_names().await?;
        let names: Vec<String> = template_variables
            .iter()
            .cloned()
            .chain(fetched)
            .collect();
        info!("Cached {} metric names under {}", names.len(), self.cache_key);

        let mut state = self.state.write().await;
        state.metric_names = Some(names.clone());
        state.template_variables = template_variables.to_vec();
        state.generation += 1;
        Ok(names)
    }

    /// Cached names, after any fetch in flight has completed.
    pub async fn get(&self) -> Option<Vec<String>> {
        let _in_flight = self.fetch_lock.lock().await;
        self.state.read().await.metric_names.clone()
    }

    pub async fn is_initialized(&self) -> bool {
        self.state.read().await.metric_names.is_some()
    }

    pub async fn invalidate(&self) {
        let mut state = self.state.write().await;
        state.metric_names = None;
        state.template_variables.clear();
    }
}

/// Unordered comparison of two template-variable lists.
fn same_variables(cached: &[String], current: &[String]) -> bool {
    let mut cached: Vec<&String> = cached.iter().collect();
    let mut current: Vec<&String> = current.iter().collect();
    cached.sort();
    current.sort();
    cached == current
}
