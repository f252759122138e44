use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tracing::debug;

use crate::app::ports::{HttpResponse, Transport, TransportError};
use crate::config::DatasourceConfig;
use crate::error::Result;
use crate::request::{HttpMethod, HttpRequest};

/// `reqwest`-backed transport.
///
/// A request carrying a `request_id` supersedes any earlier request with the same
/// id; the earlier one then completes as a cancelled request.
pub struct ReqwestTransport {
    client: reqwest::Client,
    in_flight: Mutex<HashMap<String, u64>>,
}

impl ReqwestTransport {
    pub fn new(settings: &DatasourceConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .build()?;
        Ok(Self {
            client,
            in_flight: Mutex::new(HashMap::new()),
        })
    }

    fn register(&self, request_id: &str) -> u64 {
        let mut in_flight = match self.in_flight.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let generation = in_flight.entry(request_id.to_string()).or_insert(0);
        *generation += 1;
        *generation
    }

    fn is_superseded(&self, request_id: &str, generation: u64) -> bool {
        let in_flight = match self.in_flight.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        in_flight.get(request_id).is_some_and(|latest| *latest != generation)
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn request(&self, request: &HttpRequest) -> std::result::Result<HttpResponse, TransportError> {
        let generation = request.request_id.as_deref().map(|id| (id, self.register(id)));

        let builder = match request.method {
            HttpMethod::Get => self.client.get(&request.url),
            HttpMethod::Post => self.client.post(&request.url),
        };
        let builder = match &request.data {
            Some(data) => builder.json(data),
            None => builder,
        };

        let resp = builder
            .send()
            .await
            .map_err(|e| TransportError::new(e.to_string()))?;
        let status = resp.status().as_u16();
        let is_json = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.contains("json"));
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| TransportError::new(e.to_string()))?;

        if let Some((id, generation)) = generation {
            if self.is_superseded(id, generation) {
                debug!("Request {} superseded, dropping response", id);
                return Err(TransportError::new(format!("request {} cancelled", id)));
            }
        }

        let data = decode_body(&bytes, is_json);
        if (200..300).contains(&status) {
            Ok(HttpResponse { status, data })
        } else {
            Err(TransportError::with_response(status, data))
        }
    }
}

/// Empty bodies decode to `Null`; non-JSON bodies are kept as text.
fn decode_body(bytes: &[u8], is_json: bool) -> Value {
    if bytes.is_empty() {
        return Value::Null;
    }
    match serde_json::from_slice(bytes) {
        Ok(value) => value,
        Err(_) if !is_json => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        Err(e) => {
            debug!("Malformed JSON body: {}", e);
            Value::String(String::from_utf8_lossy(bytes).into_owned())
        }
    }
}
