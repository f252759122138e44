use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

use kairosdb_datasource::app::ports::{HttpResponse, Transport, TransportError};
use kairosdb_datasource::config::DatasourceConfig;
use kairosdb_datasource::constants::SKYMINER_DATASOURCE_TYPE;
use kairosdb_datasource::features::{Component, Feature, Parameter, Scalar};
use kairosdb_datasource::request::{
    AnnotationOptions, DatasourceTarget, HttpMethod, HttpRequest, KairosDBTarget, QueryOptions,
    Safeguard, TimeRange,
};
use kairosdb_datasource::templating::StaticTemplateService;
use kairosdb_datasource::{DatasourceError, KairosDBDatasource, TemplatingValue};

type Reply = Result<HttpResponse, TransportError>;

/// Answers by URL suffix and records every request.
struct MockTransport {
    routes: Vec<(&'static str, Reply)>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockTransport {
    fn new(routes: Vec<(&'static str, Reply)>) -> Arc<Self> {
        Arc::new(Self {
            routes,
            requests: Mutex::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn request(&self, request: &HttpRequest) -> Reply {
        self.requests.lock().unwrap().push(request.clone());
        self.routes
            .iter()
            .find(|(suffix, _)| request.url.ends_with(suffix))
            .map(|(_, reply)| reply.clone())
            .unwrap_or_else(|| Err(TransportError::new("no route")))
    }
}

fn ok(data: Value) -> Reply {
    Ok(HttpResponse { status: 200, data })
}

fn datasource(transport: Arc<MockTransport>, datasource_type: &str) -> KairosDBDatasource {
    let service = StaticTemplateService::default()
        .with_variable("host", vec!["web-1".to_string(), "web-2".to_string()]);
    KairosDBDatasource::new(
        DatasourceConfig::new("http://kairosdb:8080").with_type(datasource_type),
        transport,
        Arc::new(service),
    )
}

fn datapoints_response() -> Value {
    json!({
        "queries": [{
            "sample_size": 2,
            "results": [{
                "name": "cpu",
                "group_by": [{"name": "tag", "group": {"host": "web-1"}}],
                "tags": {"host": ["web-1"]},
                "values": [[1000, 1.5], [2000, 2]]
            }]
        }]
    })
}

fn range() -> TimeRange {
    TimeRange { from: 1, to: 2 }
}

#[tokio::test]
async fn test_query_builds_request_and_converts_series() {
    let transport = MockTransport::new(vec![("/datapoints/query", ok(datapoints_response()))]);
    let datasource = datasource(transport.clone(), SKYMINER_DATASOURCE_TYPE);

    let mut query = KairosDBTarget::new("cpu");
    query.alias = Some("load".to_string());
    query.tags.insert("host".to_string(), vec!["$host".to_string()]);
    let mut aggregators = Feature::new("aggregators");
    aggregators.insert_component(
        0,
        Component::new(
            "avg",
            "Average",
            vec![Parameter::Number {
                name: "sampling_value".to_string(),
                value: Scalar::Text("10".to_string()),
            }],
        ),
    );
    query.features.push(aggregators);

    let mut target = DatasourceTarget::new("A", query);
    target.datasource = Some(SKYMINER_DATASOURCE_TYPE.to_string());
    target.safeguard = Some(Safeguard::default_limits());
    let options = QueryOptions::new(range(), vec![target]).with_panel_id(3);

    let series = datasource.query(&options).await.unwrap();
    assert_eq!(series.len(), 1);
    assert_eq!(series[0].target, "load(host: web-1)");
    assert_eq!(series[0].datapoints, vec![(json!(1.5), json!(1000)), (json!(2), json!(2000))]);

    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, HttpMethod::Post);
    assert_eq!(requests[0].request_id.as_deref(), Some("metric_names_3"));

    let data = requests[0].data.clone().unwrap();
    assert_eq!(data["safeguard"]["group_limit"], json!(30));
    assert_eq!(data["metrics"][0]["tags"], json!({"host": ["web-1", "web-2"]}));
    assert_eq!(
        data["metrics"][0]["aggregators"],
        json!([{"name": "avg", "sampling_value": 10}])
    );
}

#[tokio::test]
async fn test_backend_errors_are_aggregated() {
    let transport = MockTransport::new(vec![(
        "/datapoints/query",
        Err(TransportError::with_response(
            400,
            json!({"errors": ["metrics[0].name may not be empty", "start time required"]}),
        )),
    )]);
    let datasource = datasource(transport, SKYMINER_DATASOURCE_TYPE);
    let options = QueryOptions::new(range(), vec![DatasourceTarget::new("A", KairosDBTarget::new("cpu"))]);

    match datasource.query(&options).await {
        Err(DatasourceError::Request { message }) => assert_eq!(
            message,
            "Request Error: metrics[0].name may not be empty, start time required"
        ),
        other => panic!("expected aggregated request error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_other_failures_yield_empty_results() {
    let transport = MockTransport::new(vec![(
        "/datapoints/query",
        Err(TransportError::with_response(500, json!({"message": "boom"}))),
    )]);
    let datasource = datasource(transport, SKYMINER_DATASOURCE_TYPE);
    let options = QueryOptions::new(range(), vec![DatasourceTarget::new("A", KairosDBTarget::new("cpu"))]);

    assert!(datasource.query(&options).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_no_request_without_enabled_targets() {
    let transport = MockTransport::new(vec![]);
    let datasource = datasource(transport.clone(), SKYMINER_DATASOURCE_TYPE);
    let mut hidden = DatasourceTarget::new("A", KairosDBTarget::new("cpu"));
    hidden.hide = true;

    let options = QueryOptions::new(range(), vec![hidden]);
    assert!(datasource.query(&options).await.unwrap().is_empty());
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn test_annotation_query() {
    let transport = MockTransport::new(vec![("/datapoints/query", ok(datapoints_response()))]);
    let datasource = datasource(transport.clone(), SKYMINER_DATASOURCE_TYPE);
    let annotation = AnnotationOptions {
        name: "deploys".to_string(),
        datasource: "grafana-kairosdb-datasource".to_string(),
        target: DatasourceTarget::new("A", KairosDBTarget::new("cpu")),
    };
    let options = QueryOptions::new(range(), vec![]).with_annotation(annotation);

    let annotations = datasource.annotation_query(&options).await.unwrap();
    assert_eq!(annotations.len(), 2);
    assert_eq!(annotations[0].annotation.name, "deploys");
    assert_eq!(annotations[0].time, json!(1000));
    assert_eq!(annotations[0].text, "1.5");
    assert_eq!(annotations[1].text, "2");

    let data = transport.requests()[0].data.clone().unwrap();
    assert!(data["metrics"][0].get("limit").is_none());
}

#[tokio::test]
async fn test_health_check() {
    let healthy = MockTransport::new(vec![("/health/check", Ok(HttpResponse { status: 204, data: Value::Null }))]);
    let status = datasource(healthy, SKYMINER_DATASOURCE_TYPE).test_datasource().await;
    assert!(status.is_success());
    assert_eq!(serde_json::to_value(&status).unwrap(), json!({"status": "success"}));

    let degraded = MockTransport::new(vec![("/health/check", ok(json!({})))]);
    let status = datasource(degraded, SKYMINER_DATASOURCE_TYPE).test_datasource().await;
    assert_eq!(
        serde_json::to_value(&status).unwrap(),
        json!({"status": "error", "message": "Health check fail"})
    );
}

#[tokio::test]
async fn test_metric_names_are_cached_with_template_variables() {
    let transport = MockTransport::new(vec![("/metricnames", ok(json!({"results": ["cpu", "mem"]})))]);
    let datasource = datasource(transport.clone(), SKYMINER_DATASOURCE_TYPE);

    datasource.initialize().await;
    datasource.initialize().await;

    assert!(datasource.is_initialized());
    assert_eq!(
        datasource.metric_names_store().get().await.unwrap(),
        vec!["$host", "cpu", "mem"]
    );
    assert_eq!(transport.requests().len(), 1);

    datasource.fetch_metric_names().await;
    assert_eq!(transport.requests().len(), 2);
}

#[tokio::test]
async fn test_metric_find_query_modes() {
    let tags = json!({"queries": [{"results": [{"name": "cpu", "tags": {"host": ["web-1", "web-2"], "dc": ["eu"]}}]}]});
    let transport = MockTransport::new(vec![
        ("/metricnames", ok(json!({"results": ["cpu"]}))),
        ("/datapoints/query/tags", ok(tags)),
    ]);
    let datasource = datasource(transport.clone(), SKYMINER_DATASOURCE_TYPE);

    let names = datasource.metric_find_query("").await.unwrap();
    assert_eq!(
        names,
        vec![TemplatingValue {
            text: "cpu".to_string(),
            value: "cpu".to_string()
        }]
    );

    let keys: Vec<String> = datasource
        .metric_find_query(r#""metric": "cpu""#)
        .await
        .unwrap()
        .into_iter()
        .map(|v| v.text)
        .collect();
    assert_eq!(keys, vec!["dc", "host"]);

    let values: Vec<String> = datasource
        .metric_find_query(r#""metric": "cpu", "tagKey": "host""#)
        .await
        .unwrap()
        .into_iter()
        .map(|v| v.value)
        .collect();
    assert_eq!(values, vec!["web-1", "web-2"]);

    datasource
        .metric_find_query(r#""metric": "cpu", "tagKey": "host", "dc": "eu""#)
        .await
        .unwrap();
    let last = transport.requests().pop().unwrap();
    assert_eq!(last.data.unwrap()["metrics"][0]["tags"], json!({"dc": ["eu"]}));
}

#[tokio::test]
async fn test_metric_tags_failure_carries_backend_message() {
    let transport = MockTransport::new(vec![(
        "/datapoints/query/tags",
        Err(TransportError::with_response(400, json!({"message": "unknown metric"}))),
    )]);
    let datasource = datasource(transport, SKYMINER_DATASOURCE_TYPE);

    match datasource.get_metric_tags("cpu", &Default::default()).await {
        Err(DatasourceError::Transport { message }) => assert_eq!(message, "unknown metric"),
        other => panic!("expected transport error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_features_fall_back_to_builtin_catalog() {
    let transport = MockTransport::new(vec![]);
    let features = datasource(transport, SKYMINER_DATASOURCE_TYPE).get_features().await;
    let names: Vec<&str> = features.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["group_by", "aggregators"]);
}
