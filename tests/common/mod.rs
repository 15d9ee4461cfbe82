//! Shared helpers for integration tests: a stand-in InfluxDB server that
//! records every request and answers with canned responses.

#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body, Bytes},
    http::{header, HeaderMap, Method, Request, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tower::ServiceExt;

use influx_starter::config::Config;

pub const ORG_NAME: &str = "my-org";
pub const ORG_ID: &str = "0123456789abcdef";
pub const BUCKET: &str = "my-bucket";
pub const TOKEN: &str = "test-token";
pub const TASK_ID: &str = "0a1b2c3d4e5f6789";

/// Two tables of `_value` readings, as InfluxDB returns them.
pub const QUERY_CSV: &str = "\
#datatype,string,long,dateTimeRFC3339,string,string,double,string
#group,false,false,false,true,true,false,true
#default,_result,,,,,,
,result,table,_time,_field,_measurement,_value,user_id
,,0,2024-01-01T00:00:00Z,field1,measurement1,1.5,user1
,,0,2024-01-01T00:01:00Z,field1,measurement1,2.5,user1
,,1,2024-01-01T00:00:00Z,field2,measurement1,7,user1
";

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub query: HashMap<String, String>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl RecordedRequest {
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn body_json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("request body is JSON")
    }
}

#[derive(Default)]
struct Shared {
    requests: Mutex<Vec<RecordedRequest>>,
    failures: Mutex<HashMap<String, (StatusCode, String)>>,
    existing_buckets: Mutex<Vec<String>>,
}

/// Fake InfluxDB v2 server on an ephemeral local port.
#[derive(Clone)]
pub struct FakeInflux {
    pub url: String,
    shared: Arc<Shared>,
}

impl FakeInflux {
    pub async fn start() -> Self {
        let shared = Arc::new(Shared::default());
        let app = Router::new().fallback({
            let shared = shared.clone();
            move |method: Method, uri: Uri, headers: HeaderMap, body: Bytes| {
                let shared = shared.clone();
                async move { respond(&shared, method, &uri, headers, body) }
            }
        });

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            url: format!("http://{addr}"),
            shared,
        }
    }

    /// Answer every request to `path` with `status` and an InfluxDB error body.
    pub fn fail(&self, path: &str, status: StatusCode, message: &str) {
        self.shared
            .failures
            .lock()
            .unwrap()
            .insert(path.to_string(), (status, message.to_string()));
    }

    /// Make bucket lookups find `name`.
    pub fn add_bucket(&self, name: &str) {
        self.shared
            .existing_buckets
            .lock()
            .unwrap()
            .push(name.to_string());
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.shared.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, method: Method, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method && r.path == path)
            .collect()
    }

    /// Configuration for an app talking to this server.
    pub fn config(&self) -> Config {
        let mut config = Config::for_host(&self.url);
        config.influx_token = Some(TOKEN.to_string());
        config.influx_organization = Some(ORG_NAME.to_string());
        config.influx_organization_id = Some(ORG_ID.to_string());
        config.influx_bucket = Some(BUCKET.to_string());
        config
    }
}

fn respond(
    shared: &Shared,
    method: Method,
    uri: &Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri.path().to_string();
    let query: HashMap<String, String> = uri
        .query()
        .map(|q| {
            url::form_urlencoded::parse(q.as_bytes())
                .into_owned()
                .collect()
        })
        .unwrap_or_default();

    shared.requests.lock().unwrap().push(RecordedRequest {
        method: method.clone(),
        path: path.clone(),
        query: query.clone(),
        headers,
        body: body.clone(),
    });

    if let Some((status, message)) = shared.failures.lock().unwrap().get(&path).cloned() {
        let code = if status == StatusCode::NOT_FOUND { "not found" } else { "invalid" };
        return (status, axum::Json(json!({ "code": code, "message": message }))).into_response();
    }

    match (method, path.as_str()) {
        (Method::GET, "/ping") => StatusCode::NO_CONTENT.into_response(),
        (Method::POST, "/api/v2/write") => StatusCode::NO_CONTENT.into_response(),
        (Method::POST, "/api/v2/query") => (
            [(header::CONTENT_TYPE, "text/csv; charset=utf-8")],
            QUERY_CSV,
        )
            .into_response(),
        (Method::GET, "/api/v2/orgs") => {
            let wanted = query.get("org").cloned().unwrap_or_default();
            let orgs: Vec<Value> = if wanted.is_empty() || wanted == ORG_NAME {
                vec![json!({ "id": ORG_ID, "name": ORG_NAME })]
            } else {
                Vec::new()
            };
            axum::Json(json!({ "orgs": orgs })).into_response()
        }
        (Method::GET, "/api/v2/buckets") => {
            let wanted = query.get("name").cloned().unwrap_or_default();
            let buckets: Vec<Value> = shared
                .existing_buckets
                .lock()
                .unwrap()
                .iter()
                .filter(|b| **b == wanted)
                .map(|b| json!({ "id": format!("id-{b}"), "name": b, "orgID": ORG_ID }))
                .collect();
            axum::Json(json!({ "buckets": buckets })).into_response()
        }
        (Method::POST, "/api/v2/buckets") => {
            let request: Value = serde_json::from_slice(&body).unwrap_or_default();
            let name = request["name"].as_str().unwrap_or_default().to_string();
            shared.existing_buckets.lock().unwrap().push(name.clone());
            (
                StatusCode::CREATED,
                axum::Json(json!({
                    "id": format!("id-{name}"),
                    "name": name,
                    "orgID": request["orgID"],
                    "retentionRules": [],
                })),
            )
                .into_response()
        }
        (Method::POST, "/api/v2/tasks") => {
            let request: Value = serde_json::from_slice(&body).unwrap_or_default();
            (
                StatusCode::CREATED,
                axum::Json(json!({
                    "id": TASK_ID,
                    "name": "task",
                    "orgID": request["orgID"],
                    "status": request["status"],
                    "flux": request["flux"],
                })),
            )
                .into_response()
        }
        _ => (
            StatusCode::NOT_FOUND,
            axum::Json(json!({ "code": "not found", "message": "path not found" })),
        )
            .into_response(),
    }
}

pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, HeaderMap, Bytes) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, headers, body)
}

pub fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn post_form(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}
