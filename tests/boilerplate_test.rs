//! End-to-end tests for the boilerplate app against a fake InfluxDB.
//!
//! Run with: cargo test --test boilerplate_test

mod common;

use axum::http::{header, Method, StatusCode};
use serde_json::Value;

use common::{get, post_json, send, FakeInflux, BUCKET, ORG_ID, ORG_NAME, TOKEN};
use influx_starter::routes::boilerplate;

async fn app(influx: &FakeInflux) -> axum::Router {
    let state = boilerplate::connect(influx.config()).await.unwrap();
    boilerplate::build_router(state)
}

#[tokio::test]
async fn connect_resolves_the_organization_id() {
    let influx = FakeInflux::start().await;
    let state = boilerplate::connect(influx.config()).await.unwrap();

    assert_eq!(state.organization, ORG_NAME);
    assert_eq!(state.organization_id, ORG_ID);
    assert_eq!(state.bucket, BUCKET);
}

#[tokio::test]
async fn connect_fails_for_an_unknown_organization() {
    let influx = FakeInflux::start().await;
    let mut config = influx.config();
    config.influx_organization = Some("nobody".to_string());

    assert!(boilerplate::connect(config).await.is_err());
}

#[tokio::test]
async fn welcome_page_is_served_at_root() {
    let influx = FakeInflux::start().await;
    let (status, headers, body) = send(&app(&influx).await, get("/")).await;

    assert_eq!(status, StatusCode::OK);
    assert!(headers[header::CONTENT_TYPE].to_str().unwrap().starts_with("text/html"));
    assert!(
        String::from_utf8_lossy(&body).contains("Welcome to your first InfluxDB Application")
    );
}

#[tokio::test]
async fn ingest_writes_one_point_for_the_user() {
    let influx = FakeInflux::start().await;
    let app = app(&influx).await;

    let (status, _, _) = send(
        &app,
        post_json(
            "/ingest",
            r#"{"user_id":"user1","measurement":"measurement1","field1":1.0}"#,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let writes = influx.requests_to(Method::POST, "/api/v2/write");
    assert_eq!(writes.len(), 1);
    let write = &writes[0];
    assert_eq!(write.query["org"], ORG_NAME);
    assert_eq!(write.query["bucket"], BUCKET);
    assert_eq!(write.query["precision"], "ns");
    assert_eq!(
        write.headers[header::AUTHORIZATION].to_str().unwrap(),
        format!("Token {TOKEN}")
    );

    let line = write.body_text();
    assert!(line.starts_with("measurement1,user_id=user1 field1=1 "), "{line}");
}

#[tokio::test]
async fn ingest_rejects_malformed_json() {
    let influx = FakeInflux::start().await;
    let app = app(&influx).await;

    let (status, _, body) = send(&app, post_json("/ingest", "{not json")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert!(body["error"].as_str().unwrap().contains("Invalid JSON"));

    let (status, _, _) = send(&app, post_json("/ingest", r#"{"user_id":"user1"}"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert!(influx.requests_to(Method::POST, "/api/v2/write").is_empty());
}

#[tokio::test]
async fn ingest_passes_through_a_missing_bucket() {
    let influx = FakeInflux::start().await;
    let app = app(&influx).await;
    influx.fail("/api/v2/write", StatusCode::NOT_FOUND, "bucket \"my-bucket\" not found");

    let (status, _, body) = send(
        &app,
        post_json(
            "/ingest",
            r#"{"user_id":"user1","measurement":"measurement1","field1":1.0}"#,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert!(body["error"].as_str().unwrap().contains("not found"));
}

#[tokio::test]
async fn query_returns_records_per_table() {
    let influx = FakeInflux::start().await;
    let app = app(&influx).await;

    let (status, _, body) = send(&app, post_json("/query", r#"{"user_id":"user1"}"#)).await;
    assert_eq!(status, StatusCode::OK);

    let body: Value = serde_json::from_slice(&body).unwrap();
    let tables = body["tables"].as_array().unwrap();
    assert_eq!(tables.len(), 2);
    assert_eq!(tables[0]["records"].as_array().unwrap().len(), 2);
    let first = tables[0]["records"][0].as_str().unwrap();
    assert!(first.contains("_value:1.5"), "{first}");
    assert!(first.contains("user_id:user1"), "{first}");

    let queries = influx.requests_to(Method::POST, "/api/v2/query");
    assert_eq!(queries.len(), 1);
    let sent = queries[0].body_json();
    assert_eq!(sent["type"], "flux");
    assert_eq!(sent["params"]["bucket_name"], BUCKET);
    assert_eq!(sent["params"]["user_id"], "user1");
    assert!(sent["query"].as_str().unwrap().contains("downsampled"));
}

#[tokio::test]
async fn setup_creates_a_downsampling_task() {
    let influx = FakeInflux::start().await;
    let app = app(&influx).await;

    let (status, _, _) = send(&app, post_json("/setup", r#"{"user_id":"user1"}"#)).await;
    assert_eq!(status, StatusCode::OK);

    let tasks = influx.requests_to(Method::POST, "/api/v2/tasks");
    assert_eq!(tasks.len(), 1);
    let sent = tasks[0].body_json();
    assert_eq!(sent["orgID"], ORG_ID);
    assert_eq!(sent["status"], "active");

    let flux = sent["flux"].as_str().unwrap();
    assert!(
        flux.starts_with("option task = {name: \"user1_task\", every: 5m}\n\n"),
        "{flux}"
    );
    assert!(flux.contains("\"user1\""));
}

#[tokio::test]
async fn docs_are_served() {
    let influx = FakeInflux::start().await;
    let (status, _, _) = send(&app(&influx).await, get("/docs")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn healthz_answers_ok() {
    let influx = FakeInflux::start().await;
    let (status, _, _) = send(&app(&influx).await, get("/healthz")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let influx = FakeInflux::start().await;
    let app = app(&influx).await;

    let body = format!(
        r#"{{"user_id":"{}","measurement":"m","field1":1.0}}"#,
        "u".repeat(1024 * 1024)
    );
    let mut request = post_json("/ingest", &body);
    request
        .headers_mut()
        .insert(header::CONTENT_LENGTH, body.len().into());

    let (status, _, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(influx.requests_to(Method::POST, "/api/v2/write").is_empty());
}

#[tokio::test]
async fn oversized_body_without_length_is_rejected_while_reading() {
    let influx = FakeInflux::start().await;
    let app = app(&influx).await;

    let request = axum::http::Request::builder()
        .method(Method::POST)
        .uri("/ingest")
        .body(axum::body::Body::from("x".repeat(1024 * 1024 + 1)))
        .unwrap();

    let (status, _, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn data_routes_are_rate_limited_per_client() {
    let influx = FakeInflux::start().await;
    let mut config = influx.config();
    config.disable_rate_limiting = false;
    config.rate_limit_burst = 1;
    config.rate_limit_replenish_seconds = 60;
    let app = boilerplate::build_router(boilerplate::connect(config).await.unwrap());

    let (status, _, _) = send(&app, post_json("/query", r#"{"user_id":"user1"}"#)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _, _) = send(&app, post_json("/query", r#"{"user_id":"user1"}"#)).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);

    let mut other_client = post_json("/query", r#"{"user_id":"user1"}"#);
    other_client
        .headers_mut()
        .insert("x-forwarded-for", "203.0.113.9".parse().unwrap());
    let (status, _, _) = send(&app, other_client).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _, _) = send(&app, get("/healthz")).await;
    assert_eq!(status, StatusCode::OK);
}
