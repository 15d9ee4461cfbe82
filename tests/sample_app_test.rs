//! End-to-end tests for the sample app against a fake InfluxDB.
//!
//! Run with: cargo test --test sample_app_test

mod common;

use axum::http::{Method, StatusCode};
use serde_json::Value;

use common::{post_json, send, FakeInflux, ORG_ID, ORG_NAME, TASK_ID};
use influx_starter::routes::sample::{self, PROCESSED_DATA_BUCKET, RAW_DATA_BUCKET};

#[tokio::test]
async fn connect_creates_the_raw_data_bucket_once() {
    let influx = FakeInflux::start().await;

    let state = sample::connect(influx.config()).await.unwrap();
    assert_eq!(state.bucket, RAW_DATA_BUCKET);
    sample::connect(influx.config()).await.unwrap();

    let created = influx.requests_to(Method::POST, "/api/v2/buckets");
    assert_eq!(created.len(), 1);
    let sent = created[0].body_json();
    assert_eq!(sent["name"], RAW_DATA_BUCKET);
    assert_eq!(sent["orgID"], ORG_ID);
}

#[tokio::test]
async fn ingest_writes_to_the_raw_data_bucket() {
    let influx = FakeInflux::start().await;
    let app = sample::build_router(sample::connect(influx.config()).await.unwrap());

    let (status, _, _) = send(
        &app,
        post_json(
            "/ingest",
            r#"{"user_id":"user1","measurement":"measurement1","field1":0}"#,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let writes = influx.requests_to(Method::POST, "/api/v2/write");
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].query["org"], ORG_NAME);
    assert_eq!(writes[0].query["bucket"], RAW_DATA_BUCKET);
}

#[tokio::test]
async fn query_returns_metadata_and_records() {
    let influx = FakeInflux::start().await;
    let app = sample::build_router(sample::connect(influx.config()).await.unwrap());

    let (status, _, body) = send(&app, post_json("/query", r#"{"user_id":"user1"}"#)).await;
    assert_eq!(status, StatusCode::OK);

    let body: Value = serde_json::from_slice(&body).unwrap();
    let tables = body["tables"].as_array().unwrap();
    assert_eq!(tables.len(), 2);
    let metadata = tables[0]["metadata"].as_str().unwrap();
    assert!(metadata.starts_with("{position: 0, columns: ["), "{metadata}");
    assert!(metadata.contains("name: _value, dataType: double"), "{metadata}");

    let sent = influx.requests_to(Method::POST, "/api/v2/query")[0].body_json();
    assert_eq!(sent["params"]["bucket_name"], RAW_DATA_BUCKET);
    assert!(sent["query"].as_str().unwrap().contains("params.bucket_name"));
}

#[tokio::test]
async fn tasks_creates_processed_bucket_and_copy_task() {
    let influx = FakeInflux::start().await;
    let app = sample::build_router(sample::connect(influx.config()).await.unwrap());

    let (status, _, body) = send(&app, post_json("/tasks", r#"{"user_id":"user1"}"#)).await;
    assert_eq!(status, StatusCode::CREATED);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["task_id"], TASK_ID);

    let buckets: Vec<String> = influx
        .requests_to(Method::POST, "/api/v2/buckets")
        .iter()
        .map(|r| r.body_json()["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(buckets, vec![RAW_DATA_BUCKET, PROCESSED_DATA_BUCKET]);

    let task = influx.requests_to(Method::POST, "/api/v2/tasks")[0].body_json();
    let flux = task["flux"].as_str().unwrap();
    assert!(flux.starts_with("option task = {name: \"user1_task\", every: 1m}"), "{flux}");
    assert!(flux.contains(&format!("\"{PROCESSED_DATA_BUCKET}\"")));
}

#[tokio::test]
async fn tasks_reuses_an_existing_processed_bucket() {
    let influx = FakeInflux::start().await;
    influx.add_bucket(RAW_DATA_BUCKET);
    influx.add_bucket(PROCESSED_DATA_BUCKET);
    let app = sample::build_router(sample::connect(influx.config()).await.unwrap());

    let (status, _, _) = send(&app, post_json("/tasks", r#"{"user_id":"user1"}"#)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(influx.requests_to(Method::POST, "/api/v2/buckets").is_empty());
}

#[tokio::test]
async fn tasks_surfaces_influx_rejection() {
    let influx = FakeInflux::start().await;
    let app = sample::build_router(sample::connect(influx.config()).await.unwrap());
    influx.fail("/api/v2/tasks", StatusCode::UNAUTHORIZED, "unauthorized access");

    let (status, _, _) = send(&app, post_json("/tasks", r#"{"user_id":"user1"}"#)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
