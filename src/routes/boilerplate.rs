//! The boilerplate app: a starting point that ingests user data, downsamples
//! it with a per-user task and serves the latest downsampled values.

use axum::{extract::State, http::StatusCode, routing::get, routing::post, Json, Router};
use serde::Serialize;
use utoipa::{OpenApi, ToSchema};
use utoipa_scalar::{Scalar, Servable};

use crate::common::AppState;
use crate::config::Config;
use crate::error::AppResult;
use crate::influx::{FluxTable, InfluxClient};
use crate::queries;

use super::ingest::{self, IngestRequest, UserRequest};
use super::{health, rate_limited, with_common_layers, JsonBody};

/// How often the downsampling task runs.
pub const DOWNSAMPLE_EVERY: &str = "5m";

#[derive(Debug, Serialize, ToSchema)]
pub struct RecordsTable {
    pub records: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct QueryResponse {
    pub tables: Vec<RecordsTable>,
}

impl From<Vec<FluxTable>> for QueryResponse {
    fn from(tables: Vec<FluxTable>) -> Self {
        Self {
            tables: tables
                .into_iter()
                .map(|t| RecordsTable {
                    records: t.records.iter().map(ToString::to_string).collect(),
                })
                .collect(),
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::healthz,
        ingest::ingest,
        query,
        setup,
    ),
    components(schemas(IngestRequest, UserRequest, QueryResponse, RecordsTable)),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "data", description = "Write and read user data"),
        (name = "tasks", description = "Per-user InfluxDB tasks"),
    ),
    info(
        title = "InfluxDB boilerplate app",
        description = "Starting point for an application built on InfluxDB",
        version = "0.1.0"
    )
)]
struct ApiDoc;

/// Connect to InfluxDB and resolve the organization ID the task API needs.
///
/// # Errors
///
/// Fails if the token, organization or bucket is not configured, or the
/// organization cannot be found.
pub async fn connect(config: Config) -> AppResult<AppState> {
    let client = InfluxClient::new(&config.influx_host, config.token()?, config.influx_timeout())?;
    let organization = config.organization()?.to_string();
    let bucket = config.bucket()?.to_string();

    let org = client.find_organization_by_name(&organization).await?;
    tracing::info!(
        organization = %org.name,
        id = %org.id,
        bucket = %bucket,
        "Organization resolved"
    );

    Ok(AppState::new(config, client, organization, org.id, bucket))
}

pub fn build_router(state: AppState) -> Router {
    let data_routes = Router::new()
        .route("/ingest", post(ingest::ingest))
        .route("/query", post(query))
        .route("/setup", post(setup));

    let app = Router::new()
        .route("/", get(ingest::welcome))
        .merge(rate_limited(data_routes, &state.config))
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()))
        .with_state(state);

    with_common_layers(app)
}

/// Latest downsampled value of each of a user's fields
#[utoipa::path(
    post,
    path = "/query",
    request_body = UserRequest,
    responses(
        (status = 200, description = "Query result tables", body = QueryResponse),
        (status = 400, description = "Malformed body"),
    ),
    tag = "data"
)]
pub async fn query(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<UserRequest>,
) -> AppResult<Json<QueryResponse>> {
    let params = queries::params(&[
        ("bucket_name", state.bucket.as_str()),
        ("user_id", request.user_id.as_str()),
    ]);

    let tables = state
        .client
        .query_with_params(&state.organization, queries::DOWNSAMPLED_LAST_QUERY, &params)
        .await?;

    Ok(Json(tables.into()))
}

/// Create a task that downsamples a user's data every five minutes
///
/// The task writes the min, max and mean of each field of each measurement to
/// the `downsampled` measurement of the same bucket.
#[utoipa::path(
    post,
    path = "/setup",
    request_body = UserRequest,
    responses(
        (status = 200, description = "Task created"),
        (status = 400, description = "Malformed body"),
    ),
    tag = "tasks"
)]
pub async fn setup(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<UserRequest>,
) -> AppResult<StatusCode> {
    let flux = queries::downsample_task(&state.bucket, &request.user_id);
    let name = format!("{}_task", request.user_id);

    let task = state
        .client
        .create_task_with_every(&name, &flux, DOWNSAMPLE_EVERY, &state.organization_id)
        .await?;

    tracing::info!(user_id = %request.user_id, task_id = %task.id, "Downsampling task set up");
    Ok(StatusCode::OK)
}
