//! The sample app: ingests raw user data, queries the last hour of it and
//! sets up a per-user task copying zero readings into a second bucket.

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

pub const RAW_DATA_BUCKET: &str = "raw_data_bucket";
pub const PROCESSED_DATA_BUCKET: &str = "processed_data_bucket";

/// How often the zero-value copy task runs.
pub const COPY_TASK_EVERY: &str = "1m";

#[derive(Debug, Serialize, ToSchema)]
pub struct DescribedTable {
    pub metadata: String,
    pub records: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DescribedQueryResponse {
    pub tables: Vec<DescribedTable>,
}

impl From<Vec<FluxTable>> for DescribedQueryResponse {
    fn from(tables: Vec<FluxTable>) -> Self {
        Self {
            tables: tables
                .into_iter()
                .map(|t| DescribedTable {
                    metadata: t.metadata.to_string(),
                    records: t.records.iter().map(ToString::to_string).collect(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TaskCreated {
    /// Keep this to manage the task later
    pub task_id: String,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::healthz,
        ingest::ingest,
        query,
        tasks,
    ),
    components(schemas(
        IngestRequest,
        UserRequest,
        DescribedQueryResponse,
        DescribedTable,
        TaskCreated
    )),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "data", description = "Write and read user data"),
        (name = "tasks", description = "Per-user InfluxDB tasks"),
    ),
    info(
        title = "InfluxDB sample app",
        description = "Ingest and query raw per-user data in InfluxDB",
        version = "0.1.0"
    )
)]
struct ApiDoc;

/// Connect to InfluxDB and make sure the raw data bucket exists.
///
/// # Errors
///
/// Fails if the token or organization is not configured, the organization
/// cannot be found, or the bucket cannot be created.
pub async fn connect(config: Config) -> AppResult<AppState> {
    let client = InfluxClient::new(&config.influx_host, config.token()?, config.influx_timeout())?;
    let organization = config.organization()?.to_string();

    let org = client.find_organization_by_name(&organization).await?;
    client.find_or_create_bucket(&org.id, RAW_DATA_BUCKET).await?;
    tracing::info!(
        organization = %org.name,
        id = %org.id,
        bucket = RAW_DATA_BUCKET,
        "Ready to ingest"
    );

    Ok(AppState::new(
        config,
        client,
        organization,
        org.id,
        RAW_DATA_BUCKET,
    ))
}

pub fn build_router(state: AppState) -> Router {
    let data_routes = Router::new()
        .route("/ingest", post(ingest::ingest))
        .route("/query", post(query))
        .route("/tasks", post(tasks));

    let app = Router::new()
        .route("/", get(ingest::welcome))
        .merge(rate_limited(data_routes, &state.config))
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()))
        .with_state(state);

    with_common_layers(app)
}

/// All of a user's data from the last hour, with table metadata
#[utoipa::path(
    post,
    path = "/query",
    request_body = UserRequest,
    responses(
        (status = 200, description = "Query result tables", body = DescribedQueryResponse),
        (status = 400, description = "Malformed body"),
    ),
    tag = "data"
)]
pub async fn query(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<UserRequest>,
) -> AppResult<Json<DescribedQueryResponse>> {
    let params = queries::params(&[
        ("bucket_name", state.bucket.as_str()),
        ("user_id", request.user_id.as_str()),
    ]);

    let tables = state
        .client
        .query_with_params(&state.organization, queries::USER_DATA_QUERY, &params)
        .await?;

    Ok(Json(tables.into()))
}

/// Create a task copying a user's zero values into the processed bucket
///
/// Precomputing data like this keeps UI queries fast, and the same task
/// could call back into the application instead of writing to a bucket.
#[utoipa::path(
    post,
    path = "/tasks",
    request_body = UserRequest,
    responses(
        (status = 201, description = "Task created", body = TaskCreated),
        (status = 400, description = "Malformed body"),
    ),
    tag = "tasks"
)]
pub async fn tasks(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<UserRequest>,
) -> AppResult<(StatusCode, Json<TaskCreated>)> {
    state
        .client
        .find_or_create_bucket(&state.organization_id, PROCESSED_DATA_BUCKET)
        .await?;

    let flux =
        queries::copy_zero_values_task(&state.bucket, PROCESSED_DATA_BUCKET, &request.user_id);
    let name = format!("{}_task", request.user_id);

    let task = state
        .client
        .create_task_with_every(&name, &flux, COPY_TASK_EVERY, &state.organization_id)
        .await?;

    tracing::info!(user_id = %request.user_id, task_id = %task.id, "Zero-value task created");
    Ok((StatusCode::CREATED, Json(TaskCreated { task_id: task.id })))
}
