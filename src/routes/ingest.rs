use axum::{extract::State, http::StatusCode, response::Html};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::common::AppState;
use crate::error::AppResult;
use crate::influx::Point;

use super::JsonBody;

pub const WELCOME_HTML: &str = "<p>Welcome to your first InfluxDB Application</p>";

pub async fn welcome() -> Html<&'static str> {
    Html(WELCOME_HTML)
}

/// A measurement reported by one of your application's users.
///
/// "User" is a user of your application, not an InfluxDB user.
#[derive(Debug, Deserialize, ToSchema)]
pub struct IngestRequest {
    /// Stored as the `user_id` tag so queries can select one user's data
    #[schema(example = "user1")]
    pub user_id: String,
    #[schema(example = "measurement1")]
    pub measurement: String,
    #[serde(rename = "field1")]
    #[schema(example = 1.0)]
    pub field: f64,
}

impl IngestRequest {
    /// One point per request: the measurement, tagged with the user, stamped now.
    #[must_use]
    pub fn to_point(&self) -> Point {
        Point::new(&self.measurement)
            .tag("user_id", &self.user_id)
            .field("field1", self.field)
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UserRequest {
    #[schema(example = "user1")]
    pub user_id: String,
}

/// Write a user's measurement to InfluxDB
#[utoipa::path(
    post,
    path = "/ingest",
    request_body = IngestRequest,
    responses(
        (status = 200, description = "Point written"),
        (status = 400, description = "Malformed body or point"),
        (status = 404, description = "Bucket not found"),
    ),
    tag = "data"
)]
pub async fn ingest(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<IngestRequest>,
) -> AppResult<StatusCode> {
    // Production code should authenticate the caller and check that the
    // user_id belongs to them.
    let point = request.to_point();
    state
        .client
        .write_point(&state.organization, &state.bucket, &point)
        .await?;

    tracing::debug!(
        user_id = %request.user_id,
        measurement = %request.measurement,
        bucket = %state.bucket,
        "Ingested point"
    );
    Ok(StatusCode::OK)
}
