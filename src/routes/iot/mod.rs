//! The IoT app: a local login system that stores each user's InfluxDB tokens,
//! plus pages that write random readings and graph them.
//!
//! Only one user is logged in at a time, and the login is shared by every
//! browser talking to the server.

mod handlers;
mod pages;
mod session;

pub use handlers::{graph_first_table, GraphData};
pub use session::{ActiveUser, Session};

use axum::{routing::get, Router};
use sea_orm::{ConnectOptions, DatabaseConnection};
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::error::AppResult;
use crate::logins;

use super::{rate_limited, with_common_layers};

/// Effectively forever for a sample app process.
const IN_MEMORY_KEEPALIVE: Duration = Duration::from_secs(10 * 365 * 24 * 60 * 60);

#[derive(Clone)]
pub struct IotState {
    pub db: DatabaseConnection,
    pub config: Arc<Config>,
    pub session: Arc<Session>,
    /// Organization ID, sent as `org` on writes and queries
    pub organization_id: String,
    pub bucket: String,
}

impl IotState {
    pub fn new(
        db: DatabaseConnection,
        config: Config,
        organization_id: impl Into<String>,
        bucket: impl Into<String>,
    ) -> Self {
        Self {
            db,
            config: Arc::new(config),
            session: Arc::new(Session::default()),
            organization_id: organization_id.into(),
            bucket: bucket.into(),
        }
    }
}

/// Open the login database and collect the InfluxDB settings the app needs.
///
/// No InfluxDB token is required up front; each login supplies its own.
///
/// # Errors
///
/// Fails if the organization ID or bucket is not configured, or the login
/// database cannot be opened.
pub async fn connect(config: Config) -> AppResult<IotState> {
    let organization_id = config.organization_id()?.to_string();
    let bucket = config.bucket()?.to_string();

    let db = logins::open_login_db(login_db_options(&config.login_database_url)).await?;
    tracing::info!(url = %config.login_database_url, "Login database ready");

    Ok(IotState::new(db, config, organization_id, bucket))
}

/// Pool settings for the login database.
///
/// An in-memory database lives only as long as its connection, so it gets a
/// single connection that is never recycled.
fn login_db_options(url: &str) -> ConnectOptions {
    let mut options = ConnectOptions::new(url);
    if url.contains(":memory:") {
        options
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(IN_MEMORY_KEEPALIVE)
            .max_lifetime(IN_MEMORY_KEEPALIVE);
    }
    options
}

pub fn build_router(state: IotState) -> Router {
    let graph_routes = Router::new()
        .route("/graph_query_data", get(handlers::graph_query_data))
        .route(
            "/graph_write_data",
            get(handlers::graph_write_data).post(handlers::graph_write_data),
        );

    let app = Router::new()
        .route("/", get(handlers::index))
        .route("/login", get(handlers::login_page).post(handlers::login))
        .route("/logout", get(handlers::logout))
        .route("/signup", get(handlers::signup_page).post(handlers::signup))
        .route("/profile", get(handlers::profile))
        .merge(rate_limited(graph_routes, &state.config))
        .with_state(state);

    with_common_layers(app)
}
