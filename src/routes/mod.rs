pub mod boilerplate;
pub mod health;
pub mod ingest;
pub mod iot;
mod rate_limit;
pub mod sample;

use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
    http::StatusCode,
    routing::get,
    Router,
};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

use rate_limit::ClientIpKeyExtractor;

use crate::config::Config;
use crate::error::AppError;

/// Largest request body the apps accept.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// JSON request body that rejects undecodable input with a plain 400.
///
/// Unlike `axum::Json` it does not insist on a `Content-Type` header, so
/// `curl -d '{"user_id":"user1"}'` works as-is.
#[derive(Debug, Clone)]
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| match e.status() {
                StatusCode::PAYLOAD_TOO_LARGE => AppError::PayloadTooLarge,
                _ => AppError::BadRequest(e.body_text()),
            })?;

        serde_json::from_slice(&bytes)
            .map(JsonBody)
            .map_err(|e| AppError::BadRequest(format!("Invalid JSON body: {e}")))
    }
}

/// Apply per-client rate limiting to `routes` unless it is disabled.
pub fn rate_limited<S>(routes: Router<S>, config: &Config) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    if config.disable_rate_limiting {
        tracing::warn!("Rate limiting DISABLED");
        return routes;
    }

    let Some(limiter) = GovernorConfigBuilder::default()
        .key_extractor(ClientIpKeyExtractor)
        .per_second(config.rate_limit_replenish_seconds)
        .burst_size(config.rate_limit_burst)
        .finish()
    else {
        tracing::error!(
            replenish_seconds = config.rate_limit_replenish_seconds,
            burst = config.rate_limit_burst,
            "Invalid rate limit settings, serving without rate limiting"
        );
        return routes;
    };

    tracing::info!(
        replenish_seconds = config.rate_limit_replenish_seconds,
        burst = config.rate_limit_burst,
        "Rate limiting configured"
    );

    routes.layer(GovernorLayer {
        config: Arc::new(limiter),
    })
}

/// Add the health probe and the middleware every sample app shares.
pub fn with_common_layers(router: Router) -> Router {
    router
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .route("/healthz", get(health::healthz))
        .layer(CompressionLayer::new())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
