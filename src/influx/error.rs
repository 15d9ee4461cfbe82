use reqwest::StatusCode;

use crate::influx::point::PointError;

#[derive(Debug, thiserror::Error)]
pub enum InfluxError {
    #[error("Failed to build HTTP client: {0}")]
    Setup(#[source] reqwest::Error),

    #[error("Request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status}: {message}")]
    Api {
        status: StatusCode,
        code: Option<String>,
        message: String,
    },

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Query failed: {message}")]
    Query {
        message: String,
        reference: Option<String>,
    },

    #[error("{kind} '{name}' not found")]
    NotFound { kind: &'static str, name: String },

    #[error(transparent)]
    Point(#[from] PointError),
}

impl InfluxError {
    /// HTTP status a handler should answer with, when the error carries one.
    ///
    /// Status codes returned by the InfluxDB API are passed through unchanged.
    #[must_use]
    pub fn status_code(&self) -> Option<StatusCode> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::NotFound { .. } => Some(StatusCode::NOT_FOUND),
            Self::Point(_) => Some(StatusCode::BAD_REQUEST),
            Self::Setup(_) | Self::Request { .. } | Self::Decode(_) | Self::Query { .. } => None,
        }
    }
}

pub type InfluxResult<T> = Result<T, InfluxError>;
