use std::sync::Arc;

use crate::config::Config;
use crate::influx::InfluxClient;

/// Shared state of the JSON sample apps.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub client: InfluxClient,
    /// Organization name, sent as `org` on writes and queries
    pub organization: String,
    /// Organization ID, required by the bucket and task APIs
    pub organization_id: String,
    /// Bucket the app writes to and queries from
    pub bucket: String,
}

impl AppState {
    pub fn new(
        config: Config,
        client: InfluxClient,
        organization: impl Into<String>,
        organization_id: impl Into<String>,
        bucket: impl Into<String>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            client,
            organization: organization.into(),
            organization_id: organization_id.into(),
            bucket: bucket.into(),
        }
    }
}
