use std::sync::Arc;
use tokio::sync::RwLock;

use crate::influx::InfluxClient;

/// The logged-in user, with clients built from their stored tokens.
#[derive(Debug)]
pub struct ActiveUser {
    pub name: String,
    pub email: String,
    pub read_client: InfluxClient,
    pub write_client: InfluxClient,
}

/// Holds at most one login at a time; a new login replaces the previous one.
#[derive(Debug, Default)]
pub struct Session {
    active: RwLock<Option<Arc<ActiveUser>>>,
}

impl Session {
    pub async fn login(&self, user: ActiveUser) {
        let previous = self.active.write().await.replace(Arc::new(user));
        if let Some(previous) = previous {
            tracing::debug!(email = %previous.email, "Replaced previous login");
        }
    }

    pub async fn current(&self) -> Option<Arc<ActiveUser>> {
        self.active.read().await.clone()
    }

    pub async fn logout(&self) {
        self.active.write().await.take();
    }
}
