use sqlx::PgPool;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::application::services::{IdentityService, LinkService, ShareService};
use crate::domain::access_event::AccessEvent;

/// Shared application state injected into all handlers.
#[derive(Clone)]
pub struct AppState {
    pub link_service: Arc<LinkService>,
    pub share_service: Arc<ShareService>,
    pub identity_service: Arc<IdentityService>,
    /// Sender side of the access-log queue; used by the health check.
    pub access_tx: mpsc::Sender<AccessEvent>,
    /// Database pool for health probes. `None` when running on the in-memory
    /// store (integration tests).
    pub db: Option<Arc<PgPool>>,
    /// Base URL used when rendering full short URLs, e.g. `https://s.example.com`.
    pub public_base_url: String,
}

impl AppState {
    /// Constructs the public short URL for a link key.
    pub fn short_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url.trim_end_matches('/'), key)
    }

    /// Constructs the public URL for a share key.
    pub fn share_url(&self, key: &str) -> String {
        format!("{}/t/{}", self.public_base_url.trim_end_matches('/'), key)
    }
}
