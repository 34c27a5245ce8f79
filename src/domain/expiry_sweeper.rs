//! Periodic removal of expired resources.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, warn};

use crate::domain::repositories::{LinkRepository, ShareRepository};

/// Periodically purges links and shares whose expiry has passed.
///
/// Expired resources already stop resolving at their boundary through the
/// policy engine and the store's admission predicate; the sweep only reclaims
/// the rows (and their logs, via cascade).
pub async fn run_expiry_sweeper(
    interval: Duration,
    links: Arc<dyn LinkRepository>,
    shares: Arc<dyn ShareRepository>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        let now = Utc::now();

        match links.purge_expired(now).await {
            Ok(0) => {}
            Ok(n) => debug!("purged {n} expired links"),
            Err(e) => warn!("expiry sweep for links failed: {e}"),
        }

        match shares.purge_expired(now).await {
            Ok(0) => {}
            Ok(n) => debug!("purged {n} expired shares"),
            Err(e) => warn!("expiry sweep for shares failed: {e}"),
        }
    }
}
