//! Background worker draining access events into the log tables.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_retry::Retry;
use tokio_retry::strategy::FixedInterval;
use tracing::warn;

use crate::domain::access_event::{AccessEvent, ResourceKind};
use crate::domain::entities::{NewClick, NewView};
use crate::domain::repositories::{LinkRepository, ShareRepository};

const RETRY_ATTEMPTS: usize = 3;
const RETRY_INTERVAL: Duration = Duration::from_millis(200);

/// Drains the access-event channel, appending one log row per event.
///
/// Appends are retried a few times on store errors and then dropped with a
/// warning: a lost log entry is tolerable, and the worker must never back up
/// into the resolution path.
pub async fn run_log_worker(
    mut rx: mpsc::Receiver<AccessEvent>,
    links: Arc<dyn LinkRepository>,
    shares: Arc<dyn ShareRepository>,
) {
    while let Some(event) = rx.recv().await {
        let strategy = FixedInterval::new(RETRY_INTERVAL).take(RETRY_ATTEMPTS - 1);

        let result = Retry::spawn(strategy, || append_once(&event, &links, &shares)).await;

        if let Err(e) = result {
            metrics::counter!("access_log_dropped_total", "kind" => event.kind.as_str())
                .increment(1);
            warn!(
                key = %event.short_key,
                kind = event.kind.as_str(),
                "dropping access log entry after {RETRY_ATTEMPTS} attempts: {e}"
            );
        }
    }
}

async fn append_once(
    event: &AccessEvent,
    links: &Arc<dyn LinkRepository>,
    shares: &Arc<dyn ShareRepository>,
) -> Result<(), crate::error::AppError> {
    match event.kind {
        ResourceKind::Link => {
            links
                .append_click(NewClick {
                    link_id: event.resource_id,
                    ip: event.ip.clone(),
                    user_agent: event.user_agent.clone(),
                })
                .await
        }
        ResourceKind::Share => {
            shares
                .append_view(NewView {
                    share_id: event.resource_id,
                    ip: event.ip.clone(),
                    user_agent: event.user_agent.clone(),
                })
                .await
        }
    }
}
