//! HTTP server initialization and runtime setup.
//!
//! Handles database connections, background worker spawning, and the Axum
//! server lifecycle.

use crate::application::services::{
    ConfigTierProvider, IdentityService, LinkService, QuotaService, ShareService,
};
use crate::config::Config;
use crate::domain::expiry_sweeper::run_expiry_sweeper;
use crate::domain::log_worker::run_log_worker;
use crate::domain::repositories::{LinkRepository, ShareRepository};
use crate::infrastructure::persistence::{PgLinkRepository, PgShareRepository};
use crate::routes::app_router;
use crate::state::AppState;

use anyhow::Result;
use axum::ServiceExt;
use axum::extract::Request;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - PostgreSQL connection pool and migrations
/// - Background access-log worker and expiry sweeper
/// - Axum HTTP server
///
/// # Errors
///
/// Returns an error if the database connection, migration run, or server bind
/// fails.
pub async fn run(config: Config) -> Result<()> {
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
        .idle_timeout(Duration::from_secs(config.db_idle_timeout))
        .max_lifetime(Duration::from_secs(config.db_max_lifetime))
        .connect(&config.database_url)
        .await?;
    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations").run(&pool).await?;

    let pool = Arc::new(pool);
    let link_repository: Arc<dyn LinkRepository> =
        Arc::new(PgLinkRepository::new(pool.clone()));
    let share_repository: Arc<dyn ShareRepository> =
        Arc::new(PgShareRepository::new(pool.clone()));

    let (access_tx, access_rx) = mpsc::channel(config.access_log_queue_capacity);

    tokio::spawn(run_log_worker(
        access_rx,
        link_repository.clone(),
        share_repository.clone(),
    ));
    tracing::info!("Access log worker started");

    tokio::spawn(run_expiry_sweeper(
        Duration::from_secs(config.expiry_sweep_seconds),
        link_repository.clone(),
        share_repository.clone(),
    ));
    tracing::info!("Expiry sweeper started");

    let quota = Arc::new(QuotaService::new(
        Arc::new(ConfigTierProvider),
        config.quota_limits.clone(),
        link_repository.clone(),
        share_repository.clone(),
    ));

    let state = AppState {
        link_service: Arc::new(LinkService::new(
            link_repository,
            quota.clone(),
            access_tx.clone(),
            config.signing_secret.clone(),
        )),
        share_service: Arc::new(ShareService::new(
            share_repository,
            quota,
            access_tx.clone(),
            config.signing_secret.clone(),
        )),
        identity_service: Arc::new(IdentityService::new(config.signing_secret.clone())),
        access_tx,
        db: Some(pool),
        public_base_url: config.public_base_url.clone(),
    };

    let app = app_router(state);

    let addr: SocketAddr = config.listen_addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .await?;

    Ok(())
}
