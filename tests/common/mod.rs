#![allow(dead_code)]

use axum::routing::get;
use axum::{Router, extract::ConnectInfo, middleware};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc;

use shortbin::api::handlers::{health_handler, redirect_handler, view_share_handler};
use shortbin::api::middleware::identity;
use shortbin::api::routes::api_routes;
use shortbin::application::services::{
    ConfigTierProvider, IdentityService, LinkService, QuotaLimits, QuotaService, ShareService,
};
use shortbin::domain::access_event::AccessEvent;
use shortbin::domain::entities::Principal;
use shortbin::domain::repositories::{LinkRepository, ShareRepository};
use shortbin::infrastructure::persistence::{InMemoryLinkRepository, InMemoryShareRepository};
use shortbin::state::AppState;

pub const SECRET: &str = "test-signing-secret";
pub const BASE_URL: &str = "http://s.test";

pub struct TestContext {
    pub state: AppState,
    pub links: Arc<InMemoryLinkRepository>,
    pub shares: Arc<InMemoryShareRepository>,
    pub access_rx: mpsc::Receiver<AccessEvent>,
}

pub fn create_test_state() -> TestContext {
    create_test_state_with_limits(QuotaLimits::default())
}

pub fn create_test_state_with_limits(limits: QuotaLimits) -> TestContext {
    let links = Arc::new(InMemoryLinkRepository::new());
    let shares = Arc::new(InMemoryShareRepository::new());

    let link_repo: Arc<dyn LinkRepository> = links.clone();
    let share_repo: Arc<dyn ShareRepository> = shares.clone();

    let quota = Arc::new(QuotaService::new(
        Arc::new(ConfigTierProvider),
        limits,
        link_repo.clone(),
        share_repo.clone(),
    ));

    let (access_tx, access_rx) = mpsc::channel(100);

    let state = AppState {
        link_service: Arc::new(LinkService::new(
            link_repo,
            quota.clone(),
            access_tx.clone(),
            SECRET.to_string(),
        )),
        share_service: Arc::new(ShareService::new(
            share_repo,
            quota,
            access_tx.clone(),
            SECRET.to_string(),
        )),
        identity_service: Arc::new(IdentityService::new(SECRET.to_string())),
        access_tx,
        db: None,
        public_base_url: BASE_URL.to_string(),
    };

    TestContext {
        state,
        links,
        shares,
        access_rx,
    }
}

/// Builds the full application router over the in-memory store, with the
/// identity middleware and a mocked peer address, but no rate limiting.
pub fn test_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/t/{key}", get(view_share_handler))
        .route("/{key}", get(redirect_handler))
        .nest("/api", api_routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            identity::layer,
        ))
        .with_state(state)
        .layer(MockConnectInfoLayer)
}

/// Signed bearer token for a named guest identity.
pub fn guest_token(state: &AppState, name: &str) -> String {
    state
        .identity_service
        .token_for(&Principal::Guest(name.to_string()))
}

/// Signed bearer token for a user identity.
pub fn user_token(state: &AppState, id: i64) -> String {
    state.identity_service.token_for(&Principal::User(id))
}

#[derive(Clone)]
pub struct MockConnectInfoLayer;

impl<S> tower::Layer<S> for MockConnectInfoLayer {
    type Service = MockConnectInfoService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MockConnectInfoService { inner }
    }
}

#[derive(Clone)]
pub struct MockConnectInfoService<S> {
    inner: S,
}

impl<S, B> tower::Service<axum::http::Request<B>> for MockConnectInfoService<S>
where
    S: tower::Service<axum::http::Request<B>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: axum::http::Request<B>) -> Self::Future {
        let addr: SocketAddr = "127.0.0.1:12345".parse().unwrap();
        req.extensions_mut().insert(ConnectInfo(addr));
        self.inner.call(req)
    }
}
