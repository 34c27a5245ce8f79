//! Top-level router configuration.
//!
//! # Route Structure
//!
//! - `GET  /{key}`    - Short link redirect (public)
//! - `GET  /t/{key}`  - Text share view (public)
//! - `GET  /health`   - Health check (public)
//! - `/api/*`         - REST API (identity-resolving, stricter rate limit)
//!
//! # Middleware
//!
//! - **Tracing** - Structured request/response logging
//! - **Identity** - Bearer token → principal resolution (never rejects)
//! - **Rate limiting** - Per-IP token bucket on `/api`
//! - **Path normalization** - Trailing slash handling

use crate::api;
use crate::api::handlers::{health_handler, redirect_handler, view_share_handler};
use crate::api::middleware::{identity, rate_limit, tracing};
use crate::state::AppState;
use axum::routing::get;
use axum::{Router, middleware};
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};

/// Constructs the application router with all routes and middleware.
pub fn app_router(state: AppState) -> NormalizePath<Router> {
    let api_router = api::routes::api_routes().layer(rate_limit::secure_layer());

    let router = Router::new()
        .route("/health", get(health_handler))
        .route("/t/{key}", get(view_share_handler))
        .route("/{key}", get(redirect_handler))
        .nest("/api", api_router)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            identity::layer,
        ))
        .with_state(state)
        .layer(tracing::layer());

    NormalizePathLayer::trim_trailing_slash().layer(router)
}
