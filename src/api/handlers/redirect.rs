//! Handler for short link resolution.

use axum::{
    Extension,
    extract::{ConnectInfo, Path, Query, State},
    http::{HeaderMap, header},
    response::{IntoResponse, Redirect},
};
use serde::Deserialize;
use std::net::SocketAddr;

use crate::api::middleware::identity::RequestIdentity;
use crate::application::services::RequestMeta;
use crate::error::AppError;
use crate::state::AppState;

/// Optional password supplied with a resolution request.
#[derive(Debug, Deserialize)]
pub struct ResolveParams {
    pub password: Option<String>,
}

/// Resolves a short key to its destination URL.
///
/// # Endpoint
///
/// `GET /{key}?password=…`
///
/// # Request Flow
///
/// 1. Policy evaluation on the current snapshot (expiry, password)
/// 2. Atomic admit-and-increment in the store
/// 3. Fire-and-forget click log event
/// 4. 307 Temporary Redirect to the destination
///
/// # Errors
///
/// - `404 not_found` — the key never existed
/// - `410 expired` — the link existed but its expiry passed
/// - `401 password_required` / `401 invalid_password` — password gate
pub async fn redirect_handler(
    Path(key): Path<String>,
    State(state): State<AppState>,
    identity: Option<Extension<RequestIdentity>>,
    Query(params): Query<ResolveParams>,
    headers: HeaderMap,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
) -> Result<impl IntoResponse, AppError> {
    let principal = identity.and_then(|Extension(RequestIdentity(p))| p);

    let meta = RequestMeta {
        ip: Some(addr.ip().to_string()),
        user_agent: headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string()),
    };

    let resolved = state
        .link_service
        .resolve(&key, principal.as_ref(), params.password.as_deref(), meta)
        .await?;

    Ok(Redirect::temporary(&resolved.target_url))
}
