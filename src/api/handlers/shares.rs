//! Handlers for text share resolution and management.

use axum::{
    Extension, Json,
    extract::{ConnectInfo, Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use std::net::SocketAddr;
use validator::Validate;

use crate::api::dto::shares::{
    CreateShareRequest, CreateShareResponse, ShareContentResponse, ShareSummary,
};
use crate::api::dto::verify::{VerifyPasswordRequest, VerifyPasswordResponse};
use crate::api::handlers::links::{principal_or_minted_guest, require_identity, with_guest_token};
use crate::api::handlers::redirect::ResolveParams;
use crate::api::middleware::identity::RequestIdentity;
use crate::application::services::{CreateShare, RequestMeta};
use crate::error::AppError;
use crate::state::AppState;

/// Resolves a share key to its content.
///
/// # Endpoint
///
/// `GET /t/{key}?password=…`
///
/// Content is withheld until the password gate passes: denied requests carry
/// no share fields at all. An admitted view increments the counter atomically
/// and appends a view log entry in the background.
///
/// # Errors
///
/// - `404 not_found`
/// - `410 expired` / `410 limit_reached`
/// - `403 unauthorized` — private share, caller is not the owner
/// - `401 password_required` / `401 invalid_password`
pub async fn view_share_handler(
    Path(key): Path<String>,
    State(state): State<AppState>,
    identity: Option<Extension<RequestIdentity>>,
    Query(params): Query<ResolveParams>,
    headers: HeaderMap,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
) -> Result<Json<ShareContentResponse>, AppError> {
    let principal = identity.and_then(|Extension(RequestIdentity(p))| p);

    let meta = RequestMeta {
        ip: Some(addr.ip().to_string()),
        user_agent: headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string()),
    };

    let share = state
        .share_service
        .resolve(&key, principal.as_ref(), params.password.as_deref(), meta)
        .await?;

    Ok(Json(ShareContentResponse::from_entity(&share)))
}

/// Creates a text share.
///
/// # Endpoint
///
/// `POST /api/shares`
///
/// Anonymous requests are assigned a fresh guest identity, returned in the
/// `X-Guest-Token` response header.
pub async fn create_share_handler(
    State(state): State<AppState>,
    identity: Option<Extension<RequestIdentity>>,
    Json(payload): Json<CreateShareRequest>,
) -> Result<Response, AppError> {
    payload.validate()?;

    let (principal, minted_token) = principal_or_minted_guest(&state, identity);

    let share = state
        .share_service
        .create(
            &principal,
            CreateShare {
                title: payload.title,
                content: payload.content,
                format: payload.format,
                syntax_language: payload.syntax_language,
                custom_slug: payload.custom_slug,
                is_public: payload.is_public,
                view_limit: payload.view_limit,
                expires_at: payload.expires_at,
                password: payload.password,
            },
        )
        .await?;

    let body = CreateShareResponse {
        share_url: state.share_url(&share.short_key),
        short_key: share.short_key,
        expires_at: share.expires_at,
    };

    Ok(with_guest_token(
        (StatusCode::CREATED, Json(body)).into_response(),
        minted_token,
    ))
}

/// Lists the caller's shares, newest first.
///
/// # Endpoint
///
/// `GET /api/shares`
pub async fn list_shares_handler(
    State(state): State<AppState>,
    identity: Option<Extension<RequestIdentity>>,
) -> Result<Json<Vec<ShareSummary>>, AppError> {
    let principal = require_identity(identity)?;

    let shares = state.share_service.list_for(&principal).await?;
    let summaries = shares
        .iter()
        .map(|share| ShareSummary::from_entity(share, state.share_url(&share.short_key)))
        .collect();

    Ok(Json(summaries))
}

/// Deletes a share owned by the caller.
///
/// # Endpoint
///
/// `DELETE /api/shares/{key}`
pub async fn delete_share_handler(
    State(state): State<AppState>,
    identity: Option<Extension<RequestIdentity>>,
    Path(key): Path<String>,
) -> Result<StatusCode, AppError> {
    let principal = require_identity(identity)?;

    state.share_service.delete(&key, &principal).await?;
    Ok(StatusCode::OK)
}

/// Verifies a password against a share without mutating any counter.
///
/// # Endpoint
///
/// `POST /api/shares/{key}/verify-password`
pub async fn verify_share_password_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(payload): Json<VerifyPasswordRequest>,
) -> Result<Json<VerifyPasswordResponse>, AppError> {
    payload.validate()?;

    let valid = state
        .share_service
        .verify_share_password(&key, &payload.password)
        .await?;

    Ok(Json(VerifyPasswordResponse { valid }))
}
