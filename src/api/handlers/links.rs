//! Handlers for short link management.

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde_json::json;
use validator::Validate;

use crate::api::dto::links::{CreateLinkRequest, CreateLinkResponse, LinkSummary};
use crate::api::dto::verify::{VerifyPasswordRequest, VerifyPasswordResponse};
use crate::api::middleware::identity::RequestIdentity;
use crate::application::services::CreateLink;
use crate::domain::entities::Principal;
use crate::error::AppError;
use crate::state::AppState;

/// Response header carrying a freshly minted guest token.
pub const GUEST_TOKEN_HEADER: &str = "x-guest-token";

/// Creates a short link.
///
/// # Endpoint
///
/// `POST /api/links`
///
/// Anonymous requests are assigned a fresh guest identity; its long-lived
/// token is returned in the `X-Guest-Token` response header so the client can
/// keep acting as the same owner.
///
/// # Errors
///
/// - `400 validation_error` — malformed URL, slug or password
/// - `409 conflict` — custom slug already taken
/// - `409 quota_exceeded` — creation ceiling reached
pub async fn create_link_handler(
    State(state): State<AppState>,
    identity: Option<Extension<RequestIdentity>>,
    Json(payload): Json<CreateLinkRequest>,
) -> Result<Response, AppError> {
    payload.validate()?;

    let (principal, minted_token) = principal_or_minted_guest(&state, identity);

    let link = state
        .link_service
        .create(
            &principal,
            CreateLink {
                original_url: payload.url,
                custom_slug: payload.custom_slug,
                expires_at: payload.expires_at,
                password: payload.password,
            },
        )
        .await?;

    let body = CreateLinkResponse {
        short_url: state.short_url(&link.short_key),
        short_key: link.short_key,
        expires_at: link.expires_at,
    };

    Ok(with_guest_token(
        (StatusCode::CREATED, Json(body)).into_response(),
        minted_token,
    ))
}

/// Lists the caller's links, newest first.
///
/// # Endpoint
///
/// `GET /api/links`
pub async fn list_links_handler(
    State(state): State<AppState>,
    identity: Option<Extension<RequestIdentity>>,
) -> Result<Json<Vec<LinkSummary>>, AppError> {
    let principal = require_identity(identity)?;

    let links = state.link_service.list_for(&principal).await?;
    let summaries = links
        .iter()
        .map(|link| LinkSummary::from_entity(link, state.short_url(&link.short_key)))
        .collect();

    Ok(Json(summaries))
}

/// Deletes a link owned by the caller.
///
/// # Endpoint
///
/// `DELETE /api/links/{key}`
///
/// # Errors
///
/// - `403 unauthorized` — caller is not the owner (or has no identity)
/// - `404 not_found` — the key does not exist; deleting twice is safe
pub async fn delete_link_handler(
    State(state): State<AppState>,
    identity: Option<Extension<RequestIdentity>>,
    Path(key): Path<String>,
) -> Result<StatusCode, AppError> {
    let principal = require_identity(identity)?;

    state.link_service.delete(&key, &principal).await?;
    Ok(StatusCode::OK)
}

/// Verifies a password against a link without mutating any counter.
///
/// # Endpoint
///
/// `POST /api/links/{key}/verify-password`
pub async fn verify_link_password_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(payload): Json<VerifyPasswordRequest>,
) -> Result<Json<VerifyPasswordResponse>, AppError> {
    payload.validate()?;

    let valid = state
        .link_service
        .verify_link_password(&key, &payload.password)
        .await?;

    Ok(Json(VerifyPasswordResponse { valid }))
}

/// Resolves the acting principal, minting a guest when the request carries no
/// identity. The minted token, if any, must be surfaced to the client.
pub(crate) fn principal_or_minted_guest(
    state: &AppState,
    identity: Option<Extension<RequestIdentity>>,
) -> (Principal, Option<String>) {
    match identity.and_then(|Extension(RequestIdentity(p))| p) {
        Some(principal) => (principal, None),
        None => {
            let (principal, token) = state.identity_service.mint_guest();
            (principal, Some(token))
        }
    }
}

/// Attaches a minted guest token header to a response.
pub(crate) fn with_guest_token(mut response: Response, minted_token: Option<String>) -> Response {
    if let Some(token) = minted_token {
        if let Ok(value) = HeaderValue::from_str(&token) {
            response.headers_mut().insert(GUEST_TOKEN_HEADER, value);
        }
    }
    response
}

/// Rejects requests that carry no resolvable identity.
pub(crate) fn require_identity(
    identity: Option<Extension<RequestIdentity>>,
) -> Result<Principal, AppError> {
    identity
        .and_then(|Extension(RequestIdentity(p))| p)
        .ok_or_else(|| {
            AppError::unauthorized(
                "This operation requires an identity token",
                json!({ "reason": "Missing or invalid bearer token" }),
            )
        })
}
