//! Handler for slug availability checks.

use axum::{
    Json,
    extract::{Query, State},
};

use crate::api::dto::slug::{SlugCheckParams, SlugCheckResponse, SlugKind};
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::key_generator::validate_custom_slug;

/// Checks whether a custom slug is syntactically valid and currently unused.
///
/// # Endpoint
///
/// `GET /api/slug/check?slug=…&kind=link|share`
///
/// The answer is advisory: the store's uniqueness constraint remains the
/// arbiter at creation time, and the loser of a simultaneous claim receives
/// `409 conflict` there.
pub async fn slug_check_handler(
    State(state): State<AppState>,
    Query(params): Query<SlugCheckParams>,
) -> Result<Json<SlugCheckResponse>, AppError> {
    if validate_custom_slug(&params.slug).is_err() {
        return Ok(Json(SlugCheckResponse { available: false }));
    }

    let available = match params.kind {
        SlugKind::Link => state.link_service.slug_available(&params.slug).await?,
        SlugKind::Share => state.share_service.slug_available(&params.slug).await?,
    };

    Ok(Json(SlugCheckResponse { available }))
}
