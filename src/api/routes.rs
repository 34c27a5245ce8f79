//! API route configuration.

use axum::{
    Router,
    routing::{delete, get, post},
};

use crate::api::handlers::{
    create_link_handler, create_share_handler, delete_link_handler, delete_share_handler,
    list_links_handler, list_shares_handler, slug_check_handler, verify_link_password_handler,
    verify_share_password_handler,
};
use crate::state::AppState;

/// All `/api` routes.
///
/// # Endpoints
///
/// - `POST   /links`                        - Create a short link
/// - `GET    /links`                        - List the caller's links
/// - `DELETE /links/{key}`                  - Delete an owned link
/// - `POST   /links/{key}/verify-password`  - Verify a link password
/// - `POST   /shares`                       - Create a text share
/// - `GET    /shares`                       - List the caller's shares
/// - `DELETE /shares/{key}`                 - Delete an owned share
/// - `POST   /shares/{key}/verify-password` - Verify a share password
/// - `GET    /slug/check`                   - Custom slug availability
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/links", post(create_link_handler).get(list_links_handler))
        .route("/links/{key}", delete(delete_link_handler))
        .route(
            "/links/{key}/verify-password",
            post(verify_link_password_handler),
        )
        .route(
            "/shares",
            post(create_share_handler).get(list_shares_handler),
        )
        .route("/shares/{key}", delete(delete_share_handler))
        .route(
            "/shares/{key}/verify-password",
            post(verify_share_password_handler),
        )
        .route("/slug/check", get(slug_check_handler))
}
