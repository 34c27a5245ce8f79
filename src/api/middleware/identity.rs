//! Identity-resolving middleware.

use axum::{
    extract::{FromRequestParts, Request, State},
    middleware::Next,
    response::Response,
};
use axum_auth::AuthBearer;

use crate::domain::entities::Principal;
use crate::state::AppState;

/// The principal a request acts as, resolved from its bearer token.
///
/// `None` means the request is anonymous: resolution of public resources
/// still proceeds, while owner-scoped operations reject and creation mints a
/// fresh guest identity.
#[derive(Debug, Clone)]
pub struct RequestIdentity(pub Option<Principal>);

/// Resolves the `Authorization: Bearer` token (if any) into a principal and
/// attaches it as a request extension.
///
/// Never rejects: a missing or invalid token simply yields an anonymous
/// request. Credential issuance lives outside this service; only the token
/// signature is checked here.
pub async fn layer(State(st): State<AppState>, req: Request, next: Next) -> Response {
    let (mut parts, body) = req.into_parts();

    let principal = AuthBearer::from_request_parts(&mut parts, &())
        .await
        .ok()
        .and_then(|AuthBearer(token)| st.identity_service.verify(&token));

    let mut req = Request::from_parts(parts, body);
    req.extensions_mut().insert(RequestIdentity(principal));

    next.run(req).await
}
