//! Pure access-policy evaluation.
//!
//! No I/O: the engine takes a resource snapshot, the requester context and the
//! current time, and returns a verdict. Callers re-check the time/limit parts
//! of the verdict inside the store's atomic admission operation; this module
//! is the single place the evaluation order lives.

use chrono::{DateTime, Utc};

use crate::domain::entities::{Principal, ShortLink, TextShare};

/// Why a resolution attempt was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    NotFound,
    Expired,
    LimitReached,
    Unauthorized,
    PasswordRequired,
}

/// Verdict of a policy evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Allow,
    Deny(DenyReason),
}

/// The policy-relevant projection of a resource.
#[derive(Debug, Clone)]
pub struct AccessSnapshot<'a> {
    pub expires_at: Option<DateTime<Utc>>,
    pub count: i64,
    pub limit: Option<i64>,
    pub is_public: bool,
    pub owner: Option<&'a str>,
    pub requires_password: bool,
}

impl<'a> From<&'a ShortLink> for AccessSnapshot<'a> {
    fn from(link: &'a ShortLink) -> Self {
        Self {
            expires_at: link.expires_at,
            count: link.click_count,
            limit: None,
            is_public: true,
            owner: link.owner.as_deref(),
            requires_password: link.has_password(),
        }
    }
}

impl<'a> From<&'a TextShare> for AccessSnapshot<'a> {
    fn from(share: &'a TextShare) -> Self {
        Self {
            expires_at: share.expires_at,
            count: share.view_count,
            limit: share.view_limit,
            is_public: share.is_public,
            owner: share.owner.as_deref(),
            requires_password: share.has_password(),
        }
    }
}

/// Requester-side context of an access attempt.
#[derive(Debug, Clone)]
pub struct AccessContext<'a> {
    pub principal: Option<&'a Principal>,
    /// True when a valid password already accompanied this request.
    pub password_verified: bool,
    pub now: DateTime<Utc>,
}

/// Evaluates whether an access attempt is allowed.
///
/// Checks run cheapest and most final first: expiry, then usage limit, then
/// visibility, then password. An expired or over-limit resource therefore
/// never leaks whether it was private or password-protected.
pub fn evaluate(snapshot: &AccessSnapshot<'_>, ctx: &AccessContext<'_>) -> AccessDecision {
    if snapshot.expires_at.is_some_and(|e| ctx.now >= e) {
        return AccessDecision::Deny(DenyReason::Expired);
    }

    if snapshot.limit.is_some_and(|limit| snapshot.count >= limit) {
        return AccessDecision::Deny(DenyReason::LimitReached);
    }

    if !snapshot.is_public {
        let is_owner = ctx
            .principal
            .is_some_and(|principal| principal.owns(snapshot.owner));
        if !is_owner {
            return AccessDecision::Deny(DenyReason::Unauthorized);
        }
    }

    if snapshot.requires_password && !ctx.password_verified {
        return AccessDecision::Deny(DenyReason::PasswordRequired);
    }

    AccessDecision::Allow
}
