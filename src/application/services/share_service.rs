//! Text share creation, resolution and management.

use chrono::{DateTime, Utc};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

use super::{QuotaService, RequestMeta, deny_error};
use crate::domain::access_event::{AccessEvent, ResourceKind};
use crate::domain::entities::{
    MAX_CONTENT_BYTES, NewTextShare, Principal, ShareFormat, TextShare,
};
use crate::domain::policy::{self, AccessContext, AccessDecision, AccessSnapshot, DenyReason};
use crate::domain::repositories::{Admission, DeleteOutcome, ShareRepository};
use crate::error::AppError;
use crate::utils::key_generator::{generate_key, validate_custom_slug};
use crate::utils::password::{hash_password, verify_password};

const MAX_KEY_ATTEMPTS: usize = 10;

/// Input for creating a text share.
#[derive(Debug, Clone)]
pub struct CreateShare {
    pub title: String,
    pub content: String,
    pub format: ShareFormat,
    pub syntax_language: Option<String>,
    pub custom_slug: Option<String>,
    pub is_public: bool,
    pub view_limit: Option<i64>,
    pub expires_at: Option<DateTime<Utc>>,
    pub password: Option<String>,
}

impl Default for CreateShare {
    fn default() -> Self {
        Self {
            title: String::new(),
            content: String::new(),
            format: ShareFormat::Plain,
            syntax_language: None,
            custom_slug: None,
            is_public: true,
            view_limit: None,
            expires_at: None,
            password: None,
        }
    }
}

/// Service for creating and resolving text shares.
pub struct ShareService {
    shares: Arc<dyn ShareRepository>,
    quota: Arc<QuotaService>,
    events: mpsc::Sender<AccessEvent>,
    signing_secret: String,
}

impl ShareService {
    pub fn new(
        shares: Arc<dyn ShareRepository>,
        quota: Arc<QuotaService>,
        events: mpsc::Sender<AccessEvent>,
        signing_secret: String,
    ) -> Self {
        Self {
            shares,
            quota,
            events,
            signing_secret,
        }
    }

    /// Creates a text share owned by `principal`.
    pub async fn create(
        &self,
        principal: &Principal,
        req: CreateShare,
    ) -> Result<TextShare, AppError> {
        self.quota.ensure_can_create(principal).await?;

        if req.content.len() > MAX_CONTENT_BYTES {
            return Err(AppError::bad_request(
                "Content exceeds the maximum size",
                json!({ "max_bytes": MAX_CONTENT_BYTES, "provided_bytes": req.content.len() }),
            ));
        }

        if req.view_limit.is_some_and(|limit| limit < 1) {
            return Err(AppError::bad_request(
                "View limit must be positive",
                json!({ "view_limit": req.view_limit }),
            ));
        }

        let password_hash = req
            .password
            .as_deref()
            .map(|pw| hash_password(&self.signing_secret, pw));

        let new_share = |short_key: String| NewTextShare {
            short_key,
            title: req.title.clone(),
            content: req.content.clone(),
            format: req.format,
            syntax_language: req.syntax_language.clone(),
            password_hash: password_hash.clone(),
            is_public: req.is_public,
            owner: Some(principal.storage_key()),
            view_limit: req.view_limit,
            expires_at: req.expires_at,
        };

        let share = if let Some(slug) = &req.custom_slug {
            validate_custom_slug(slug)?;
            self.shares.create(new_share(slug.clone())).await?
        } else {
            let mut created = None;
            for _ in 0..MAX_KEY_ATTEMPTS {
                match self.shares.create(new_share(generate_key())).await {
                    Err(AppError::Conflict { .. }) => continue,
                    other => {
                        created = Some(other?);
                        break;
                    }
                }
            }
            created.ok_or_else(|| {
                AppError::internal(
                    "Failed to generate unique short key",
                    json!({ "reason": "Too many collisions" }),
                )
            })?
        };

        metrics::counter!("share_creations_total").increment(1);
        Ok(share)
    }

    /// Resolves a share key to its content, admitting and counting the view
    /// atomically.
    ///
    /// The returned entity is mapped to a response DTO by the API layer; the
    /// password hash never leaves the service boundary in a response.
    pub async fn resolve(
        &self,
        key: &str,
        principal: Option<&Principal>,
        presented_password: Option<&str>,
        meta: RequestMeta,
    ) -> Result<TextShare, AppError> {
        let now = Utc::now();

        let Some(share) = self.shares.find_by_key(key).await? else {
            self.record_outcome("not_found");
            return Err(deny_error(DenyReason::NotFound, key));
        };

        let snapshot = AccessSnapshot::from(&share);
        let ctx = AccessContext {
            principal,
            password_verified: false,
            now,
        };

        match policy::evaluate(&snapshot, &ctx) {
            AccessDecision::Allow => {}
            AccessDecision::Deny(DenyReason::PasswordRequired) => {
                let Some(password) = presented_password else {
                    self.record_outcome("password_required");
                    return Err(deny_error(DenyReason::PasswordRequired, key));
                };
                let hash = share.password_hash.as_deref().unwrap_or_default();
                if !verify_password(&self.signing_secret, password, hash) {
                    self.record_outcome("invalid_password");
                    return Err(AppError::invalid_password(
                        "Invalid password",
                        json!({ "short_key": key }),
                    ));
                }
            }
            AccessDecision::Deny(reason) => {
                self.record_outcome(reason_code(reason));
                return Err(deny_error(reason, key));
            }
        }

        match self.shares.admit_view(key, now).await? {
            Admission::Admitted { new_count } => {
                self.record_outcome("allow");

                let event = AccessEvent::new(
                    ResourceKind::Share,
                    share.id,
                    share.short_key.clone(),
                    meta.ip,
                    meta.user_agent.as_deref(),
                );
                if self.events.try_send(event).is_err() {
                    debug!(key, "access log queue full, dropping view event");
                }

                Ok(TextShare {
                    view_count: new_count,
                    ..share
                })
            }
            Admission::Denied(reason) => {
                self.record_outcome(reason_code(reason));
                Err(deny_error(reason, key))
            }
            Admission::NotFound => {
                self.record_outcome("not_found");
                Err(deny_error(DenyReason::NotFound, key))
            }
        }
    }

    /// Verifies a presented password against a share's stored hash without
    /// touching counters.
    pub async fn verify_share_password(
        &self,
        key: &str,
        password: &str,
    ) -> Result<bool, AppError> {
        let Some(share) = self.shares.find_by_key(key).await? else {
            return Err(deny_error(DenyReason::NotFound, key));
        };

        Ok(share
            .password_hash
            .as_deref()
            .is_some_and(|hash| verify_password(&self.signing_secret, password, hash)))
    }

    /// Deletes a share owned by `principal`. Idempotent on missing keys.
    pub async fn delete(&self, key: &str, principal: &Principal) -> Result<(), AppError> {
        match self.shares.delete(key, principal).await? {
            DeleteOutcome::Deleted => Ok(()),
            DeleteOutcome::Forbidden => Err(AppError::unauthorized(
                "Only the owner can delete this share",
                json!({ "short_key": key }),
            )),
            DeleteOutcome::NotFound => Err(deny_error(DenyReason::NotFound, key)),
        }
    }

    /// Lists shares owned by `principal`, newest first.
    pub async fn list_for(&self, principal: &Principal) -> Result<Vec<TextShare>, AppError> {
        self.shares.list_by_owner(&principal.storage_key()).await
    }

    /// Returns true when `slug` is not yet taken as a share key.
    pub async fn slug_available(&self, slug: &str) -> Result<bool, AppError> {
        Ok(self.shares.find_by_key(slug).await?.is_none())
    }

    fn record_outcome(&self, outcome: &'static str) {
        metrics::counter!("resolutions_total", "kind" => "share", "outcome" => outcome)
            .increment(1);
    }
}

fn reason_code(reason: DenyReason) -> &'static str {
    match reason {
        DenyReason::NotFound => "not_found",
        DenyReason::Expired => "expired",
        DenyReason::LimitReached => "limit_reached",
        DenyReason::Unauthorized => "unauthorized",
        DenyReason::PasswordRequired => "password_required",
    }
}
