//! Short link creation, resolution and management.

use chrono::{DateTime, Utc};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

use super::{QuotaService, RequestMeta, deny_error};
use crate::domain::access_event::{AccessEvent, ResourceKind};
use crate::domain::entities::{NewShortLink, Principal, ShortLink};
use crate::domain::policy::{self, AccessContext, AccessDecision, AccessSnapshot, DenyReason};
use crate::domain::repositories::{Admission, DeleteOutcome, LinkRepository};
use crate::error::AppError;
use crate::utils::key_generator::{generate_key, validate_custom_slug};
use crate::utils::password::{hash_password, verify_password};
use crate::utils::url_normalizer::normalize_url;

/// Attempts at generating a collision-free random key before giving up.
const MAX_KEY_ATTEMPTS: usize = 10;

/// Input for creating a short link.
#[derive(Debug, Clone, Default)]
pub struct CreateLink {
    pub original_url: String,
    pub custom_slug: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub password: Option<String>,
}

/// Payload of an admitted link resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLink {
    pub target_url: String,
    pub click_count: i64,
}

/// Service for creating and resolving shortened links.
pub struct LinkService {
    links: Arc<dyn LinkRepository>,
    quota: Arc<QuotaService>,
    events: mpsc::Sender<AccessEvent>,
    signing_secret: String,
}

impl LinkService {
    pub fn new(
        links: Arc<dyn LinkRepository>,
        quota: Arc<QuotaService>,
        events: mpsc::Sender<AccessEvent>,
        signing_secret: String,
    ) -> Self {
        Self {
            links,
            quota,
            events,
            signing_secret,
        }
    }

    /// Creates a short link owned by `principal`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] for a malformed URL or slug,
    /// [`AppError::QuotaExceeded`] at the creation ceiling, and
    /// [`AppError::Conflict`] when a custom slug is already taken.
    pub async fn create(
        &self,
        principal: &Principal,
        req: CreateLink,
    ) -> Result<ShortLink, AppError> {
        self.quota.ensure_can_create(principal).await?;

        let normalized_url = normalize_url(&req.original_url).map_err(|e| {
            AppError::bad_request("Invalid URL format", json!({ "reason": e.to_string() }))
        })?;

        let password_hash = req
            .password
            .as_deref()
            .map(|pw| hash_password(&self.signing_secret, pw));

        let link = if let Some(slug) = req.custom_slug {
            validate_custom_slug(&slug)?;

            // The unique constraint settles simultaneous claims; the loser
            // surfaces Conflict to the caller.
            self.links
                .create(NewShortLink {
                    short_key: slug,
                    original_url: normalized_url,
                    owner: Some(principal.storage_key()),
                    password_hash,
                    custom_slug: true,
                    expires_at: req.expires_at,
                })
                .await?
        } else {
            self.create_with_generated_key(principal, normalized_url, password_hash, req.expires_at)
                .await?
        };

        metrics::counter!("link_creations_total").increment(1);
        Ok(link)
    }

    /// Resolves a short key to its destination, admitting and counting the
    /// click atomically.
    ///
    /// The snapshot read here drives policy; the admission predicate is
    /// re-evaluated inside the store's atomic increment, which is the source
    /// of truth under concurrency.
    pub async fn resolve(
        &self,
        key: &str,
        principal: Option<&Principal>,
        presented_password: Option<&str>,
        meta: RequestMeta,
    ) -> Result<ResolvedLink, AppError> {
        let now = Utc::now();

        let Some(link) = self.links.find_by_key(key).await? else {
            self.record_outcome("not_found");
            return Err(deny_error(DenyReason::NotFound, key));
        };

        let snapshot = AccessSnapshot::from(&link);
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
                let hash = link.password_hash.as_deref().unwrap_or_default();
                if !verify_password(&self.signing_secret, password, hash) {
                    self.record_outcome("invalid_password");
                    return Err(AppError::invalid_password(
                        "Invalid password",
                        json!({ "short_key": key }),
                    ));
                }
            }
            AccessDecision::Deny(reason) => {
                self.record_outcome(code_for(reason));
                return Err(deny_error(reason, key));
            }
        }

        match self.links.admit_click(key, now).await? {
            Admission::Admitted { new_count } => {
                self.record_outcome("allow");

                let event = AccessEvent::new(
                    ResourceKind::Link,
                    link.id,
                    link.short_key.clone(),
                    meta.ip,
                    meta.user_agent.as_deref(),
                );
                if self.events.try_send(event).is_err() {
                    debug!(key, "access log queue full, dropping click event");
                }

                Ok(ResolvedLink {
                    target_url: link.original_url,
                    click_count: new_count,
                })
            }
            Admission::Denied(reason) => {
                self.record_outcome(code_for(reason));
                Err(deny_error(reason, key))
            }
            Admission::NotFound => {
                self.record_outcome("not_found");
                Err(deny_error(DenyReason::NotFound, key))
            }
        }
    }

    /// Verifies a presented password against a link's stored hash.
    ///
    /// Never mutates counters; existence of the link is reported via 404,
    /// matching the policy ordering (a missing resource never reveals
    /// password state).
    pub async fn verify_link_password(&self, key: &str, password: &str) -> Result<bool, AppError> {
        let Some(link) = self.links.find_by_key(key).await? else {
            return Err(deny_error(DenyReason::NotFound, key));
        };

        Ok(link
            .password_hash
            .as_deref()
            .is_some_and(|hash| verify_password(&self.signing_secret, password, hash)))
    }

    /// Deletes a link owned by `principal`.
    ///
    /// Deleting a missing key yields `NotFound`; a second delete of the same
    /// key is therefore safe.
    pub async fn delete(&self, key: &str, principal: &Principal) -> Result<(), AppError> {
        match self.links.delete(key, principal).await? {
            DeleteOutcome::Deleted => Ok(()),
            DeleteOutcome::Forbidden => Err(AppError::unauthorized(
                "Only the owner can delete this link",
                json!({ "short_key": key }),
            )),
            DeleteOutcome::NotFound => Err(deny_error(DenyReason::NotFound, key)),
        }
    }

    /// Lists links owned by `principal`, newest first.
    pub async fn list_for(&self, principal: &Principal) -> Result<Vec<ShortLink>, AppError> {
        self.links.list_by_owner(&principal.storage_key()).await
    }

    /// Returns true when `slug` is not yet taken as a link key.
    pub async fn slug_available(&self, slug: &str) -> Result<bool, AppError> {
        Ok(self.links.find_by_key(slug).await?.is_none())
    }

    async fn create_with_generated_key(
        &self,
        principal: &Principal,
        original_url: String,
        password_hash: Option<String>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<ShortLink, AppError> {
        for _ in 0..MAX_KEY_ATTEMPTS {
            let result = self
                .links
                .create(NewShortLink {
                    short_key: generate_key(),
                    original_url: original_url.clone(),
                    owner: Some(principal.storage_key()),
                    password_hash: password_hash.clone(),
                    custom_slug: false,
                    expires_at,
                })
                .await;

            match result {
                Err(AppError::Conflict { .. }) => continue,
                other => return other,
            }
        }

        Err(AppError::internal(
            "Failed to generate unique short key",
            json!({ "reason": "Too many collisions" }),
        ))
    }

    fn record_outcome(&self, outcome: &'static str) {
        metrics::counter!("resolutions_total", "kind" => "link", "outcome" => outcome)
            .increment(1);
    }
}

fn code_for(reason: DenyReason) -> &'static str {
    match reason {
        DenyReason::NotFound => "not_found",
        DenyReason::Expired => "expired",
        DenyReason::LimitReached => "limit_reached",
        DenyReason::Unauthorized => "unauthorized",
        DenyReason::PasswordRequired => "password_required",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::{ConfigTierProvider, QuotaLimits};
    use crate::domain::repositories::{
        MockLinkRepository, MockShareRepository,
    };
    use crate::utils::password::hash_password;
    use chrono::Duration;

    const SECRET: &str = "test-signing-secret";

    fn guest() -> Principal {
        Principal::Guest("tester".to_string())
    }

    fn test_link(id: i64, key: &str) -> ShortLink {
        ShortLink {
            id,
            short_key: key.to_string(),
            original_url: "https://example.com/".to_string(),
            owner: Some(guest().storage_key()),
            password_hash: None,
            custom_slug: false,
            click_count: 0,
            expires_at: None,
            created_at: Utc::now(),
        }
    }

    fn quota_allowing() -> Arc<QuotaService> {
        let mut links = MockLinkRepository::new();
        links.expect_count_by_owner().returning(|_| Ok(0));
        let mut shares = MockShareRepository::new();
        shares.expect_count_by_owner().returning(|_| Ok(0));
        Arc::new(QuotaService::new(
            Arc::new(ConfigTierProvider),
            QuotaLimits::default(),
            Arc::new(links),
            Arc::new(shares),
        ))
    }

    fn service(
        repo: MockLinkRepository,
    ) -> (LinkService, mpsc::Receiver<AccessEvent>) {
        let (tx, rx) = mpsc::channel(16);
        let service = LinkService::new(Arc::new(repo), quota_allowing(), tx, SECRET.to_string());
        (service, rx)
    }

    #[tokio::test]
    async fn test_create_normalizes_url() {
        let mut repo = MockLinkRepository::new();
        repo.expect_create()
            .withf(|new_link| new_link.original_url == "https://example.com/path")
            .times(1)
            .returning(|new_link| {
                let mut link = test_link(1, &new_link.short_key);
                link.original_url = new_link.original_url;
                Ok(link)
            });

        let (service, _rx) = service(repo);
        let result = service
            .create(
                &guest(),
                CreateLink {
                    original_url: "HTTPS://EXAMPLE.COM:443/path".to_string(),
                    ..Default::default()
                },
            )
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_url() {
        let mut repo = MockLinkRepository::new();
        repo.expect_create().times(0);

        let (service, _rx) = service(repo);
        let err = service
            .create(
                &guest(),
                CreateLink {
                    original_url: "javascript:alert(1)".to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_create_retries_generated_key_on_conflict() {
        let mut repo = MockLinkRepository::new();
        let mut calls = 0;
        repo.expect_create().times(2).returning(move |new_link| {
            calls += 1;
            if calls == 1 {
                Err(AppError::conflict("dup", json!({})))
            } else {
                Ok(test_link(1, &new_link.short_key))
            }
        });

        let (service, _rx) = service(repo);
        let result = service
            .create(
                &guest(),
                CreateLink {
                    original_url: "https://example.com".to_string(),
                    ..Default::default()
                },
            )
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_create_custom_slug_conflict_not_retried() {
        let mut repo = MockLinkRepository::new();
        repo.expect_create()
            .times(1)
            .returning(|_| Err(AppError::conflict("dup", json!({}))));

        let (service, _rx) = service(repo);
        let err = service
            .create(
                &guest(),
                CreateLink {
                    original_url: "https://example.com".to_string(),
                    custom_slug: Some("my-slug".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_resolve_admits_and_emits_event() {
        let mut repo = MockLinkRepository::new();
        repo.expect_find_by_key()
            .returning(|key| Ok(Some(test_link(7, key))));
        repo.expect_admit_click()
            .times(1)
            .returning(|_, _| Ok(Admission::Admitted { new_count: 1 }));

        let (service, mut rx) = service(repo);
        let resolved = service
            .resolve(
                "abc1234",
                None,
                None,
                RequestMeta {
                    ip: Some("10.0.0.1".to_string()),
                    user_agent: Some("TestBot/1.0".to_string()),
                },
            )
            .await
            .unwrap();

        assert_eq!(resolved.target_url, "https://example.com/");
        assert_eq!(resolved.click_count, 1);

        let event = rx.try_recv().unwrap();
        assert_eq!(event.resource_id, 7);
        assert_eq!(event.kind, ResourceKind::Link);
        assert_eq!(event.ip, Some("10.0.0.1".to_string()));
    }

    #[tokio::test]
    async fn test_resolve_expired_never_mutates() {
        let mut repo = MockLinkRepository::new();
        repo.expect_find_by_key().returning(|key| {
            let mut link = test_link(1, key);
            link.expires_at = Some(Utc::now() - Duration::seconds(1));
            Ok(Some(link))
        });
        repo.expect_admit_click().times(0);

        let (service, mut rx) = service(repo);
        let err = service
            .resolve("old1234", None, None, RequestMeta::default())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Expired { .. }));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_resolve_password_flow() {
        let hash = hash_password(SECRET, "hunter2");
        let mut repo = MockLinkRepository::new();
        let hash_clone = hash.clone();
        repo.expect_find_by_key().returning(move |key| {
            let mut link = test_link(1, key);
            link.password_hash = Some(hash_clone.clone());
            Ok(Some(link))
        });
        repo.expect_admit_click()
            .times(1)
            .returning(|_, _| Ok(Admission::Admitted { new_count: 1 }));

        let (service, _rx) = service(repo);

        // no password presented
        let err = service
            .resolve("locked1", None, None, RequestMeta::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::PasswordRequired { .. }));

        // wrong password: denied before any admission attempt
        let err = service
            .resolve("locked1", None, Some("wrong"), RequestMeta::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidPassword { .. }));

        // correct password resolves and admits exactly once
        let resolved = service
            .resolve("locked1", None, Some("hunter2"), RequestMeta::default())
            .await
            .unwrap();
        assert_eq!(resolved.click_count, 1);
    }

    #[tokio::test]
    async fn test_resolve_admission_denial_wins_over_snapshot() {
        // Snapshot says allow, but the atomic admission observed expiry.
        let mut repo = MockLinkRepository::new();
        repo.expect_find_by_key()
            .returning(|key| Ok(Some(test_link(1, key))));
        repo.expect_admit_click()
            .times(1)
            .returning(|_, _| Ok(Admission::Denied(DenyReason::Expired)));

        let (service, _rx) = service(repo);
        let err = service
            .resolve("racing1", None, None, RequestMeta::default())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Expired { .. }));
    }

    #[tokio::test]
    async fn test_delete_maps_outcomes() {
        let mut repo = MockLinkRepository::new();
        repo.expect_delete()
            .returning(|_, _| Ok(DeleteOutcome::Forbidden));

        let (service, _rx) = service(repo);
        let err = service.delete("other12", &guest()).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized { .. }));
    }

    #[tokio::test]
    async fn test_verify_password_missing_key_is_not_found() {
        let mut repo = MockLinkRepository::new();
        repo.expect_find_by_key().returning(|_| Ok(None));

        let (service, _rx) = service(repo);
        let err = service
            .verify_link_password("ghost12", "pw")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }
}
