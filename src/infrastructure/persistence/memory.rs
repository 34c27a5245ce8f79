//! In-memory repository adapters.
//!
//! Used by integration tests to drive the full HTTP stack without a database.
//! A single `tokio::sync::Mutex` around each store serializes admissions,
//! which satisfies the per-key linearizability contract of the repository
//! traits: every admission sees all previously committed increments.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::Mutex;

use crate::domain::entities::{
    NewClick, NewShortLink, NewTextShare, NewView, Principal, ShortLink, TextShare,
};
use crate::domain::policy::DenyReason;
use crate::domain::repositories::{
    Admission, DeleteOutcome, LinkRepository, ShareRepository,
};
use crate::error::AppError;
use serde_json::json;

#[derive(Default)]
struct LinkStore {
    next_id: i64,
    links: HashMap<String, ShortLink>,
    clicks: Vec<NewClick>,
}

/// In-memory [`LinkRepository`].
#[derive(Default)]
pub struct InMemoryLinkRepository {
    store: Mutex<LinkStore>,
}

impl InMemoryLinkRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of click log entries appended for a link (test observability).
    pub async fn click_log_len(&self, link_id: i64) -> usize {
        let store = self.store.lock().await;
        store.clicks.iter().filter(|c| c.link_id == link_id).count()
    }
}

#[async_trait]
impl LinkRepository for InMemoryLinkRepository {
    async fn create(&self, new_link: NewShortLink) -> Result<ShortLink, AppError> {
        let mut store = self.store.lock().await;

        if store.links.contains_key(&new_link.short_key) {
            return Err(AppError::conflict(
                "Short key already exists",
                json!({ "short_key": new_link.short_key }),
            ));
        }

        store.next_id += 1;
        let link = ShortLink {
            id: store.next_id,
            short_key: new_link.short_key.clone(),
            original_url: new_link.original_url,
            owner: new_link.owner,
            password_hash: new_link.password_hash,
            custom_slug: new_link.custom_slug,
            click_count: 0,
            expires_at: new_link.expires_at,
            created_at: Utc::now(),
        };
        store.links.insert(new_link.short_key, link.clone());

        Ok(link)
    }

    async fn find_by_key(&self, key: &str) -> Result<Option<ShortLink>, AppError> {
        let store = self.store.lock().await;
        Ok(store.links.get(key).cloned())
    }

    async fn admit_click(&self, key: &str, now: DateTime<Utc>) -> Result<Admission, AppError> {
        let mut store = self.store.lock().await;

        let Some(link) = store.links.get_mut(key) else {
            return Ok(Admission::NotFound);
        };

        if link.is_expired(now) {
            return Ok(Admission::Denied(DenyReason::Expired));
        }

        link.click_count += 1;
        Ok(Admission::Admitted {
            new_count: link.click_count,
        })
    }

    async fn append_click(&self, click: NewClick) -> Result<(), AppError> {
        let mut store = self.store.lock().await;
        store.clicks.push(click);
        Ok(())
    }

    async fn delete(&self, key: &str, requester: &Principal) -> Result<DeleteOutcome, AppError> {
        let mut store = self.store.lock().await;

        let owned = match store.links.get(key) {
            None => return Ok(DeleteOutcome::NotFound),
            Some(link) => requester.owns(link.owner.as_deref()),
        };

        if !owned {
            return Ok(DeleteOutcome::Forbidden);
        }

        store.links.remove(key);
        Ok(DeleteOutcome::Deleted)
    }

    async fn list_by_owner(&self, owner: &str) -> Result<Vec<ShortLink>, AppError> {
        let store = self.store.lock().await;
        let mut links: Vec<_> = store
            .links
            .values()
            .filter(|l| l.owner.as_deref() == Some(owner))
            .cloned()
            .collect();
        links.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(links)
    }

    async fn count_by_owner(&self, owner: &str) -> Result<i64, AppError> {
        let store = self.store.lock().await;
        Ok(store
            .links
            .values()
            .filter(|l| l.owner.as_deref() == Some(owner))
            .count() as i64)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let mut store = self.store.lock().await;
        let before = store.links.len();
        store.links.retain(|_, l| !l.is_expired(now));
        Ok((before - store.links.len()) as u64)
    }
}

#[derive(Default)]
struct ShareStore {
    next_id: i64,
    shares: HashMap<String, TextShare>,
    views: Vec<NewView>,
}

/// In-memory [`ShareRepository`].
#[derive(Default)]
pub struct InMemoryShareRepository {
    store: Mutex<ShareStore>,
}

impl InMemoryShareRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of view log entries appended for a share (test observability).
    pub async fn view_log_len(&self, share_id: i64) -> usize {
        let store = self.store.lock().await;
        store.views.iter().filter(|v| v.share_id == share_id).count()
    }
}

#[async_trait]
impl ShareRepository for InMemoryShareRepository {
    async fn create(&self, new_share: NewTextShare) -> Result<TextShare, AppError> {
        let mut store = self.store.lock().await;

        if store.shares.contains_key(&new_share.short_key) {
            return Err(AppError::conflict(
                "Short key already exists",
                json!({ "short_key": new_share.short_key }),
            ));
        }

        store.next_id += 1;
        let share = TextShare {
            id: store.next_id,
            short_key: new_share.short_key.clone(),
            title: new_share.title,
            content: new_share.content,
            format: new_share.format,
            syntax_language: new_share.syntax_language,
            password_hash: new_share.password_hash,
            is_public: new_share.is_public,
            owner: new_share.owner,
            view_count: 0,
            view_limit: new_share.view_limit,
            expires_at: new_share.expires_at,
            created_at: Utc::now(),
        };
        store.shares.insert(new_share.short_key, share.clone());

        Ok(share)
    }

    async fn find_by_key(&self, key: &str) -> Result<Option<TextShare>, AppError> {
        let store = self.store.lock().await;
        Ok(store.shares.get(key).cloned())
    }

    async fn admit_view(&self, key: &str, now: DateTime<Utc>) -> Result<Admission, AppError> {
        let mut store = self.store.lock().await;

        let Some(share) = store.shares.get_mut(key) else {
            return Ok(Admission::NotFound);
        };

        if share.is_expired(now) {
            return Ok(Admission::Denied(DenyReason::Expired));
        }

        if share.limit_reached() {
            return Ok(Admission::Denied(DenyReason::LimitReached));
        }

        share.view_count += 1;
        Ok(Admission::Admitted {
            new_count: share.view_count,
        })
    }

    async fn append_view(&self, view: NewView) -> Result<(), AppError> {
        let mut store = self.store.lock().await;
        store.views.push(view);
        Ok(())
    }

    async fn delete(&self, key: &str, requester: &Principal) -> Result<DeleteOutcome, AppError> {
        let mut store = self.store.lock().await;

        let owned = match store.shares.get(key) {
            None => return Ok(DeleteOutcome::NotFound),
            Some(share) => requester.owns(share.owner.as_deref()),
        };

        if !owned {
            return Ok(DeleteOutcome::Forbidden);
        }

        store.shares.remove(key);
        Ok(DeleteOutcome::Deleted)
    }

    async fn list_by_owner(&self, owner: &str) -> Result<Vec<TextShare>, AppError> {
        let store = self.store.lock().await;
        let mut shares: Vec<_> = store
            .shares
            .values()
            .filter(|s| s.owner.as_deref() == Some(owner))
            .cloned()
            .collect();
        shares.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(shares)
    }

    async fn count_by_owner(&self, owner: &str) -> Result<i64, AppError> {
        let store = self.store.lock().await;
        Ok(store
            .shares
            .values()
            .filter(|s| s.owner.as_deref() == Some(owner))
            .count() as i64)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let mut store = self.store.lock().await;
        let before = store.shares.len();
        store.shares.retain(|_, s| !s.is_expired(now));
        Ok((before - store.shares.len()) as u64)
    }
}
