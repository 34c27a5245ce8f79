//! Repository trait for short link data access.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{Admission, DeleteOutcome};
use crate::domain::entities::{NewClick, NewShortLink, Principal, ShortLink};
use crate::error::AppError;

/// Repository interface for short links and their click log.
///
/// All mutations are durable before the call returns; only log appends are
/// allowed to be best-effort (they run on the background worker).
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgLinkRepository`] - PostgreSQL
/// - [`crate::infrastructure::persistence::InMemoryLinkRepository`] - tests
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinkRepository: Send + Sync {
    /// Creates a new short link.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if the short key is already taken.
    /// Returns [`AppError::Internal`] / [`AppError::Unavailable`] on store errors.
    async fn create(&self, new_link: NewShortLink) -> Result<ShortLink, AppError>;

    /// Finds a link by its short key.
    async fn find_by_key(&self, key: &str) -> Result<Option<ShortLink>, AppError>;

    /// Atomically admits one click and increments the counter.
    ///
    /// The admission predicate (not expired at `now`) is evaluated inside the
    /// same indivisible operation as the increment. The snapshot a caller read
    /// earlier is advisory only; this call is the source of truth.
    async fn admit_click(&self, key: &str, now: DateTime<Utc>) -> Result<Admission, AppError>;

    /// Appends a click log entry. One entry per admitted resolution.
    async fn append_click(&self, click: NewClick) -> Result<(), AppError>;

    /// Deletes a link if `requester` owns it.
    ///
    /// A missing key yields `NotFound` rather than an error, so deletion is
    /// idempotent from the caller's perspective.
    async fn delete(&self, key: &str, requester: &Principal) -> Result<DeleteOutcome, AppError>;

    /// Lists links owned by the given principal storage key, newest first.
    async fn list_by_owner(&self, owner: &str) -> Result<Vec<ShortLink>, AppError>;

    /// Counts links owned by the given principal storage key.
    async fn count_by_owner(&self, owner: &str) -> Result<i64, AppError>;

    /// Removes links whose expiry has passed. Returns the number purged.
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, AppError>;
}
