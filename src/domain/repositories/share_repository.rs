//! Repository trait for text share data access.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{Admission, DeleteOutcome};
use crate::domain::entities::{NewTextShare, NewView, Principal, TextShare};
use crate::error::AppError;

/// Repository interface for text shares and their view log.
///
/// The view-limit boundary is enforced by [`Self::admit_view`]: two concurrent
/// callers racing at `view_count == view_limit - 1` must not both be admitted.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ShareRepository: Send + Sync {
    /// Creates a new text share.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if the short key is already taken.
    async fn create(&self, new_share: NewTextShare) -> Result<TextShare, AppError>;

    /// Finds a share by its short key.
    async fn find_by_key(&self, key: &str) -> Result<Option<TextShare>, AppError>;

    /// Atomically admits one view and increments the counter.
    ///
    /// The admission predicate (not expired at `now`, and under the view
    /// limit if one is set) runs inside the same indivisible operation as the
    /// increment; the increment is the unit of admission.
    async fn admit_view(&self, key: &str, now: DateTime<Utc>) -> Result<Admission, AppError>;

    /// Appends a view log entry. One entry per admitted resolution.
    async fn append_view(&self, view: NewView) -> Result<(), AppError>;

    /// Deletes a share if `requester` owns it.
    async fn delete(&self, key: &str, requester: &Principal) -> Result<DeleteOutcome, AppError>;

    /// Lists shares owned by the given principal storage key, newest first.
    async fn list_by_owner(&self, owner: &str) -> Result<Vec<TextShare>, AppError>;

    /// Counts shares owned by the given principal storage key.
    async fn count_by_owner(&self, owner: &str) -> Result<i64, AppError>;

    /// Removes shares whose expiry has passed. Returns the number purged.
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, AppError>;
}
