//! ShortLink entity representing a short-key-to-URL mapping.

use chrono::{DateTime, Utc};

/// A shortened URL with access constraints and click accounting.
///
/// `click_count` is monotonically non-decreasing and only ever changes through
/// the store's atomic admit-and-increment operation.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ShortLink {
    pub id: i64,
    pub short_key: String,
    pub original_url: String,
    /// Principal storage key of the creator (`u:<id>` / `g:<id>`), if any.
    pub owner: Option<String>,
    pub password_hash: Option<String>,
    pub custom_slug: bool,
    pub click_count: i64,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl ShortLink {
    /// Returns true if the link has passed its expiry time at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|e| now >= e)
    }

    pub fn has_password(&self) -> bool {
        self.password_hash.is_some()
    }
}

/// Input data for creating a new short link.
#[derive(Debug, Clone, PartialEq)]
pub struct NewShortLink {
    pub short_key: String,
    pub original_url: String,
    pub owner: Option<String>,
    pub password_hash: Option<String>,
    pub custom_slug: bool,
    pub expires_at: Option<DateTime<Utc>>,
}
