//! TextShare entity representing a short-key-to-text-payload mapping.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum accepted content size in bytes (100 KiB).
pub const MAX_CONTENT_BYTES: usize = 100 * 1024;

/// Rendering format of a text share.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum ShareFormat {
    Plain,
    Markdown,
    Code,
}

/// A shared text payload with visibility, expiry, view-limit and password
/// constraints plus view accounting.
///
/// `view_count` is monotonic; when `view_limit` is set, the increment is the
/// unit of admission and the store enforces `view_count < view_limit`
/// atomically.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TextShare {
    pub id: i64,
    pub short_key: String,
    pub title: String,
    pub content: String,
    pub format: ShareFormat,
    pub syntax_language: Option<String>,
    pub password_hash: Option<String>,
    pub is_public: bool,
    /// Principal storage key of the creator (`u:<id>` / `g:<id>`), if any.
    pub owner: Option<String>,
    pub view_count: i64,
    pub view_limit: Option<i64>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl TextShare {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|e| now >= e)
    }

    /// Returns true once the view limit has been consumed.
    pub fn limit_reached(&self) -> bool {
        self.view_limit.is_some_and(|limit| self.view_count >= limit)
    }

    pub fn has_password(&self) -> bool {
        self.password_hash.is_some()
    }
}

/// Input data for creating a new text share.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTextShare {
    pub short_key: String,
    pub title: String,
    pub content: String,
    pub format: ShareFormat,
    pub syntax_language: Option<String>,
    pub password_hash: Option<String>,
    pub is_public: bool,
    pub owner: Option<String>,
    pub view_limit: Option<i64>,
    pub expires_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn share(view_count: i64, view_limit: Option<i64>) -> TextShare {
        TextShare {
            id: 1,
            short_key: "xyz9876".to_string(),
            title: "notes".to_string(),
            content: "hello".to_string(),
            format: ShareFormat::Plain,
            syntax_language: None,
            password_hash: None,
            is_public: true,
            owner: None,
            view_count,
            view_limit,
            expires_at: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_limit_reached() {
        assert!(!share(0, None).limit_reached());
        assert!(!share(1_000_000, None).limit_reached());
        assert!(!share(4, Some(5)).limit_reached());
        assert!(share(5, Some(5)).limit_reached());
        assert!(share(6, Some(5)).limit_reached());
    }

    #[test]
    fn test_is_expired() {
        let now = Utc::now();
        let mut s = share(0, None);
        assert!(!s.is_expired(now));
        s.expires_at = Some(now - Duration::seconds(1));
        assert!(s.is_expired(now));
    }

    #[test]
    fn test_format_serde_names() {
        assert_eq!(
            serde_json::to_string(&ShareFormat::Markdown).unwrap(),
            "\"markdown\""
        );
        let parsed: ShareFormat = serde_json::from_str("\"code\"").unwrap();
        assert_eq!(parsed, ShareFormat::Code);
    }
}
