//! DTOs for text share endpoints.

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use std::sync::LazyLock;
use validator::Validate;

use crate::domain::entities::{ShareFormat, TextShare};

static SLUG_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").unwrap());

fn default_true() -> bool {
    true
}

fn default_format() -> ShareFormat {
    ShareFormat::Plain
}

/// Request to create a text share.
///
/// Content size is bounded in bytes by the service (100 KiB); the length
/// bound here only rejects grossly oversized payloads early.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateShareRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,

    #[validate(length(min = 1))]
    pub content: String,

    #[serde(default = "default_format")]
    pub format: ShareFormat,

    #[validate(length(max = 40))]
    pub syntax_language: Option<String>,

    #[validate(length(min = 1, max = 50))]
    #[validate(regex(path = "*SLUG_REGEX"))]
    pub custom_slug: Option<String>,

    #[serde(default = "default_true")]
    pub is_public: bool,

    #[validate(range(min = 1))]
    pub view_limit: Option<i64>,

    pub expires_at: Option<DateTime<Utc>>,

    #[validate(length(min = 4, max = 128))]
    pub password: Option<String>,
}

/// Response for a created text share.
#[skip_serializing_none]
#[derive(Debug, Serialize)]
pub struct CreateShareResponse {
    pub short_key: String,
    pub share_url: String,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Resolved share payload returned to viewers.
///
/// Statically omits the password hash and owner key; there is no field to
/// leak.
#[skip_serializing_none]
#[derive(Debug, Serialize)]
pub struct ShareContentResponse {
    pub short_key: String,
    pub title: String,
    pub content: String,
    pub format: ShareFormat,
    pub syntax_language: Option<String>,
    pub view_count: i64,
    pub view_limit: Option<i64>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl ShareContentResponse {
    pub fn from_entity(share: &TextShare) -> Self {
        Self {
            short_key: share.short_key.clone(),
            title: share.title.clone(),
            content: share.content.clone(),
            format: share.format,
            syntax_language: share.syntax_language.clone(),
            view_count: share.view_count,
            view_limit: share.view_limit,
            expires_at: share.expires_at,
            created_at: share.created_at,
        }
    }
}

/// Owner-facing summary of a share (no content body, no password hash).
#[skip_serializing_none]
#[derive(Debug, Serialize)]
pub struct ShareSummary {
    pub short_key: String,
    pub share_url: String,
    pub title: String,
    pub format: ShareFormat,
    pub is_public: bool,
    pub has_password: bool,
    pub view_count: i64,
    pub view_limit: Option<i64>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl ShareSummary {
    pub fn from_entity(share: &TextShare, share_url: String) -> Self {
        Self {
            short_key: share.short_key.clone(),
            share_url,
            title: share.title.clone(),
            format: share.format,
            is_public: share.is_public,
            has_password: share.has_password(),
            view_count: share.view_count,
            view_limit: share.view_limit,
            expires_at: share.expires_at,
            created_at: share.created_at,
        }
    }
}
