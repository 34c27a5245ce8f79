//! DTOs for short link endpoints.

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use std::sync::LazyLock;
use validator::Validate;

use crate::domain::entities::ShortLink;

/// Compiled pattern for user-chosen slugs.
static SLUG_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").unwrap());

/// Request to create a short link.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateLinkRequest {
    /// The destination URL (must be absolute HTTP/HTTPS).
    #[validate(url(message = "Invalid URL format"))]
    pub url: String,

    /// Optional custom slug used as the short key.
    #[validate(length(min = 1, max = 50))]
    #[validate(regex(path = "*SLUG_REGEX"))]
    pub custom_slug: Option<String>,

    /// Optional expiry instant. After this time, resolution returns 410 Gone.
    pub expires_at: Option<DateTime<Utc>>,

    /// Optional access password.
    #[validate(length(min = 4, max = 128))]
    pub password: Option<String>,
}

/// Response for a created short link.
#[skip_serializing_none]
#[derive(Debug, Serialize)]
pub struct CreateLinkResponse {
    pub short_key: String,
    pub short_url: String,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Owner-facing summary of a link. Never carries the password hash.
#[skip_serializing_none]
#[derive(Debug, Serialize)]
pub struct LinkSummary {
    pub short_key: String,
    pub short_url: String,
    pub original_url: String,
    pub click_count: i64,
    pub has_password: bool,
    pub custom_slug: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl LinkSummary {
    pub fn from_entity(link: &ShortLink, short_url: String) -> Self {
        Self {
            short_key: link.short_key.clone(),
            short_url,
            original_url: link.original_url.clone(),
            click_count: link.click_count,
            has_password: link.has_password(),
            custom_slug: link.custom_slug,
            expires_at: link.expires_at,
            created_at: link.created_at,
        }
    }
}
