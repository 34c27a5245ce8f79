//! DTOs for the slug availability endpoint.

use serde::{Deserialize, Serialize};

/// Which key space to check a slug against.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SlugKind {
    #[default]
    Link,
    Share,
}

/// Query parameters for a slug availability check.
#[derive(Debug, Deserialize)]
pub struct SlugCheckParams {
    pub slug: String,
    #[serde(default)]
    pub kind: SlugKind,
}

/// Availability outcome.
#[derive(Debug, Serialize)]
pub struct SlugCheckResponse {
    pub available: bool,
}
