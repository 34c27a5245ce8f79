//! DTOs for password verification endpoints.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request to verify a resource password.
#[derive(Debug, Deserialize, Validate)]
pub struct VerifyPasswordRequest {
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

/// Verification outcome. Reveals nothing beyond validity.
#[derive(Debug, Serialize)]
pub struct VerifyPasswordResponse {
    pub valid: bool,
}
