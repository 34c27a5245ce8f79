//! Short key generation and custom slug validation.

use rand::Rng;
use serde_json::json;
use std::sync::LazyLock;

use crate::error::AppError;

/// Alphabet for generated keys: 62 alphanumeric symbols.
const KEY_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Length of generated short keys.
pub const KEY_LENGTH: usize = 7;

/// Maximum length of a user-chosen slug.
pub const MAX_SLUG_LENGTH: usize = 50;

/// Reserved slugs that collide with routing or system endpoints.
const RESERVED_SLUGS: &[&str] = &["api", "health", "t", "static", "metrics"];

static SLUG_PATTERN: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"^[A-Za-z0-9_-]+$").expect("valid slug pattern"));

/// Generates a random short key drawn uniformly from the 62-symbol alphabet.
///
/// Collisions are handled by the store's uniqueness constraint at create time;
/// callers retry on `Conflict`.
pub fn generate_key() -> String {
    let mut rng = rand::rng();

    (0..KEY_LENGTH)
        .map(|_| {
            let idx = rng.random_range(0..KEY_ALPHABET.len());
            KEY_ALPHABET[idx] as char
        })
        .collect()
}

/// Validates a user-chosen custom slug.
///
/// # Rules
///
/// - 1 to 50 characters
/// - Allowed characters: letters, digits, underscore, hyphen
/// - Cannot shadow a reserved system path
///
/// Availability is not checked here; the store's uniqueness constraint is the
/// arbiter, and the loser of a simultaneous claim receives `Conflict`.
pub fn validate_custom_slug(slug: &str) -> Result<(), AppError> {
    if slug.is_empty() || slug.len() > MAX_SLUG_LENGTH {
        return Err(AppError::bad_request(
            "Custom slug must be 1-50 characters",
            json!({ "provided_length": slug.len() }),
        ));
    }

    if !SLUG_PATTERN.is_match(slug) {
        return Err(AppError::bad_request(
            "Custom slug can only contain letters, digits, underscores, and hyphens",
            json!({ "slug": slug }),
        ));
    }

    if RESERVED_SLUGS.contains(&slug.to_ascii_lowercase().as_str()) {
        return Err(AppError::bad_request(
            "This slug is reserved",
            json!({ "slug": slug }),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generate_key_length() {
        assert_eq!(generate_key().len(), KEY_LENGTH);
    }

    #[test]
    fn test_generate_key_alphabet() {
        for _ in 0..100 {
            let key = generate_key();
            assert!(key.chars().all(|c| c.is_ascii_alphanumeric()), "{key}");
        }
    }

    #[test]
    fn test_generate_key_uniqueness() {
        let mut keys = HashSet::new();
        for _ in 0..1000 {
            keys.insert(generate_key());
        }
        // 62^7 keyspace; 1000 draws colliding would indicate broken sampling
        assert!(keys.len() >= 999);
    }

    #[test]
    fn test_validate_slug_accepts_allowed_charset() {
        assert!(validate_custom_slug("My-Slug_01").is_ok());
        assert!(validate_custom_slug("a").is_ok());
        assert!(validate_custom_slug(&"x".repeat(50)).is_ok());
    }

    #[test]
    fn test_validate_slug_rejects_length() {
        assert!(validate_custom_slug("").is_err());
        assert!(validate_custom_slug(&"x".repeat(51)).is_err());
    }

    #[test]
    fn test_validate_slug_rejects_charset() {
        assert!(validate_custom_slug("has space").is_err());
        assert!(validate_custom_slug("emoji😀").is_err());
        assert!(validate_custom_slug("slash/").is_err());
        assert!(validate_custom_slug("dot.dot").is_err());
    }

    #[test]
    fn test_validate_slug_rejects_reserved() {
        for &reserved in RESERVED_SLUGS {
            assert!(
                validate_custom_slug(reserved).is_err(),
                "reserved slug '{reserved}' should be invalid"
            );
        }
        // case-insensitive
        assert!(validate_custom_slug("API").is_err());
    }
}
