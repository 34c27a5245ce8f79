//! Resource password hashing and constant-time verification.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Hashes a resource password with HMAC-SHA256 keyed by the server signing
/// secret.
///
/// An attacker with read-only access to the database cannot verify password
/// guesses without the server-side secret. Returns a 64-character lowercase
/// hex MAC.
pub fn hash_password(secret: &str, password: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(password.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Verifies a presented password against a stored hash in constant time.
pub fn verify_password(secret: &str, password: &str, stored_hash: &str) -> bool {
    let Ok(expected) = hex::decode(stored_hash) else {
        return false;
    };

    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(password.as_bytes());
    mac.verify_slice(&expected).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_deterministic() {
        let h1 = hash_password("secret", "hunter2");
        let h2 = hash_password("secret", "hunter2");
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 64);
    }

    #[test]
    fn test_verify_round_trip() {
        let hash = hash_password("secret", "hunter2");
        assert!(verify_password("secret", "hunter2", &hash));
        assert!(!verify_password("secret", "hunter3", &hash));
    }

    #[test]
    fn test_secret_matters() {
        let hash = hash_password("secret-a", "hunter2");
        assert!(!verify_password("secret-b", "hunter2", &hash));
    }

    #[test]
    fn test_verify_rejects_malformed_stored_hash() {
        assert!(!verify_password("secret", "hunter2", "not-hex"));
        assert!(!verify_password("secret", "hunter2", ""));
    }
}
