//! Identity resolution for requests: signed user/guest tokens.

use base64::Engine as _;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::domain::entities::Principal;

type HmacSha256 = Hmac<Sha256>;

/// Random bytes backing a freshly minted guest id.
const GUEST_ID_BYTES: usize = 9;

/// Resolves bearer tokens into principals and mints guest identities.
///
/// Token format: `u.<id>.<hex mac>` for users, `g.<id>.<hex mac>` for guests,
/// where the MAC is HMAC-SHA256 over `<kind>.<id>` keyed by the service
/// signing secret. The service never verifies user credentials; the external
/// auth system holding the same secret issues `u.…` tokens, while guest tokens
/// are minted here and persisted client-side as a long-lived identity.
pub struct IdentityService {
    signing_secret: String,
}

impl IdentityService {
    pub fn new(signing_secret: String) -> Self {
        Self { signing_secret }
    }

    fn sign(&self, payload: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(self.signing_secret.as_bytes())
            .expect("HMAC accepts any key length");
        mac.update(payload.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// Verifies a token signature and returns the principal it names.
    ///
    /// Returns `None` for malformed tokens or bad signatures; requests without
    /// a resolvable identity simply proceed as anonymous.
    pub fn verify(&self, token: &str) -> Option<Principal> {
        let mut parts = token.splitn(3, '.');
        let kind = parts.next()?;
        let id = parts.next()?;
        let signature = parts.next()?;

        let payload = format!("{kind}.{id}");
        let expected = hex::decode(signature).ok()?;

        let mut mac = HmacSha256::new_from_slice(self.signing_secret.as_bytes())
            .expect("HMAC accepts any key length");
        mac.update(payload.as_bytes());
        mac.verify_slice(&expected).ok()?;

        match kind {
            "u" => id.parse().ok().map(Principal::User),
            "g" if !id.is_empty() => Some(Principal::Guest(id.to_string())),
            _ => None,
        }
    }

    /// Mints a fresh guest principal and its long-lived token.
    pub fn mint_guest(&self) -> (Principal, String) {
        let mut buffer = [0u8; GUEST_ID_BYTES];
        getrandom::fill(&mut buffer).expect("system RNG");
        let id = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(buffer);

        let principal = Principal::Guest(id);
        let token = self.token_for(&principal);
        (principal, token)
    }

    /// Produces the signed token for a principal.
    pub fn token_for(&self, principal: &Principal) -> String {
        let payload = match principal {
            Principal::User(id) => format!("u.{id}"),
            Principal::Guest(id) => format!("g.{id}"),
        };
        let signature = self.sign(&payload);
        format!("{payload}.{signature}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> IdentityService {
        IdentityService::new("test-signing-secret".to_string())
    }

    #[test]
    fn test_guest_token_round_trip() {
        let svc = service();
        let (principal, token) = svc.mint_guest();

        assert!(matches!(principal, Principal::Guest(_)));
        assert_eq!(svc.verify(&token), Some(principal));
    }

    #[test]
    fn test_user_token_round_trip() {
        let svc = service();
        let principal = Principal::User(42);
        let token = svc.token_for(&principal);

        assert!(token.starts_with("u.42."));
        assert_eq!(svc.verify(&token), Some(principal));
    }

    #[test]
    fn test_tampered_token_rejected() {
        let svc = service();
        let token = svc.token_for(&Principal::User(42));

        // change the claimed id but keep the old signature
        let forged = token.replacen("u.42.", "u.43.", 1);
        assert_eq!(svc.verify(&forged), None);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let svc = service();
        let other = IdentityService::new("other-secret".to_string());
        let token = other.token_for(&Principal::Guest("abc".to_string()));

        assert_eq!(svc.verify(&token), None);
    }

    #[test]
    fn test_malformed_tokens_rejected() {
        let svc = service();
        assert_eq!(svc.verify(""), None);
        assert_eq!(svc.verify("u.42"), None);
        assert_eq!(svc.verify("x.42.deadbeef"), None);
        assert_eq!(svc.verify("u.42.not-hex"), None);
    }

    #[test]
    fn test_minted_guests_are_distinct() {
        let svc = service();
        let (a, _) = svc.mint_guest();
        let (b, _) = svc.mint_guest();
        assert_ne!(a, b);
    }
}
