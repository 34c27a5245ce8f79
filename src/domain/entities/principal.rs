//! Acting principal for ownership and quota checks.

use serde::{Deserialize, Serialize};

/// The identity a request acts as: an authenticated user or an anonymous
/// guest with a stable, token-persisted id.
///
/// The core never verifies credentials; it only consumes principals produced
/// by the identity middleware.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Principal {
    User(i64),
    Guest(String),
}

impl Principal {
    /// Canonical storage key, used as the `owner` column value and for
    /// ownership comparison.
    pub fn storage_key(&self) -> String {
        match self {
            Principal::User(id) => format!("u:{id}"),
            Principal::Guest(id) => format!("g:{id}"),
        }
    }

    /// Parses a storage key back into a principal.
    pub fn from_storage_key(key: &str) -> Option<Self> {
        let (kind, id) = key.split_once(':')?;
        match kind {
            "u" => id.parse().ok().map(Principal::User),
            "g" if !id.is_empty() => Some(Principal::Guest(id.to_string())),
            _ => None,
        }
    }

    /// Returns true when this principal owns a resource with the given
    /// (nullable) owner key.
    pub fn owns(&self, owner: Option<&str>) -> bool {
        owner.is_some_and(|o| o == self.storage_key())
    }
}

impl std::fmt::Display for Principal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.storage_key())
    }
}
