//! Per-principal creation quotas.

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

use crate::domain::entities::Principal;
use crate::domain::repositories::{LinkRepository, ShareRepository};
use crate::error::AppError;

/// Subscription class bounding creation quotas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Guest,
    Free,
    Premium,
}

/// Resolves the tier for a principal.
///
/// Real subscription lookup lives outside this service; the default provider
/// maps guests to the guest tier and all users to the free tier.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TierProvider: Send + Sync {
    async fn tier_for(&self, principal: &Principal) -> Tier;
}

/// Config-backed tier provider.
pub struct ConfigTierProvider;

#[async_trait]
impl TierProvider for ConfigTierProvider {
    async fn tier_for(&self, principal: &Principal) -> Tier {
        match principal {
            Principal::Guest(_) => Tier::Guest,
            Principal::User(_) => Tier::Free,
        }
    }
}

/// Creation ceilings per tier; `-1` means unlimited.
#[derive(Debug, Clone)]
pub struct QuotaLimits {
    pub guest: i64,
    pub free: i64,
    pub premium: i64,
}

impl Default for QuotaLimits {
    fn default() -> Self {
        Self {
            guest: 10,
            free: -1,
            premium: -1,
        }
    }
}

impl QuotaLimits {
    fn ceiling(&self, tier: Tier) -> i64 {
        match tier {
            Tier::Guest => self.guest,
            Tier::Free => self.free,
            Tier::Premium => self.premium,
        }
    }
}

/// Checks creation quotas before a resource is created.
///
/// The check is advisory: it is not atomic with the creation itself, so two
/// simultaneous creations racing at the ceiling may admit one extra resource.
/// That is an accepted relaxation of a soft business limit, not a correctness
/// counter.
pub struct QuotaService {
    tier_provider: Arc<dyn TierProvider>,
    limits: QuotaLimits,
    links: Arc<dyn LinkRepository>,
    shares: Arc<dyn ShareRepository>,
}

impl QuotaService {
    pub fn new(
        tier_provider: Arc<dyn TierProvider>,
        limits: QuotaLimits,
        links: Arc<dyn LinkRepository>,
        shares: Arc<dyn ShareRepository>,
    ) -> Self {
        Self {
            tier_provider,
            limits,
            links,
            shares,
        }
    }

    /// Returns an error if the principal is at or over its creation ceiling.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::QuotaExceeded`] with current usage and limit.
    pub async fn ensure_can_create(&self, principal: &Principal) -> Result<(), AppError> {
        let tier = self.tier_provider.tier_for(principal).await;
        let limit = self.limits.ceiling(tier);

        if limit < 0 {
            return Ok(());
        }

        let owner = principal.storage_key();
        let current =
            self.links.count_by_owner(&owner).await? + self.shares.count_by_owner(&owner).await?;

        if current >= limit {
            return Err(AppError::quota_exceeded(
                "Creation quota exhausted",
                json!({ "current": current, "limit": limit }),
            ));
        }

        Ok(())
    }
}
