//! Application services orchestrating the domain.

mod identity_service;
mod link_service;
mod quota_service;
mod share_service;

pub use identity_service::IdentityService;
pub use link_service::{CreateLink, LinkService, ResolvedLink};
pub use quota_service::{ConfigTierProvider, QuotaLimits, QuotaService, Tier, TierProvider};
pub use share_service::{CreateShare, ShareService};

use serde_json::json;

use crate::domain::policy::DenyReason;
use crate::error::AppError;

/// Client metadata attached to an admitted resolution's log entry.
#[derive(Debug, Clone, Default)]
pub struct RequestMeta {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

/// Maps a policy denial onto the application error taxonomy.
pub(crate) fn deny_error(reason: DenyReason, key: &str) -> AppError {
    let details = json!({ "short_key": key });
    match reason {
        DenyReason::NotFound => AppError::not_found("Resource not found", details),
        DenyReason::Expired => AppError::expired("Resource has expired", details),
        DenyReason::LimitReached => {
            AppError::limit_reached("Resource view limit reached", details)
        }
        DenyReason::Unauthorized => {
            AppError::unauthorized("You do not have access to this resource", details)
        }
        DenyReason::PasswordRequired => {
            AppError::password_required("This resource is password protected", details)
        }
    }
}
