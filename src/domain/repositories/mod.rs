//! Repository traits abstracting resource storage.

mod link_repository;
mod share_repository;

pub use link_repository::LinkRepository;
pub use share_repository::ShareRepository;

#[cfg(test)]
pub use link_repository::MockLinkRepository;
#[cfg(test)]
pub use share_repository::MockShareRepository;

use crate::domain::policy::DenyReason;

/// Outcome of the atomic admit-and-increment operation.
///
/// `Admitted` means the counter was incremented as part of the same
/// indivisible store operation that re-evaluated the admission predicate.
/// Concurrent callers on one key are linearized by the store: each sees all
/// previously committed increments before its own predicate runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Admitted { new_count: i64 },
    Denied(DenyReason),
    NotFound,
}

/// Outcome of an owner-scoped delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    Forbidden,
    NotFound,
}
