//! Storage adapters implementing the domain repository traits.

mod memory;
mod pg_link_repository;
mod pg_share_repository;

pub use memory::{InMemoryLinkRepository, InMemoryShareRepository};
pub use pg_link_repository::PgLinkRepository;
pub use pg_share_repository::PgShareRepository;
