//! HTTP handlers for all endpoints.

pub mod health;
pub mod links;
pub mod redirect;
pub mod shares;
pub mod slug;

pub use health::health_handler;
pub use links::{
    create_link_handler, delete_link_handler, list_links_handler, verify_link_password_handler,
};
pub use redirect::redirect_handler;
pub use shares::{
    create_share_handler, delete_share_handler, list_shares_handler, verify_share_password_handler,
    view_share_handler,
};
pub use slug::slug_check_handler;
