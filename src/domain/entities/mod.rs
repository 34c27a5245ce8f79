//! Core business entities.

mod access_log;
mod principal;
mod short_link;
mod text_share;

pub use access_log::{NewClick, NewView};
pub use principal::Principal;
pub use short_link::{NewShortLink, ShortLink};
pub use text_share::{MAX_CONTENT_BYTES, NewTextShare, ShareFormat, TextShare};
