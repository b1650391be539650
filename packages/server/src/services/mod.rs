//! Domain operations behind the HTTP handlers.
//!
//! Every mutating operation takes the authenticated caller and checks its
//! role before validating input or touching a collaborator.

mod admin;
mod album;
mod event;
mod post;

pub use admin::AdminService;
pub use album::{ALBUM_ROOT, AlbumService};
pub use event::EventService;
pub use post::PostService;
