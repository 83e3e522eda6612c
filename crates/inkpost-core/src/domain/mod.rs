//! Domain entities - the core business objects.

mod category;
mod comment;
mod location;
mod post;
mod user;

pub mod visibility;

pub use category::Category;
pub use comment::{Comment, CommentDraft};
pub use location::Location;
pub use post::{Post, PostDraft, PostSummary, TITLE_MAX_LENGTH};
pub use user::{ProfileChanges, User, validate_email, validate_username};
pub use visibility::{PostQuery, PostScope, Viewer};
