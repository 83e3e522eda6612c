//! Services - the blog's use cases on top of the repository ports.
//!
//! Reads apply the publication-visibility rules; writes apply authorship
//! rules. A write the actor is not entitled to is not an error: it resolves
//! to [`Authorized::Denied`] and nothing is changed.

mod comments;
mod posts;
mod profiles;

use std::sync::Arc;

use crate::ports::{
    CategoryRepository, CommentRepository, LocationRepository, PostRepository, UserRepository,
};

pub use comments::CommentService;
pub use posts::{PostDetail, PostFormChoices, PostService};
pub use profiles::{Profile, ProfileService};

/// Result of an ownership-guarded operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authorized<T> {
    Granted(T),
    /// The actor may not perform the operation; nothing was changed.
    Denied,
}

impl<T> Authorized<T> {
    pub fn is_denied(&self) -> bool {
        matches!(self, Authorized::Denied)
    }
}

/// The full set of repositories the services work against.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub categories: Arc<dyn CategoryRepository>,
    pub locations: Arc<dyn LocationRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub comments: Arc<dyn CommentRepository>,
}
