//! Publication visibility.
//!
//! A post is *published* when it is flagged as published, its publication
//! date is not in the future, and it belongs to a category that is itself
//! published. Anyone may see published posts; authors always see their own
//! posts, and staff may open any post.
//!
//! The same rule is expressed as a SQL condition by the database query
//! builder; [`is_published`] is the in-memory form of it.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{Category, Post};

/// The identity on whose behalf a read is performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Viewer {
    Anonymous,
    Member { user_id: Uuid, is_staff: bool },
}

impl Viewer {
    pub fn member(user_id: Uuid) -> Self {
        Viewer::Member {
            user_id,
            is_staff: false,
        }
    }

    pub fn staff(user_id: Uuid) -> Self {
        Viewer::Member {
            user_id,
            is_staff: true,
        }
    }

    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            Viewer::Anonymous => None,
            Viewer::Member { user_id, .. } => Some(*user_id),
        }
    }

    pub fn is_staff(&self) -> bool {
        matches!(self, Viewer::Member { is_staff: true, .. })
    }

    /// True when the viewer is the given user.
    pub fn is(&self, user_id: Uuid) -> bool {
        self.user_id() == Some(user_id)
    }

    /// Authors and staff may open posts that are not published.
    pub fn bypasses_publication(&self, author_id: Uuid) -> bool {
        self.is(author_id) || self.is_staff()
    }
}

/// The public visibility predicate evaluated on a single post.
///
/// `category` must be the post's own category (or `None` when the post has
/// none); a mismatching category never makes a post visible.
pub fn is_published(post: &Post, category: Option<&Category>, now: DateTime<Utc>) -> bool {
    post.is_published
        && post.pub_date <= now
        && category
            .is_some_and(|category| post.category_id == Some(category.id) && category.is_published)
}

/// Which posts a query may return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostScope {
    /// Every post regardless of publication state.
    All,
    /// Only posts satisfying [`is_published`] at `now`.
    Published { now: DateTime<Utc> },
}

/// A composable post query: a scope narrowed by optional filters.
///
/// Results are ordered by publication date, newest first, ties broken by id
/// (descending).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostQuery {
    pub scope: PostScope,
    pub author_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
}

impl PostQuery {
    pub fn all() -> Self {
        Self {
            scope: PostScope::All,
            author_id: None,
            category_id: None,
        }
    }

    pub fn published(now: DateTime<Utc>) -> Self {
        Self {
            scope: PostScope::Published { now },
            ..Self::all()
        }
    }

    /// Profile feed: the profile owner sees everything they wrote, everyone
    /// else only the published part.
    pub fn for_profile(viewer: &Viewer, author_id: Uuid, now: DateTime<Utc>) -> Self {
        let base = if viewer.is(author_id) {
            Self::all()
        } else {
            Self::published(now)
        };
        base.by_author(author_id)
    }

    pub fn by_author(mut self, author_id: Uuid) -> Self {
        self.author_id = Some(author_id);
        self
    }

    pub fn in_category(mut self, category_id: Uuid) -> Self {
        self.category_id = Some(category_id);
        self
    }

    /// Whether a post (with its category) belongs to the query's result.
    pub fn matches(&self, post: &Post, category: Option<&Category>) -> bool {
        let in_scope = match self.scope {
            PostScope::All => true,
            PostScope::Published { now } => is_published(post, category, now),
        };
        in_scope
            && self.author_id.is_none_or(|id| post.author_id == id)
            && self.category_id.is_none_or(|id| post.category_id == Some(id))
    }
}
