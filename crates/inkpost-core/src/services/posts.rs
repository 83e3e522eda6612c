use chrono::Utc;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::{Authorized, Repositories};
use crate::domain::visibility::is_published;
use crate::domain::{
    Category, Comment, Location, Post, PostDraft, PostQuery, PostSummary, User, Viewer,
};
use crate::error::{DomainError, FieldErrors};
use crate::pagination::{Page, PageRequest};

const INVALID_CHOICE: &str = "Select a valid choice. That choice is not one of the available choices.";

/// Everything shown on a post's page.
#[derive(Debug, Clone)]
pub struct PostDetail {
    pub post: Post,
    pub author: User,
    pub category: Option<Category>,
    /// Present only when the location itself is published.
    pub location: Option<Location>,
    /// Newest first.
    pub comments: Vec<Comment>,
    /// Whether new comments are accepted, i.e. the post is publicly visible.
    pub comments_open: bool,
}

/// Selectable values for the post form.
#[derive(Debug, Clone)]
pub struct PostFormChoices {
    pub categories: Vec<Category>,
    pub locations: Vec<Location>,
}

#[derive(Clone)]
pub struct PostService {
    repos: Repositories,
}

impl PostService {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    /// Home feed: every published post.
    pub async fn home_feed(&self, page: PageRequest) -> Result<Page<PostSummary>, DomainError> {
        let query = PostQuery::published(Utc::now());
        Ok(self.repos.posts.find_page(&query, page).await?)
    }

    /// Published posts of a published category. Unknown and hidden
    /// categories are both not found.
    pub async fn category_feed(
        &self,
        slug: &str,
        page: PageRequest,
    ) -> Result<(Category, Page<PostSummary>), DomainError> {
        let category = self
            .repos
            .categories
            .find_by_slug(slug)
            .await?
            .filter(|category| category.is_published)
            .ok_or_else(|| DomainError::not_found_by("category", slug))?;

        let query = PostQuery::published(Utc::now()).in_category(category.id);
        let posts = self.repos.posts.find_page(&query, page).await?;
        Ok((category, posts))
    }

    /// A post's page. Hidden posts are reported exactly like missing ones
    /// unless the viewer is the author or staff.
    #[instrument(skip(self))]
    pub async fn detail(&self, post_id: Uuid, viewer: &Viewer) -> Result<PostDetail, DomainError> {
        let not_found = || DomainError::not_found("post", post_id);

        let post = self.repos.posts.find_by_id(post_id).await?.ok_or_else(not_found)?;
        let category = match post.category_id {
            Some(id) => self.repos.categories.find_by_id(id).await?,
            None => None,
        };

        let comments_open = is_published(&post, category.as_ref(), Utc::now());
        if !comments_open && !viewer.bypasses_publication(post.author_id) {
            debug!(%post_id, "hidden post requested");
            return Err(not_found());
        }

        let author = self
            .repos
            .users
            .find_by_id(post.author_id)
            .await?
            .ok_or_else(not_found)?;
        let location = match post.location_id {
            Some(id) => self
                .repos
                .locations
                .find_by_id(id)
                .await?
                .filter(|location| location.is_published),
            None => None,
        };
        let comments = self.repos.comments.find_by_post(post.id).await?;

        Ok(PostDetail {
            post,
            author,
            category,
            location,
            comments,
            comments_open,
        })
    }

    pub async fn form_choices(&self) -> Result<PostFormChoices, DomainError> {
        Ok(PostFormChoices {
            categories: self.repos.categories.list().await?,
            locations: self.repos.locations.list().await?,
        })
    }

    /// Publish a new post written by `author_id`.
    #[instrument(skip(self, draft))]
    pub async fn create(&self, author_id: Uuid, draft: PostDraft) -> Result<Post, DomainError> {
        if self.repos.users.find_by_id(author_id).await?.is_none() {
            return Err(DomainError::Unauthorized);
        }
        self.validate(&draft).await?;

        let post = self.repos.posts.create(Post::new(author_id, draft)).await?;
        info!(post_id = %post.id, %author_id, "post created");
        Ok(post)
    }

    /// The current values of a post, for its author only.
    pub async fn edit_form(
        &self,
        post_id: Uuid,
        actor: &Viewer,
    ) -> Result<Authorized<Post>, DomainError> {
        let post = self.find(post_id).await?;
        if !actor.is(post.author_id) {
            return Ok(Authorized::Denied);
        }
        Ok(Authorized::Granted(post))
    }

    /// Replace a post's fields. Only the author may edit.
    #[instrument(skip(self, draft))]
    pub async fn edit(
        &self,
        post_id: Uuid,
        actor: &Viewer,
        draft: PostDraft,
    ) -> Result<Authorized<Post>, DomainError> {
        let mut post = self.find(post_id).await?;
        if !actor.is(post.author_id) {
            info!(%post_id, actor = ?actor.user_id(), "post edit denied");
            return Ok(Authorized::Denied);
        }
        self.validate(&draft).await?;

        post.apply(draft);
        let post = self.repos.posts.update(post).await?;
        info!(%post_id, "post updated");
        Ok(Authorized::Granted(post))
    }

    /// Delete a post and, with it, its comments. Authors and staff only.
    #[instrument(skip(self))]
    pub async fn delete(
        &self,
        post_id: Uuid,
        actor: &Viewer,
    ) -> Result<Authorized<Post>, DomainError> {
        let post = self.find(post_id).await?;
        if !actor.bypasses_publication(post.author_id) {
            info!(%post_id, actor = ?actor.user_id(), "post delete denied");
            return Ok(Authorized::Denied);
        }

        self.repos.posts.delete(post.id).await?;
        info!(%post_id, "post deleted");
        Ok(Authorized::Granted(post))
    }

    async fn find(&self, post_id: Uuid) -> Result<Post, DomainError> {
        self.repos
            .posts
            .find_by_id(post_id)
            .await?
            .ok_or_else(|| DomainError::not_found("post", post_id))
    }

    async fn validate(&self, draft: &PostDraft) -> Result<(), DomainError> {
        let mut errors: FieldErrors = draft.validate();
        if let Some(id) = draft.category_id {
            if self.repos.categories.find_by_id(id).await?.is_none() {
                errors.add("category_id", INVALID_CHOICE);
            }
        }
        if let Some(id) = draft.location_id {
            if self.repos.locations.find_by_id(id).await?.is_none() {
                errors.add("location_id", INVALID_CHOICE);
            }
        }
        errors.into_result()
    }
}
