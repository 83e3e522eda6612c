use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{Authorized, Repositories};
use crate::domain::visibility::is_published;
use crate::domain::{Comment, CommentDraft, Post, Viewer};
use crate::error::DomainError;
use crate::ports::{CommentNotice, Notifier};

#[derive(Clone)]
pub struct CommentService {
    repos: Repositories,
    notifier: Arc<dyn Notifier>,
}

impl CommentService {
    pub fn new(repos: Repositories, notifier: Arc<dyn Notifier>) -> Self {
        Self { repos, notifier }
    }

    /// Comment on a publicly visible post.
    ///
    /// Posts that are not published accept no comments, not even from their
    /// author. When the commenter is not the author, the author is notified
    /// on a best-effort basis.
    #[instrument(skip(self, draft))]
    pub async fn create(
        &self,
        post_id: Uuid,
        actor: &Viewer,
        draft: CommentDraft,
    ) -> Result<Comment, DomainError> {
        let commenter_id = actor.user_id().ok_or(DomainError::Unauthorized)?;
        let commenter = self
            .repos
            .users
            .find_by_id(commenter_id)
            .await?
            .ok_or(DomainError::Unauthorized)?;
        let post = self.find_published_post(post_id).await?;
        draft.validate().into_result()?;

        let comment = self
            .repos
            .comments
            .create(Comment::new(post.id, commenter.id, draft))
            .await?;
        info!(comment_id = %comment.id, %post_id, "comment created");

        if !post.is_authored_by(commenter.id) {
            match self.repos.users.find_by_id(post.author_id).await {
                Ok(Some(author)) => {
                    self.notifier
                        .comment_added(CommentNotice {
                            post_id: post.id,
                            post_title: post.title.clone(),
                            comment_id: comment.id,
                            commenter_username: commenter.username.clone(),
                            recipient_email: author.email,
                        })
                        .await;
                }
                Ok(None) => {}
                Err(e) => warn!(%post_id, error = %e, "skipping comment notification"),
            }
        }

        Ok(comment)
    }

    /// The current text of a comment, for its author only.
    pub async fn edit_form(
        &self,
        post_id: Uuid,
        comment_id: Uuid,
        actor: &Viewer,
    ) -> Result<Authorized<Comment>, DomainError> {
        self.find_published_post(post_id).await?;
        let comment = self.find_comment(post_id, comment_id).await?;
        if !actor.is(comment.author_id) {
            return Ok(Authorized::Denied);
        }
        Ok(Authorized::Granted(comment))
    }

    /// Change a comment's text. Only its author may, and only while the post
    /// is publicly visible.
    #[instrument(skip(self, draft))]
    pub async fn edit(
        &self,
        post_id: Uuid,
        comment_id: Uuid,
        actor: &Viewer,
        draft: CommentDraft,
    ) -> Result<Authorized<Comment>, DomainError> {
        self.find_published_post(post_id).await?;
        let mut comment = self.find_comment(post_id, comment_id).await?;
        if !actor.is(comment.author_id) {
            info!(%comment_id, actor = ?actor.user_id(), "comment edit denied");
            return Ok(Authorized::Denied);
        }
        draft.validate().into_result()?;

        comment.text = draft.text;
        let comment = self.repos.comments.update(comment).await?;
        info!(%comment_id, "comment updated");
        Ok(Authorized::Granted(comment))
    }

    /// Delete a comment. Its author and staff may.
    #[instrument(skip(self))]
    pub async fn delete(
        &self,
        post_id: Uuid,
        comment_id: Uuid,
        actor: &Viewer,
    ) -> Result<Authorized<Comment>, DomainError> {
        let comment = self.find_comment(post_id, comment_id).await?;
        if !actor.bypasses_publication(comment.author_id) {
            info!(%comment_id, actor = ?actor.user_id(), "comment delete denied");
            return Ok(Authorized::Denied);
        }

        self.repos.comments.delete(comment.id).await?;
        info!(%comment_id, "comment deleted");
        Ok(Authorized::Granted(comment))
    }

    async fn find_published_post(&self, post_id: Uuid) -> Result<Post, DomainError> {
        let not_found = || DomainError::not_found("post", post_id);

        let post = self.repos.posts.find_by_id(post_id).await?.ok_or_else(not_found)?;
        let category = match post.category_id {
            Some(id) => self.repos.categories.find_by_id(id).await?,
            None => None,
        };
        if !is_published(&post, category.as_ref(), Utc::now()) {
            return Err(not_found());
        }
        Ok(post)
    }

    /// A comment addressed through a post it does not belong to is not found.
    async fn find_comment(&self, post_id: Uuid, comment_id: Uuid) -> Result<Comment, DomainError> {
        self.repos
            .comments
            .find_by_id(comment_id)
            .await?
            .filter(|comment| comment.post_id == post_id)
            .ok_or_else(|| DomainError::not_found("comment", comment_id))
    }
}
