use chrono::Utc;
use tracing::{info, instrument};
use uuid::Uuid;

use super::{Authorized, Repositories};
use crate::domain::{PostQuery, PostSummary, ProfileChanges, User, Viewer};
use crate::error::{DomainError, FieldErrors};
use crate::pagination::{Page, PageRequest};

/// A user's public page.
#[derive(Debug, Clone)]
pub struct Profile {
    pub user: User,
    pub posts: Page<PostSummary>,
}

#[derive(Clone)]
pub struct ProfileService {
    repos: Repositories,
}

impl ProfileService {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    /// A profile with its feed. The owner sees all of their posts, everyone
    /// else only the published ones.
    pub async fn profile(
        &self,
        username: &str,
        viewer: &Viewer,
        page: PageRequest,
    ) -> Result<Profile, DomainError> {
        let user = self.find_by_username(username).await?;
        let query = PostQuery::for_profile(viewer, user.id, Utc::now());
        let posts = self.repos.posts.find_page(&query, page).await?;
        Ok(Profile { user, posts })
    }

    /// The account behind an authenticated identity.
    pub async fn current_user(&self, user_id: Uuid) -> Result<User, DomainError> {
        self.repos
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(DomainError::Unauthorized)
    }

    /// Profile form values; only the profile owner gets them.
    pub async fn edit_form(
        &self,
        username: &str,
        actor: &Viewer,
    ) -> Result<Authorized<ProfileChanges>, DomainError> {
        let user = self.find_by_username(username).await?;
        if !actor.is(user.id) {
            return Ok(Authorized::Denied);
        }
        Ok(Authorized::Granted(ProfileChanges::from_user(&user)))
    }

    /// Update the owner's profile fields.
    #[instrument(skip(self, changes))]
    pub async fn edit(
        &self,
        username: &str,
        actor: &Viewer,
        changes: ProfileChanges,
    ) -> Result<Authorized<User>, DomainError> {
        let mut user = self.find_by_username(username).await?;
        if !actor.is(user.id) {
            return Ok(Authorized::Denied);
        }

        let changes = changes.normalized();
        let mut errors: FieldErrors = changes.validate();
        if changes.username != user.username
            && self.repos.users.find_by_username(&changes.username).await?.is_some()
        {
            errors.add("username", "A user with that username already exists.");
        }
        if changes.email != user.email
            && self.repos.users.find_by_email(&changes.email).await?.is_some()
        {
            errors.add("email", "A user with that email already exists.");
        }
        errors.into_result()?;

        user.apply(changes);
        let user = self.repos.users.update(user).await?;
        info!(user_id = %user.id, username = %user.username, "profile updated");
        Ok(Authorized::Granted(user))
    }

    async fn find_by_username(&self, username: &str) -> Result<User, DomainError> {
        self.repos
            .users
            .find_by_username(username)
            .await?
            .ok_or_else(|| DomainError::not_found_by("user", username))
    }
}
