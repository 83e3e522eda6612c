use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Category, Comment, Location, Post, PostQuery, PostSummary, User};
use crate::error::RepoError;
use crate::pagination::{Page, PageRequest};

/// Generic repository trait defining standard CRUD operations.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Insert a new entity.
    async fn create(&self, entity: T) -> Result<T, RepoError>;

    /// Overwrite an existing entity.
    async fn update(&self, entity: T) -> Result<T, RepoError>;

    /// Delete an entity by its ID. Dependent rows follow the foreign-key
    /// rules of the schema (cascade or set null).
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

#[async_trait]
pub trait UserRepository: BaseRepository<User, Uuid> {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;
}

#[async_trait]
pub trait CategoryRepository: BaseRepository<Category, Uuid> {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Category>, RepoError>;

    /// All categories, ordered by title.
    async fn list(&self) -> Result<Vec<Category>, RepoError>;
}

#[async_trait]
pub trait LocationRepository: BaseRepository<Location, Uuid> {
    /// All locations, ordered by name.
    async fn list(&self) -> Result<Vec<Location>, RepoError>;
}

#[async_trait]
pub trait PostRepository: BaseRepository<Post, Uuid> {
    /// One page of posts matching `query`, newest publication first, each
    /// annotated with its comment count.
    async fn find_page(
        &self,
        query: &PostQuery,
        page: PageRequest,
    ) -> Result<Page<PostSummary>, RepoError>;
}

#[async_trait]
pub trait CommentRepository: BaseRepository<Comment, Uuid> {
    /// Comments of a post, newest first.
    async fn find_by_post(&self, post_id: Uuid) -> Result<Vec<Comment>, RepoError>;
}
