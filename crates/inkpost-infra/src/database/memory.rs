//! In-memory store - used as fallback when no database is configured.
//!
//! Mirrors the relational schema: unique usernames, emails and category
//! slugs are enforced, and deletes follow the same foreign-key rules as the
//! migration (posts and comments cascade, category and location references
//! are nulled). Data is lost on process restart.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use inkpost_core::domain::{Category, Comment, Location, Post, PostQuery, PostSummary, User};
use inkpost_core::error::RepoError;
use inkpost_core::pagination::{Page, PageRequest};
use inkpost_core::ports::{
    BaseRepository, CategoryRepository, CommentRepository, LocationRepository, PostRepository,
    UserRepository,
};
use inkpost_core::services::Repositories;

#[derive(Default)]
pub struct Tables {
    users: HashMap<Uuid, User>,
    categories: HashMap<Uuid, Category>,
    locations: HashMap<Uuid, Location>,
    posts: HashMap<Uuid, Post>,
    comments: HashMap<Uuid, Comment>,
}

/// A row type stored in one of the tables.
pub trait Row: Clone + Send + Sync + 'static {
    fn id(&self) -> Uuid;

    fn table(tables: &Tables) -> &HashMap<Uuid, Self>;

    fn table_mut(tables: &mut Tables) -> &mut HashMap<Uuid, Self>;

    /// Unique and foreign-key checks run before every write.
    fn check(&self, _tables: &Tables) -> Result<(), RepoError> {
        Ok(())
    }

    /// Apply on-delete rules to rows referencing `id`.
    fn on_delete(_id: Uuid, _tables: &mut Tables) {}
}

fn constraint(msg: &str) -> RepoError {
    RepoError::Constraint(msg.to_string())
}

impl Row for User {
    fn id(&self) -> Uuid {
        self.id
    }

    fn table(tables: &Tables) -> &HashMap<Uuid, Self> {
        &tables.users
    }

    fn table_mut(tables: &mut Tables) -> &mut HashMap<Uuid, Self> {
        &mut tables.users
    }

    fn check(&self, tables: &Tables) -> Result<(), RepoError> {
        let others = || tables.users.values().filter(|u| u.id != self.id);
        if others().any(|u| u.username == self.username) {
            return Err(constraint("users_username_key"));
        }
        if others().any(|u| u.email == self.email) {
            return Err(constraint("users_email_key"));
        }
        Ok(())
    }

    fn on_delete(id: Uuid, tables: &mut Tables) {
        let authored: Vec<Uuid> = tables
            .posts
            .values()
            .filter(|p| p.author_id == id)
            .map(|p| p.id)
            .collect();
        for post_id in authored {
            tables.posts.remove(&post_id);
            Post::on_delete(post_id, tables);
        }
        tables.comments.retain(|_, c| c.author_id != id);
    }
}

impl Row for Category {
    fn id(&self) -> Uuid {
        self.id
    }

    fn table(tables: &Tables) -> &HashMap<Uuid, Self> {
        &tables.categories
    }

    fn table_mut(tables: &mut Tables) -> &mut HashMap<Uuid, Self> {
        &mut tables.categories
    }

    fn check(&self, tables: &Tables) -> Result<(), RepoError> {
        if tables
            .categories
            .values()
            .any(|c| c.id != self.id && c.slug == self.slug)
        {
            return Err(constraint("categories_slug_key"));
        }
        Ok(())
    }

    fn on_delete(id: Uuid, tables: &mut Tables) {
        for post in tables.posts.values_mut() {
            if post.category_id == Some(id) {
                post.category_id = None;
            }
        }
    }
}

impl Row for Location {
    fn id(&self) -> Uuid {
        self.id
    }

    fn table(tables: &Tables) -> &HashMap<Uuid, Self> {
        &tables.locations
    }

    fn table_mut(tables: &mut Tables) -> &mut HashMap<Uuid, Self> {
        &mut tables.locations
    }

    fn on_delete(id: Uuid, tables: &mut Tables) {
        for post in tables.posts.values_mut() {
            if post.location_id == Some(id) {
                post.location_id = None;
            }
        }
    }
}

impl Row for Post {
    fn id(&self) -> Uuid {
        self.id
    }

    fn table(tables: &Tables) -> &HashMap<Uuid, Self> {
        &tables.posts
    }

    fn table_mut(tables: &mut Tables) -> &mut HashMap<Uuid, Self> {
        &mut tables.posts
    }

    fn check(&self, tables: &Tables) -> Result<(), RepoError> {
        if !tables.users.contains_key(&self.author_id) {
            return Err(constraint("posts_author_id_fkey"));
        }
        if self
            .category_id
            .is_some_and(|id| !tables.categories.contains_key(&id))
        {
            return Err(constraint("posts_category_id_fkey"));
        }
        if self
            .location_id
            .is_some_and(|id| !tables.locations.contains_key(&id))
        {
            return Err(constraint("posts_location_id_fkey"));
        }
        Ok(())
    }

    fn on_delete(id: Uuid, tables: &mut Tables) {
        tables.comments.retain(|_, c| c.post_id != id);
    }
}

impl Row for Comment {
    fn id(&self) -> Uuid {
        self.id
    }

    fn table(tables: &Tables) -> &HashMap<Uuid, Self> {
        &tables.comments
    }

    fn table_mut(tables: &mut Tables) -> &mut HashMap<Uuid, Self> {
        &mut tables.comments
    }

    fn check(&self, tables: &Tables) -> Result<(), RepoError> {
        if !tables.posts.contains_key(&self.post_id) {
            return Err(constraint("comments_post_id_fkey"));
        }
        if !tables.users.contains_key(&self.author_id) {
            return Err(constraint("comments_author_id_fkey"));
        }
        Ok(())
    }
}

/// Shared in-memory tables. Cloning is cheap and every clone sees the same
/// data.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn users(&self) -> InMemoryRepository<User> {
        self.repository()
    }

    pub fn categories(&self) -> InMemoryRepository<Category> {
        self.repository()
    }

    pub fn locations(&self) -> InMemoryRepository<Location> {
        self.repository()
    }

    pub fn posts(&self) -> InMemoryRepository<Post> {
        self.repository()
    }

    pub fn comments(&self) -> InMemoryRepository<Comment> {
        self.repository()
    }

    /// Every repository backed by this store.
    pub fn repositories(&self) -> Repositories {
        Repositories {
            users: Arc::new(self.users()),
            categories: Arc::new(self.categories()),
            locations: Arc::new(self.locations()),
            posts: Arc::new(self.posts()),
            comments: Arc::new(self.comments()),
        }
    }

    fn repository<T: Row>(&self) -> InMemoryRepository<T> {
        InMemoryRepository {
            tables: self.tables.clone(),
            _row: PhantomData,
        }
    }
}

/// Repository handle over one table of an [`InMemoryStore`].
pub struct InMemoryRepository<T> {
    tables: Arc<RwLock<Tables>>,
    _row: PhantomData<fn() -> T>,
}

impl<T> Clone for InMemoryRepository<T> {
    fn clone(&self) -> Self {
        Self {
            tables: self.tables.clone(),
            _row: PhantomData,
        }
    }
}

#[async_trait]
impl<T: Row> BaseRepository<T, Uuid> for InMemoryRepository<T> {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<T>, RepoError> {
        let tables = self.tables.read().await;
        Ok(T::table(&tables).get(&id).cloned())
    }

    async fn create(&self, entity: T) -> Result<T, RepoError> {
        let mut tables = self.tables.write().await;
        if T::table(&tables).contains_key(&entity.id()) {
            return Err(constraint("primary key"));
        }
        entity.check(&tables)?;
        T::table_mut(&mut tables).insert(entity.id(), entity.clone());
        Ok(entity)
    }

    async fn update(&self, entity: T) -> Result<T, RepoError> {
        let mut tables = self.tables.write().await;
        if !T::table(&tables).contains_key(&entity.id()) {
            return Err(RepoError::NotFound);
        }
        entity.check(&tables)?;
        T::table_mut(&mut tables).insert(entity.id(), entity.clone());
        Ok(entity)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        if T::table_mut(&mut tables).remove(&id).is_none() {
            return Err(RepoError::NotFound);
        }
        T::on_delete(id, &mut tables);
        Ok(())
    }
}

#[async_trait]
impl UserRepository for InMemoryRepository<User> {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }
}

#[async_trait]
impl CategoryRepository for InMemoryRepository<Category> {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Category>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.categories.values().find(|c| c.slug == slug).cloned())
    }

    async fn list(&self) -> Result<Vec<Category>, RepoError> {
        let tables = self.tables.read().await;
        let mut categories: Vec<Category> = tables.categories.values().cloned().collect();
        categories.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(categories)
    }
}

#[async_trait]
impl LocationRepository for InMemoryRepository<Location> {
    async fn list(&self) -> Result<Vec<Location>, RepoError> {
        let tables = self.tables.read().await;
        let mut locations: Vec<Location> = tables.locations.values().cloned().collect();
        locations.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(locations)
    }
}

#[async_trait]
impl PostRepository for InMemoryRepository<Post> {
    async fn find_page(
        &self,
        query: &PostQuery,
        page: PageRequest,
    ) -> Result<Page<PostSummary>, RepoError> {
        let tables = self.tables.read().await;

        let mut posts: Vec<&Post> = tables
            .posts
            .values()
            .filter(|post| {
                let category = post.category_id.and_then(|id| tables.categories.get(&id));
                query.matches(post, category)
            })
            .collect();
        posts.sort_by(|a, b| b.pub_date.cmp(&a.pub_date).then_with(|| b.id.cmp(&a.id)));

        let mut counts: HashMap<Uuid, u64> = HashMap::new();
        for comment in tables.comments.values() {
            *counts.entry(comment.post_id).or_default() += 1;
        }

        let summaries = posts
            .into_iter()
            .map(|post| PostSummary {
                post: post.clone(),
                comment_count: counts.get(&post.id).copied().unwrap_or(0),
            })
            .collect();

        Ok(Page::from_all(summaries, page))
    }
}

#[async_trait]
impl CommentRepository for InMemoryRepository<Comment> {
    async fn find_by_post(&self, post_id: Uuid) -> Result<Vec<Comment>, RepoError> {
        let tables = self.tables.read().await;
        let mut comments: Vec<Comment> = tables
            .comments
            .values()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect();
        comments.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(comments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use inkpost_core::domain::{CommentDraft, PostDraft};

    async fn seed_user(store: &InMemoryStore, username: &str) -> User {
        let user = User::new(
            username.to_string(),
            format!("{username}@example.com"),
            "hash".to_string(),
        );
        store.users().create(user).await.unwrap()
    }

    async fn seed_category(store: &InMemoryStore, slug: &str) -> Category {
        let category = Category::new(slug.to_uppercase(), String::new(), slug.to_string());
        store.categories().create(category).await.unwrap()
    }

    fn draft(category: &Category) -> PostDraft {
        PostDraft {
            title: "Title".into(),
            text: "Body".into(),
            category_id: Some(category.id),
            ..PostDraft::default()
        }
    }

    #[tokio::test]
    async fn test_duplicate_username_is_a_constraint_error() {
        let store = InMemoryStore::new();
        seed_user(&store, "alice").await;

        let dup = User::new("alice".into(), "other@example.com".into(), "hash".into());
        let err = store.users().create(dup).await.unwrap_err();

        assert!(matches!(err, RepoError::Constraint(_)));
    }

    #[tokio::test]
    async fn test_post_requires_existing_author() {
        let store = InMemoryStore::new();
        let category = seed_category(&store, "news").await;

        let orphan = Post::new(Uuid::new_v4(), draft(&category));
        let err = store.posts().create(orphan).await.unwrap_err();

        assert!(matches!(err, RepoError::Constraint(_)));
    }

    #[tokio::test]
    async fn test_deleting_post_removes_its_comments() {
        let store = InMemoryStore::new();
        let alice = seed_user(&store, "alice").await;
        let category = seed_category(&store, "news").await;
        let post = store
            .posts()
            .create(Post::new(alice.id, draft(&category)))
            .await
            .unwrap();
        let comment = Comment::new(post.id, alice.id, CommentDraft { text: "hi".into() });
        store.comments().create(comment).await.unwrap();

        store.posts().delete(post.id).await.unwrap();

        assert!(store.comments().find_by_post(post.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_deleting_category_keeps_posts_without_category() {
        let store = InMemoryStore::new();
        let alice = seed_user(&store, "alice").await;
        let category = seed_category(&store, "news").await;
        let post = store
            .posts()
            .create(Post::new(alice.id, draft(&category)))
            .await
            .unwrap();

        store.categories().delete(category.id).await.unwrap();

        let post = store.posts().find_by_id(post.id).await.unwrap().unwrap();
        assert_eq!(post.category_id, None);
    }

    #[tokio::test]
    async fn test_find_page_orders_by_pub_date_then_id() {
        let store = InMemoryStore::new();
        let alice = seed_user(&store, "alice").await;
        let category = seed_category(&store, "news").await;
        let when = Utc::now() - Duration::hours(1);

        let mut ids = Vec::new();
        for _ in 0..3 {
            let mut post = Post::new(alice.id, draft(&category));
            post.pub_date = when;
            ids.push(store.posts().create(post).await.unwrap().id);
        }
        let mut older = Post::new(alice.id, draft(&category));
        older.pub_date = when - Duration::days(1);
        let older = store.posts().create(older).await.unwrap();

        let page = store
            .posts()
            .find_page(&PostQuery::all(), PageRequest::first())
            .await
            .unwrap();

        ids.sort();
        ids.reverse();
        ids.push(older.id);
        let got: Vec<Uuid> = page.items.iter().map(|s| s.post.id).collect();
        assert_eq!(got, ids);
    }

    #[tokio::test]
    async fn test_find_page_counts_comments() {
        let store = InMemoryStore::new();
        let alice = seed_user(&store, "alice").await;
        let category = seed_category(&store, "news").await;
        let post = store
            .posts()
            .create(Post::new(alice.id, draft(&category)))
            .await
            .unwrap();
        for text in ["one", "two"] {
            let comment = Comment::new(post.id, alice.id, CommentDraft { text: text.into() });
            store.comments().create(comment).await.unwrap();
        }

        let page = store
            .posts()
            .find_page(&PostQuery::all(), PageRequest::first())
            .await
            .unwrap();

        assert_eq!(page.items[0].comment_count, 2);
    }
}
