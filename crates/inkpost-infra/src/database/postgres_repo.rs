//! PostgreSQL repository implementations.

use std::collections::HashMap;

use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, DbConn, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select,
};
use uuid::Uuid;

use inkpost_core::domain::{Category, Comment, Location, PostQuery, PostSummary, User};
use inkpost_core::error::RepoError;
use inkpost_core::pagination::{Page, PageRequest};
use inkpost_core::ports::{
    CategoryRepository, CommentRepository, LocationRepository, PostRepository, UserRepository,
};

use super::entity::category::{self, Entity as CategoryEntity};
use super::entity::comment::{self, Entity as CommentEntity};
use super::entity::location::{self, Entity as LocationEntity};
use super::entity::post::Entity as PostEntity;
use super::entity::user::{self, Entity as UserEntity};
use super::post_query;
use super::postgres_base::{PostgresBaseRepository, repo_error};

pub type PostgresUserRepository = PostgresBaseRepository<UserEntity>;
pub type PostgresCategoryRepository = PostgresBaseRepository<CategoryEntity>;
pub type PostgresLocationRepository = PostgresBaseRepository<LocationEntity>;
pub type PostgresPostRepository = PostgresBaseRepository<PostEntity>;
pub type PostgresCommentRepository = PostgresBaseRepository<CommentEntity>;

/// Mask the local part of an address so that logs carry no PII.
fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) => {
            let first: String = local.chars().take(1).collect();
            if local.chars().count() > 1 {
                format!("{first}***@{domain}")
            } else {
                format!("***@{domain}")
            }
        }
        None => "***".to_string(),
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        tracing::debug!(%username, "Finding user by username");

        let result = UserEntity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await
            .map_err(repo_error)?;

        Ok(result.map(Into::into))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        tracing::debug!(user_email = %mask_email(email), "Finding user by email");

        let result = UserEntity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(repo_error)?;

        Ok(result.map(Into::into))
    }
}

#[async_trait]
impl CategoryRepository for PostgresCategoryRepository {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Category>, RepoError> {
        let result = CategoryEntity::find()
            .filter(category::Column::Slug.eq(slug))
            .one(&self.db)
            .await
            .map_err(repo_error)?;

        Ok(result.map(Into::into))
    }

    async fn list(&self) -> Result<Vec<Category>, RepoError> {
        let result = CategoryEntity::find()
            .order_by_asc(category::Column::Title)
            .all(&self.db)
            .await
            .map_err(repo_error)?;

        Ok(result.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl LocationRepository for PostgresLocationRepository {
    async fn list(&self) -> Result<Vec<Location>, RepoError> {
        let result = LocationEntity::find()
            .order_by_asc(location::Column::Name)
            .all(&self.db)
            .await
            .map_err(repo_error)?;

        Ok(result.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn find_page(
        &self,
        query: &PostQuery,
        page: PageRequest,
    ) -> Result<Page<PostSummary>, RepoError> {
        let paginator = post_query::select(query).paginate(&self.db, page.per_page());
        let total = paginator.num_items().await.map_err(repo_error)?;
        let window = page.resolve(total);

        let posts = paginator
            .fetch_page(window.number - 1)
            .await
            .map_err(repo_error)?;
        tracing::debug!(
            page = window.number,
            total_items = total,
            fetched = posts.len(),
            "Fetched post page"
        );

        let ids: Vec<Uuid> = posts.iter().map(|p| p.id).collect();
        let counts = comment_counts(&self.db, ids).await?;

        let items = posts
            .into_iter()
            .map(|model| {
                let comment_count = counts.get(&model.id).copied().unwrap_or(0);
                PostSummary {
                    post: model.into(),
                    comment_count,
                }
            })
            .collect();

        Ok(Page::new(items, window))
    }
}

/// Number of comments per post, for the given posts only.
async fn comment_counts(db: &DbConn, post_ids: Vec<Uuid>) -> Result<HashMap<Uuid, u64>, RepoError> {
    if post_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows: Vec<(Uuid, i64)> = CommentEntity::find()
        .select_only()
        .column(comment::Column::PostId)
        .column_as(Expr::col(comment::Column::Id).count(), "comment_count")
        .filter(comment::Column::PostId.is_in(post_ids))
        .group_by(comment::Column::PostId)
        .into_tuple()
        .all(db)
        .await
        .map_err(repo_error)?;

    Ok(rows
        .into_iter()
        .map(|(post_id, count)| (post_id, count.max(0) as u64))
        .collect())
}

/// Comments of one post, newest first. Equal timestamps fall back to id so
/// the order matches the in-memory store.
fn comments_of(post_id: Uuid) -> Select<CommentEntity> {
    CommentEntity::find()
        .filter(comment::Column::PostId.eq(post_id))
        .order_by_desc(comment::Column::CreatedAt)
        .order_by_desc(comment::Column::Id)
}

#[async_trait]
impl CommentRepository for PostgresCommentRepository {
    async fn find_by_post(&self, post_id: Uuid) -> Result<Vec<Comment>, RepoError> {
        let result = comments_of(post_id)
            .all(&self.db)
            .await
            .map_err(repo_error)?;

        Ok(result.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::{comments_of, mask_email};
    use sea_orm::{DatabaseBackend, QueryTrait};
    use uuid::Uuid;

    #[test]
    fn test_comments_newest_first_with_id_tie_break() {
        let post_id = Uuid::new_v4();
        let sql = comments_of(post_id)
            .build(DatabaseBackend::Postgres)
            .to_string();

        assert!(sql.contains(&format!(r#""comments"."post_id" = '{post_id}'"#)));
        assert!(sql.contains(
            r#"ORDER BY "comments"."created_at" DESC, "comments"."id" DESC"#
        ));
    }

    #[test]
    fn test_mask_email() {
        assert_eq!(mask_email("alice@example.com"), "a***@example.com");
        assert_eq!(mask_email("a@example.com"), "***@example.com");
        assert_eq!(mask_email("not-an-email"), "***");
    }
}
