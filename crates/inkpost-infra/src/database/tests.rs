use chrono::Utc;
use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
use uuid::Uuid;

use inkpost_core::domain::{Comment, Post};
use inkpost_core::error::RepoError;
use inkpost_core::ports::{BaseRepository, CommentRepository};

use crate::database::entity::{comment, post};
use crate::database::postgres_repo::{PostgresCommentRepository, PostgresPostRepository};

#[tokio::test]
async fn test_find_post_by_id() {
    let post_id = Uuid::new_v4();
    let author_id = Uuid::new_v4();
    let category_id = Uuid::new_v4();
    let now = Utc::now();

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![post::Model {
            id: post_id,
            author_id,
            title: "Test Post".to_owned(),
            text: "Content".to_owned(),
            pub_date: now.into(),
            is_published: true,
            category_id: Some(category_id),
            location_id: None,
            image: None,
            created_at: now.into(),
        }]])
        .into_connection();

    let repo = PostgresPostRepository::new(db);

    let post: Post = repo.find_by_id(post_id).await.unwrap().unwrap();

    assert_eq!(post.id, post_id);
    assert_eq!(post.title, "Test Post");
    assert_eq!(post.category_id, Some(category_id));
    assert_eq!(post.pub_date.timestamp(), now.timestamp());
}

#[tokio::test]
async fn test_delete_missing_post_is_not_found() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_exec_results(vec![MockExecResult {
            last_insert_id: 0,
            rows_affected: 0,
        }])
        .into_connection();

    let repo = PostgresPostRepository::new(db);

    let result = BaseRepository::<Post, Uuid>::delete(&repo, Uuid::new_v4()).await;

    assert!(matches!(result, Err(RepoError::NotFound)));
}

#[tokio::test]
async fn test_find_comments_by_post() {
    let post_id = Uuid::new_v4();
    let author_id = Uuid::new_v4();
    let now = Utc::now();

    let row = |text: &str| comment::Model {
        id: Uuid::new_v4(),
        post_id,
        author_id,
        text: text.to_owned(),
        created_at: now.into(),
    };

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![row("newer"), row("older")]])
        .into_connection();

    let repo = PostgresCommentRepository::new(db);

    let comments: Vec<Comment> = repo.find_by_post(post_id).await.unwrap();

    assert_eq!(comments.len(), 2);
    assert_eq!(comments[0].text, "newer");
    assert!(comments.iter().all(|c| c.post_id == post_id));
}
