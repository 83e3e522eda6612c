//! Blog use cases run against the in-memory store.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use uuid::Uuid;

use inkpost_core::domain::{Category, CommentDraft, Location, Post, PostDraft, User, Viewer};
use inkpost_core::pagination::PageRequest;
use inkpost_core::ports::{BaseRepository, CommentNotice, CommentRepository, Notifier};
use inkpost_core::services::{Authorized, CommentService, PostService, ProfileService};
use inkpost_core::DomainError;
use inkpost_infra::InMemoryStore;

#[derive(Default)]
struct RecordingNotifier {
    notices: Mutex<Vec<CommentNotice>>,
}

impl RecordingNotifier {
    fn notices(&self) -> Vec<CommentNotice> {
        self.notices.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn comment_added(&self, notice: CommentNotice) {
        self.notices.lock().unwrap().push(notice);
    }
}

struct Blog {
    store: InMemoryStore,
    posts: PostService,
    comments: CommentService,
    profiles: ProfileService,
    notifier: Arc<RecordingNotifier>,
    alice: User,
    bob: User,
    news: Category,
}

impl Blog {
    async fn new() -> Self {
        let store = InMemoryStore::new();
        let notifier = Arc::new(RecordingNotifier::default());
        let repos = store.repositories();

        let alice = store.users().create(user("alice")).await.unwrap();
        let bob = store.users().create(user("bob")).await.unwrap();
        let news = store
            .categories()
            .create(Category::new(
                "News".to_string(),
                "What happened".to_string(),
                "news".to_string(),
            ))
            .await
            .unwrap();

        Self {
            posts: PostService::new(repos.clone()),
            comments: CommentService::new(repos.clone(), notifier.clone()),
            profiles: ProfileService::new(repos),
            store,
            notifier,
            alice,
            bob,
            news,
        }
    }

    fn draft(&self, title: &str) -> PostDraft {
        PostDraft {
            title: title.to_string(),
            text: "Some text".to_string(),
            category_id: Some(self.news.id),
            ..PostDraft::default()
        }
    }

    async fn publish(&self, author: &User, draft: PostDraft) -> Post {
        self.posts.create(author.id, draft).await.unwrap()
    }

    async fn comment(&self, author: &User, post: &Post, text: &str) -> Result<(), DomainError> {
        self.comments
            .create(
                post.id,
                &Viewer::member(author.id),
                CommentDraft {
                    text: text.to_string(),
                },
            )
            .await
            .map(|_| ())
    }
}

fn user(username: &str) -> User {
    User::new(
        username.to_string(),
        format!("{username}@example.com"),
        "hash".to_string(),
    )
}

fn assert_not_found<T: std::fmt::Debug>(result: Result<T, DomainError>) {
    assert!(
        matches!(result, Err(DomainError::NotFound { .. })),
        "expected not found, got {result:?}"
    );
}

#[tokio::test]
async fn test_home_feed_lists_only_published_posts() {
    let blog = Blog::new().await;
    let hidden_news = blog
        .store
        .categories()
        .create(Category::new("Hidden".into(), "".into(), "hidden".into()).hidden())
        .await
        .unwrap();

    let visible = blog.publish(&blog.alice, blog.draft("Visible")).await;
    blog.publish(
        &blog.alice,
        PostDraft {
            is_published: false,
            ..blog.draft("Draft")
        },
    )
    .await;
    blog.publish(
        &blog.alice,
        PostDraft {
            pub_date: Some(Utc::now() + Duration::days(1)),
            ..blog.draft("Tomorrow")
        },
    )
    .await;
    blog.publish(
        &blog.alice,
        PostDraft {
            category_id: Some(hidden_news.id),
            ..blog.draft("In hidden category")
        },
    )
    .await;

    let feed = blog.posts.home_feed(PageRequest::first()).await.unwrap();

    assert_eq!(feed.total_items, 1);
    assert_eq!(feed.items[0].post.id, visible.id);
}

#[tokio::test]
async fn test_scheduled_post_is_visible_to_author_only() {
    let blog = Blog::new().await;
    let scheduled = blog
        .publish(
            &blog.alice,
            PostDraft {
                pub_date: Some(Utc::now() + Duration::days(1)),
                ..blog.draft("Tomorrow")
            },
        )
        .await;

    let detail = blog
        .posts
        .detail(scheduled.id, &Viewer::member(blog.alice.id))
        .await
        .unwrap();
    assert!(!detail.comments_open);

    assert_not_found(blog.posts.detail(scheduled.id, &Viewer::Anonymous).await);
    assert_not_found(
        blog.posts
            .detail(scheduled.id, &Viewer::member(blog.bob.id))
            .await,
    );

    let own = blog
        .profiles
        .profile("alice", &Viewer::member(blog.alice.id), PageRequest::first())
        .await
        .unwrap();
    assert_eq!(own.posts.total_items, 1);

    let public = blog
        .profiles
        .profile("alice", &Viewer::member(blog.bob.id), PageRequest::first())
        .await
        .unwrap();
    assert_eq!(public.posts.total_items, 0);
}

#[tokio::test]
async fn test_staff_sees_hidden_post() {
    let blog = Blog::new().await;
    let draft = blog
        .publish(
            &blog.alice,
            PostDraft {
                is_published: false,
                ..blog.draft("Draft")
            },
        )
        .await;

    let moderator = blog.store.users().create(user("moderator").staff()).await.unwrap();
    let detail = blog
        .posts
        .detail(draft.id, &Viewer::staff(moderator.id))
        .await
        .unwrap();

    assert_eq!(detail.post.id, draft.id);
}

#[tokio::test]
async fn test_comments_are_newest_first_and_notify_author() {
    let blog = Blog::new().await;
    let post = blog.publish(&blog.alice, blog.draft("Hello")).await;

    blog.comment(&blog.bob, &post, "First").await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    blog.comment(&blog.bob, &post, "Second").await.unwrap();
    blog.comment(&blog.alice, &post, "Thanks").await.unwrap();

    let detail = blog.posts.detail(post.id, &Viewer::Anonymous).await.unwrap();
    assert_eq!(detail.comments.len(), 3);
    assert_eq!(detail.comments.last().unwrap().text, "First");

    let notices = blog.notifier.notices();
    assert_eq!(notices.len(), 2);
    assert!(notices.iter().all(|n| n.recipient_email == "alice@example.com"));
    assert_eq!(notices[0].commenter_username, "bob");
    assert_eq!(notices[0].post_title, "Hello");

    let feed = blog.posts.home_feed(PageRequest::first()).await.unwrap();
    assert_eq!(feed.items[0].comment_count, 3);
}

#[tokio::test]
async fn test_hidden_post_accepts_no_comments() {
    let blog = Blog::new().await;
    let draft = blog
        .publish(
            &blog.alice,
            PostDraft {
                is_published: false,
                ..blog.draft("Draft")
            },
        )
        .await;

    assert_not_found(blog.comment(&blog.alice, &draft, "Note to self").await);
    assert!(blog.notifier.notices().is_empty());
}

#[tokio::test]
async fn test_non_author_cannot_edit_post() {
    let blog = Blog::new().await;
    let post = blog.publish(&blog.alice, blog.draft("Original")).await;

    let outcome = blog
        .posts
        .edit(post.id, &Viewer::member(blog.bob.id), blog.draft("Hijacked"))
        .await
        .unwrap();
    assert!(outcome.is_denied());

    let outcome = blog
        .posts
        .edit(post.id, &Viewer::staff(blog.bob.id), blog.draft("Moderated"))
        .await
        .unwrap();
    assert!(outcome.is_denied());

    let stored = blog.store.posts().find_by_id(post.id).await.unwrap().unwrap();
    assert_eq!(stored.title, "Original");
}

#[tokio::test]
async fn test_deleting_post_removes_its_comments() {
    let blog = Blog::new().await;
    let post = blog.publish(&blog.alice, blog.draft("Short-lived")).await;
    blog.comment(&blog.bob, &post, "Nice").await.unwrap();

    let denied = blog
        .posts
        .delete(post.id, &Viewer::member(blog.bob.id))
        .await
        .unwrap();
    assert!(denied.is_denied());

    let deleted = blog
        .posts
        .delete(post.id, &Viewer::member(blog.alice.id))
        .await
        .unwrap();
    assert!(matches!(deleted, Authorized::Granted(_)));

    assert!(blog.store.comments().find_by_post(post.id).await.unwrap().is_empty());
    assert_not_found(blog.posts.detail(post.id, &Viewer::member(blog.alice.id)).await);
}

#[tokio::test]
async fn test_deleting_category_keeps_posts() {
    let blog = Blog::new().await;
    let post = blog.publish(&blog.alice, blog.draft("Survivor")).await;

    blog.store.categories().delete(blog.news.id).await.unwrap();

    let stored = blog.store.posts().find_by_id(post.id).await.unwrap().unwrap();
    assert_eq!(stored.category_id, None);

    // No category means not published.
    let feed = blog.posts.home_feed(PageRequest::first()).await.unwrap();
    assert_eq!(feed.total_items, 0);
}

#[tokio::test]
async fn test_hidden_category_feed_is_not_found() {
    let blog = Blog::new().await;
    blog.store
        .categories()
        .create(Category::new("Drafts".into(), "".into(), "drafts".into()).hidden())
        .await
        .unwrap();

    assert_not_found(blog.posts.category_feed("drafts", PageRequest::first()).await);
    assert_not_found(blog.posts.category_feed("missing", PageRequest::first()).await);

    let (category, posts) = blog
        .posts
        .category_feed("news", PageRequest::first())
        .await
        .unwrap();
    assert_eq!(category.id, blog.news.id);
    assert_eq!(posts.total_items, 0);
}

#[tokio::test]
async fn test_comment_moderation() {
    let blog = Blog::new().await;
    let post = blog.publish(&blog.alice, blog.draft("Open thread")).await;
    let comment = blog
        .comments
        .create(
            post.id,
            &Viewer::member(blog.bob.id),
            CommentDraft {
                text: "Spam".to_string(),
            },
        )
        .await
        .unwrap();

    // The post author does not own the comment.
    let outcome = blog
        .comments
        .edit(
            post.id,
            comment.id,
            &Viewer::member(blog.alice.id),
            CommentDraft {
                text: "Edited".to_string(),
            },
        )
        .await
        .unwrap();
    assert!(outcome.is_denied());

    let moderator = blog.store.users().create(user("moderator").staff()).await.unwrap();
    let outcome = blog
        .comments
        .delete(post.id, comment.id, &Viewer::staff(moderator.id))
        .await
        .unwrap();
    assert!(!outcome.is_denied());
    assert!(blog.store.comments().find_by_post(post.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_comment_addressed_through_other_post_is_not_found() {
    let blog = Blog::new().await;
    let first = blog.publish(&blog.alice, blog.draft("First")).await;
    let second = blog.publish(&blog.alice, blog.draft("Second")).await;
    let comment = blog
        .comments
        .create(
            first.id,
            &Viewer::member(blog.bob.id),
            CommentDraft {
                text: "Hi".to_string(),
            },
        )
        .await
        .unwrap();

    assert_not_found(
        blog.comments
            .delete(second.id, comment.id, &Viewer::member(blog.bob.id))
            .await,
    );
}

#[tokio::test]
async fn test_unpublished_location_is_dropped_from_detail() {
    let blog = Blog::new().await;
    let mut location = Location::new("Nowhere".to_string());
    location.is_published = false;
    let location = blog.store.locations().create(location).await.unwrap();

    let post = blog
        .publish(
            &blog.alice,
            PostDraft {
                location_id: Some(location.id),
                ..blog.draft("Somewhere")
            },
        )
        .await;

    let detail = blog.posts.detail(post.id, &Viewer::Anonymous).await.unwrap();
    assert_eq!(detail.post.location_id, Some(location.id));
    assert!(detail.location.is_none());
}

#[tokio::test]
async fn test_unknown_category_is_a_field_error() {
    let blog = Blog::new().await;
    let result = blog
        .posts
        .create(
            blog.alice.id,
            PostDraft {
                category_id: Some(Uuid::new_v4()),
                ..blog.draft("Lost")
            },
        )
        .await;

    match result {
        Err(DomainError::Validation(errors)) => assert!(errors.contains("category_id")),
        other => panic!("expected validation error, got {other:?}"),
    }
}
