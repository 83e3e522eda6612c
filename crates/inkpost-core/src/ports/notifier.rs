//! Notification port for events authors care about.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Someone other than the author commented on a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentNotice {
    pub post_id: Uuid,
    pub post_title: String,
    pub comment_id: Uuid,
    pub commenter_username: String,
    pub recipient_email: String,
}

/// Best-effort notifications.
///
/// Implementations never report failure to the caller: delivery problems are
/// logged and dropped.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn comment_added(&self, notice: CommentNotice);
}
