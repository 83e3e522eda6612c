use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::FieldErrors;

/// Comment entity - deleted together with its post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub fn new(post_id: Uuid, author_id: Uuid, draft: CommentDraft) -> Self {
        Self {
            id: Uuid::new_v4(),
            post_id,
            author_id,
            text: draft.text,
            created_at: Utc::now(),
        }
    }

    pub fn is_authored_by(&self, user_id: Uuid) -> bool {
        self.author_id == user_id
    }
}

/// Submitted comment form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentDraft {
    #[serde(default)]
    pub text: String,
}

impl CommentDraft {
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        if self.text.trim().is_empty() {
            errors.add("text", "This field is required.");
        }
        errors
    }
}
