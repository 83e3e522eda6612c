use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::FieldErrors;

pub const TITLE_MAX_LENGTH: usize = 256;

/// Post entity - a blog publication.
///
/// A post is publicly visible only when its own flag, its category's flag and
/// its publication date all allow it; see [`super::visibility::is_published`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub text: String,
    /// May lie in the future for scheduled publications.
    pub pub_date: DateTime<Utc>,
    pub is_published: bool,
    /// Nulled when the category is deleted.
    pub category_id: Option<Uuid>,
    /// Nulled when the location is deleted.
    pub location_id: Option<Uuid>,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Post {
    /// Create a new post from a validated draft.
    pub fn new(author_id: Uuid, draft: PostDraft) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            author_id,
            title: draft.title,
            text: draft.text,
            pub_date: draft.pub_date.unwrap_or(now),
            is_published: draft.is_published,
            category_id: draft.category_id,
            location_id: draft.location_id,
            image: draft.image,
            created_at: now,
        }
    }

    pub fn is_authored_by(&self, user_id: Uuid) -> bool {
        self.author_id == user_id
    }

    /// Replace the editable fields. An absent `pub_date` keeps the current one.
    pub fn apply(&mut self, draft: PostDraft) {
        self.title = draft.title;
        self.text = draft.text;
        if let Some(pub_date) = draft.pub_date {
            self.pub_date = pub_date;
        }
        self.is_published = draft.is_published;
        self.category_id = draft.category_id;
        self.location_id = draft.location_id;
        self.image = draft.image;
    }
}

/// Submitted post form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostDraft {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub pub_date: Option<DateTime<Utc>>,
    #[serde(default = "default_published")]
    pub is_published: bool,
    #[serde(default)]
    pub category_id: Option<Uuid>,
    #[serde(default)]
    pub location_id: Option<Uuid>,
    #[serde(default)]
    pub image: Option<String>,
}

fn default_published() -> bool {
    true
}

impl Default for PostDraft {
    fn default() -> Self {
        Self {
            title: String::new(),
            text: String::new(),
            pub_date: None,
            is_published: default_published(),
            category_id: None,
            location_id: None,
            image: None,
        }
    }
}

impl PostDraft {
    pub fn from_post(post: &Post) -> Self {
        Self {
            title: post.title.clone(),
            text: post.text.clone(),
            pub_date: Some(post.pub_date),
            is_published: post.is_published,
            category_id: post.category_id,
            location_id: post.location_id,
            image: post.image.clone(),
        }
    }

    /// Field checks that need no storage access. Existence of the referenced
    /// category and location is checked by the post service.
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        if self.title.trim().is_empty() {
            errors.add("title", "This field is required.");
        } else if self.title.chars().count() > TITLE_MAX_LENGTH {
            errors.add(
                "title",
                format!("Ensure this value has at most {TITLE_MAX_LENGTH} characters."),
            );
        }
        if self.text.trim().is_empty() {
            errors.add("text", "This field is required.");
        }
        if self.category_id.is_none() {
            errors.add("category_id", "This field is required.");
        }
        if self.image.as_deref().is_some_and(|image| image.trim().is_empty()) {
            errors.add("image", "The submitted file is empty.");
        }
        errors
    }
}

/// A post annotated with its number of comments, as listed in feeds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostSummary {
    #[serde(flatten)]
    pub post: Post,
    pub comment_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> PostDraft {
        PostDraft {
            title: "Morning in the hills".to_string(),
            text: "Fog, then sun.".to_string(),
            pub_date: None,
            is_published: true,
            category_id: Some(Uuid::new_v4()),
            location_id: None,
            image: None,
        }
    }

    #[test]
    fn test_new_post_defaults_pub_date_to_now() {
        let before = Utc::now();
        let post = Post::new(Uuid::new_v4(), draft());
        assert!(post.pub_date >= before);
        assert!(post.pub_date <= Utc::now());
    }

    #[test]
    fn test_apply_keeps_pub_date_when_absent() {
        let mut post = Post::new(Uuid::new_v4(), draft());
        let original = post.pub_date;

        let mut edit = draft();
        edit.title = "Evening in the hills".to_string();
        post.apply(edit);

        assert_eq!(post.title, "Evening in the hills");
        assert_eq!(post.pub_date, original);
    }

    #[test]
    fn test_validate_required_fields() {
        let errors = PostDraft {
            title: "  ".to_string(),
            text: String::new(),
            category_id: None,
            ..draft()
        }
        .validate();

        assert!(errors.contains("title"));
        assert!(errors.contains("text"));
        assert!(errors.contains("category_id"));
        assert!(!errors.contains("location_id"));
    }

    #[test]
    fn test_validate_title_length() {
        let errors = PostDraft {
            title: "x".repeat(TITLE_MAX_LENGTH + 1),
            ..draft()
        }
        .validate();
        assert!(errors.contains("title"));
        assert!(draft().validate().is_empty());
    }

    #[test]
    fn test_draft_deserializes_with_defaults() {
        let category = Uuid::new_v4();
        let draft: PostDraft = serde_json::from_value(serde_json::json!({
            "title": "t",
            "text": "x",
            "category_id": category,
        }))
        .unwrap();

        assert!(draft.is_published);
        assert_eq!(draft.pub_date, None);
        assert_eq!(draft.category_id, Some(category));
    }
}
