use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::FieldErrors;
use crate::ports::{ROLE_STAFF, ROLE_USER};

const USERNAME_MAX_LENGTH: usize = 150;
const NAME_MAX_LENGTH: usize = 150;

/// User entity - an author of posts and comments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
    /// Staff may delete any post or comment.
    pub is_staff: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new regular user with generated ID and timestamps.
    pub fn new(username: String, email: String, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            username,
            email,
            first_name: String::new(),
            last_name: String::new(),
            password_hash,
            is_staff: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn staff(mut self) -> Self {
        self.is_staff = true;
        self
    }

    /// Roles embedded in issued tokens.
    pub fn roles(&self) -> Vec<String> {
        let mut roles = vec![ROLE_USER.to_string()];
        if self.is_staff {
            roles.push(ROLE_STAFF.to_string());
        }
        roles
    }

    pub fn apply(&mut self, changes: ProfileChanges) {
        self.first_name = changes.first_name;
        self.last_name = changes.last_name;
        self.username = changes.username;
        self.email = changes.email;
        self.updated_at = Utc::now();
    }
}

/// Editable profile fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileChanges {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub username: String,
    pub email: String,
}

impl ProfileChanges {
    pub fn from_user(user: &User) -> Self {
        Self {
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
        }
    }

    pub fn normalized(mut self) -> Self {
        self.username = self.username.trim().to_string();
        self.email = self.email.trim().to_lowercase();
        self.first_name = self.first_name.trim().to_string();
        self.last_name = self.last_name.trim().to_string();
        self
    }

    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        validate_username(&self.username, &mut errors);
        validate_email(&self.email, &mut errors);
        for (field, value) in [("first_name", &self.first_name), ("last_name", &self.last_name)] {
            if value.chars().count() > NAME_MAX_LENGTH {
                errors.add(
                    field,
                    format!("Ensure this value has at most {NAME_MAX_LENGTH} characters."),
                );
            }
        }
        errors
    }
}

/// Usernames are 1-150 characters of letters, digits and `@.+-_`.
pub fn validate_username(username: &str, errors: &mut FieldErrors) {
    if username.is_empty() {
        errors.add("username", "This field is required.");
        return;
    }
    if username.chars().count() > USERNAME_MAX_LENGTH {
        errors.add(
            "username",
            format!("Ensure this value has at most {USERNAME_MAX_LENGTH} characters."),
        );
    }
    let allowed = |c: char| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_');
    if !username.chars().all(allowed) {
        errors.add(
            "username",
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
        );
    }
}

pub fn validate_email(email: &str, errors: &mut FieldErrors) {
    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if !valid {
        errors.add("email", "Enter a valid email address.");
    }
}
