//! Authentication ports.

use uuid::Uuid;

/// Role carried by every account's token.
pub const ROLE_USER: &str = "user";
/// Role of moderators, who may delete any post or comment.
pub const ROLE_STAFF: &str = "staff";

/// What a verified access token says about its bearer.
#[derive(Debug, Clone)]
pub struct TokenClaims {
    pub user_id: Uuid,
    /// Username when the token was issued; it may have changed since.
    pub username: String,
    pub roles: Vec<String>,
    /// Expiry, seconds since the epoch.
    pub exp: i64,
}

impl TokenClaims {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    pub fn is_staff(&self) -> bool {
        self.has_role(ROLE_STAFF)
    }
}

/// Issues and checks bearer tokens.
pub trait TokenService: Send + Sync {
    fn generate_token(
        &self,
        user_id: Uuid,
        username: &str,
        roles: Vec<String>,
    ) -> Result<String, AuthError>;

    fn validate_token(&self, token: &str) -> Result<TokenClaims, AuthError>;

    /// Lifetime of issued tokens.
    fn expiration_seconds(&self) -> i64;
}

/// One-way password hashing.
pub trait PasswordService: Send + Sync {
    fn hash(&self, password: &str) -> Result<String, AuthError>;

    /// `Ok(false)` for a wrong password, `Err` only for an unreadable hash.
    fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError>;
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Hashing error: {0}")]
    HashingError(String),
}
