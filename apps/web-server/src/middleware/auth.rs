//! Authentication extractors.
//!
//! Requests carry a `Bearer` token. A protected route visited without one
//! redirects to the login page with the original path in `next`; a token
//! that is present but invalid is rejected with `401`.

use actix_web::{FromRequest, HttpRequest, HttpResponse, dev::Payload, http::header, web};
use std::future::{Ready, ready};
use uuid::Uuid;

use inkpost_core::domain::Viewer;
use inkpost_core::ports::{AuthError, ROLE_STAFF, TokenClaims, TokenService};
use inkpost_shared::ErrorResponse;

use crate::state::AppState;

/// Authenticated user identity extractor.
///
/// Use this in handlers to require authentication:
/// ```ignore
/// async fn delete(state: web::Data<AppState>, identity: Identity, id: web::Path<Uuid>) -> AppResult<HttpResponse> {
///     state.posts.delete(*id, &identity.viewer()).await?;
///     ...
/// }
/// ```
///
/// The token's username is not kept: it goes stale when the user renames
/// themselves, so handlers look the account up by `user_id`.
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: Uuid,
    pub roles: Vec<String>,
}

impl Identity {
    /// Check if the user has a specific role.
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    pub fn viewer(&self) -> Viewer {
        Viewer::Member {
            user_id: self.user_id,
            is_staff: self.has_role(ROLE_STAFF),
        }
    }
}

impl From<TokenClaims> for Identity {
    fn from(claims: TokenClaims) -> Self {
        Self {
            user_id: claims.user_id,
            roles: claims.roles,
        }
    }
}

/// Error type for authentication failures.
#[derive(Debug)]
pub enum AuthenticationError {
    /// No credentials at all.
    LoginRequired { login_url: String, next: String },
    /// Credentials were sent but are not acceptable.
    Rejected(AuthError),
}

impl std::fmt::Display for AuthenticationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthenticationError::LoginRequired { next, .. } => {
                write!(f, "Login required for {}", next)
            }
            AuthenticationError::Rejected(e) => write!(f, "{}", e),
        }
    }
}

impl actix_web::ResponseError for AuthenticationError {
    fn status_code(&self) -> actix_web::http::StatusCode {
        match self {
            AuthenticationError::LoginRequired { .. } => actix_web::http::StatusCode::SEE_OTHER,
            AuthenticationError::Rejected(AuthError::HashingError(_)) => {
                actix_web::http::StatusCode::INTERNAL_SERVER_ERROR
            }
            AuthenticationError::Rejected(_) => actix_web::http::StatusCode::UNAUTHORIZED,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error = match self {
            AuthenticationError::LoginRequired { login_url, next } => {
                let location = format!("{}?next={}", login_url, encode_query_value(next));
                return HttpResponse::SeeOther()
                    .insert_header((header::LOCATION, location))
                    .finish();
            }
            AuthenticationError::Rejected(AuthError::TokenExpired) => {
                ErrorResponse::new(401, "Token Expired")
                    .with_detail("Your authentication token has expired. Please login again.")
            }
            AuthenticationError::Rejected(AuthError::InvalidToken(msg)) => {
                ErrorResponse::new(401, "Invalid Token").with_detail(msg.clone())
            }
            AuthenticationError::Rejected(AuthError::HashingError(_)) => {
                ErrorResponse::internal_error()
            }
            AuthenticationError::Rejected(_) => ErrorResponse::unauthorized(),
        };

        HttpResponse::build(self.status_code()).json(error)
    }
}

/// Percent-encode everything but unreserved characters and `/`.
fn encode_query_value(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b'/' => {
                encoded.push(byte as char)
            }
            _ => encoded.push_str(&format!("%{:02X}", byte)),
        }
    }
    encoded
}

/// The bearer token of a request, `None` when no `Authorization` header is
/// present.
fn bearer_token(req: &HttpRequest) -> Result<Option<&str>, AuthError> {
    let Some(value) = req.headers().get(header::AUTHORIZATION) else {
        return Ok(None);
    };
    let value = value
        .to_str()
        .map_err(|_| AuthError::InvalidToken("Invalid authorization header".to_string()))?;
    value
        .strip_prefix("Bearer ")
        .map(Some)
        .ok_or_else(|| AuthError::InvalidToken("Expected Bearer token".to_string()))
}

/// Decode the request's credentials, if any.
fn authenticate(req: &HttpRequest) -> Result<Option<Identity>, AuthError> {
    let Some(token) = bearer_token(req)? else {
        return Ok(None);
    };
    let Some(state) = req.app_data::<web::Data<AppState>>() else {
        tracing::error!("AppState not found in app data");
        return Err(AuthError::InvalidToken("Server configuration error".to_string()));
    };
    let claims = state.tokens.validate_token(token)?;
    Ok(Some(Identity::from(claims)))
}

impl FromRequest for Identity {
    type Error = AuthenticationError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let result = match authenticate(req) {
            Ok(Some(identity)) => Ok(identity),
            Ok(None) => {
                let login_url = req
                    .app_data::<web::Data<AppState>>()
                    .map(|state| state.login_url.clone())
                    .unwrap_or_else(|| "/auth/login/".to_string());
                let next = req
                    .uri()
                    .path_and_query()
                    .map(|pq| pq.as_str().to_string())
                    .unwrap_or_else(|| req.path().to_string());
                Err(AuthenticationError::LoginRequired { login_url, next })
            }
            Err(e) => {
                tracing::debug!(error = %e, "Rejected credentials");
                Err(AuthenticationError::Rejected(e))
            }
        };
        ready(result)
    }
}

/// Optional identity extractor - anonymous when no credentials are sent.
pub struct OptionalIdentity(pub Option<Identity>);

impl OptionalIdentity {
    pub fn viewer(&self) -> Viewer {
        self.0
            .as_ref()
            .map(Identity::viewer)
            .unwrap_or(Viewer::Anonymous)
    }
}

impl FromRequest for OptionalIdentity {
    type Error = AuthenticationError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(
            authenticate(req)
                .map(OptionalIdentity)
                .map_err(AuthenticationError::Rejected),
        )
    }
}
