//! Authentication handlers.

use actix_web::{HttpResponse, web};

use inkpost_core::domain::{User, validate_email, validate_username};
use inkpost_core::error::FieldErrors;
use inkpost_core::ports::{
    AuthError, BaseRepository, PasswordService, TokenService, UserRepository,
};
use inkpost_shared::dto::{AuthResponse, LoginRequest, RegisterUserRequest};

use super::views;
use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

const PASSWORD_MIN_LENGTH: usize = 8;

/// POST /auth/register/
pub async fn register(
    state: web::Data<AppState>,
    body: web::Json<RegisterUserRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let username = req.username.trim().to_string();
    let email = req.email.trim().to_lowercase();

    let mut errors = FieldErrors::new();
    validate_username(&username, &mut errors);
    validate_email(&email, &mut errors);
    if req.password.chars().count() < PASSWORD_MIN_LENGTH {
        errors.add(
            "password",
            format!("This password is too short. It must contain at least {PASSWORD_MIN_LENGTH} characters."),
        );
    }
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    if state.users.find_by_username(&username).await?.is_some() {
        return Err(AppError::Conflict("Username already taken".to_string()));
    }
    if state.users.find_by_email(&email).await?.is_some() {
        return Err(AppError::Conflict("Email already registered".to_string()));
    }

    let password_hash = state.passwords.hash(&req.password)?;
    let user = state
        .users
        .create(User::new(username, email, password_hash))
        .await?;
    tracing::info!(user_id = %user.id, username = %user.username, "User registered");

    Ok(HttpResponse::Created().json(issue_token(&state, &user)?))
}

/// POST /auth/login/
pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    let user = state
        .users
        .find_by_username(req.username.trim())
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    if !state.passwords.verify(&req.password, &user.password_hash)? {
        tracing::debug!(username = %user.username, "Login with wrong password");
        return Err(AuthError::InvalidCredentials.into());
    }

    Ok(HttpResponse::Ok().json(issue_token(&state, &user)?))
}

/// GET /auth/me/ - the caller's own account.
pub async fn me(state: web::Data<AppState>, identity: Identity) -> AppResult<HttpResponse> {
    let user = state.profiles.current_user(identity.user_id).await?;
    Ok(HttpResponse::Ok().json(views::account(&user)))
}

fn issue_token(state: &AppState, user: &User) -> AppResult<AuthResponse> {
    let token = state
        .tokens
        .generate_token(user.id, &user.username, user.roles())
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(AuthResponse {
        access_token: token,
        token_type: "Bearer".to_string(),
        expires_in: state.tokens.expiration_seconds().max(0) as u64,
    })
}
