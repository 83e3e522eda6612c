//! Profile pages.

use actix_web::{HttpResponse, web};

use inkpost_core::domain::ProfileChanges;
use inkpost_core::services::Authorized;
use inkpost_shared::dto::{ProfileFormResponse, ProfileResponse};

use super::{PageQuery, profile_url, see_other, views};
use crate::middleware::auth::{Identity, OptionalIdentity};
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// GET /profile/{username}/
pub async fn profile(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    username: web::Path<String>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let profile = state
        .profiles
        .profile(&username, &identity.viewer(), query.request())
        .await?;
    Ok(HttpResponse::Ok().json(ProfileResponse {
        user: views::author(&profile.user),
        posts: views::feed(profile.posts),
    }))
}

/// GET /profile/{username}/edit/
pub async fn edit_form(
    state: web::Data<AppState>,
    identity: Identity,
    username: web::Path<String>,
) -> AppResult<HttpResponse> {
    match state.profiles.edit_form(&username, &identity.viewer()).await? {
        Authorized::Granted(form) => Ok(HttpResponse::Ok().json(ProfileFormResponse {
            first_name: form.first_name,
            last_name: form.last_name,
            username: form.username,
            email: form.email,
        })),
        Authorized::Denied => own_profile(&state, &identity).await,
    }
}

/// POST /profile/{username}/edit/
pub async fn edit(
    state: web::Data<AppState>,
    identity: Identity,
    username: web::Path<String>,
    body: web::Json<ProfileChanges>,
) -> AppResult<HttpResponse> {
    match state
        .profiles
        .edit(&username, &identity.viewer(), body.into_inner())
        .await?
    {
        Authorized::Granted(user) => Ok(see_other(profile_url(&user.username))),
        Authorized::Denied => own_profile(&state, &identity).await,
    }
}

/// Send someone editing another user's profile to their own.
async fn own_profile(state: &AppState, identity: &Identity) -> AppResult<HttpResponse> {
    let user = state.profiles.current_user(identity.user_id).await?;
    Ok(see_other(profile_url(&user.username)))
}
