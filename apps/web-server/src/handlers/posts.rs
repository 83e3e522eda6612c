//! Feeds and post pages.

use actix_web::{HttpResponse, web};
use chrono::Utc;
use uuid::Uuid;

use inkpost_core::domain::PostDraft;
use inkpost_core::services::Authorized;
use inkpost_shared::dto::CategoryFeedResponse;

use super::{PageQuery, post_url, profile_url, see_other, views};
use crate::middleware::auth::{Identity, OptionalIdentity};
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// GET / - published posts, newest first.
pub async fn index(state: web::Data<AppState>, query: web::Query<PageQuery>) -> AppResult<HttpResponse> {
    let page = state.posts.home_feed(query.request()).await?;
    Ok(HttpResponse::Ok().json(views::feed(page)))
}

/// GET /category/{slug}/
pub async fn category_posts(
    state: web::Data<AppState>,
    slug: web::Path<String>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let (category, page) = state.posts.category_feed(&slug, query.request()).await?;
    Ok(HttpResponse::Ok().json(CategoryFeedResponse {
        category: views::category(&category),
        posts: views::feed(page),
    }))
}

/// GET /posts/{id}/
pub async fn detail(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    post_id: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let detail = state.posts.detail(*post_id, &identity.viewer()).await?;
    Ok(HttpResponse::Ok().json(views::detail(&detail)))
}

/// GET /posts/create/ - empty form with today's date.
pub async fn create_form(state: web::Data<AppState>, _identity: Identity) -> AppResult<HttpResponse> {
    let choices = state.posts.form_choices().await?;
    let draft = PostDraft {
        pub_date: Some(Utc::now()),
        ..PostDraft::default()
    };
    Ok(HttpResponse::Ok().json(views::post_form(draft, &choices)))
}

/// POST /posts/create/
pub async fn create(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<PostDraft>,
) -> AppResult<HttpResponse> {
    let author = state.profiles.current_user(identity.user_id).await?;
    state.posts.create(author.id, body.into_inner()).await?;
    Ok(see_other(profile_url(&author.username)))
}

/// GET /posts/{id}/edit/
pub async fn edit_form(
    state: web::Data<AppState>,
    identity: Identity,
    post_id: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let post_id = post_id.into_inner();
    match state.posts.edit_form(post_id, &identity.viewer()).await? {
        Authorized::Granted(post) => {
            let choices = state.posts.form_choices().await?;
            Ok(HttpResponse::Ok().json(views::post_form(PostDraft::from_post(&post), &choices)))
        }
        Authorized::Denied => Ok(see_other(post_url(post_id))),
    }
}

/// POST /posts/{id}/edit/
pub async fn edit(
    state: web::Data<AppState>,
    identity: Identity,
    post_id: web::Path<Uuid>,
    body: web::Json<PostDraft>,
) -> AppResult<HttpResponse> {
    let post_id = post_id.into_inner();
    state
        .posts
        .edit(post_id, &identity.viewer(), body.into_inner())
        .await?;
    Ok(see_other(post_url(post_id)))
}

/// POST /posts/{id}/delete/
pub async fn delete(
    state: web::Data<AppState>,
    identity: Identity,
    post_id: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let post_id = post_id.into_inner();
    match state.posts.delete(post_id, &identity.viewer()).await? {
        Authorized::Granted(_) => {
            let actor = state.profiles.current_user(identity.user_id).await?;
            Ok(see_other(profile_url(&actor.username)))
        }
        Authorized::Denied => Ok(see_other(post_url(post_id))),
    }
}
