//! Comment handlers. Every outcome of a write, allowed or not, redirects to
//! the post page.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use inkpost_core::domain::CommentDraft;
use inkpost_core::services::Authorized;
use inkpost_shared::dto::CommentFormResponse;

use super::{post_url, see_other};
use crate::middleware::auth::Identity;
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// POST /posts/{id}/comment/
pub async fn add_comment(
    state: web::Data<AppState>,
    identity: Identity,
    post_id: web::Path<Uuid>,
    body: web::Json<CommentDraft>,
) -> AppResult<HttpResponse> {
    let post_id = post_id.into_inner();
    state
        .comments
        .create(post_id, &identity.viewer(), body.into_inner())
        .await?;
    Ok(see_other(post_url(post_id)))
}

/// GET /posts/{id}/edit_comment/{comment_id}/
pub async fn edit_comment_form(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<(Uuid, Uuid)>,
) -> AppResult<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    match state
        .comments
        .edit_form(post_id, comment_id, &identity.viewer())
        .await?
    {
        Authorized::Granted(comment) => Ok(HttpResponse::Ok().json(CommentFormResponse {
            post_id,
            comment_id,
            text: comment.text,
        })),
        Authorized::Denied => Ok(see_other(post_url(post_id))),
    }
}

/// POST /posts/{id}/edit_comment/{comment_id}/
pub async fn edit_comment(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<(Uuid, Uuid)>,
    body: web::Json<CommentDraft>,
) -> AppResult<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    state
        .comments
        .edit(post_id, comment_id, &identity.viewer(), body.into_inner())
        .await?;
    Ok(see_other(post_url(post_id)))
}

/// POST /posts/{id}/delete_comment/{comment_id}/
pub async fn delete_comment(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<(Uuid, Uuid)>,
) -> AppResult<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    state
        .comments
        .delete(post_id, comment_id, &identity.viewer())
        .await?;
    Ok(see_other(post_url(post_id)))
}
