//! HTTP handlers and route configuration.

mod auth;
mod comments;
mod health;
mod posts;
mod profiles;
mod views;


use actix_web::{HttpResponse, http::header, web};
use serde::Deserialize;
use uuid::Uuid;

use inkpost_core::pagination::PageRequest;

use crate::middleware::error::AppError;

/// `?page=` of the paginated feeds. Kept as a string so that garbage falls
/// back to the first page instead of failing extraction.
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

impl PageQuery {
    pub fn request(&self) -> PageRequest {
        PageRequest::parse(self.page.as_deref())
    }
}

/// `303 See Other` to `location`.
pub(crate) fn see_other(location: impl AsRef<str>) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location.as_ref()))
        .finish()
}

pub(crate) fn post_url(post_id: Uuid) -> String {
    format!("/posts/{}/", post_id)
}

pub(crate) fn profile_url(username: &str) -> String {
    format!("/profile/{}/", username)
}

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::PathConfig::default().error_handler(|_, _| AppError::NotFound.into()))
        .app_data(
            web::JsonConfig::default()
                .error_handler(|err, _| AppError::BadRequest(err.to_string()).into()),
        )
        .route("/health", web::get().to(health::health_check))
        .route("/", web::get().to(posts::index))
        .route("/category/{slug}/", web::get().to(posts::category_posts))
        // `create/` must be registered before `{id}/`
        .route("/posts/create/", web::get().to(posts::create_form))
        .route("/posts/create/", web::post().to(posts::create))
        .route("/posts/{id}/", web::get().to(posts::detail))
        .route("/posts/{id}/edit/", web::get().to(posts::edit_form))
        .route("/posts/{id}/edit/", web::post().to(posts::edit))
        .route("/posts/{id}/delete/", web::post().to(posts::delete))
        .route("/posts/{id}/comment/", web::post().to(comments::add_comment))
        .route(
            "/posts/{id}/edit_comment/{comment_id}/",
            web::get().to(comments::edit_comment_form),
        )
        .route(
            "/posts/{id}/edit_comment/{comment_id}/",
            web::post().to(comments::edit_comment),
        )
        .route(
            "/posts/{id}/delete_comment/{comment_id}/",
            web::post().to(comments::delete_comment),
        )
        .route("/profile/{username}/", web::get().to(profiles::profile))
        .route("/profile/{username}/edit/", web::get().to(profiles::edit_form))
        .route("/profile/{username}/edit/", web::post().to(profiles::edit))
        .service(
            web::scope("/auth")
                .route("/register/", web::post().to(auth::register))
                .route("/login/", web::post().to(auth::login))
                .route("/me/", web::get().to(auth::me)),
        );
}
