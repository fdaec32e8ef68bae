pub mod auth_handlers;
pub mod follow_handlers;
pub mod media_handlers;
pub mod post_handlers;

use actix_web::http::header;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use tera::Context;

use crate::error::AppError;
use crate::middleware::auth_extractor::AuthenticatedUser;
use crate::templates;

/// `?page=` as sent by the browser; parsing happens in the paginator.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

/// Handlers take `Option<web::Query<PageQuery>>`: a query string that does not
/// deserialize (a repeated `page`, say) shows the first page instead of a 400.
pub(crate) fn requested_page(query: &Option<web::Query<PageQuery>>) -> Option<&str> {
    query.as_ref().and_then(|q| q.page.as_deref())
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(post_handlers::index)
        .service(post_handlers::group_posts)
        .service(post_handlers::profile)
        .service(post_handlers::post_detail)
        .service(post_handlers::post_create_form)
        .service(post_handlers::post_create)
        .service(post_handlers::post_edit_form)
        .service(post_handlers::post_edit)
        .service(post_handlers::add_comment)
        .service(follow_handlers::follow_index)
        .service(follow_handlers::profile_follow)
        .service(follow_handlers::profile_unfollow)
        .service(auth_handlers::signup_form)
        .service(auth_handlers::signup)
        .service(auth_handlers::login_form)
        .service(auth_handlers::login)
        .service(auth_handlers::logout)
        .service(media_handlers::serve_media)
        .default_service(web::to(not_found));
}

async fn not_found() -> Result<HttpResponse, AppError> {
    Err(AppError::NotFound)
}

pub(crate) fn redirect(location: &str) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location))
        .finish()
}

pub(crate) fn profile_url(username: &str) -> String {
    format!("/profile/{}/", urlencoding::encode(username))
}

pub(crate) fn post_url(post_id: i64) -> String {
    format!("/posts/{post_id}/")
}

/// Context every page starts from; `viewer` drives the navigation bar.
pub(crate) fn base_context(viewer: Option<&AuthenticatedUser>) -> Context {
    let mut ctx = Context::new();
    ctx.insert("viewer", &viewer);
    ctx
}

pub(crate) fn html(body: String) -> HttpResponse {
    HttpResponse::Ok()
        .content_type(mime::TEXT_HTML_UTF_8)
        .body(body)
}

pub(crate) fn render(template: &str, ctx: &Context) -> Result<HttpResponse, AppError> {
    Ok(html(templates::render(template, ctx)?))
}
