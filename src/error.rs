use actix_web::http::{header, StatusCode};
use actix_web::{HttpResponse, ResponseError};
use log::error;
use tera::Context;
use thiserror::Error;

use crate::repositories::RepoError;
use crate::services::auth_services::AuthError;
use crate::services::media::MediaError;
use crate::templates;

pub const LOGIN_URL: &str = "/auth/login/";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("page not found")]
    NotFound,
    #[error("login required for {next}")]
    LoginRequired { next: String },
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error("template error: {0}")]
    Template(#[from] tera::Error),
    #[error(transparent)]
    Media(#[from] MediaError),
    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl From<actix_multipart::MultipartError> for AppError {
    fn from(err: actix_multipart::MultipartError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

/// Renders one of the `core/` error pages, falling back to plain text if
/// even that fails.
fn error_page(status: StatusCode, template: &str) -> HttpResponse {
    match templates::render(template, &Context::new()) {
        Ok(html) => HttpResponse::build(status)
            .content_type(mime::TEXT_HTML_UTF_8)
            .body(html),
        Err(e) => {
            error!("failed to render {}: {}", template, e);
            HttpResponse::build(status).body(status.to_string())
        }
    }
}

pub fn login_redirect(next: &str) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((
            header::LOCATION,
            format!("{LOGIN_URL}?next={}", urlencoding::encode(next)),
        ))
        .finish()
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound | AppError::Repo(RepoError::NotFound) => StatusCode::NOT_FOUND,
            AppError::LoginRequired { .. } => StatusCode::FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            AppError::NotFound | AppError::Repo(RepoError::NotFound) => {
                error_page(StatusCode::NOT_FOUND, "core/404.html")
            }
            AppError::LoginRequired { next } => login_redirect(next),
            AppError::BadRequest(msg) => HttpResponse::BadRequest().body(msg.clone()),
            other => {
                error!("request failed: {}", other);
                error_page(StatusCode::INTERNAL_SERVER_ERROR, "core/500.html")
            }
        }
    }
}
