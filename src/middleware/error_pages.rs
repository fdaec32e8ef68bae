use actix_web::body::MessageBody;
use actix_web::dev::ServiceResponse;
use actix_web::http::StatusCode;
use actix_web::middleware::{ErrorHandlerResponse, ErrorHandlers};
use log::error;

use super::auth_extractor::authenticate;
use crate::handlers::base_context;
use crate::templates;

/// Re-renders the 404 and 500 pages for logged-in users so the navigation
/// bar shows their account. Guests keep the page built by `AppError`.
pub fn error_pages<B: MessageBody + 'static>() -> ErrorHandlers<B> {
    ErrorHandlers::new()
        .handler(StatusCode::NOT_FOUND, with_viewer::<B>)
        .handler(StatusCode::INTERNAL_SERVER_ERROR, with_viewer::<B>)
}

fn with_viewer<B: MessageBody + 'static>(
    res: ServiceResponse<B>,
) -> actix_web::Result<ErrorHandlerResponse<B>> {
    let Ok(viewer) = authenticate(res.request()) else {
        return Ok(ErrorHandlerResponse::Response(res.map_into_left_body()));
    };

    let template = if res.status() == StatusCode::NOT_FOUND {
        "core/404.html"
    } else {
        "core/500.html"
    };
    let body = match templates::render(template, &base_context(Some(&viewer))) {
        Ok(body) => body,
        Err(e) => {
            error!("failed to render {} for {}: {}", template, viewer.username, e);
            return Ok(ErrorHandlerResponse::Response(res.map_into_left_body()));
        }
    };

    let (req, res) = res.into_parts();
    let res = res.set_body(body);
    Ok(ErrorHandlerResponse::Response(
        ServiceResponse::new(req, res)
            .map_into_boxed_body()
            .map_into_right_body(),
    ))
}
