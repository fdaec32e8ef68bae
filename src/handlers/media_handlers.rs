use std::path::Path;

use actix_web::{get, web, HttpResponse};
use log::debug;

use crate::error::AppError;
use crate::services::media::ImageKind;
use crate::AppState;

/// GET /media/{path}
/// Uploaded post images
#[get("/media/{path:.*}")]
pub async fn serve_media(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let file_path = state.media.resolve(&path).ok_or(AppError::NotFound)?;

    let data = match tokio::fs::read(&file_path).await {
        Ok(data) => data,
        Err(e) => {
            debug!("media {} not readable: {}", file_path.display(), e);
            return Err(AppError::NotFound);
        }
    };

    let content_type = Path::new(path.as_str())
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(ImageKind::from_extension)
        .map(ImageKind::mime)
        .unwrap_or(mime::APPLICATION_OCTET_STREAM);

    Ok(HttpResponse::Ok().content_type(content_type).body(data))
}
