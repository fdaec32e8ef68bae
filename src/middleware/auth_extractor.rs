use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use futures::future::{ready, Ready};
use log::{debug, error};
use serde::Serialize;

use crate::error::AppError;
use crate::services::auth_services::{AuthService, SESSION_COOKIE};

/// The logged-in user, read from the signed session cookie.
///
/// Requiring it turns a guest request into a redirect to the login page.
/// Take `Option<AuthenticatedUser>` on pages guests may also see.
#[derive(Debug, Clone, Serialize)]
pub struct AuthenticatedUser {
    pub user_id: i64,
    pub username: String,
}

impl FromRequest for AuthenticatedUser {
    type Error = AppError;
    type Future = Ready<Result<AuthenticatedUser, AppError>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}

pub(crate) fn authenticate(req: &HttpRequest) -> Result<AuthenticatedUser, AppError> {
    let login_required = || AppError::LoginRequired {
        next: req
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| req.path().to_string()),
    };

    let Some(auth) = req.app_data::<web::Data<AuthService>>() else {
        error!("AuthService is not registered as app data");
        return Err(login_required());
    };

    let cookie = req.cookie(SESSION_COOKIE).ok_or_else(login_required)?;

    let claims = auth.decode_token(cookie.value()).map_err(|e| {
        debug!("rejected session cookie: {}", e);
        login_required()
    })?;

    let user_id = claims.sub.parse::<i64>().map_err(|_| login_required())?;

    Ok(AuthenticatedUser {
        user_id,
        username: claims.username,
    })
}
