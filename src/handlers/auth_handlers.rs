use actix_web::http::header;
use actix_web::{get, post, web, HttpResponse};
use log::{info, warn};

use super::{base_context, render};
use crate::dtos::auth::{safe_next, LoginIn, NextQuery, SignupIn};
use crate::dtos::{add_error, FieldErrors};
use crate::error::AppError;
use crate::middleware::auth_extractor::AuthenticatedUser;
use crate::models::user::User;
use crate::services::auth_services::{AuthError, AuthService};
use crate::AppState;

fn render_signup(form: &SignupIn, errors: &FieldErrors) -> Result<HttpResponse, AppError> {
    let mut ctx = base_context(None);
    ctx.insert("form", form);
    ctx.insert("errors", errors);
    render("users/signup.html", &ctx)
}

fn render_login(form: &LoginIn, errors: &FieldErrors) -> Result<HttpResponse, AppError> {
    let mut ctx = base_context(None);
    ctx.insert("form", form);
    ctx.insert("errors", errors);
    render("users/login.html", &ctx)
}

/// Redirect that also sets the session cookie for `user`.
fn logged_in_redirect(auth: &AuthService, user: &User, location: &str) -> Result<HttpResponse, AppError> {
    let token = auth.issue_token(user)?;
    Ok(HttpResponse::Found()
        .insert_header((header::LOCATION, location))
        .cookie(auth.session_cookie(token))
        .finish())
}

#[get("/auth/signup/")]
pub async fn signup_form() -> Result<HttpResponse, AppError> {
    render_signup(&SignupIn::default(), &FieldErrors::new())
}

/// POST /auth/signup/
/// Creates the account and logs it in
#[post("/auth/signup/")]
pub async fn signup(
    state: web::Data<AppState>,
    auth: web::Data<AuthService>,
    body: web::Form<SignupIn>,
) -> Result<HttpResponse, AppError> {
    let form = body.into_inner();
    if let Err(errors) = form.validate() {
        return render_signup(&form, &errors);
    }

    match auth.register(state.repo.as_ref(), &form).await {
        Ok(user) => logged_in_redirect(&auth, &user, "/"),
        Err(AuthError::UsernameTaken) => {
            let mut errors = FieldErrors::new();
            add_error(&mut errors, "username", "A user with that username already exists.");
            render_signup(&form, &errors)
        }
        Err(e) => Err(e.into()),
    }
}

#[get("/auth/login/")]
pub async fn login_form(query: Option<web::Query<NextQuery>>) -> Result<HttpResponse, AppError> {
    let form = LoginIn {
        next: query.and_then(|q| q.into_inner().next),
        ..Default::default()
    };
    render_login(&form, &FieldErrors::new())
}

#[post("/auth/login/")]
pub async fn login(
    state: web::Data<AppState>,
    auth: web::Data<AuthService>,
    body: web::Form<LoginIn>,
) -> Result<HttpResponse, AppError> {
    let form = body.into_inner();
    if let Err(errors) = form.validate() {
        return render_login(&form, &errors);
    }

    match auth.login(state.repo.as_ref(), &form).await {
        Ok(user) => {
            info!("user {} logged in", user.username);
            let location = safe_next(form.next.as_deref()).unwrap_or("/");
            logged_in_redirect(&auth, &user, location)
        }
        Err(AuthError::InvalidCredentials) => {
            warn!("failed login for {:?}", form.username.trim());
            let mut errors = FieldErrors::new();
            add_error(
                &mut errors,
                "__all__",
                "Please enter a correct username and password. Note that both fields may be case-sensitive.",
            );
            render_login(&form, &errors)
        }
        Err(e) => Err(e.into()),
    }
}

#[get("/auth/logout/")]
pub async fn logout(
    viewer: Option<AuthenticatedUser>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    if let Some(user) = &viewer {
        info!("user {} logged out", user.username);
    }
    let body = crate::templates::render("users/logged_out.html", &base_context(None))?;
    Ok(HttpResponse::Ok()
        .content_type(mime::TEXT_HTML_UTF_8)
        .cookie(auth.expired_cookie())
        .body(body))
}
