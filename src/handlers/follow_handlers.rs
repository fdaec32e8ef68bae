use actix_web::{get, web, HttpResponse};
use log::info;

use super::{base_context, profile_url, redirect, render, requested_page, PageQuery};
use crate::error::AppError;
use crate::middleware::auth_extractor::AuthenticatedUser;
use crate::models::post::PostFilter;
use crate::services::feed_services::{follow_author, load_feed_page, unfollow_author};
use crate::AppState;

/// GET /follow/
/// Posts by the authors the user follows
#[get("/follow/")]
pub async fn follow_index(
    user: AuthenticatedUser,
    state: web::Data<AppState>,
    query: Option<web::Query<PageQuery>>,
) -> Result<HttpResponse, AppError> {
    let page = load_feed_page(
        state.repo.as_ref(),
        &state.paginator,
        PostFilter::FollowedBy(user.user_id),
        requested_page(&query),
    )
    .await?;

    let mut ctx = base_context(Some(&user));
    ctx.insert("page_obj", &page);
    render("posts/follow.html", &ctx)
}

#[get("/profile/{username}/follow/")]
pub async fn profile_follow(
    user: AuthenticatedUser,
    state: web::Data<AppState>,
    username: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let author = state
        .repo
        .find_user_by_username(&username)
        .await?
        .ok_or(AppError::NotFound)?;

    if follow_author(state.repo.as_ref(), user.user_id, author.id).await? {
        info!("{} now follows {}", user.username, author.username);
    }
    Ok(redirect(&profile_url(&author.username)))
}

#[get("/profile/{username}/unfollow/")]
pub async fn profile_unfollow(
    user: AuthenticatedUser,
    state: web::Data<AppState>,
    username: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let author = state
        .repo
        .find_user_by_username(&username)
        .await?
        .ok_or(AppError::NotFound)?;

    if unfollow_author(state.repo.as_ref(), user.user_id, author.id).await? {
        info!("{} unfollowed {}", user.username, author.username);
    }
    Ok(redirect(&profile_url(&author.username)))
}
