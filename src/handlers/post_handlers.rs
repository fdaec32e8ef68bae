use actix_multipart::Multipart;
use actix_web::{get, post, route, web, HttpRequest, HttpResponse};
use log::{debug, info, warn};

use super::{base_context, html, post_url, profile_url, redirect, render, requested_page, PageQuery};
use crate::dtos::comment::CommentForm;
use crate::dtos::post::PostForm;
use crate::dtos::FieldErrors;
use crate::error::AppError;
use crate::middleware::auth_extractor::AuthenticatedUser;
use crate::models::comment::NewComment;
use crate::models::group::Group;
use crate::models::post::{NewPost, PostChanges, PostFilter};
use crate::services::feed_services::load_feed_page;
use crate::services::page_cache::PageCache;
use crate::{templates, AppState};

/// GET /
/// Every post, newest first. The rendered page is served from the
/// page cache until it expires.
#[get("/")]
pub async fn index(
    req: HttpRequest,
    state: web::Data<AppState>,
    viewer: Option<AuthenticatedUser>,
    query: Option<web::Query<PageQuery>>,
) -> Result<HttpResponse, AppError> {
    let path = req.uri().path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
    let key = PageCache::key(path, viewer.as_ref().map(|v| v.user_id));
    if let Some(cached) = state.page_cache.get(&key).await {
        debug!("index served from cache ({})", key);
        return Ok(html(cached));
    }

    let page = load_feed_page(
        state.repo.as_ref(),
        &state.paginator,
        PostFilter::All,
        requested_page(&query),
    )
    .await?;

    let mut ctx = base_context(viewer.as_ref());
    ctx.insert("page_obj", &page);
    let body = templates::render("posts/index.html", &ctx)?;
    state.page_cache.insert(key, body.clone()).await;
    Ok(html(body))
}

#[get("/group/{slug}/")]
pub async fn group_posts(
    state: web::Data<AppState>,
    viewer: Option<AuthenticatedUser>,
    slug: web::Path<String>,
    query: Option<web::Query<PageQuery>>,
) -> Result<HttpResponse, AppError> {
    let group = state
        .repo
        .find_group_by_slug(&slug)
        .await?
        .ok_or(AppError::NotFound)?;

    let page = load_feed_page(
        state.repo.as_ref(),
        &state.paginator,
        PostFilter::Group(group.id),
        requested_page(&query),
    )
    .await?;

    let mut ctx = base_context(viewer.as_ref());
    ctx.insert("group", &group);
    ctx.insert("page_obj", &page);
    render("posts/group_list.html", &ctx)
}

#[get("/profile/{username}/")]
pub async fn profile(
    state: web::Data<AppState>,
    viewer: Option<AuthenticatedUser>,
    username: web::Path<String>,
    query: Option<web::Query<PageQuery>>,
) -> Result<HttpResponse, AppError> {
    let author = state
        .repo
        .find_user_by_username(&username)
        .await?
        .ok_or(AppError::NotFound)?;

    let page = load_feed_page(
        state.repo.as_ref(),
        &state.paginator,
        PostFilter::Author(author.id),
        requested_page(&query),
    )
    .await?;

    let following = match &viewer {
        Some(v) => state.repo.is_following(v.user_id, author.id).await?,
        None => false,
    };
    let is_own_profile = viewer.as_ref().is_some_and(|v| v.user_id == author.id);

    let mut ctx = base_context(viewer.as_ref());
    ctx.insert("profile_user", &author);
    ctx.insert("posts_count", &page.count);
    ctx.insert("followers_count", &state.repo.count_followers(author.id).await?);
    ctx.insert("following_count", &state.repo.count_following(author.id).await?);
    ctx.insert("following", &following);
    ctx.insert("is_own_profile", &is_own_profile);
    ctx.insert("page_obj", &page);
    render("posts/profile.html", &ctx)
}

#[get("/posts/{post_id:\\d+}/")]
pub async fn post_detail(
    state: web::Data<AppState>,
    viewer: Option<AuthenticatedUser>,
    post_id: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let post = state
        .repo
        .find_post(*post_id)
        .await?
        .ok_or(AppError::NotFound)?;
    let comments = state.repo.list_comments(post.id).await?;
    let author_posts_count = state
        .repo
        .count_posts(PostFilter::Author(post.author.id))
        .await?;

    let mut ctx = base_context(viewer.as_ref());
    ctx.insert("post", &post);
    ctx.insert("author_posts_count", &author_posts_count);
    ctx.insert("comments", &comments);
    ctx.insert("form", &CommentForm::default());
    render("posts/post_detail.html", &ctx)
}

fn render_post_form(
    viewer: &AuthenticatedUser,
    form: &PostForm,
    groups: &[Group],
    errors: &FieldErrors,
    editing: Option<i64>,
) -> Result<HttpResponse, AppError> {
    let mut ctx = base_context(Some(viewer));
    ctx.insert("form", form);
    ctx.insert("groups", groups);
    ctx.insert("errors", errors);
    ctx.insert("is_edit", &editing.is_some());
    ctx.insert("post_id", &editing);
    render("posts/create_post.html", &ctx)
}

#[get("/create/")]
pub async fn post_create_form(
    user: AuthenticatedUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let groups = state.repo.list_groups().await?;
    render_post_form(&user, &PostForm::default(), &groups, &FieldErrors::new(), None)
}

#[post("/create/")]
pub async fn post_create(
    user: AuthenticatedUser,
    state: web::Data<AppState>,
    payload: Multipart,
) -> Result<HttpResponse, AppError> {
    let form = PostForm::from_multipart(payload).await?;
    let groups = state.repo.list_groups().await?;

    let clean = match form.validate(&groups) {
        Ok(clean) => clean,
        Err(errors) => {
            debug!("post form from {} rejected: {:?}", user.username, errors);
            return render_post_form(&user, &form, &groups, &errors, None);
        }
    };

    let image = match clean.image {
        Some((kind, bytes)) => Some(state.media.save_post_image(kind, bytes).await?),
        None => None,
    };

    let created = state
        .repo
        .create_post(NewPost {
            author_id: user.user_id,
            text: clean.text,
            group_id: clean.group_id,
            image: image.clone(),
        })
        .await;

    match created {
        Ok(post) => {
            info!("user {} created post {}", user.username, post.id);
            Ok(redirect(&profile_url(&user.username)))
        }
        Err(e) => {
            // Clean up uploaded file if the insert fails
            if let Some(path) = image {
                state.media.remove(&path).await;
            }
            Err(e.into())
        }
    }
}

#[get("/posts/{post_id:\\d+}/edit/")]
pub async fn post_edit_form(
    viewer: Option<AuthenticatedUser>,
    state: web::Data<AppState>,
    post_id: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let post = state
        .repo
        .find_post(*post_id)
        .await?
        .ok_or(AppError::NotFound)?;

    let Some(user) = viewer.filter(|v| v.user_id == post.author.id) else {
        return Ok(redirect(&post_url(post.id)));
    };

    let groups = state.repo.list_groups().await?;
    render_post_form(
        &user,
        &PostForm::for_post(&post),
        &groups,
        &FieldErrors::new(),
        Some(post.id),
    )
}

#[post("/posts/{post_id:\\d+}/edit/")]
pub async fn post_edit(
    viewer: Option<AuthenticatedUser>,
    state: web::Data<AppState>,
    post_id: web::Path<i64>,
    payload: Multipart,
) -> Result<HttpResponse, AppError> {
    let post = state
        .repo
        .find_post(*post_id)
        .await?
        .ok_or(AppError::NotFound)?;

    let Some(user) = viewer.filter(|v| v.user_id == post.author.id) else {
        warn!("edit of post {} refused for non-author", post.id);
        return Ok(redirect(&post_url(post.id)));
    };

    let mut form = PostForm::from_multipart(payload).await?;
    form.current_image = post.image.clone();
    let groups = state.repo.list_groups().await?;

    let clean = match form.validate(&groups) {
        Ok(clean) => clean,
        Err(errors) => return render_post_form(&user, &form, &groups, &errors, Some(post.id)),
    };

    let uploaded = match clean.image {
        Some((kind, bytes)) => Some(state.media.save_post_image(kind, bytes).await?),
        None => None,
    };
    let image = match &uploaded {
        Some(path) => Some(path.clone()),
        None if clean.clear_image => None,
        None => post.image.clone(),
    };

    let updated = state
        .repo
        .update_post(
            post.id,
            PostChanges {
                text: clean.text,
                group_id: clean.group_id,
                image,
            },
        )
        .await;

    if let Err(e) = updated {
        if let Some(path) = uploaded {
            state.media.remove(&path).await;
        }
        return Err(e.into());
    }
    info!("user {} edited post {}", user.username, post.id);
    Ok(redirect(&post_url(post.id)))
}

/// Invalid comments are dropped without telling the user; the response is
/// the same redirect either way.
#[route("/posts/{post_id:\\d+}/comment/", method = "GET", method = "POST")]
pub async fn add_comment(
    user: AuthenticatedUser,
    state: web::Data<AppState>,
    post_id: web::Path<i64>,
    form: Option<web::Form<CommentForm>>,
) -> Result<HttpResponse, AppError> {
    let post = state
        .repo
        .find_post(*post_id)
        .await?
        .ok_or(AppError::NotFound)?;

    match form.as_deref().map(CommentForm::validate) {
        Some(Ok(text)) => {
            let comment = state
                .repo
                .create_comment(NewComment {
                    post_id: post.id,
                    author_id: user.user_id,
                    text,
                })
                .await?;
            debug!("comment {} added to post {}", comment.id, post.id);
        }
        Some(Err(errors)) => debug!("comment on post {} dropped: {:?}", post.id, errors),
        None => debug!("comment request on post {} without a form body", post.id),
    }

    Ok(redirect(&post_url(post.id)))
}
