#![allow(dead_code)]

use std::sync::Arc;

use actix_web::body::MessageBody;
use actix_web::cookie::Cookie;
use actix_web::dev::ServiceResponse;
use actix_web::http::header;
use actix_web::web;
use async_trait::async_trait;
use tempfile::TempDir;

use postboard::config::AppConfig;
use postboard::models::comment::{Comment, NewComment};
use postboard::models::group::{Group, NewGroup};
use postboard::models::post::{NewPost, Post, PostChanges, PostFilter};
use postboard::models::user::{NewUser, User};
use postboard::repositories::memory::MemoryRepository;
use postboard::repositories::{RepoError, Repository};
use postboard::services::auth_services::AuthService;
use postboard::AppState;

pub const SMALL_GIF: &[u8] = b"GIF89a\x01\x00\x01\x00\x00\x00\x00\x21\xf9\x04\x01\x0a\x00\x01\x00\x2c\x00\x00\x00\x00\x01\x00\x01\x00\x00\x02\x02\x4c\x01\x00\x3b";

const BOUNDARY: &str = "----postboard-test-boundary";

/// Builds the full application around an in-memory repository.
macro_rules! test_app {
    ($ctx:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .wrap(postboard::middleware::error_pages::error_pages())
                .app_data($ctx.state.clone())
                .app_data($ctx.auth.clone())
                .configure(postboard::handlers::configure),
        )
        .await
    };
}

/// Shared state for one test; media files go to a temp dir removed on drop.
pub struct TestContext {
    pub repo: Arc<MemoryRepository>,
    pub state: web::Data<AppState>,
    pub auth: web::Data<AuthService>,
    pub media: TempDir,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_storage(|repo| repo as Arc<dyn Repository>)
    }

    /// Same data as `new`, but the app talks to whatever `wrap` builds
    /// around the memory repository.
    pub fn with_storage(wrap: impl FnOnce(Arc<MemoryRepository>) -> Arc<dyn Repository>) -> Self {
        let media = tempfile::tempdir().expect("create media dir");
        let config = AppConfig::development(media.path());
        let repo = Arc::new(MemoryRepository::new());
        let state = web::Data::new(AppState::new(wrap(repo.clone()), &config));
        let auth = web::Data::new(AuthService::new(&config));
        Self {
            repo,
            state,
            auth,
            media,
        }
    }

    /// A user whose password hash is a placeholder; log in via `cookie_for`.
    pub async fn user(&self, username: &str) -> User {
        self.repo
            .create_user(NewUser {
                username: username.to_string(),
                password_hash: "!unusable".to_string(),
            })
            .await
            .expect("create user")
    }

    pub async fn group(&self, title: &str, slug: &str) -> Group {
        self.repo
            .create_group(NewGroup {
                title: title.to_string(),
                slug: slug.to_string(),
                description: format!("{title} description"),
            })
            .await
            .expect("create group")
    }

    pub async fn post(&self, author: &User, text: &str, group: Option<&Group>) -> Post {
        self.repo
            .create_post(NewPost {
                author_id: author.id,
                text: text.to_string(),
                group_id: group.map(|g| g.id),
                image: None,
            })
            .await
            .expect("create post")
    }

    pub async fn posts(&self, author: &User, count: usize, group: Option<&Group>) {
        for i in 0..count {
            self.post(author, &format!("post number {i}"), group).await;
        }
    }

    pub async fn comment(&self, post: &Post, author: &User, text: &str) {
        self.repo
            .create_comment(NewComment {
                post_id: post.id,
                author_id: author.id,
                text: text.to_string(),
            })
            .await
            .expect("create comment");
    }

    pub async fn repo_follow(&self, user: &User, author: &User) {
        self.repo.follow(user.id, author.id).await.expect("follow");
    }

    pub fn cookie_for(&self, user: &User) -> Cookie<'static> {
        let token = self.auth.issue_token(user).expect("issue token");
        self.auth.session_cookie(token)
    }

    /// Files stored under the media root's `posts/` directory.
    pub fn stored_images(&self) -> usize {
        std::fs::read_dir(self.media.path().join("posts"))
            .map(|dir| dir.count())
            .unwrap_or(0)
    }
}

/// Memory storage whose `update_post` always fails.
pub struct FailingUpdates(pub Arc<MemoryRepository>);

#[async_trait]
impl Repository for FailingUpdates {
    async fn create_user(&self, new: NewUser) -> Result<User, RepoError> {
        self.0.create_user(new).await
    }
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        self.0.find_user_by_username(username).await
    }
    async fn create_group(&self, new: NewGroup) -> Result<Group, RepoError> {
        self.0.create_group(new).await
    }
    async fn find_group_by_slug(&self, slug: &str) -> Result<Option<Group>, RepoError> {
        self.0.find_group_by_slug(slug).await
    }
    async fn list_groups(&self) -> Result<Vec<Group>, RepoError> {
        self.0.list_groups().await
    }
    async fn create_post(&self, new: NewPost) -> Result<Post, RepoError> {
        self.0.create_post(new).await
    }
    async fn find_post(&self, id: i64) -> Result<Option<Post>, RepoError> {
        self.0.find_post(id).await
    }
    async fn update_post(&self, _id: i64, _changes: PostChanges) -> Result<Post, RepoError> {
        Err(RepoError::Conflict("post update"))
    }
    async fn delete_post(&self, id: i64) -> Result<(), RepoError> {
        self.0.delete_post(id).await
    }
    async fn count_posts(&self, filter: PostFilter) -> Result<u64, RepoError> {
        self.0.count_posts(filter).await
    }
    async fn list_posts(
        &self,
        filter: PostFilter,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<Post>, RepoError> {
        self.0.list_posts(filter, limit, offset).await
    }
    async fn create_comment(&self, new: NewComment) -> Result<Comment, RepoError> {
        self.0.create_comment(new).await
    }
    async fn list_comments(&self, post_id: i64) -> Result<Vec<Comment>, RepoError> {
        self.0.list_comments(post_id).await
    }
    async fn follow(&self, user_id: i64, author_id: i64) -> Result<bool, RepoError> {
        self.0.follow(user_id, author_id).await
    }
    async fn unfollow(&self, user_id: i64, author_id: i64) -> Result<bool, RepoError> {
        self.0.unfollow(user_id, author_id).await
    }
    async fn is_following(&self, user_id: i64, author_id: i64) -> Result<bool, RepoError> {
        self.0.is_following(user_id, author_id).await
    }
    async fn count_following(&self, user_id: i64) -> Result<u64, RepoError> {
        self.0.count_following(user_id).await
    }
    async fn count_followers(&self, author_id: i64) -> Result<u64, RepoError> {
        self.0.count_followers(author_id).await
    }
}

/// A multipart/form-data body with text fields and an optional
/// `(field, file name, content type, bytes)` file part.
pub fn multipart_body(
    fields: &[(&str, &str)],
    file: Option<(&str, &str, &str, &[u8])>,
) -> (String, Vec<u8>) {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
        );
        body.extend_from_slice(value.as_bytes());
        body.extend_from_slice(b"\r\n");
    }
    if let Some((name, file_name, content_type, bytes)) = file {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n\
                 Content-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    (format!("multipart/form-data; boundary={BOUNDARY}"), body)
}

pub fn location<B>(resp: &ServiceResponse<B>) -> String {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

pub async fn body_text<B: MessageBody>(resp: ServiceResponse<B>) -> String {
    let bytes = actix_web::test::read_body(resp).await;
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}

/// Number of rendered post cards on a page.
pub fn post_cards(html: &str) -> usize {
    html.matches("class=\"post-card\"").count()
}
