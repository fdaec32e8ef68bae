pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::comment::{Comment, NewComment};
use crate::models::group::{Group, NewGroup};
use crate::models::post::{NewPost, Post, PostChanges, PostFilter};
use crate::models::user::{NewUser, User};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("postgres error: {0}")]
    Postgres(#[from] tokio_postgres::Error),
    #[error("pool error: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),
    #[error("{0} already exists")]
    Conflict(&'static str),
    #[error("not found")]
    NotFound,
}

/// Everything the handlers read from or write to storage.
///
/// Posts always come back joined with their author and group and ordered
/// newest first (`pub_date DESC, id DESC`).
#[async_trait]
pub trait Repository: Send + Sync {
    async fn create_user(&self, new: NewUser) -> Result<User, RepoError>;
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, RepoError>;

    async fn create_group(&self, new: NewGroup) -> Result<Group, RepoError>;
    async fn find_group_by_slug(&self, slug: &str) -> Result<Option<Group>, RepoError>;
    async fn list_groups(&self) -> Result<Vec<Group>, RepoError>;

    async fn create_post(&self, new: NewPost) -> Result<Post, RepoError>;
    async fn find_post(&self, id: i64) -> Result<Option<Post>, RepoError>;
    async fn update_post(&self, id: i64, changes: PostChanges) -> Result<Post, RepoError>;
    async fn delete_post(&self, id: i64) -> Result<(), RepoError>;
    async fn count_posts(&self, filter: PostFilter) -> Result<u64, RepoError>;
    async fn list_posts(
        &self,
        filter: PostFilter,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<Post>, RepoError>;

    async fn create_comment(&self, new: NewComment) -> Result<Comment, RepoError>;
    /// Oldest first
    async fn list_comments(&self, post_id: i64) -> Result<Vec<Comment>, RepoError>;

    /// Returns `true` when a new edge was stored.
    async fn follow(&self, user_id: i64, author_id: i64) -> Result<bool, RepoError>;
    /// Returns `true` when an edge was removed.
    async fn unfollow(&self, user_id: i64, author_id: i64) -> Result<bool, RepoError>;
    async fn is_following(&self, user_id: i64, author_id: i64) -> Result<bool, RepoError>;
    async fn count_following(&self, user_id: i64) -> Result<u64, RepoError>;
    async fn count_followers(&self, author_id: i64) -> Result<u64, RepoError>;
}
