use async_trait::async_trait;
use deadpool_postgres::Pool;
use log::info;
use tokio_postgres::error::SqlState;
use tokio_postgres::types::ToSql;
use tokio_postgres::Row;

use super::{RepoError, Repository};
use crate::models::comment::{Comment, NewComment};
use crate::models::group::{Group, GroupSummary, NewGroup};
use crate::models::post::{NewPost, Post, PostChanges, PostFilter};
use crate::models::user::{NewUser, User, UserSummary};

const MIGRATION: &str = include_str!("../../migrations/0001_init.sql");

const POST_SELECT: &str = "SELECT p.id, p.text, p.pub_date, p.image, u.id, u.username, g.id, g.title, g.slug \
     FROM posts p \
     JOIN users u ON u.id = p.author_id \
     LEFT JOIN post_groups g ON g.id = p.group_id";

const POST_ORDER: &str = " ORDER BY p.pub_date DESC, p.id DESC";

/// Repository for the Postgres schema in `migrations/`.
#[derive(Clone)]
pub struct PgRepository {
    pool: Pool,
}

impl PgRepository {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Applies the (idempotent) schema.
    pub async fn migrate(&self) -> Result<(), RepoError> {
        let client = self.pool.get().await?;
        client.batch_execute(MIGRATION).await?;
        info!("database schema is up to date");
        Ok(())
    }
}

fn filter_clause(filter: PostFilter) -> (&'static str, Option<i64>) {
    match filter {
        PostFilter::All => ("", None),
        PostFilter::Group(id) => (" WHERE p.group_id = $1", Some(id)),
        PostFilter::Author(id) => (" WHERE p.author_id = $1", Some(id)),
        PostFilter::FollowedBy(id) => (
            " WHERE p.author_id IN (SELECT f.author_id FROM follows f WHERE f.user_id = $1)",
            Some(id),
        ),
    }
}

/// Maps a unique violation to `Conflict`, everything else passes through.
fn conflict_or(err: tokio_postgres::Error, what: &'static str) -> RepoError {
    if err.code() == Some(&SqlState::UNIQUE_VIOLATION) {
        RepoError::Conflict(what)
    } else {
        RepoError::Postgres(err)
    }
}

fn user_from_row(row: &Row) -> User {
    User {
        id: row.get(0),
        username: row.get(1),
        password_hash: row.get(2),
        date_joined: row.get(3),
    }
}

fn group_from_row(row: &Row) -> Group {
    Group {
        id: row.get(0),
        title: row.get(1),
        slug: row.get(2),
        description: row.get(3),
    }
}

fn post_from_row(row: &Row) -> Post {
    let group_id: Option<i64> = row.get(6);
    Post {
        id: row.get(0),
        text: row.get(1),
        pub_date: row.get(2),
        image: row.get(3),
        author: UserSummary {
            id: row.get(4),
            username: row.get(5),
        },
        group: group_id.map(|id| GroupSummary {
            id,
            title: row.get(7),
            slug: row.get(8),
        }),
    }
}

#[async_trait]
impl Repository for PgRepository {
    async fn create_user(&self, new: NewUser) -> Result<User, RepoError> {
        let client = self.pool.get().await?;
        let row = client
            .query_one(
                "INSERT INTO users (username, password_hash) VALUES ($1, $2) \
                 RETURNING id, username, password_hash, date_joined",
                &[&new.username, &new.password_hash],
            )
            .await
            .map_err(|e| conflict_or(e, "username"))?;
        Ok(user_from_row(&row))
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                "SELECT id, username, password_hash, date_joined FROM users WHERE username = $1",
                &[&username],
            )
            .await?;
        Ok(row.as_ref().map(user_from_row))
    }

    async fn create_group(&self, new: NewGroup) -> Result<Group, RepoError> {
        let client = self.pool.get().await?;
        let row = client
            .query_one(
                "INSERT INTO post_groups (title, slug, description) VALUES ($1, $2, $3) \
                 RETURNING id, title, slug, description",
                &[&new.title, &new.slug, &new.description],
            )
            .await
            .map_err(|e| conflict_or(e, "group slug"))?;
        Ok(group_from_row(&row))
    }

    async fn find_group_by_slug(&self, slug: &str) -> Result<Option<Group>, RepoError> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                "SELECT id, title, slug, description FROM post_groups WHERE slug = $1",
                &[&slug],
            )
            .await?;
        Ok(row.as_ref().map(group_from_row))
    }

    async fn list_groups(&self) -> Result<Vec<Group>, RepoError> {
        let client = self.pool.get().await?;
        let rows = client
            .query(
                "SELECT id, title, slug, description FROM post_groups ORDER BY title, id",
                &[],
            )
            .await?;
        Ok(rows.iter().map(group_from_row).collect())
    }

    async fn create_post(&self, new: NewPost) -> Result<Post, RepoError> {
        let client = self.pool.get().await?;
        let row = client
            .query_one(
                "INSERT INTO posts (author_id, text, group_id, image) VALUES ($1, $2, $3, $4) RETURNING id",
                &[&new.author_id, &new.text, &new.group_id, &new.image],
            )
            .await?;
        let id: i64 = row.get(0);
        drop(client);
        self.find_post(id).await?.ok_or(RepoError::NotFound)
    }

    async fn find_post(&self, id: i64) -> Result<Option<Post>, RepoError> {
        let client = self.pool.get().await?;
        let sql = format!("{POST_SELECT} WHERE p.id = $1");
        let row = client.query_opt(sql.as_str(), &[&id]).await?;
        Ok(row.as_ref().map(post_from_row))
    }

    async fn update_post(&self, id: i64, changes: PostChanges) -> Result<Post, RepoError> {
        let client = self.pool.get().await?;
        let updated = client
            .execute(
                "UPDATE posts SET text = $1, group_id = $2, image = $3 WHERE id = $4",
                &[&changes.text, &changes.group_id, &changes.image, &id],
            )
            .await?;
        if updated == 0 {
            return Err(RepoError::NotFound);
        }
        drop(client);
        self.find_post(id).await?.ok_or(RepoError::NotFound)
    }

    async fn delete_post(&self, id: i64) -> Result<(), RepoError> {
        let client = self.pool.get().await?;
        let deleted = client
            .execute("DELETE FROM posts WHERE id = $1", &[&id])
            .await?;
        if deleted == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn count_posts(&self, filter: PostFilter) -> Result<u64, RepoError> {
        let client = self.pool.get().await?;
        let (clause, arg) = filter_clause(filter);
        let sql = format!("SELECT COUNT(*) FROM posts p{clause}");
        let row = match arg {
            Some(id) => client.query_one(sql.as_str(), &[&id]).await?,
            None => client.query_one(sql.as_str(), &[]).await?,
        };
        let count: i64 = row.get(0);
        Ok(count as u64)
    }

    async fn list_posts(
        &self,
        filter: PostFilter,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<Post>, RepoError> {
        let client = self.pool.get().await?;
        let (clause, arg) = filter_clause(filter);
        let limit = limit as i64;
        let offset = offset as i64;

        let mut params: Vec<&(dyn ToSql + Sync)> = Vec::with_capacity(3);
        if let Some(id) = arg.as_ref() {
            params.push(id);
        }
        let sql = format!(
            "{POST_SELECT}{clause}{POST_ORDER} LIMIT ${} OFFSET ${}",
            params.len() + 1,
            params.len() + 2
        );
        params.push(&limit);
        params.push(&offset);

        let rows = client.query(sql.as_str(), &params).await?;
        Ok(rows.iter().map(post_from_row).collect())
    }

    async fn create_comment(&self, new: NewComment) -> Result<Comment, RepoError> {
        let client = self.pool.get().await?;
        let row = client
            .query_one(
                "WITH inserted AS ( \
                     INSERT INTO comments (post_id, author_id, text) VALUES ($1, $2, $3) \
                     RETURNING id, post_id, author_id, text, created \
                 ) \
                 SELECT i.id, i.post_id, u.id, u.username, i.text, i.created \
                 FROM inserted i JOIN users u ON u.id = i.author_id",
                &[&new.post_id, &new.author_id, &new.text],
            )
            .await?;
        Ok(comment_from_row(&row))
    }

    async fn list_comments(&self, post_id: i64) -> Result<Vec<Comment>, RepoError> {
        let client = self.pool.get().await?;
        let rows = client
            .query(
                "SELECT c.id, c.post_id, u.id, u.username, c.text, c.created \
                 FROM comments c JOIN users u ON u.id = c.author_id \
                 WHERE c.post_id = $1 ORDER BY c.created, c.id",
                &[&post_id],
            )
            .await?;
        Ok(rows.iter().map(comment_from_row).collect())
    }

    async fn follow(&self, user_id: i64, author_id: i64) -> Result<bool, RepoError> {
        let client = self.pool.get().await?;
        let inserted = client
            .execute(
                "INSERT INTO follows (user_id, author_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
                &[&user_id, &author_id],
            )
            .await?;
        Ok(inserted > 0)
    }

    async fn unfollow(&self, user_id: i64, author_id: i64) -> Result<bool, RepoError> {
        let client = self.pool.get().await?;
        let deleted = client
            .execute(
                "DELETE FROM follows WHERE user_id = $1 AND author_id = $2",
                &[&user_id, &author_id],
            )
            .await?;
        Ok(deleted > 0)
    }

    async fn is_following(&self, user_id: i64, author_id: i64) -> Result<bool, RepoError> {
        let client = self.pool.get().await?;
        let row = client
            .query_one(
                "SELECT EXISTS (SELECT 1 FROM follows WHERE user_id = $1 AND author_id = $2)",
                &[&user_id, &author_id],
            )
            .await?;
        Ok(row.get(0))
    }

    async fn count_following(&self, user_id: i64) -> Result<u64, RepoError> {
        let client = self.pool.get().await?;
        let row = client
            .query_one("SELECT COUNT(*) FROM follows WHERE user_id = $1", &[&user_id])
            .await?;
        let count: i64 = row.get(0);
        Ok(count as u64)
    }

    async fn count_followers(&self, author_id: i64) -> Result<u64, RepoError> {
        let client = self.pool.get().await?;
        let row = client
            .query_one("SELECT COUNT(*) FROM follows WHERE author_id = $1", &[&author_id])
            .await?;
        let count: i64 = row.get(0);
        Ok(count as u64)
    }
}

fn comment_from_row(row: &Row) -> Comment {
    Comment {
        id: row.get(0),
        post_id: row.get(1),
        author: UserSummary {
            id: row.get(2),
            username: row.get(3),
        },
        text: row.get(4),
        created: row.get(5),
    }
}
