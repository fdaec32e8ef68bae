use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{RepoError, Repository};
use crate::models::comment::{Comment, NewComment};
use crate::models::group::{Group, GroupSummary, NewGroup};
use crate::models::post::{NewPost, Post, PostChanges, PostFilter};
use crate::models::user::{NewUser, User, UserSummary};

struct PostRow {
    id: i64,
    text: String,
    pub_date: DateTime<Utc>,
    author_id: i64,
    group_id: Option<i64>,
    image: Option<String>,
}

struct CommentRow {
    id: i64,
    post_id: i64,
    author_id: i64,
    text: String,
    created: DateTime<Utc>,
}

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    groups: Vec<Group>,
    posts: Vec<PostRow>,
    comments: Vec<CommentRow>,
    follows: Vec<(i64, i64)>,
    last_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn user(&self, id: i64) -> Result<&User, RepoError> {
        self.users.iter().find(|u| u.id == id).ok_or(RepoError::NotFound)
    }

    fn matches(&self, row: &PostRow, filter: PostFilter, followed: &HashSet<i64>) -> bool {
        match filter {
            PostFilter::All => true,
            PostFilter::Group(id) => row.group_id == Some(id),
            PostFilter::Author(id) => row.author_id == id,
            PostFilter::FollowedBy(_) => followed.contains(&row.author_id),
        }
    }

    fn followed_by(&self, filter: PostFilter) -> HashSet<i64> {
        match filter {
            PostFilter::FollowedBy(user_id) => self
                .follows
                .iter()
                .filter(|(u, _)| *u == user_id)
                .map(|(_, a)| *a)
                .collect(),
            _ => HashSet::new(),
        }
    }

    fn join_post(&self, row: &PostRow) -> Result<Post, RepoError> {
        let author = self.user(row.author_id)?;
        let group = row
            .group_id
            .and_then(|id| self.groups.iter().find(|g| g.id == id))
            .map(GroupSummary::from);
        Ok(Post {
            id: row.id,
            text: row.text.clone(),
            pub_date: row.pub_date,
            author: UserSummary::from(author),
            group,
            image: row.image.clone(),
        })
    }

    fn join_comment(&self, row: &CommentRow) -> Result<Comment, RepoError> {
        let author = self.user(row.author_id)?;
        Ok(Comment {
            id: row.id,
            post_id: row.post_id,
            author: UserSummary::from(author),
            text: row.text.clone(),
            created: row.created,
        })
    }

    /// Newest first, the same order the SQL repository uses.
    fn sorted_posts(&self, filter: PostFilter) -> Vec<&PostRow> {
        let followed = self.followed_by(filter);
        let mut rows: Vec<&PostRow> = self
            .posts
            .iter()
            .filter(|row| self.matches(row, filter, &followed))
            .collect();
        rows.sort_by(|a, b| b.pub_date.cmp(&a.pub_date).then(b.id.cmp(&a.id)));
        rows
    }
}

/// Process-local storage with the same constraints as the Postgres schema.
/// Used with `STORAGE=memory` and by the test suite.
#[derive(Default)]
pub struct MemoryRepository {
    tables: RwLock<Tables>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn create_user(&self, new: NewUser) -> Result<User, RepoError> {
        let mut tables = self.tables.write().await;
        if tables.users.iter().any(|u| u.username == new.username) {
            return Err(RepoError::Conflict("username"));
        }
        let user = User {
            id: tables.next_id(),
            username: new.username,
            password_hash: new.password_hash,
            date_joined: Utc::now(),
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.username == username).cloned())
    }

    async fn create_group(&self, new: NewGroup) -> Result<Group, RepoError> {
        let mut tables = self.tables.write().await;
        if tables.groups.iter().any(|g| g.slug == new.slug) {
            return Err(RepoError::Conflict("group slug"));
        }
        let group = Group {
            id: tables.next_id(),
            title: new.title,
            slug: new.slug,
            description: new.description,
        };
        tables.groups.push(group.clone());
        Ok(group)
    }

    async fn find_group_by_slug(&self, slug: &str) -> Result<Option<Group>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.groups.iter().find(|g| g.slug == slug).cloned())
    }

    async fn list_groups(&self) -> Result<Vec<Group>, RepoError> {
        let tables = self.tables.read().await;
        let mut groups = tables.groups.clone();
        groups.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));
        Ok(groups)
    }

    async fn create_post(&self, new: NewPost) -> Result<Post, RepoError> {
        let mut tables = self.tables.write().await;
        tables.user(new.author_id)?;
        let row = PostRow {
            id: tables.next_id(),
            text: new.text,
            pub_date: Utc::now(),
            author_id: new.author_id,
            group_id: new.group_id,
            image: new.image,
        };
        let post = tables.join_post(&row)?;
        tables.posts.push(row);
        Ok(post)
    }

    async fn find_post(&self, id: i64) -> Result<Option<Post>, RepoError> {
        let tables = self.tables.read().await;
        tables
            .posts
            .iter()
            .find(|p| p.id == id)
            .map(|row| tables.join_post(row))
            .transpose()
    }

    async fn update_post(&self, id: i64, changes: PostChanges) -> Result<Post, RepoError> {
        let mut tables = self.tables.write().await;
        let row = tables
            .posts
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(RepoError::NotFound)?;
        row.text = changes.text;
        row.group_id = changes.group_id;
        row.image = changes.image;

        let tables = &*tables;
        let row = tables
            .posts
            .iter()
            .find(|p| p.id == id)
            .ok_or(RepoError::NotFound)?;
        tables.join_post(row)
    }

    async fn delete_post(&self, id: i64) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        let before = tables.posts.len();
        tables.posts.retain(|p| p.id != id);
        if tables.posts.len() == before {
            return Err(RepoError::NotFound);
        }
        tables.comments.retain(|c| c.post_id != id);
        Ok(())
    }

    async fn count_posts(&self, filter: PostFilter) -> Result<u64, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.sorted_posts(filter).len() as u64)
    }

    async fn list_posts(
        &self,
        filter: PostFilter,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<Post>, RepoError> {
        let tables = self.tables.read().await;
        tables
            .sorted_posts(filter)
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .map(|row| tables.join_post(row))
            .collect()
    }

    async fn create_comment(&self, new: NewComment) -> Result<Comment, RepoError> {
        let mut tables = self.tables.write().await;
        if !tables.posts.iter().any(|p| p.id == new.post_id) {
            return Err(RepoError::NotFound);
        }
        tables.user(new.author_id)?;
        let row = CommentRow {
            id: tables.next_id(),
            post_id: new.post_id,
            author_id: new.author_id,
            text: new.text,
            created: Utc::now(),
        };
        let comment = tables.join_comment(&row)?;
        tables.comments.push(row);
        Ok(comment)
    }

    async fn list_comments(&self, post_id: i64) -> Result<Vec<Comment>, RepoError> {
        let tables = self.tables.read().await;
        let mut rows: Vec<&CommentRow> = tables
            .comments
            .iter()
            .filter(|c| c.post_id == post_id)
            .collect();
        rows.sort_by(|a, b| a.created.cmp(&b.created).then(a.id.cmp(&b.id)));
        rows.into_iter().map(|row| tables.join_comment(row)).collect()
    }

    async fn follow(&self, user_id: i64, author_id: i64) -> Result<bool, RepoError> {
        let mut tables = self.tables.write().await;
        tables.user(user_id)?;
        tables.user(author_id)?;
        if tables.follows.contains(&(user_id, author_id)) {
            return Ok(false);
        }
        tables.follows.push((user_id, author_id));
        Ok(true)
    }

    async fn unfollow(&self, user_id: i64, author_id: i64) -> Result<bool, RepoError> {
        let mut tables = self.tables.write().await;
        let before = tables.follows.len();
        tables.follows.retain(|edge| *edge != (user_id, author_id));
        Ok(tables.follows.len() != before)
    }

    async fn is_following(&self, user_id: i64, author_id: i64) -> Result<bool, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.follows.contains(&(user_id, author_id)))
    }

    async fn count_following(&self, user_id: i64) -> Result<u64, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.follows.iter().filter(|(u, _)| *u == user_id).count() as u64)
    }

    async fn count_followers(&self, author_id: i64) -> Result<u64, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.follows.iter().filter(|(_, a)| *a == author_id).count() as u64)
    }
}
