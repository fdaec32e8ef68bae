use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::group::GroupSummary;
use crate::models::user::UserSummary;

/// A post joined with its author and (optional) group, the shape every feed renders.
#[derive(Debug, Clone, Serialize)]
pub struct Post {
    pub id: i64,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub author: UserSummary,
    pub group: Option<GroupSummary>,
    /// Path relative to the media root, e.g. `posts/3f1c….gif`
    pub image: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub author_id: i64,
    pub text: String,
    pub group_id: Option<i64>,
    pub image: Option<String>,
}

/// Full replacement of the editable columns of a post.
#[derive(Debug, Clone)]
pub struct PostChanges {
    pub text: String,
    pub group_id: Option<i64>,
    pub image: Option<String>,
}

/// Which slice of the post table a feed shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostFilter {
    All,
    Group(i64),
    Author(i64),
    /// Posts whose author is followed by the given user
    FollowedBy(i64),
}
