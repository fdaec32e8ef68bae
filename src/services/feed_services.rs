use log::debug;

use crate::models::post::{Post, PostFilter};
use crate::repositories::{RepoError, Repository};
use crate::services::paginator::{Page, Paginator};

/// Loads one page of a feed: count first, then only the rows of the requested page.
pub async fn load_feed_page(
    repo: &dyn Repository,
    paginator: &Paginator,
    filter: PostFilter,
    requested_page: Option<&str>,
) -> Result<Page<Post>, RepoError> {
    let count = repo.count_posts(filter).await?;
    let window = paginator.window(requested_page, count);
    debug!(
        "feed {:?}: page {}/{} ({} posts)",
        filter, window.number, window.num_pages, count
    );
    let items = repo
        .list_posts(filter, window.limit, window.offset)
        .await?;
    Ok(window.into_page(items))
}

/// Idempotent; following yourself is silently ignored.
pub async fn follow_author(
    repo: &dyn Repository,
    user_id: i64,
    author_id: i64,
) -> Result<bool, RepoError> {
    if user_id == author_id {
        return Ok(false);
    }
    repo.follow(user_id, author_id).await
}

/// Removing an edge that does not exist is a no-op.
pub async fn unfollow_author(
    repo: &dyn Repository,
    user_id: i64,
    author_id: i64,
) -> Result<bool, RepoError> {
    repo.unfollow(user_id, author_id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::post::NewPost;
    use crate::models::user::NewUser;
    use crate::repositories::memory::MemoryRepository;

    async fn seeded(posts: usize) -> (MemoryRepository, i64) {
        let repo = MemoryRepository::new();
        let author = repo
            .create_user(NewUser {
                username: "kirill".into(),
                password_hash: "x".into(),
            })
            .await
            .unwrap();
        for i in 0..posts {
            repo.create_post(NewPost {
                author_id: author.id,
                text: format!("post {i}"),
                group_id: None,
                image: None,
            })
            .await
            .unwrap();
        }
        (repo, author.id)
    }

    #[tokio::test]
    async fn pages_split_the_feed() {
        let (repo, _) = seeded(13).await;
        let paginator = Paginator::new(10);

        let first = load_feed_page(&repo, &paginator, PostFilter::All, None)
            .await
            .unwrap();
        assert_eq!(first.items.len(), 10);
        assert_eq!(first.items[0].text, "post 12");

        let second = load_feed_page(&repo, &paginator, PostFilter::All, Some("2"))
            .await
            .unwrap();
        assert_eq!(second.items.len(), 3);
        assert_eq!(second.items[2].text, "post 0");
    }

    #[tokio::test]
    async fn self_follow_is_ignored() {
        let (repo, author_id) = seeded(0).await;
        assert!(!follow_author(&repo, author_id, author_id).await.unwrap());
        assert_eq!(repo.count_following(author_id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn unfollow_without_edge_is_noop() {
        let (repo, author_id) = seeded(0).await;
        let other = repo
            .create_user(NewUser {
                username: "daniil".into(),
                password_hash: "x".into(),
            })
            .await
            .unwrap();
        assert!(!unfollow_author(&repo, other.id, author_id).await.unwrap());
        assert!(follow_author(&repo, other.id, author_id).await.unwrap());
        assert!(unfollow_author(&repo, other.id, author_id).await.unwrap());
        assert_eq!(repo.count_following(other.id).await.unwrap(), 0);
    }
}
