use std::time::Duration;

use moka::future::Cache;

/// Rendered pages kept for a fixed time. Writes to the store do not evict
/// anything; entries leave only on expiry or `clear()`.
#[derive(Clone)]
pub struct PageCache {
    pages: Cache<String, String>,
}

impl PageCache {
    pub fn new(ttl: Duration) -> Self {
        let pages = Cache::builder()
            .max_capacity(1_000)
            .time_to_live(ttl)
            .build();
        Self { pages }
    }

    /// Cache key for a page as seen by one viewer.
    pub fn key(path_and_query: &str, viewer_id: Option<i64>) -> String {
        match viewer_id {
            Some(id) => format!("user:{id}:{path_and_query}"),
            None => format!("guest:{path_and_query}"),
        }
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        self.pages.get(key).await
    }

    pub async fn insert(&self, key: String, html: String) {
        self.pages.insert(key, html).await;
    }

    pub fn clear(&self) {
        self.pages.invalidate_all();
    }
}
