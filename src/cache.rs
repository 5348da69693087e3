use std::time::Duration;

use moka::future::Cache;

/// Rendered pages keyed by route, each kept for a fixed time.
#[derive(Clone)]
pub struct PageCache {
    pages: Cache<String, String>,
}

impl PageCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            pages: Cache::builder().time_to_live(ttl).build(),
        }
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        self.pages.get(key).await
    }

    pub async fn insert(&self, key: String, page: String) {
        self.pages.insert(key, page).await;
    }

    /// Drops everything; the next request renders afresh.
    pub fn clear(&self) {
        self.pages.invalidate_all();
    }
}
