//! Storage for cached rendered pages.
//!
//! Invalidation is purely time-based: an entry is served as-is until its
//! TTL elapses, regardless of content-store writes in the meantime. There
//! is no dependency tracking on individual records.

use std::num::NonZeroUsize;
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};

use axum::http::HeaderValue;
use bytes::Bytes;
use lru::LruCache;

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub ttl: Duration,
    pub max_pages: NonZeroUsize,
}

/// A fully rendered response body, keyed by path and query.
#[derive(Debug, Clone)]
pub struct CachedPage {
    pub body: Bytes,
    pub content_type: Option<HeaderValue>,
    stored_at: Instant,
}

pub struct PageStore {
    pages: RwLock<LruCache<String, CachedPage>>,
    ttl: Duration,
}

impl PageStore {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            pages: RwLock::new(LruCache::new(config.max_pages)),
            ttl: config.ttl,
        }
    }

    /// Fresh entry for the key, if any. Stale entries are dropped on access.
    pub fn get(&self, key: &str) -> Option<CachedPage> {
        let mut pages = self.pages.write().unwrap_or_else(PoisonError::into_inner);
        match pages.get(key) {
            Some(page) if page.stored_at.elapsed() < self.ttl => Some(page.clone()),
            Some(_) => {
                pages.pop(key);
                None
            }
            None => None,
        }
    }

    pub fn put(&self, key: String, body: Bytes, content_type: Option<HeaderValue>) {
        let page = CachedPage {
            body,
            content_type,
            stored_at: Instant::now(),
        };
        self.pages
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .put(key, page);
    }

    pub fn len(&self) -> usize {
        self.pages
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(ttl: Duration, max_pages: usize) -> CacheConfig {
        CacheConfig {
            ttl,
            max_pages: NonZeroUsize::new(max_pages).expect("nonzero capacity"),
        }
    }

    #[test]
    fn serves_entries_within_the_ttl() {
        let store = PageStore::new(&config(Duration::from_secs(60), 8));
        store.put("/".to_string(), Bytes::from_static(b"rendered"), None);

        let hit = store.get("/").expect("fresh entry");
        assert_eq!(&hit.body[..], b"rendered");
    }

    #[test]
    fn expired_entries_are_dropped_on_access() {
        let store = PageStore::new(&config(Duration::ZERO, 8));
        store.put("/".to_string(), Bytes::from_static(b"rendered"), None);

        assert!(store.get("/").is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn capacity_evicts_least_recently_used() {
        let store = PageStore::new(&config(Duration::from_secs(60), 2));
        store.put("/?page=1".to_string(), Bytes::from_static(b"one"), None);
        store.put("/?page=2".to_string(), Bytes::from_static(b"two"), None);
        store.put("/?page=3".to_string(), Bytes::from_static(b"three"), None);

        assert!(store.get("/?page=1").is_none());
        assert!(store.get("/?page=3").is_some());
        assert_eq!(store.len(), 2);
    }
}
