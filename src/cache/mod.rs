//! Time-based response cache for the home listing.

mod middleware;
mod store;

pub use middleware::{PageCacheState, page_cache_layer};
pub use store::{CacheConfig, CachedPage, PageStore};
