//! Caching utilities for vscrape

use moka::future::Cache;
use std::hash::Hash;
use std::time::Duration;

/// Async cache with per-entry TTL
pub type AsyncCache<K, V> = Cache<K, V>;

/// Upper bound on cached entries when no capacity is given
pub const DEFAULT_CAPACITY: u64 = 256;

/// Create a new async cache with TTL
pub fn new_async_cache<K, V>(ttl: Duration) -> AsyncCache<K, V>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    new_async_cache_with_capacity(ttl, DEFAULT_CAPACITY)
}

/// Create a new async cache with TTL and max capacity
pub fn new_async_cache_with_capacity<K, V>(ttl: Duration, max_capacity: u64) -> AsyncCache<K, V>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    Cache::builder()
        .time_to_live(ttl)
        .max_capacity(max_capacity)
        .build()
}
