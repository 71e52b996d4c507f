//! Advisory set of task fingerprints that a worker is currently processing.
//!
//! Entries are bounded by an LRU capacity and a time-to-live so a fingerprint
//! leaked by a crashed worker eventually disappears. Durable state, not this
//! cache, decides whether a file still needs work.

use crate::config::CacheConfig;
use log::debug;
use moka::policy::EvictionPolicy;
use moka::sync::Cache;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct InFlightCache {
    cache: Cache<String, ()>,
}

impl InFlightCache {
    pub fn new(capacity: u64, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(capacity)
            .time_to_live(ttl)
            .eviction_policy(EvictionPolicy::lru())
            .build();
        Self { cache }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.size, config.expiration())
    }

    pub fn has(&self, key: &str) -> bool {
        self.cache.contains_key(key)
    }

    pub fn add(&self, key: &str) {
        self.cache.insert(key.to_string(), ());
    }

    pub fn remove(&self, key: &str) {
        self.cache.invalidate(key);
    }

    /// Inserts `key` unless it is already present. The returned guard removes it on drop.
    pub fn claim(self: &Arc<Self>, key: &str) -> Option<InFlightGuard> {
        let entry = self.cache.entry(key.to_string()).or_insert(());
        if !entry.is_fresh() {
            debug!("[Cache] {} already in flight", key);
            return None;
        }
        Some(InFlightGuard {
            cache: Arc::clone(self),
            key: key.to_string(),
        })
    }
}

/// Removes its fingerprint from the cache when dropped, on every exit path.
pub struct InFlightGuard {
    cache: Arc<InFlightCache>,
    key: String,
}

impl InFlightGuard {
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.cache.remove(&self.key);
    }
}
