//! Response cache storage.
//!
//! A bounded LRU of rendered public JSON responses keyed by request path and
//! query hash. Stands in for the page-level cache the hosting framework
//! provides in a managed deployment: the invalidation coordinator
//! revalidates it by path prefix.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::RwLock;

use bytes::Bytes;
use lru::LruCache;
use metrics::counter;

use super::config::CacheConfig;
use super::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::store";

const METRIC_RESPONSE_EVICT: &str = "vitrina_response_cache_evict_total";

/// Hash a raw query string into the cache key.
pub fn hash_query(query: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    query.hash(&mut hasher);
    hasher.finish()
}

/// Key for one cached response.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResponseKey {
    pub path: String,
    pub query_hash: u64,
}

/// Cached HTTP response.
#[derive(Clone)]
pub struct CachedResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

/// Response cache storage with LRU eviction.
pub struct ResponseStore {
    responses: RwLock<LruCache<ResponseKey, CachedResponse>>,
}

impl ResponseStore {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            responses: RwLock::new(LruCache::new(config.response_limit_non_zero())),
        }
    }

    pub fn get(&self, key: &ResponseKey) -> Option<CachedResponse> {
        rw_write(&self.responses, SOURCE, "get").get(key).cloned()
    }

    pub fn set(&self, key: ResponseKey, response: CachedResponse) {
        let mut responses = rw_write(&self.responses, SOURCE, "set");
        // `push` also returns the old entry when the key was already
        // present; only a displaced different key is a capacity eviction.
        if let Some((evicted, _)) = responses.push(key.clone(), response)
            && evicted != key
        {
            counter!(METRIC_RESPONSE_EVICT).increment(1);
        }
    }

    /// Drop every cached response at `path` or under it, returning how many
    /// entries were removed. Revalidating `/` clears the whole store.
    pub fn revalidate_path(&self, path: &str) -> usize {
        let normalized = normalize_path(path);
        let mut responses = rw_write(&self.responses, SOURCE, "revalidate_path");

        let affected: Vec<ResponseKey> = responses
            .iter()
            .filter(|(key, _)| covers(&normalized, &key.path))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &affected {
            responses.pop(key);
        }
        affected.len()
    }

    pub fn invalidate_all(&self) {
        rw_write(&self.responses, SOURCE, "invalidate_all").clear();
    }

    pub fn len(&self) -> usize {
        rw_read(&self.responses, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn normalize_path(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}

fn covers(revalidated: &str, cached: &str) -> bool {
    if revalidated == "/" {
        return true;
    }
    cached == revalidated
        || cached
            .strip_prefix(revalidated)
            .is_some_and(|rest| rest.starts_with('/'))
}
