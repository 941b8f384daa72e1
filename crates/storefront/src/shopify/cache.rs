//! Short-TTL memoization of read (query) responses.
//!
//! Entries are keyed by request shape (truncated query text plus canonical
//! variable JSON) and expire individually. Expiry is enforced lazily on
//! lookup: an entry whose age has reached its TTL is logically absent even if
//! it has not been physically evicted yet. Mutation responses are never
//! cached; the client only writes read results here.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde_json::Value;

/// Default TTL for cached product reads.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);
/// Default entry ceiling before the oldest fifth is evicted.
const DEFAULT_MAX_ENTRIES: usize = 1000;
/// How much of the query text participates in the cache key.
const KEY_QUERY_PREFIX: usize = 100;

#[derive(Debug, Clone)]
struct CacheEntry {
    payload: Value,
    stored_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.stored_at) >= self.ttl
    }
}

/// Size-bounded response cache with per-entry TTL.
#[derive(Debug)]
pub struct ResponseCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    max_entries: usize,
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_MAX_ENTRIES)
    }
}

impl ResponseCache {
    /// Create a cache that evicts its oldest 20% once `max_entries` is
    /// exceeded.
    #[must_use]
    pub fn with_capacity(max_entries: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            max_entries,
        }
    }

    /// Derive the cache key for a request.
    ///
    /// Variables are serialized through `serde_json`, whose object maps are
    /// ordered by key, so two logically identical variable sets produce the
    /// same key regardless of construction order. This order-independence is
    /// pinned by tests.
    #[must_use]
    pub fn cache_key(query: &str, variables: &Value) -> String {
        let prefix: String = query.chars().take(KEY_QUERY_PREFIX).collect();
        format!("{prefix}:{variables}")
    }

    /// Look up a live entry, lazily evicting it if its TTL has elapsed.
    pub fn get(&self, key: &str) -> Option<Value> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let now = Instant::now();
        match entries.get(key) {
            Some(entry) if entry.is_expired(now) => {
                entries.remove(key);
                None
            }
            Some(entry) => Some(entry.payload.clone()),
            None => None,
        }
    }

    /// Whether a live entry exists for the key.
    pub fn contains(&self, key: &str) -> bool {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let now = Instant::now();
        match entries.get(key) {
            Some(entry) if entry.is_expired(now) => {
                entries.remove(key);
                false
            }
            Some(_) => true,
            None => false,
        }
    }

    /// Store a response payload under the key with the given TTL.
    pub fn insert(&self, key: String, payload: Value, ttl: Duration) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(
            key,
            CacheEntry {
                payload,
                stored_at: Instant::now(),
                ttl,
            },
        );
        Self::manage_size(&mut entries, self.max_entries);
    }

    /// Evict the oldest 20% of entries by insertion time once the ceiling is
    /// exceeded. An approximation of LRU, not the real thing; good enough for
    /// a short-TTL cache.
    fn manage_size(entries: &mut HashMap<String, CacheEntry>, max_entries: usize) {
        if entries.len() <= max_entries {
            return;
        }
        let mut by_age: Vec<(String, Instant)> = entries
            .iter()
            .map(|(k, e)| (k.clone(), e.stored_at))
            .collect();
        by_age.sort_by_key(|&(_, stored_at)| stored_at);
        for (key, _) in by_age.iter().take(max_entries / 5) {
            entries.remove(key);
        }
    }
}
