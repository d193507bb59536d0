//! Short-TTL key/value cache fronting metadata reads.
//!
//! Entries are derived, disposable state: losing one never loses
//! correctness, only an optimization. The database stays the source of
//! truth, and there is deliberately no write-through invalidation - an
//! update never evicts a matching entry, entries die only by TTL. Mutating
//! operations therefore bypass the cache for their consistency-critical
//! reads (the delete path does).
//!
//! The same store holds the rate-limit counters; a concurrent map's entry
//! operations give the atomic increment/expire the limiter relies on.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;

#[derive(Debug, Clone)]
enum Value {
    Text(String),
    Counter(u64),
}

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    expires_at: Instant,
}

impl Entry {
    fn expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// Process-local cache instance shared by reference across components.
///
/// Stands in for the single networked cache store the deployment assumes;
/// this type is the seam such a store would implement.
#[derive(Debug, Clone, Default)]
pub struct Cache {
    entries: Arc<DashMap<String, Entry>>,
}

impl Cache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a cached value. Expired entries count as misses and are
    /// dropped on the way out.
    pub fn get(&self, key: &str) -> Option<String> {
        match self.entries.get(key) {
            Some(entry) if !entry.expired() => match &entry.value {
                Value::Text(text) => Some(text.clone()),
                Value::Counter(count) => Some(count.to_string()),
            },
            Some(entry) => {
                drop(entry);
                self.entries.remove_if(key, |_, e| e.expired());
                None
            }
            None => None,
        }
    }

    /// Store a value with a fixed TTL, replacing whatever was there.
    pub fn put(&self, key: impl Into<String>, value: impl Into<String>, ttl: Duration) {
        self.entries.insert(
            key.into(),
            Entry {
                value: Value::Text(value.into()),
                expires_at: Instant::now() + ttl,
            },
        );
    }

    /// Atomically increment a counter, returning the post-increment count.
    ///
    /// The first increment of a window (fresh key or expired entry) resets
    /// the count to 1 and arms the TTL; later increments within the window
    /// leave the expiry untouched. The entry lock makes the read-modify-
    /// write atomic across tasks.
    pub fn increment(&self, key: impl Into<String>, ttl: Duration) -> u64 {
        let mut entry = self.entries.entry(key.into()).or_insert_with(|| Entry {
            value: Value::Counter(0),
            expires_at: Instant::now() + ttl,
        });

        if entry.expired() {
            entry.value = Value::Counter(0);
            entry.expires_at = Instant::now() + ttl;
        }

        let count = match entry.value {
            Value::Counter(count) => count + 1,
            // A text value under a counter key is stale cross-class reuse;
            // restart the window rather than guessing.
            Value::Text(_) => 1,
        };
        entry.value = Value::Counter(count);
        count
    }
}
