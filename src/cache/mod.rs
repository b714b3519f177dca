// src/cache/mod.rs
//! Generic TTL cache used for DID documents and verification results.
//!
//! One abstraction owns all eviction and invalidation logic: entries are
//! `{ value, stored_at }` pairs, evicted lazily on read once older than
//! the cache's TTL, and additionally removable via [`TtlCache::sweep`] or
//! an explicit [`TtlCache::evict`]. A cache built without a TTL keeps
//! entries until they are explicitly evicted.
//!
//! Caches in this crate are never a source of truth: every entry is a
//! copy of what the store or ledger returned, so dropping one only costs
//! a re-read.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Mutex;
use std::time::{Duration, Instant};

struct CacheEntry<V> {
    value: V,
    stored_at: Instant,
}

/// A mutex-guarded map with per-cache TTL semantics.
///
/// Values are cloned out on read; keep them cheap to clone (the DID and
/// verification caches store small serde structs).
pub struct TtlCache<K, V> {
    entries: Mutex<HashMap<K, CacheEntry<V>>>,
    ttl: Option<Duration>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Creates a cache whose entries expire `ttl` after insertion.
    pub fn new(ttl: Duration) -> Self {
        TtlCache {
            entries: Mutex::new(HashMap::new()),
            ttl: Some(ttl),
        }
    }

    /// Creates a cache whose entries never expire; they leave only via
    /// [`TtlCache::evict`].
    pub fn unbounded() -> Self {
        TtlCache {
            entries: Mutex::new(HashMap::new()),
            ttl: None,
        }
    }

    /// Returns the cached value for `key`, treating an expired entry as
    /// absent and removing it.
    pub fn get(&self, key: &K) -> Option<V> {
        let mut entries = self.entries.lock().expect("cache mutex poisoned");
        let stale = match entries.get(key) {
            Some(entry) => {
                if !Self::expired(entry, self.ttl) {
                    return Some(entry.value.clone());
                }
                true
            }
            None => false,
        };
        if stale {
            entries.remove(key);
        }
        None
    }

    /// Inserts or replaces the value under `key`, resetting its age.
    pub fn insert(&self, key: K, value: V) {
        let mut entries = self.entries.lock().expect("cache mutex poisoned");
        entries.insert(
            key,
            CacheEntry {
                value,
                stored_at: Instant::now(),
            },
        );
    }

    /// Removes the entry under `key`, returning its value if one was
    /// present (expired or not).
    pub fn evict(&self, key: &K) -> Option<V> {
        let mut entries = self.entries.lock().expect("cache mutex poisoned");
        entries.remove(key).map(|e| e.value)
    }

    /// Drops every expired entry. Intended for periodic housekeeping;
    /// correctness does not depend on it since reads evict lazily.
    pub fn sweep(&self) {
        let ttl = self.ttl;
        let mut entries = self.entries.lock().expect("cache mutex poisoned");
        entries.retain(|_, entry| !Self::expired(entry, ttl));
    }

    /// Number of entries currently held, including not-yet-swept expired
    /// ones.
    pub fn len(&self) -> usize {
        self.entries.lock().expect("cache mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn expired(entry: &CacheEntry<V>, ttl: Option<Duration>) -> bool {
        match ttl {
            Some(ttl) => entry.stored_at.elapsed() >= ttl,
            None => false,
        }
    }
}
