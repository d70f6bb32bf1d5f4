//! Memo table of past catalog lookups, keyed by normalized query.

use std::time::Duration;

use tracing::debug;

use crate::songbot::song::{normalize_query, SongDescriptor};
use crate::songbot::store::BoundedStore;

/// Remembers catalog results so a repeated query skips the upstream call.
///
/// Bounded by entry count and TTL. The first result stored for a key wins
/// until it expires or is evicted.
pub struct MemoTable {
    store: BoundedStore<String, SongDescriptor>,
}

impl MemoTable {
    pub fn new(max_entries: usize, ttl: Option<Duration>) -> Self {
        Self {
            store: BoundedStore::new(max_entries, ttl),
        }
    }

    /// Look up a raw query. Normalization happens here.
    pub fn get(&self, query: &str) -> Option<SongDescriptor> {
        self.store.get(&normalize_query(query))
    }

    pub fn put(&self, query: &str, song: SongDescriptor) {
        let key = normalize_query(query);
        if !self.store.insert_if_absent(key.clone(), song) {
            debug!("Memo already holds '{}', keeping first result", key);
        }
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Normalized queries currently memoized, oldest first.
    pub fn queries(&self) -> Vec<String> {
        self.store.keys()
    }
}
