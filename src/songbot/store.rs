//! Bounded in-process key-value store shared by the memo table and session state.
//!
//! Entries expire after an optional TTL and the oldest entry is evicted once
//! the store reaches capacity. Locking is internal and never held across an
//! await point.

use std::collections::{HashMap, VecDeque};
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use tracing::debug;

struct Entry<V> {
    value: V,
    inserted_at: Instant,
}

struct Inner<K, V> {
    entries: HashMap<K, Entry<V>>,
    /// Insertion order, oldest first.
    order: VecDeque<K>,
}

pub struct BoundedStore<K, V> {
    inner: Mutex<Inner<K, V>>,
    max_entries: usize,
    ttl: Option<Duration>,
}

impl<K, V> BoundedStore<K, V>
where
    K: Eq + Hash + Clone + std::fmt::Debug,
    V: Clone,
{
    pub fn new(max_entries: usize, ttl: Option<Duration>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                order: VecDeque::new(),
            }),
            max_entries: max_entries.max(1),
            ttl,
        }
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.get_at(key, Instant::now())
    }

    /// Insert or overwrite.
    pub fn insert(&self, key: K, value: V) {
        self.insert_at(key, value, Instant::now());
    }

    /// Insert only when no live entry exists. Returns whether the value was stored.
    ///
    /// The check and the insert happen under one lock, so concurrent callers
    /// racing on the same key see exactly one winner.
    pub fn insert_if_absent(&self, key: K, value: V) -> bool {
        let now = Instant::now();
        let mut inner = self.lock();
        if self.live_value(&mut inner, &key, now).is_some() {
            return false;
        }
        self.store(&mut inner, key, value, now);
        true
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// Keys currently held, oldest first. Expired entries may still be listed.
    pub fn keys(&self) -> Vec<K> {
        self.lock().order.iter().cloned().collect()
    }

    fn lock(&self) -> MutexGuard<'_, Inner<K, V>> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn is_expired(&self, entry: &Entry<V>, now: Instant) -> bool {
        match self.ttl {
            Some(ttl) => now.saturating_duration_since(entry.inserted_at) >= ttl,
            None => false,
        }
    }

    fn get_at(&self, key: &K, now: Instant) -> Option<V> {
        let mut inner = self.lock();
        self.live_value(&mut inner, key, now)
    }

    fn insert_at(&self, key: K, value: V, now: Instant) {
        let mut inner = self.lock();
        self.store(&mut inner, key, value, now);
    }

    /// Drops the entry when it has expired.
    fn live_value(&self, inner: &mut Inner<K, V>, key: &K, now: Instant) -> Option<V> {
        match inner.entries.get(key) {
            None => return None,
            Some(entry) if !self.is_expired(entry, now) => return Some(entry.value.clone()),
            Some(_) => {}
        }
        debug!("Store entry expired: {:?}", key);
        inner.entries.remove(key);
        inner.order.retain(|k| k != key);
        None
    }

    fn store(&self, inner: &mut Inner<K, V>, key: K, value: V, now: Instant) {
        if inner.entries.contains_key(&key) {
            inner.order.retain(|k| k != &key);
        } else {
            while inner.entries.len() >= self.max_entries {
                let Some(oldest) = inner.order.pop_front() else {
                    break;
                };
                debug!("Evicting oldest store entry: {:?}", oldest);
                inner.entries.remove(&oldest);
            }
        }

        inner.order.push_back(key.clone());
        inner.entries.insert(key, Entry { value, inserted_at: now });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_missing() {
        let store: BoundedStore<String, u32> = BoundedStore::new(4, None);
        assert_eq!(store.get(&"nope".to_string()), None);
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn test_insert_overwrites() {
        let store = BoundedStore::new(4, None);
        store.insert(1, "a");
        store.insert(1, "b");
        assert_eq!(store.get(&1), Some("b"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_insert_if_absent_keeps_first() {
        let store = BoundedStore::new(4, None);
        assert!(store.insert_if_absent("k", 1));
        assert!(!store.insert_if_absent("k", 2));
        assert_eq!(store.get(&"k"), Some(1));
    }

    #[test]
    fn test_evicts_oldest_at_capacity() {
        let store = BoundedStore::new(2, None);
        store.insert("a", 1);
        store.insert("b", 2);
        store.insert("c", 3);
        assert_eq!(store.len(), 2);
        assert_eq!(store.get(&"a"), None);
        assert_eq!(store.keys(), vec!["b", "c"]);
    }

    #[test]
    fn test_overwrite_refreshes_position() {
        let store = BoundedStore::new(2, None);
        store.insert("a", 1);
        store.insert("b", 2);
        store.insert("a", 10);
        store.insert("c", 3);
        // "b" is now the oldest
        assert_eq!(store.get(&"b"), None);
        assert_eq!(store.get(&"a"), Some(10));
        assert_eq!(store.get(&"c"), Some(3));
    }

    #[test]
    fn test_ttl_expiry() {
        let store = BoundedStore::new(4, Some(Duration::from_secs(60)));
        let start = Instant::now();
        store.insert_at("k", 1, start);

        assert_eq!(store.get_at(&"k", start + Duration::from_secs(59)), Some(1));
        assert_eq!(store.get_at(&"k", start + Duration::from_secs(60)), None);
        assert_eq!(store.len(), 0);
        assert!(store.keys().is_empty());
    }

    #[test]
    fn test_expired_entry_can_be_replaced() {
        let store = BoundedStore::new(4, Some(Duration::from_millis(1)));
        store.insert_at("k", 1, Instant::now() - Duration::from_secs(1));
        assert!(store.insert_if_absent("k", 2));
        assert_eq!(store.get(&"k"), Some(2));
    }

    #[test]
    fn test_concurrent_insert_if_absent_single_winner() {
        use std::sync::Barrier;

        for _ in 0..50 {
            let store = BoundedStore::new(4, None);
            let barrier = Barrier::new(8);
            let winners: Vec<usize> = std::thread::scope(|scope| {
                let handles: Vec<_> = (0..8)
                    .map(|i| {
                        let store = &store;
                        let barrier = &barrier;
                        scope.spawn(move || {
                            barrier.wait();
                            store.insert_if_absent("song", i).then_some(i)
                        })
                    })
                    .collect();
                handles.into_iter().filter_map(|h| h.join().unwrap()).collect()
            });

            assert_eq!(winners.len(), 1);
            assert_eq!(store.get(&"song"), Some(winners[0]));
        }
    }

    #[test]
    fn test_zero_capacity_clamped() {
        let store = BoundedStore::new(0, None);
        store.insert("a", 1);
        assert_eq!(store.get(&"a"), Some(1));
    }
}
