//! Fixed-capacity least-recently-used cache.
//!
//! Wraps [`lru::LruCache`] and stamps every entry with a recency rank drawn
//! from a monotonically increasing counter, so recency forms a total order
//! with no ties. Not thread-safe: owners that share a cache across tasks
//! wrap it in a lock.

use lru::LruCache;
use std::borrow::Borrow;
use std::hash::Hash;
use std::num::NonZeroUsize;

#[derive(Debug)]
struct Slot<V> {
    value: V,
    rank: u64,
}

/// A cache that never holds more than `capacity` entries.
///
/// Inserting a new key into a full cache evicts the single entry with the
/// lowest recency rank. Every `get` hit and every `set` advances the
/// touched entry's rank.
#[derive(Debug)]
pub struct BoundedCache<K: Hash + Eq, V> {
    inner: LruCache<K, Slot<V>>,
    clock: u64,
}

impl<K: Hash + Eq, V> BoundedCache<K, V> {
    /// Create a cache holding at most `capacity` entries (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: LruCache::new(capacity),
            clock: 0,
        }
    }

    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    /// Insert or update `key`.
    ///
    /// Returns the key evicted to make room, if any. Updating an existing
    /// key never evicts.
    pub fn set(&mut self, key: K, value: V) -> Option<K> {
        let rank = self.tick();
        match self.inner.push(key, Slot { value, rank }) {
            Some((old_key, _)) if !self.inner.contains(&old_key) => Some(old_key),
            _ => None,
        }
    }

    /// Look up `key`, marking it most recently used on a hit.
    ///
    /// A miss leaves the cache untouched.
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        if !self.inner.contains(key) {
            return None;
        }
        let rank = self.tick();
        let slot = self.inner.get_mut(key)?;
        slot.rank = rank;
        Some(&slot.value)
    }

    /// Look up `key` without touching its recency.
    pub fn peek<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.peek(key).map(|slot| &slot.value)
    }

    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.contains(key)
    }

    /// Remove `key`, returning its value if it was present.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.pop(key).map(|slot| slot.value)
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }

    /// Drop every entry whose value fails `keep`. Returns how many were removed.
    pub fn retain(&mut self, mut keep: impl FnMut(&V) -> bool) -> usize
    where
        K: Clone,
    {
        let doomed: Vec<K> = self
            .inner
            .iter()
            .filter(|(_, slot)| !keep(&slot.value))
            .map(|(k, _)| k.clone())
            .collect();
        for key in &doomed {
            self.inner.pop(key);
        }
        doomed.len()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.inner.cap().get()
    }

    /// The recency rank of `key`, if present. Higher is more recent.
    pub fn recency_rank<Q>(&self, key: &Q) -> Option<u64>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.peek(key).map(|slot| slot.rank)
    }

    /// Entries from least to most recently used, without touching recency.
    pub fn iter_oldest_first(&self) -> impl Iterator<Item = (&K, &V)> {
        self.inner.iter().rev().map(|(k, slot)| (k, &slot.value))
    }

    /// Keys from least to most recently used.
    pub fn keys(&self) -> Vec<&K> {
        self.iter_oldest_first().map(|(k, _)| k).collect()
    }
}
