//! Cache Store Module
//!
//! Main cache engine combining HashMap lookup with LRU tracking and TTL
//! expiration. The store is not synchronized; [`TimedLruCache`] wraps it in
//! a lock. Every operation takes the current instant explicitly.
//!
//! [`TimedLruCache`]: crate::cache::TimedLruCache

use std::borrow::Borrow;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::warn;

use crate::cache::arena::{Arena, Entry, EntryId};
use crate::cache::lru::RecencyList;
use crate::cache::timeout::ExpirationList;
use crate::cache::{CacheStats, EjectionListener, EjectionReason, MAX_TTL};
use crate::error::{CacheError, Result};

/// Upper bound on storage reserved up front; larger caches grow on demand.
const INITIAL_CAPACITY: usize = 1024;

// == Cache Store ==
/// Bounded storage with LRU eviction and TTL expiration.
pub struct CacheStore<K, V> {
    /// Diagnostic name
    name: String,
    /// Key to arena handle
    map: HashMap<K, EntryId>,
    /// Owner of every entry
    arena: Arena<K, V>,
    /// Least to most recently used
    recency: RecencyList,
    /// Soonest to latest expiration
    expiration: ExpirationList,
    /// Performance statistics
    stats: CacheStats,
    /// Maximum number of entries allowed
    max_elements: usize,
    /// TTL for entries without explicit TTL and for refresh
    default_ttl: Duration,
    /// Whether ejections are reported to the listener
    ejection_logging: bool,
    listener: Arc<dyn EjectionListener<K>>,
}

impl<K, V> CacheStore<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    // == Constructor ==
    /// Creates a new CacheStore with specified capacity and default TTL.
    ///
    /// # Errors
    /// - [`CacheError::InvalidCapacity`] if `max_elements` is zero
    /// - [`CacheError::MissingName`] if `name` is blank
    pub fn new(
        max_elements: usize,
        default_ttl: Duration,
        name: impl Into<String>,
        listener: Arc<dyn EjectionListener<K>>,
    ) -> Result<Self> {
        if max_elements == 0 {
            return Err(CacheError::InvalidCapacity(max_elements));
        }
        let name = name.into();
        if name.trim().is_empty() {
            return Err(CacheError::MissingName);
        }

        Ok(Self {
            name,
            map: HashMap::with_capacity(max_elements.min(INITIAL_CAPACITY)),
            arena: Arena::with_capacity(max_elements.min(INITIAL_CAPACITY)),
            recency: RecencyList::new(),
            expiration: ExpirationList::new(),
            stats: CacheStats::new(),
            max_elements,
            default_ttl,
            ejection_logging: false,
            listener,
        })
    }

    // == Put ==
    /// Stores a value that expires `ttl` after `now`.
    ///
    /// An existing key keeps its entry: value and expiration are replaced and
    /// the entry becomes most recently used. A new key may first trigger a
    /// stale sweep and then LRU eviction until there is room.
    ///
    /// Returns the previous value for the key, if any.
    pub fn put(&mut self, key: K, value: V, ttl: Duration, now: Instant) -> Option<V> {
        let expires_at = expiry(now, ttl);

        if let Some(&id) = self.map.get(&key) {
            let entry = &mut self.arena[id];
            let previous = std::mem::replace(&mut entry.value, value);
            entry.expires_at = expires_at;
            self.recency.touch(&mut self.arena, id);
            self.expiration.reposition(&mut self.arena, id);
            return Some(previous);
        }

        if self.map.len() >= self.max_elements {
            self.clear_stale(now, EjectionReason::Stale);
        }
        while self.map.len() >= self.max_elements {
            let Some(victim) = self.recency.evict_oldest(&mut self.arena) else {
                break;
            };
            self.expiration.remove(&mut self.arena, victim);
            let entry = self.arena.remove(victim);
            self.map.remove(&entry.key);
            self.eject(&entry.key, EjectionReason::Capacity);
        }

        let id = self.arena.insert(Entry::new(key.clone(), value, expires_at));
        self.map.insert(key, id);
        self.recency.insert(&mut self.arena, id);
        self.expiration.insert(&mut self.arena, id);
        debug_assert_eq!(self.arena.len(), self.map.len());
        debug_assert_eq!(self.recency.len(), self.map.len());
        debug_assert_eq!(self.expiration.len(), self.map.len());
        self.stats.set_total_entries(self.map.len());
        None
    }

    // == Get ==
    /// Retrieves a value by key and marks it most recently used.
    ///
    /// An entry whose TTL has elapsed is removed and reported as a miss.
    pub fn get<Q>(&mut self, key: &Q, now: Instant) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let Some(&id) = self.map.get(key) else {
            self.stats.record_miss();
            return None;
        };

        if self.arena[id].is_expired(now) {
            self.map.remove(key);
            let entry = self.detach(id);
            self.stats.record_miss();
            self.eject(&entry.key, EjectionReason::Expired);
            return None;
        }

        self.recency.touch(&mut self.arena, id);
        self.stats.record_hit();
        Some(self.arena[id].value.clone())
    }

    // == Refresh ==
    /// Restarts an entry's lifetime with the default TTL and marks it most
    /// recently used.
    ///
    /// Succeeds even if the entry already expired but has not been swept.
    pub fn refresh<Q>(&mut self, key: &Q, now: Instant) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let Some(&id) = self.map.get(key) else {
            return false;
        };

        self.arena[id].expires_at = expiry(now, self.default_ttl);
        self.recency.touch(&mut self.arena, id);
        self.expiration.reposition(&mut self.arena, id);
        true
    }

    // == Remove ==
    /// Removes an entry by key, returning its value.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let id = self.map.remove(key)?;
        let entry = self.detach(id);
        self.stats.set_total_entries(self.map.len());
        Some(entry.value)
    }

    // == Clear ==
    /// Drops every entry.
    pub fn clear(&mut self) {
        self.map.clear();
        self.recency.clear();
        self.expiration.clear();
        self.arena.clear();
        self.stats.set_total_entries(0);
    }

    // == Clear Stale ==
    /// Removes every entry expired by `now`, walking the expiration list
    /// from its head.
    ///
    /// Returns the number of entries removed.
    pub fn clear_stale(&mut self, now: Instant, reason: EjectionReason) -> usize {
        let mut removed = 0;
        while let Some(id) = self.expiration.pop_expired(&mut self.arena, now) {
            self.recency.remove(&mut self.arena, id);
            let entry = self.arena.remove(id);
            self.map.remove(&entry.key);
            self.eject(&entry.key, reason);
            removed += 1;
        }
        self.stats.set_total_entries(self.map.len());
        removed
    }

    /// Instant at which the soonest-expiring entry expires.
    pub fn next_expiration(&self) -> Option<Instant> {
        self.expiration.next_deadline(&self.arena)
    }

    // == Time To Live ==
    /// Remaining lifetime of a live entry. Does not count as an access.
    pub fn ttl_remaining<Q>(&self, key: &Q, now: Instant) -> Option<Duration>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let entry = &self.arena[*self.map.get(key)?];
        if entry.is_expired(now) {
            None
        } else {
            Some(entry.ttl_remaining(now))
        }
    }

    // == Snapshots ==
    /// Copies every key.
    pub fn keys(&self) -> HashSet<K> {
        self.map.keys().cloned().collect()
    }

    /// Copies every value, least recently used first. Does not touch recency.
    pub fn values(&self) -> Vec<V> {
        self.recency
            .iter(&self.arena)
            .map(|id| self.arena[id].value.clone())
            .collect()
    }

    /// Copies the values of `keys` in the order given, skipping keys that are
    /// not cached.
    pub fn values_for(&self, keys: &[K]) -> Vec<V>
    where
        K: fmt::Debug,
    {
        keys.iter()
            .filter_map(|key| match self.map.get(key) {
                Some(&id) => Some(self.arena[id].value.clone()),
                None => {
                    warn!(
                        cache = %self.name,
                        ?key,
                        "{}: failed to locate referenced object in cache",
                        self.name
                    );
                    None
                }
            })
            .collect()
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.map.len());
        stats
    }

    // == Accessors ==
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn max_elements(&self) -> usize {
        self.max_elements
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_ejection_logging(&mut self, enabled: bool) {
        self.ejection_logging = enabled;
    }

    pub fn ejection_logging(&self) -> bool {
        self.ejection_logging
    }

    /// Unlinks an entry from both lists and frees its slot. The caller has
    /// already removed it from the map.
    fn detach(&mut self, id: EntryId) -> Entry<K, V> {
        self.recency.remove(&mut self.arena, id);
        self.expiration.remove(&mut self.arena, id);
        self.arena.remove(id)
    }

    fn eject(&mut self, key: &K, reason: EjectionReason) {
        self.stats.record_ejection(reason);
        if self.ejection_logging {
            self.listener.on_ejection(&self.name, key, reason);
        }
    }
}

#[cfg(test)]
impl<K, V> CacheStore<K, V>
where
    K: Eq + Hash + Clone + fmt::Debug,
    V: Clone,
{
    /// Keys from least to most recently used.
    pub(crate) fn recency_keys(&self) -> Vec<K> {
        self.recency
            .iter(&self.arena)
            .map(|id| self.arena[id].key.clone())
            .collect()
    }

    /// Keys from soonest to latest expiration.
    pub(crate) fn expiration_keys(&self) -> Vec<K> {
        self.expiration
            .iter(&self.arena)
            .map(|id| self.arena[id].key.clone())
            .collect()
    }

    /// Panics unless the table, arena and both lists agree.
    pub(crate) fn assert_invariants(&self) {
        let len = self.map.len();
        assert!(len <= self.max_elements, "{} entries over max {}", len, self.max_elements);
        assert_eq!(self.arena.len(), len, "arena size differs from table");
        assert_eq!(self.recency.len(), len, "recency list size differs from table");
        assert_eq!(self.expiration.len(), len, "expiration list size differs from table");

        let recency: Vec<EntryId> = self.recency.iter(&self.arena).take(len + 1).collect();
        let expiration: Vec<EntryId> = self.expiration.iter(&self.arena).take(len + 1).collect();
        assert_eq!(recency.len(), len, "recency list walk length");
        assert_eq!(expiration.len(), len, "expiration list walk length");

        for ids in [&recency, &expiration] {
            let unique: HashSet<EntryId> = ids.iter().copied().collect();
            assert_eq!(unique.len(), len, "entry linked twice");
            for id in ids {
                let key = &self.arena[*id].key;
                assert_eq!(self.map.get(key), Some(id), "list entry {:?} not in table", key);
            }
        }

        for pair in expiration.windows(2) {
            assert!(
                self.arena[pair[0]].expires_at <= self.arena[pair[1]].expires_at,
                "expiration list out of order"
            );
        }
    }
}

impl<K, V> fmt::Debug for CacheStore<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheStore")
            .field("name", &self.name)
            .field("len", &self.map.len())
            .field("max_elements", &self.max_elements)
            .field("default_ttl", &self.default_ttl)
            .field("ejection_logging", &self.ejection_logging)
            .finish_non_exhaustive()
    }
}

/// Expiration instant for a TTL starting at `now`, capped at [`MAX_TTL`].
fn expiry(now: Instant, ttl: Duration) -> Instant {
    now + ttl.min(MAX_TTL)
}
