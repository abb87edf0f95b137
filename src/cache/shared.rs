//! Thread-safe Cache
//!
//! Wraps a [`CacheStore`] in one mutex and pairs it with the condition
//! variable the background reaper sleeps on.

use std::borrow::Borrow;
use std::collections::HashSet;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tracing::{error, info};

use crate::cache::{
    CacheStats, CacheStore, EjectionListener, EjectionReason, StatsReport, TracingEjectionLog,
};
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};
use crate::tasks::spawn_reaper;

/// State guarded by the cache lock.
pub(crate) struct State<K, V> {
    pub(crate) store: CacheStore<K, V>,
    /// Keep-running flag for the reaper
    pub(crate) reaping: bool,
}

/// Lock and wake-up signal shared with the reaper thread.
pub(crate) struct Shared<K, V> {
    pub(crate) state: Mutex<State<K, V>>,
    /// Signalled by every mutation that can change the next expiration
    pub(crate) wake: Condvar,
}

// == Timed LRU Cache ==
/// Bounded, thread-safe cache with LRU eviction and TTL expiration.
///
/// Every operation takes a single lock for its whole duration, so concurrent
/// calls are linearized. Share the cache between threads with an `Arc`.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use timed_lru::TimedLruCache;
///
/// let cache = TimedLruCache::new(2, Duration::from_secs(60), "example").unwrap();
/// cache.put("a", 1);
/// cache.put("b", 2);
/// cache.get(&"a");
/// cache.put("c", 3); // evicts "b", the least recently used
///
/// assert_eq!(cache.get(&"b"), None);
/// assert_eq!(cache.get(&"a"), Some(1));
/// ```
pub struct TimedLruCache<K, V> {
    shared: Arc<Shared<K, V>>,
    reaper: Mutex<Option<JoinHandle<()>>>,
    name: String,
    max_elements: usize,
    default_ttl: Duration,
}

impl<K, V> TimedLruCache<K, V>
where
    K: Eq + Hash + Clone + Debug + Send + 'static,
    V: Clone + Send + 'static,
{
    // == Constructors ==
    /// Creates a cache that reports ejections through `tracing`.
    ///
    /// # Errors
    /// - [`CacheError::InvalidCapacity`] if `max_elements` is zero
    /// - [`CacheError::MissingName`] if `cache_name` is blank
    pub fn new(max_elements: usize, default_ttl: Duration, cache_name: impl Into<String>) -> Result<Self> {
        Self::with_listener(max_elements, default_ttl, cache_name, TracingEjectionLog)
    }

    /// Creates a cache that reports ejections to `listener`.
    pub fn with_listener<L>(
        max_elements: usize,
        default_ttl: Duration,
        cache_name: impl Into<String>,
        listener: L,
    ) -> Result<Self>
    where
        L: EjectionListener<K> + 'static,
    {
        let store = CacheStore::new(max_elements, default_ttl, cache_name, Arc::new(listener))?;
        let name = store.name().to_string();

        Ok(Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State {
                    store,
                    reaping: false,
                }),
                wake: Condvar::new(),
            }),
            reaper: Mutex::new(None),
            name,
            max_elements,
            default_ttl,
        })
    }

    /// Creates a cache from configuration, applying its logging and reaping
    /// switches.
    pub fn from_config(config: &CacheConfig) -> Result<Self> {
        config.validate()?;
        let cache = Self::new(config.max_elements, config.default_ttl(), config.cache_name.clone())?;
        cache.set_ejection_logging(config.ejection_logging);
        cache.set_active_reaping(config.active_reaping)?;
        Ok(cache)
    }

    // == Put ==
    /// Stores a value with the default TTL. Returns the previous value.
    pub fn put(&self, key: K, value: V) -> Option<V> {
        self.put_with_ttl(key, value, self.default_ttl)
    }

    /// Stores a value with an explicit TTL. Returns the previous value.
    pub fn put_with_ttl(&self, key: K, value: V, ttl: Duration) -> Option<V> {
        let mut state = self.shared.state.lock();
        let previous = state.store.put(key, value, ttl, Instant::now());
        self.shared.wake.notify_one();
        previous
    }

    // == Get ==
    /// Returns a copy of the value if present and not expired.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let mut state = self.shared.state.lock();
        state.store.get(key, Instant::now())
    }

    // == Refresh ==
    /// Restarts the entry's lifetime with the default TTL.
    ///
    /// Returns false if the key is not cached.
    pub fn refresh<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let mut state = self.shared.state.lock();
        let refreshed = state.store.refresh(key, Instant::now());
        if refreshed {
            self.shared.wake.notify_one();
        }
        refreshed
    }

    // == Remove ==
    /// Removes the entry, returning its value if it was cached.
    pub fn remove<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let mut state = self.shared.state.lock();
        let removed = state.store.remove(key);
        if removed.is_some() {
            self.shared.wake.notify_one();
        }
        removed
    }

    // == Clear ==
    pub fn clear(&self) {
        let mut state = self.shared.state.lock();
        state.store.clear();
        self.shared.wake.notify_one();
    }

    /// Removes every expired entry now. Returns how many were removed.
    pub fn clear_stale(&self) -> usize {
        let mut state = self.shared.state.lock();
        state.store.clear_stale(Instant::now(), EjectionReason::Stale)
    }

    /// Remaining lifetime of a live entry. Does not count as an access.
    pub fn ttl_remaining<Q>(&self, key: &Q) -> Option<Duration>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let state = self.shared.state.lock();
        state.store.ttl_remaining(key, Instant::now())
    }

    // == Snapshots ==
    /// Copies the current keys.
    pub fn key_set(&self) -> HashSet<K> {
        self.shared.state.lock().store.keys()
    }

    /// Copies every cached value, least recently used first.
    pub fn get_all(&self) -> Vec<V> {
        self.shared.state.lock().store.values()
    }

    /// Copies the values of `keys`. Keys that are not cached are logged and
    /// skipped.
    pub fn get_all_referenced(&self, keys: &[K]) -> Vec<V> {
        self.shared.state.lock().store.values_for(keys)
    }

    // == Accessors ==
    pub fn size(&self) -> usize {
        self.shared.state.lock().store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.state.lock().store.is_empty()
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

    pub fn stats(&self) -> CacheStats {
        self.shared.state.lock().store.stats()
    }

    /// Named, timestamped statistics snapshot.
    pub fn report(&self) -> StatsReport {
        StatsReport::new(self.name.clone(), self.max_elements, self.stats())
    }

    /// Reports entries dropped by capacity pressure or expiration to the
    /// ejection listener.
    pub fn set_ejection_logging(&self, enabled: bool) {
        self.shared.state.lock().store.set_ejection_logging(enabled);
    }

    // == Active Reaping ==
    /// Starts or stops the background reaper.
    ///
    /// Starting while running and stopping while stopped are no-ops.
    /// Stopping blocks until the reaper thread has exited.
    ///
    /// # Errors
    /// [`CacheError::ReaperSpawn`] if the thread could not be started.
    pub fn set_active_reaping(&self, active: bool) -> Result<()> {
        let mut reaper = self.reaper.lock();
        if active {
            if reaper.is_none() {
                self.shared.state.lock().reaping = true;
                match spawn_reaper(self.shared.clone(), &self.name) {
                    Ok(handle) => *reaper = Some(handle),
                    Err(e) => {
                        self.shared.state.lock().reaping = false;
                        return Err(CacheError::ReaperSpawn(e.to_string()));
                    }
                }
            }
        } else if let Some(handle) = reaper.take() {
            stop_reaper(&self.shared, handle, &self.name);
        }
        Ok(())
    }

    pub fn is_actively_reaping(&self) -> bool {
        self.reaper.lock().is_some()
    }
}

/// Clears the keep-running flag, wakes the reaper and waits for it to exit.
fn stop_reaper<K, V>(shared: &Shared<K, V>, handle: JoinHandle<()>, name: &str) {
    {
        let mut state = shared.state.lock();
        state.reaping = false;
        shared.wake.notify_all();
    }
    if handle.join().is_err() {
        error!(cache = name, "{}: reaper thread exited with a panic", name);
    } else {
        info!(cache = name, "{}: active reaping stopped", name);
    }
}

impl<K, V> Drop for TimedLruCache<K, V> {
    fn drop(&mut self) {
        if let Some(handle) = self.reaper.get_mut().take() {
            stop_reaper(&self.shared, handle, &self.name);
        }
    }
}

impl<K, V> Debug for TimedLruCache<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimedLruCache")
            .field("name", &self.name)
            .field("max_elements", &self.max_elements)
            .field("default_ttl", &self.default_ttl)
            .finish_non_exhaustive()
    }
}
