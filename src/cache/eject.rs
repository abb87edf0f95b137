//! Ejection Reporting
//!
//! Entries removed by the cache itself (as opposed to an explicit `remove`)
//! are reported to an [`EjectionListener`] when ejection logging is on.

use std::fmt::{self, Debug};

use tracing::debug;

// == Ejection Reason ==
/// Why the cache dropped an entry on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EjectionReason {
    /// Least recently used entry removed to make room
    Capacity,
    /// Expired entry found by `get`
    Expired,
    /// Expired entry removed by a stale sweep on the caller's thread
    Stale,
    /// Expired entry removed by the background reaper
    Reaped,
}

impl fmt::Display for EjectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            EjectionReason::Capacity => "overloaded cache",
            EjectionReason::Expired => "timed-out entry in get",
            EjectionReason::Stale => "timed-out entry",
            EjectionReason::Reaped => "reaped timed-out entry",
        };
        f.write_str(text)
    }
}

// == Listener Trait ==
/// Receives one call per ejected entry.
///
/// Invoked while the cache lock is held: implementations must not call back
/// into the same cache.
pub trait EjectionListener<K>: Send + Sync {
    fn on_ejection(&self, cache_name: &str, key: &K, reason: EjectionReason);
}

// == Tracing Listener ==
/// Default listener: one `debug` event per ejection.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEjectionLog;

impl<K: Debug> EjectionListener<K> for TracingEjectionLog {
    fn on_ejection(&self, cache_name: &str, key: &K, reason: EjectionReason) {
        debug!(cache = cache_name, ?key, %reason, "{}: {}: removing cached item", cache_name, reason);
    }
}

impl<K, F> EjectionListener<K> for F
where
    F: Fn(&str, &K, EjectionReason) + Send + Sync,
{
    fn on_ejection(&self, cache_name: &str, key: &K, reason: EjectionReason) {
        self(cache_name, key, reason)
    }
}
