//! Cache Module
//!
//! Provides in-memory caching with TTL expiration and LRU eviction.

mod arena;
mod eject;
mod list;
mod lru;
mod shared;
mod stats;
mod store;
mod timeout;

#[cfg(test)]
mod property_tests;

use std::time::Duration;

// Re-export public types
pub use eject::{EjectionListener, EjectionReason, TracingEjectionLog};
pub use shared::TimedLruCache;
pub use stats::{CacheStats, StatsReport};
pub use store::CacheStore;

pub(crate) use shared::Shared;

// == Public Constants ==
/// Longest lifetime an entry can be given; larger TTLs are clamped.
pub const MAX_TTL: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);
