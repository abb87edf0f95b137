//! Timed LRU - A bounded in-memory cache
//!
//! Evicts entries by two policies at once: least-recently-used capacity
//! eviction and per-entry TTL expiration, with an optional background reaper.

pub mod cache;
pub mod config;
pub mod error;
mod tasks;

pub use cache::{CacheStats, EjectionListener, EjectionReason, StatsReport, TimedLruCache};
pub use config::CacheConfig;
pub use error::{CacheError, Result};
