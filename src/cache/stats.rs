//! Cache Statistics Module
//!
//! Tracks cache performance metrics including hits, misses, evictions and
//! expirations.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cache::EjectionReason;

// == Cache Stats ==
/// Tracks cache performance metrics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Number of successful cache retrievals
    pub hits: u64,
    /// Number of failed cache retrievals (key not found or expired)
    pub misses: u64,
    /// Number of entries evicted due to LRU capacity pressure
    pub evictions: u64,
    /// Number of entries removed because their TTL elapsed
    pub expirations: u64,
    /// Current number of entries in the cache
    pub total_entries: usize,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    // == Record Ejection ==
    /// Counts an entry the cache dropped on its own.
    pub fn record_ejection(&mut self, reason: EjectionReason) {
        match reason {
            EjectionReason::Capacity => self.evictions += 1,
            EjectionReason::Expired | EjectionReason::Stale | EjectionReason::Reaped => {
                self.expirations += 1
            }
        }
    }

    pub fn set_total_entries(&mut self, count: usize) {
        self.total_entries = count;
    }
}

// == Stats Report ==
/// Timestamped, named snapshot suitable for JSON output.
#[derive(Debug, Clone, Serialize)]
pub struct StatsReport {
    pub cache: String,
    pub taken_at: DateTime<Utc>,
    pub max_elements: usize,
    pub hit_rate: f64,
    #[serde(flatten)]
    pub stats: CacheStats,
}

impl StatsReport {
    pub fn new(cache: impl Into<String>, max_elements: usize, stats: CacheStats) -> Self {
        Self {
            cache: cache.into(),
            taken_at: Utc::now(),
            max_elements,
            hit_rate: stats.hit_rate(),
            stats,
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_new() {
        let stats = CacheStats::new();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.evictions, 0);
        assert_eq!(stats.expirations, 0);
        assert_eq!(stats.total_entries, 0);
    }

    #[test]
    fn test_hit_rate_no_requests() {
        let stats = CacheStats::new();
        assert_eq!(stats.hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_mixed() {
        let mut stats = CacheStats::new();
        stats.record_hit();
        stats.record_hit();
        stats.record_hit();
        stats.record_miss();
        assert_eq!(stats.hit_rate(), 0.75);
    }

    #[test]
    fn test_record_ejection_by_reason() {
        let mut stats = CacheStats::new();
        stats.record_ejection(EjectionReason::Capacity);
        stats.record_ejection(EjectionReason::Capacity);
        stats.record_ejection(EjectionReason::Expired);
        stats.record_ejection(EjectionReason::Stale);
        stats.record_ejection(EjectionReason::Reaped);
        assert_eq!(stats.evictions, 2);
        assert_eq!(stats.expirations, 3);
    }

    #[test]
    fn test_report_serializes_flat() {
        let mut stats = CacheStats::new();
        stats.record_hit();
        stats.set_total_entries(42);

        let report = StatsReport::new("sessions", 100, stats);
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["cache"], "sessions");
        assert_eq!(json["max_elements"], 100);
        assert_eq!(json["hits"], 1);
        assert_eq!(json["total_entries"], 42);
        assert_eq!(json["hit_rate"], 1.0);
        assert!(json["taken_at"].is_string());
    }
}
