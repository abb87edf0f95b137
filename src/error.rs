//! Error types for the cache
//!
//! Provides unified error handling using thiserror. Cache misses are not
//! errors; only configuration problems are reported through this type.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for cache construction and configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// The element bound must be at least one
    #[error("Invalid capacity: max_elements must be greater than 0 (got {0})")]
    InvalidCapacity(usize),

    /// Every cache needs a name for its diagnostics
    #[error("Missing cache name: a non-empty cache name is required")]
    MissingName,

    /// The background reaper thread could not be started
    #[error("Failed to start reaper thread: {0}")]
    ReaperSpawn(String),

    /// A configuration value could not be parsed
    #[error("Invalid configuration for {key}: {reason}")]
    InvalidConfig { key: String, reason: String },
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
