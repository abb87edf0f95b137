//! Configuration Module
//!
//! Handles loading and validating cache configuration from environment variables.

use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CacheError, Result};

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of entries the cache can hold
    pub max_elements: usize,
    /// Default TTL in milliseconds for entries without explicit TTL
    pub default_ttl_ms: u64,
    /// Name used to prefix diagnostic messages
    pub cache_name: String,
    /// Whether a background reaper removes expired entries
    pub active_reaping: bool,
    /// Whether ejected entries are reported to the ejection listener
    pub ejection_logging: bool,
}

impl CacheConfig {
    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_MAX_ELEMENTS` - Maximum cache entries (default: 1000)
    /// - `CACHE_DEFAULT_TTL_MS` - Default TTL in milliseconds (default: 300000)
    /// - `CACHE_NAME` - Diagnostic name (default: "default")
    /// - `CACHE_ACTIVE_REAPING` - Start the reaper thread (default: false)
    /// - `CACHE_EJECTION_LOGGING` - Report ejected entries (default: false)
    ///
    /// Unset variables fall back to defaults; variables that are set but
    /// cannot be parsed are reported as [`CacheError::InvalidConfig`].
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let config = Self {
            max_elements: parse_var(&lookup, "CACHE_MAX_ELEMENTS", defaults.max_elements)?,
            default_ttl_ms: parse_var(&lookup, "CACHE_DEFAULT_TTL_MS", defaults.default_ttl_ms)?,
            cache_name: lookup("CACHE_NAME").unwrap_or(defaults.cache_name),
            active_reaping: parse_flag(&lookup, "CACHE_ACTIVE_REAPING", defaults.active_reaping)?,
            ejection_logging: parse_flag(
                &lookup,
                "CACHE_EJECTION_LOGGING",
                defaults.ejection_logging,
            )?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks the rules every cache construction enforces.
    pub fn validate(&self) -> Result<()> {
        if self.max_elements == 0 {
            return Err(CacheError::InvalidCapacity(self.max_elements));
        }
        if self.cache_name.trim().is_empty() {
            return Err(CacheError::MissingName);
        }
        Ok(())
    }

    /// Default TTL as a Duration.
    pub fn default_ttl(&self) -> Duration {
        Duration::from_millis(self.default_ttl_ms)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_elements: 1000,
            default_ttl_ms: 300_000,
            cache_name: "default".to_string(),
            active_reaping: false,
            ejection_logging: false,
        }
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| CacheError::InvalidConfig {
            key: key.to_string(),
            reason: e.to_string(),
        }),
    }
}

fn parse_flag<F>(lookup: &F, key: &str, default: bool) -> Result<bool>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key).as_deref().map(str::trim) {
        None => Ok(default),
        Some("1") | Some("true") | Some("yes") | Some("on") => Ok(true),
        Some("0") | Some("false") | Some("no") | Some("off") => Ok(false),
        Some(other) => Err(CacheError::InvalidConfig {
            key: key.to_string(),
            reason: format!("expected a boolean, got {:?}", other),
        }),
    }
}
