//! Coordinator configuration and per-read options
//!
//! Defaults follow the common stale-while-revalidate posture: a short
//! freshness window (5 seconds) inside a much longer retention window
//! (5 minutes). All validation happens before any producer is invoked.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cache::error::CacheOperationError;

/// Coordinator-wide configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Default freshness window applied by `get`.
    pub default_stale_after: Duration,
    /// Default retention window applied by `get`.
    pub default_expire_after: Duration,
    /// Interval of the background sweep of expired entries.
    /// `None` disables the maintenance worker entirely.
    pub sweep_interval: Option<Duration>,
    /// Capacity bound of the in-process layer. When an insert pushes the
    /// layer over this bound, expired entries are swept first and the
    /// oldest live entries are evicted after that.
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_stale_after: Duration::from_secs(5),
            default_expire_after: Duration::from_secs(300),
            sweep_interval: Some(Duration::from_secs(60)),
            max_entries: 10_000,
        }
    }
}

impl CacheConfig {
    /// Validate the configuration before the coordinator is built.
    pub fn validate(&self) -> Result<(), CacheOperationError> {
        if self.default_stale_after > self.default_expire_after {
            return Err(CacheOperationError::InvalidConfiguration(format!(
                "default_stale_after ({:?}) exceeds default_expire_after ({:?})",
                self.default_stale_after, self.default_expire_after
            )));
        }
        if self.max_entries == 0 {
            return Err(CacheOperationError::InvalidConfiguration(
                "max_entries must be at least 1".to_string(),
            ));
        }
        if let Some(interval) = self.sweep_interval {
            if interval.is_zero() {
                return Err(CacheOperationError::InvalidConfiguration(
                    "sweep_interval must be non-zero; use None to disable sweeping".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Per-read options derived from the configured defaults.
    pub fn default_read_options(&self) -> ReadOptions {
        ReadOptions {
            stale_after: self.default_stale_after,
            expire_after: self.default_expire_after,
        }
    }
}

/// Freshness and retention windows for a single read.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ReadOptions {
    /// Age after which the entry is stale but still servable.
    pub stale_after: Duration,
    /// Age after which the entry must no longer be served.
    pub expire_after: Duration,
}

impl ReadOptions {
    pub fn new(stale_after: Duration, expire_after: Duration) -> Self {
        Self {
            stale_after,
            expire_after,
        }
    }

    /// Reject options that would let an entry expire before it goes stale.
    pub fn validate(&self) -> Result<(), CacheOperationError> {
        if self.stale_after > self.expire_after {
            return Err(CacheOperationError::InvalidArgument(format!(
                "stale_after ({:?}) exceeds expire_after ({:?})",
                self.stale_after, self.expire_after
            )));
        }
        Ok(())
    }
}

impl Default for ReadOptions {
    fn default() -> Self {
        CacheConfig::default().default_read_options()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(CacheConfig::default().validate().is_ok());
    }

    #[test]
    fn inverted_windows_are_rejected() {
        let options = ReadOptions::new(Duration::from_secs(10), Duration::from_secs(1));
        assert!(matches!(
            options.validate(),
            Err(CacheOperationError::InvalidArgument(_))
        ));
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let config = CacheConfig {
            max_entries: 0,
            ..CacheConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(CacheOperationError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn equal_windows_are_allowed() {
        let options = ReadOptions::new(Duration::from_secs(5), Duration::from_secs(5));
        assert!(options.validate().is_ok());
    }
}
