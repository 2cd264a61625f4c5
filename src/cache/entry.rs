//! Cache entry storage and freshness classification
//!
//! Entries carry their own freshness windows so classification is
//! independent of which layer served them. Classification uses strict
//! half-open intervals: `age < stale_after` is fresh,
//! `stale_after <= age < expire_after` is stale, `age >= expire_after`
//! is expired and must be treated as absent.

use std::time::Duration;

use tokio::time::Instant;

/// Freshness classification of a stored entry at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Servable with no revalidation.
    Fresh,
    /// Servable immediately while a background revalidation may run.
    Stale,
    /// Never servable; reads treat the entry as absent and evict it.
    Expired,
}

/// A single cached value with its write timestamp and freshness windows.
///
/// Overwrite semantics: at most one entry per key per layer, replaced
/// whole on every successful production.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    value: V,
    stored_at: Instant,
    stale_after: Duration,
    expire_after: Duration,
}

impl<V> CacheEntry<V> {
    /// Create an entry stamped at the current instant.
    ///
    /// Callers must have validated `stale_after <= expire_after` already;
    /// the windows are clamped here so a raced construction can never
    /// produce an entry that expires before it goes stale.
    pub fn new(value: V, stale_after: Duration, expire_after: Duration) -> Self {
        Self {
            value,
            stored_at: Instant::now(),
            stale_after: stale_after.min(expire_after),
            expire_after,
        }
    }

    /// Age of the entry at `now`.
    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.stored_at)
    }

    /// Classify the entry at `now` using half-open interval boundaries.
    pub fn classify(&self, now: Instant) -> Freshness {
        let age = self.age(now);
        if age < self.stale_after {
            Freshness::Fresh
        } else if age < self.expire_after {
            Freshness::Stale
        } else {
            Freshness::Expired
        }
    }

    /// True once the entry may no longer be served at all.
    pub fn is_expired(&self, now: Instant) -> bool {
        self.classify(now) == Freshness::Expired
    }

    pub fn value(&self) -> &V {
        &self.value
    }

    pub fn into_value(self) -> V {
        self.value
    }

    pub fn stored_at(&self) -> Instant {
        self.stored_at
    }
}
