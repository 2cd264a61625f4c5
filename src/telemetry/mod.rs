//! Coordinator statistics with atomic counters
//!
//! All counters are relaxed atomics updated on the hot path; `snapshot()`
//! materializes a serializable view with the derived hit rate.

use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam_utils::CachePadded;

/// Atomic counters for every observable coordinator event.
#[derive(Debug, Default)]
pub struct CoordinatorStatistics {
    /// Reads served from an entry younger than `stale_after`.
    fresh_hits: CachePadded<AtomicU64>,
    /// Reads served from a stale entry while revalidation may run.
    stale_hits: CachePadded<AtomicU64>,
    /// Cold reads: no entry at all for the key.
    misses: CachePadded<AtomicU64>,
    /// Cold reads caused by an entry aging past `expire_after`.
    expired_reads: CachePadded<AtomicU64>,
    /// Producer invocations started (cold and background alike).
    productions: CachePadded<AtomicU64>,
    /// Cold-path producer failures propagated to waiters.
    production_failures: CachePadded<AtomicU64>,
    /// Background revalidations started from stale hits.
    revalidations: CachePadded<AtomicU64>,
    /// Background revalidation failures (swallowed, stale entry kept).
    revalidation_failures: CachePadded<AtomicU64>,
    /// Callers that attached to an already in-flight production.
    coalesced_waiters: CachePadded<AtomicU64>,
    /// Explicit invalidations (single-key and full clears both count once).
    invalidations: CachePadded<AtomicU64>,
    /// Expired entries removed by reads and the maintenance sweeper.
    entries_swept: CachePadded<AtomicU64>,
    /// Entries promoted from the shared layer into the in-process layer.
    promotions: CachePadded<AtomicU64>,
    /// Live entries evicted to enforce the capacity bound.
    capacity_evictions: CachePadded<AtomicU64>,
}

/// Point-in-time view of the coordinator counters.
#[derive(Debug, Clone, serde::Serialize)]
pub struct StatsSnapshot {
    pub fresh_hits: u64,
    pub stale_hits: u64,
    pub misses: u64,
    pub expired_reads: u64,
    pub productions: u64,
    pub production_failures: u64,
    pub revalidations: u64,
    pub revalidation_failures: u64,
    pub coalesced_waiters: u64,
    pub invalidations: u64,
    pub entries_swept: u64,
    pub promotions: u64,
    pub capacity_evictions: u64,
    /// Fraction of reads answered without waiting on a producer.
    pub hit_rate: f64,
}

impl CoordinatorStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_fresh_hit(&self) {
        self.fresh_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_stale_hit(&self) {
        self.stale_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_expired_read(&self) {
        self.expired_reads.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_production(&self) {
        self.productions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_production_failure(&self) {
        self.production_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_revalidation(&self) {
        self.revalidations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_revalidation_failure(&self) {
        self.revalidation_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_coalesced_waiter(&self) {
        self.coalesced_waiters.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_invalidation(&self) {
        self.invalidations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_swept(&self, count: usize) {
        if count > 0 {
            self.entries_swept.fetch_add(count as u64, Ordering::Relaxed);
        }
    }

    pub fn record_promotion(&self) {
        self.promotions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_capacity_evictions(&self, count: usize) {
        if count > 0 {
            self.capacity_evictions
                .fetch_add(count as u64, Ordering::Relaxed);
        }
    }

    /// Materialize the counters into a serializable snapshot.
    pub fn snapshot(&self) -> StatsSnapshot {
        let fresh_hits = self.fresh_hits.load(Ordering::Relaxed);
        let stale_hits = self.stale_hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let expired_reads = self.expired_reads.load(Ordering::Relaxed);

        let hits = fresh_hits + stale_hits;
        let lookups = hits + misses + expired_reads;
        let hit_rate = if lookups > 0 {
            hits as f64 / lookups as f64
        } else {
            0.0
        };

        StatsSnapshot {
            fresh_hits,
            stale_hits,
            misses,
            expired_reads,
            productions: self.productions.load(Ordering::Relaxed),
            production_failures: self.production_failures.load(Ordering::Relaxed),
            revalidations: self.revalidations.load(Ordering::Relaxed),
            revalidation_failures: self.revalidation_failures.load(Ordering::Relaxed),
            coalesced_waiters: self.coalesced_waiters.load(Ordering::Relaxed),
            invalidations: self.invalidations.load(Ordering::Relaxed),
            entries_swept: self.entries_swept.load(Ordering::Relaxed),
            promotions: self.promotions.load(Ordering::Relaxed),
            capacity_evictions: self.capacity_evictions.load(Ordering::Relaxed),
            hit_rate,
        }
    }
}
