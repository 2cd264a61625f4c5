//! Storage layers behind the coordinator
//!
//! The coordinator reads through a stack of layers: a fast in-process
//! layer that is always present, and an optional slower shared layer
//! supplied by the caller (a Redis- or disk-backed store, typically).
//! Layers store whole entries, timestamps included, so freshness
//! classification never depends on which layer answered.

pub(crate) mod memory;
pub(crate) mod stack;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::cache::entry::CacheEntry;

/// An object-safe storage layer.
///
/// Implementations must apply each mutation atomically per key: a reader
/// sees either the previous entry or the new one, never a torn write.
/// `dayold` ships [`memory::MemoryLayer`]; callers plug in their own
/// shared layer through [`crate::DayoldBuilder::shared_layer`].
#[async_trait]
pub trait CacheLayer<V>: Send + Sync
where
    V: Clone + Send + Sync + 'static,
{
    /// Fetch the entry for `key`, expired or not. Expiry filtering is the
    /// stack's job so that passive eviction is applied uniformly.
    async fn read(&self, key: &str) -> Option<CacheEntry<V>>;

    /// Store `entry` under `key`, replacing any previous entry whole.
    async fn write(&self, key: &str, entry: CacheEntry<V>);

    /// Remove the entry for `key`. Returns true if one was present.
    async fn remove(&self, key: &str) -> bool;

    /// Drop every entry.
    async fn clear(&self);

    /// Number of stored entries, expired ones included.
    async fn len(&self) -> usize;

    /// Remove every entry already expired at `now`. Returns the count.
    async fn sweep_expired(&self, now: Instant) -> usize;
}
