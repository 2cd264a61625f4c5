//! In-process cache layer
//!
//! DashMap-backed storage with a hard capacity bound. Overflow handling
//! sweeps expired entries first and falls back to evicting the oldest
//! live entries by `stored_at`.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::time::Instant;

use super::CacheLayer;
use crate::cache::entry::CacheEntry;

/// The always-present fast layer.
#[derive(Debug)]
pub struct MemoryLayer<V> {
    entries: DashMap<Arc<str>, CacheEntry<V>>,
    max_entries: usize,
}

impl<V> MemoryLayer<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: DashMap::new(),
            max_entries: max_entries.max(1),
        }
    }

    /// Bring the layer back under `max_entries`. Expired entries go
    /// first; live entries are evicted oldest-first after that.
    /// Returns (expired swept, live evicted).
    fn enforce_capacity(&self, now: Instant) -> (usize, usize) {
        if self.entries.len() <= self.max_entries {
            return (0, 0);
        }

        let mut swept = 0;
        self.entries.retain(|_, entry| {
            if entry.is_expired(now) {
                swept += 1;
                false
            } else {
                true
            }
        });

        let excess = self.entries.len().saturating_sub(self.max_entries);
        if excess == 0 {
            return (swept, 0);
        }

        // Oldest-first eviction. Collecting timestamps is O(n) but only
        // runs when an insert overflows the bound.
        let mut by_age: Vec<(Arc<str>, Instant)> = self
            .entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().stored_at()))
            .collect();
        by_age.sort_by_key(|(_, stored_at)| *stored_at);

        let mut evicted = 0;
        for (key, _) in by_age.into_iter().take(excess) {
            if self.entries.remove(&key).is_some() {
                evicted += 1;
            }
        }
        (swept, evicted)
    }

    /// Synchronous write used by both the trait impl and the stack's
    /// promote-on-hit path. Returns (expired swept, live evicted).
    pub(crate) fn insert(&self, key: Arc<str>, entry: CacheEntry<V>) -> (usize, usize) {
        self.entries.insert(key, entry);
        self.enforce_capacity(Instant::now())
    }

    pub(crate) fn get(&self, key: &str) -> Option<CacheEntry<V>> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    pub(crate) fn delete(&self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    pub(crate) fn entry_count(&self) -> usize {
        self.entries.len()
    }
}

#[async_trait]
impl<V> CacheLayer<V> for MemoryLayer<V>
where
    V: Clone + Send + Sync + 'static,
{
    async fn read(&self, key: &str) -> Option<CacheEntry<V>> {
        self.get(key)
    }

    async fn write(&self, key: &str, entry: CacheEntry<V>) {
        self.insert(Arc::from(key), entry);
    }

    async fn remove(&self, key: &str) -> bool {
        self.delete(key)
    }

    async fn clear(&self) {
        self.entries.clear();
    }

    async fn len(&self) -> usize {
        self.entry_count()
    }

    async fn sweep_expired(&self, now: Instant) -> usize {
        let mut swept = 0;
        self.entries.retain(|_, entry| {
            if entry.is_expired(now) {
                swept += 1;
                false
            } else {
                true
            }
        });
        swept
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn entry(value: u32) -> CacheEntry<u32> {
        CacheEntry::new(value, Duration::from_secs(1), Duration::from_secs(2))
    }

    #[tokio::test(start_paused = true)]
    async fn overwrites_keep_a_single_entry_per_key() {
        let layer = MemoryLayer::new(16);
        layer.write("k", entry(1)).await;
        layer.write("k", entry(2)).await;
        assert_eq!(layer.len().await, 1);
        assert_eq!(*layer.read("k").await.unwrap().value(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn capacity_overflow_evicts_oldest_live_entries() {
        let layer = MemoryLayer::new(2);
        layer.write("a", entry(1)).await;
        tokio::time::advance(Duration::from_millis(10)).await;
        layer.write("b", entry(2)).await;
        tokio::time::advance(Duration::from_millis(10)).await;
        layer.write("c", entry(3)).await;

        assert_eq!(layer.len().await, 2);
        assert!(layer.read("a").await.is_none());
        assert!(layer.read("b").await.is_some());
        assert!(layer.read("c").await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn overflow_prefers_sweeping_expired_entries() {
        let layer = MemoryLayer::new(2);
        layer.write("old", entry(1)).await;
        tokio::time::advance(Duration::from_secs(3)).await; // "old" is now expired
        layer.write("b", entry(2)).await;
        layer.write("c", entry(3)).await;

        assert!(layer.read("old").await.is_none());
        assert!(layer.read("b").await.is_some());
        assert!(layer.read("c").await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn sweep_removes_only_expired_entries() {
        let layer = MemoryLayer::new(16);
        layer.write("short", entry(1)).await;
        tokio::time::advance(Duration::from_secs(3)).await;
        layer.write("fresh", entry(2)).await;

        let swept = layer.sweep_expired(Instant::now()).await;
        assert_eq!(swept, 1);
        assert_eq!(layer.len().await, 1);
        assert!(layer.read("fresh").await.is_some());
    }
}
