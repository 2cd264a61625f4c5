//! Layer stack: read-through with promote-on-hit
//!
//! Reads try the in-process layer first and fall back to the shared
//! layer, promoting shared hits into the in-process layer. Writes and
//! removals go through to every layer. Expired entries found on either
//! path are passively evicted and reported as absent.

use std::sync::Arc;

use tokio::time::Instant;

use super::memory::MemoryLayer;
use super::CacheLayer;
use crate::cache::entry::{CacheEntry, Freshness};
use crate::telemetry::CoordinatorStatistics;

/// Outcome of a stack read. Hits carry their freshness, classified once
/// against the instant the read was issued with, so callers never
/// re-derive it against a different clock reading.
pub(crate) enum LayerRead<V> {
    Fresh(CacheEntry<V>),
    Stale(CacheEntry<V>),
    /// An expired entry was found and passively evicted.
    Expired,
    Miss,
}

impl<V> LayerRead<V> {
    pub(crate) fn into_entry(self) -> Option<CacheEntry<V>> {
        match self {
            LayerRead::Fresh(entry) | LayerRead::Stale(entry) => Some(entry),
            _ => None,
        }
    }
}

pub(crate) struct LayerStack<V>
where
    V: Clone + Send + Sync + 'static,
{
    l1: Arc<MemoryLayer<V>>,
    l2: Option<Arc<dyn CacheLayer<V>>>,
    stats: Arc<CoordinatorStatistics>,
}

impl<V> Clone for LayerStack<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            l1: self.l1.clone(),
            l2: self.l2.clone(),
            stats: self.stats.clone(),
        }
    }
}

impl<V> LayerStack<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub(crate) fn new(
        max_entries: usize,
        l2: Option<Arc<dyn CacheLayer<V>>>,
        stats: Arc<CoordinatorStatistics>,
    ) -> Self {
        Self {
            l1: Arc::new(MemoryLayer::new(max_entries)),
            l2,
            stats,
        }
    }

    /// Read through the stack. Only non-expired entries count as hits;
    /// an expired entry is evicted from the layer it was found in. An
    /// expired in-process copy does not take the shared copy with it:
    /// another process may have refreshed the shared layer since, so the
    /// shared copy is read and judged on its own age.
    pub(crate) async fn read(&self, key: &str, now: Instant) -> LayerRead<V> {
        let mut found_expired = false;
        if let Some(entry) = self.l1.get(key) {
            match entry.classify(now) {
                Freshness::Fresh => return LayerRead::Fresh(entry),
                Freshness::Stale => return LayerRead::Stale(entry),
                Freshness::Expired => {
                    self.l1.delete(key);
                    self.stats.record_swept(1);
                    found_expired = true;
                }
            }
        }

        if let Some(l2) = &self.l2 {
            if let Some(entry) = l2.read(key).await {
                match entry.classify(now) {
                    Freshness::Expired => {
                        l2.remove(key).await;
                        self.stats.record_swept(1);
                        return LayerRead::Expired;
                    }
                    freshness => {
                        let (swept, evicted) = self.l1.insert(Arc::from(key), entry.clone());
                        self.stats.record_swept(swept);
                        self.stats.record_capacity_evictions(evicted);
                        self.stats.record_promotion();
                        return match freshness {
                            Freshness::Stale => LayerRead::Stale(entry),
                            _ => LayerRead::Fresh(entry),
                        };
                    }
                }
            }
        }

        if found_expired {
            LayerRead::Expired
        } else {
            LayerRead::Miss
        }
    }

    /// Write through to every layer. Each layer's insert replaces the
    /// previous entry atomically, so concurrent writers for the same key
    /// resolve last-writer-wins per layer.
    pub(crate) async fn write(&self, key: &Arc<str>, entry: CacheEntry<V>) {
        if let Some(l2) = &self.l2 {
            l2.write(key, entry.clone()).await;
        }
        let (swept, evicted) = self.l1.insert(key.clone(), entry);
        self.stats.record_swept(swept);
        self.stats.record_capacity_evictions(evicted);
    }

    pub(crate) async fn remove(&self, key: &str) -> bool {
        let removed_l1 = self.l1.delete(key);
        let removed_l2 = match &self.l2 {
            Some(l2) => l2.remove(key).await,
            None => false,
        };
        removed_l1 || removed_l2
    }

    pub(crate) async fn clear(&self) {
        CacheLayer::clear(self.l1.as_ref()).await;
        if let Some(l2) = &self.l2 {
            l2.clear().await;
        }
    }

    /// Live entry count of the in-process layer.
    pub(crate) fn len(&self) -> usize {
        self.l1.entry_count()
    }

    pub(crate) async fn sweep_expired(&self, now: Instant) -> usize {
        let mut swept = CacheLayer::sweep_expired(self.l1.as_ref(), now).await;
        if let Some(l2) = &self.l2 {
            swept += l2.sweep_expired(now).await;
        }
        swept
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn stack_with_l2() -> (LayerStack<u32>, Arc<MemoryLayer<u32>>) {
        let l2 = Arc::new(MemoryLayer::new(64));
        let stats = Arc::new(CoordinatorStatistics::new());
        let stack = LayerStack::new(64, Some(l2.clone() as Arc<dyn CacheLayer<u32>>), stats);
        (stack, l2)
    }

    fn entry(value: u32) -> CacheEntry<u32> {
        CacheEntry::new(value, Duration::from_secs(1), Duration::from_secs(2))
    }

    #[tokio::test(start_paused = true)]
    async fn shared_layer_hits_are_promoted() {
        let (stack, l2) = stack_with_l2();
        l2.write("k", entry(9)).await;

        let hit = stack.read("k", Instant::now()).await.into_entry().unwrap();
        assert_eq!(*hit.value(), 9);
        // Promoted: the next read is served without touching L2.
        assert_eq!(stack.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn writes_reach_both_layers() {
        let (stack, l2) = stack_with_l2();
        stack.write(&Arc::from("k"), entry(4)).await;

        assert_eq!(stack.len(), 1);
        assert_eq!(*l2.read("k").await.unwrap().value(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_entries_are_evicted_on_read() {
        let (stack, l2) = stack_with_l2();
        stack.write(&Arc::from("k"), entry(4)).await;
        tokio::time::advance(Duration::from_secs(3)).await;

        assert!(stack.read("k", Instant::now()).await.into_entry().is_none());
        assert_eq!(stack.len(), 0);
        assert!(l2.read("k").await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn a_newer_shared_copy_survives_local_expiry() {
        let (stack, l2) = stack_with_l2();
        stack.write(&Arc::from("k"), entry(1)).await;
        tokio::time::advance(Duration::from_secs(3)).await;

        // Another process refreshed the shared layer while the local
        // copy aged out.
        l2.write("k", entry(2)).await;

        let hit = stack.read("k", Instant::now()).await.into_entry().unwrap();
        assert_eq!(*hit.value(), 2);
        assert_eq!(*l2.read("k").await.unwrap().value(), 2);
        assert_eq!(stack.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn remove_clears_every_layer() {
        let (stack, l2) = stack_with_l2();
        stack.write(&Arc::from("k"), entry(4)).await;

        assert!(stack.remove("k").await);
        assert!(stack.read("k", Instant::now()).await.into_entry().is_none());
        assert!(l2.read("k").await.is_none());
    }
}
