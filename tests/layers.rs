//! Layered storage behavior through the public API: shared-layer
//! fallback, promote-on-hit, write-through invalidation, and the
//! capacity bound of the in-process layer.

use std::convert::Infallible;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dayold::layers::{CacheEntry, CacheLayer, MemoryLayer};
use dayold::{Dayold, ReadOptions};
use tokio::time::Instant;

/// A shared layer that counts reads, standing in for a remote store.
struct CountingLayer {
    inner: MemoryLayer<u32>,
    reads: AtomicUsize,
}

impl CountingLayer {
    fn new() -> Self {
        Self {
            inner: MemoryLayer::new(1024),
            reads: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl CacheLayer<u32> for CountingLayer {
    async fn read(&self, key: &str) -> Option<CacheEntry<u32>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.read(key).await
    }

    async fn write(&self, key: &str, entry: CacheEntry<u32>) {
        self.inner.write(key, entry).await;
    }

    async fn remove(&self, key: &str) -> bool {
        self.inner.remove(key).await
    }

    async fn clear(&self) {
        self.inner.clear().await;
    }

    async fn len(&self) -> usize {
        self.inner.len().await
    }

    async fn sweep_expired(&self, now: Instant) -> usize {
        self.inner.sweep_expired(now).await
    }
}

fn produce(value: u32) -> impl FnOnce() -> futures_util::future::BoxFuture<'static, Result<u32, Infallible>>
{
    move || Box::pin(async move { Ok(value) })
}

#[tokio::test(start_paused = true)]
async fn writes_go_through_to_the_shared_layer() {
    let shared = Arc::new(CountingLayer::new());
    let cache: Dayold<u32> = Dayold::builder()
        .without_sweeper()
        .shared_layer(shared.clone())
        .build()
        .await
        .unwrap();

    cache.get("k", produce(5)).await.unwrap();

    let entry = shared.inner.read("k").await.expect("written through");
    assert_eq!(*entry.value(), 5);
}

#[tokio::test(start_paused = true)]
async fn shared_layer_serves_keys_evicted_from_the_fast_layer() {
    let shared = Arc::new(CountingLayer::new());
    let cache: Dayold<u32> = Dayold::builder()
        .without_sweeper()
        .max_entries(1)
        .shared_layer(shared.clone())
        .build()
        .await
        .unwrap();

    cache.get("a", produce(1)).await.unwrap();
    tokio::time::advance(Duration::from_millis(1)).await;
    // Inserting "b" pushes "a" out of the one-slot fast layer.
    cache.get("b", produce(2)).await.unwrap();
    assert_eq!(cache.len(), 1);

    // "a" comes back from the shared layer without a producer call, and
    // is promoted into the fast layer again.
    let reads_before = shared.reads.load(Ordering::SeqCst);
    let value = cache.get("a", produce(99)).await.unwrap();
    assert_eq!(value, 1);
    assert!(shared.reads.load(Ordering::SeqCst) > reads_before);

    let stats = cache.stats();
    assert_eq!(stats.productions, 2);
    assert!(stats.promotions >= 1);
}

#[tokio::test(start_paused = true)]
async fn invalidate_clears_both_layers() {
    let shared = Arc::new(CountingLayer::new());
    let cache: Dayold<u32> = Dayold::builder()
        .without_sweeper()
        .shared_layer(shared.clone())
        .build()
        .await
        .unwrap();

    cache.get("k", produce(5)).await.unwrap();
    assert!(cache.invalidate("k").await);

    assert!(!cache.contains("k").await);
    assert!(shared.inner.read("k").await.is_none());
}

#[tokio::test(start_paused = true)]
async fn expired_entries_are_not_served_from_the_shared_layer() {
    let shared = Arc::new(CountingLayer::new());
    let cache: Dayold<u32> = Dayold::builder()
        .without_sweeper()
        .shared_layer(shared.clone())
        .build()
        .await
        .unwrap();
    let options = ReadOptions::new(Duration::from_millis(10), Duration::from_millis(20));

    cache.get_with("k", options, produce(1)).await.unwrap();
    tokio::time::advance(Duration::from_millis(30)).await;

    // Both copies are past retention: the read is a miss and produces.
    let value = cache.get_with("k", options, produce(2)).await.unwrap();
    assert_eq!(value, 2);
    assert_eq!(cache.stats().expired_reads, 1);
}

#[tokio::test(start_paused = true)]
async fn capacity_bound_holds_without_a_shared_layer() {
    let cache: Dayold<u32> = Dayold::builder()
        .without_sweeper()
        .max_entries(2)
        .build()
        .await
        .unwrap();

    for (i, key) in ["a", "b", "c"].iter().enumerate() {
        cache.get(key, produce(i as u32)).await.unwrap();
        tokio::time::advance(Duration::from_millis(1)).await;
    }

    assert_eq!(cache.len(), 2);
    assert!(!cache.contains("a").await);
    assert!(cache.contains("b").await);
    assert!(cache.contains("c").await);
    assert!(cache.stats().capacity_evictions >= 1);
}
