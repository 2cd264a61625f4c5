//! Simple public API for the dayold cache coordinator
//!
//! `Dayold<V>` is a cheaply clonable handle over the internal coordinator:
//! every clone shares the same layers, in-flight table, and maintenance
//! worker. Construction goes through [`DayoldBuilder`] so configuration is
//! validated before anything runs.

use std::error::Error;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::config::{CacheConfig, ReadOptions};
use crate::cache::coordinator::CacheCoordinator;
use crate::cache::error::CacheOperationError;
use crate::cache::layer::CacheLayer;
use crate::telemetry::StatsSnapshot;

/// Stale-while-revalidate cache handle.
///
/// `get` serves values through a layered cache with configurable
/// freshness (`stale_after`) and retention (`expire_after`): fresh hits
/// return immediately, stale hits return immediately while at most one
/// background revalidation runs, and misses wait on exactly one shared
/// producer invocation per key.
pub struct Dayold<V>
where
    V: Clone + Send + Sync + 'static,
{
    // Arc-wrapped coordinator: clones share state instead of spawning
    // another worker.
    coordinator: Arc<CacheCoordinator<V>>,
}

impl<V> Clone for Dayold<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            coordinator: self.coordinator.clone(),
        }
    }
}

impl<V> Dayold<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Create a new cache builder with fluent configuration.
    pub fn builder() -> DayoldBuilder<V> {
        DayoldBuilder::new()
    }

    /// Create a cache with the default configuration.
    pub async fn new() -> Result<Self, CacheOperationError> {
        Self::builder().build().await
    }

    /// Read through the cache with the configured default windows.
    ///
    /// The producer runs at most once concurrently per key, whatever the
    /// interleaving of callers. A cold-path producer failure is returned
    /// verbatim (see [`CacheOperationError::Production`]); a stale-path
    /// revalidation failure is swallowed and logged because the caller
    /// already has its value.
    pub async fn get<F, Fut, E>(&self, key: &str, producer: F) -> Result<V, CacheOperationError>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
        E: Error + Send + Sync + 'static,
    {
        let options = self.coordinator.default_read_options();
        self.coordinator.get(key, options, producer).await
    }

    /// Read through the cache with per-call freshness windows.
    pub async fn get_with<F, Fut, E>(
        &self,
        key: &str,
        options: ReadOptions,
        producer: F,
    ) -> Result<V, CacheOperationError>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
        E: Error + Send + Sync + 'static,
    {
        self.coordinator.get(key, options, producer).await
    }

    /// Remove any stored entry for `key` from every layer, immediately.
    ///
    /// An in-flight production for the key is not cancelled; when it
    /// completes, its result is still stored (last-writer-wins).
    pub async fn invalidate(&self, key: &str) -> bool {
        self.coordinator.invalidate(key).await
    }

    /// Clear all entries. No effect on productions already started.
    pub async fn invalidate_all(&self) {
        self.coordinator.invalidate_all().await;
    }

    /// True if a non-expired entry exists for `key`.
    pub async fn contains(&self, key: &str) -> bool {
        self.coordinator.contains(key).await
    }

    /// Live entry count of the in-process layer.
    pub fn len(&self) -> usize {
        self.coordinator.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the coordinator counters.
    pub fn stats(&self) -> StatsSnapshot {
        self.coordinator.stats()
    }

    /// Stop the maintenance worker and clear every layer. Subsequent
    /// reads fail with [`CacheOperationError::ShuttingDown`].
    pub async fn shutdown(&self) {
        self.coordinator.shutdown().await;
    }
}

/// Fluent builder for [`Dayold`].
pub struct DayoldBuilder<V>
where
    V: Clone + Send + Sync + 'static,
{
    config: CacheConfig,
    shared_layer: Option<Arc<dyn CacheLayer<V>>>,
    _marker: PhantomData<fn() -> V>,
}

impl<V> Default for DayoldBuilder<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<V> DayoldBuilder<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            config: CacheConfig::default(),
            shared_layer: None,
            _marker: PhantomData,
        }
    }

    /// Default freshness window for `get`.
    pub fn stale_after(mut self, window: Duration) -> Self {
        self.config.default_stale_after = window;
        self
    }

    /// Default retention window for `get`.
    pub fn expire_after(mut self, window: Duration) -> Self {
        self.config.default_expire_after = window;
        self
    }

    /// Interval of the background expired-entry sweep.
    pub fn sweep_interval(mut self, interval: Duration) -> Self {
        self.config.sweep_interval = Some(interval);
        self
    }

    /// Run without the maintenance worker; expiry is then purely passive.
    pub fn without_sweeper(mut self) -> Self {
        self.config.sweep_interval = None;
        self
    }

    /// Capacity bound of the in-process layer.
    pub fn max_entries(mut self, max_entries: usize) -> Self {
        self.config.max_entries = max_entries;
        self
    }

    /// Attach a slower shared layer (Redis-backed, disk-backed, ...)
    /// behind the in-process layer. Reads fall back to it and promote
    /// hits; writes and removals go through to it.
    pub fn shared_layer(mut self, layer: Arc<dyn CacheLayer<V>>) -> Self {
        self.shared_layer = Some(layer);
        self
    }

    /// Replace the whole configuration at once.
    pub fn config(mut self, config: CacheConfig) -> Self {
        self.config = config;
        self
    }

    /// Validate the configuration and start the coordinator.
    pub async fn build(self) -> Result<Dayold<V>, CacheOperationError> {
        let coordinator = CacheCoordinator::new(self.config, self.shared_layer)?;
        Ok(Dayold {
            coordinator: Arc::new(coordinator),
        })
    }
}
