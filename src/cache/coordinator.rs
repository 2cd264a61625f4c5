//! Cache coordinator: the read path, production, and invalidation
//!
//! Serves cached values fast, keeps them reasonably fresh, and never runs
//! redundant concurrent work to produce the same value. Fresh and stale
//! hits return without awaiting any producer; a miss or fully expired
//! read awaits exactly one shared production per key.

use std::error::Error;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures_util::FutureExt;
use tokio::sync::watch;
use tokio::time::Instant;

use crate::cache::config::{CacheConfig, ReadOptions};
use crate::cache::entry::CacheEntry;
use crate::cache::error::CacheOperationError;
use crate::cache::inflight::{InFlightGuard, InFlightTable, SharedProduction};
use crate::cache::layer::stack::{LayerRead, LayerStack};
use crate::cache::layer::CacheLayer;
use crate::cache::worker;
use crate::telemetry::{CoordinatorStatistics, StatsSnapshot};

/// What triggered a production, for logging and failure policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProductionTrigger {
    /// Cold path: a waiter is blocked on the result.
    Cold,
    /// Detached revalidation behind a stale hit. Failures are swallowed.
    Revalidation,
}

pub(crate) struct CacheCoordinator<V>
where
    V: Clone + Send + Sync + 'static,
{
    config: CacheConfig,
    layers: LayerStack<V>,
    inflight: Arc<InFlightTable<V>>,
    stats: Arc<CoordinatorStatistics>,
    shutting_down: AtomicBool,
    // Dropping the sender stops the maintenance worker with the coordinator.
    shutdown_tx: watch::Sender<bool>,
}

impl<V> CacheCoordinator<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Build the coordinator and start its maintenance worker. Must be
    /// called from within a tokio runtime.
    pub(crate) fn new(
        config: CacheConfig,
        shared_layer: Option<Arc<dyn CacheLayer<V>>>,
    ) -> Result<Self, CacheOperationError> {
        config.validate()?;

        let stats = Arc::new(CoordinatorStatistics::new());
        let layers = LayerStack::new(config.max_entries, shared_layer, stats.clone());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        if let Some(interval) = config.sweep_interval {
            let _worker =
                worker::spawn_maintenance(layers.clone(), stats.clone(), interval, shutdown_rx);
        }

        Ok(Self {
            config,
            layers,
            inflight: Arc::new(InFlightTable::new()),
            stats,
            shutting_down: AtomicBool::new(false),
            shutdown_tx,
        })
    }

    pub(crate) fn default_read_options(&self) -> ReadOptions {
        self.config.default_read_options()
    }

    /// The read path. See the crate docs for the fresh/stale/expired
    /// contract; classification and the decision to start or join a
    /// production happen against atomic map state, so no caller can
    /// observe a half-updated entry or start a duplicate production.
    pub(crate) async fn get<F, Fut, E>(
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
        if self.shutting_down.load(Ordering::Acquire) {
            return Err(CacheOperationError::ShuttingDown);
        }
        if key.is_empty() {
            return Err(CacheOperationError::InvalidArgument(
                "cache key must be non-empty".to_string(),
            ));
        }
        options.validate()?;

        let key: Arc<str> = Arc::from(key);
        let now = Instant::now();

        match self.layers.read(&key, now).await {
            LayerRead::Fresh(entry) => {
                self.stats.record_fresh_hit();
                return Ok(entry.into_value());
            }
            LayerRead::Stale(entry) => {
                self.stats.record_stale_hit();
                self.spawn_revalidation(&key, options, producer);
                return Ok(entry.into_value());
            }
            LayerRead::Expired => self.stats.record_expired_read(),
            LayerRead::Miss => self.stats.record_miss(),
        }

        let (production, started) = self.inflight.join_or_start(&key, || {
            self.start_production(key.clone(), options, producer, ProductionTrigger::Cold)
        });
        if !started {
            self.stats.record_coalesced_waiter();
        }
        production.await
    }

    /// Start at most one detached revalidation for a stale key. If any
    /// production is already in flight for the key, regardless of what
    /// triggered it, nothing new is started.
    fn spawn_revalidation<F, Fut, E>(&self, key: &Arc<str>, options: ReadOptions, producer: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
        E: Error + Send + Sync + 'static,
    {
        let (_, started) = self.inflight.join_or_start(key, || {
            self.start_production(
                key.clone(),
                options,
                producer,
                ProductionTrigger::Revalidation,
            )
        });
        if started {
            self.stats.record_revalidation();
        }
    }

    /// Run the producer in its own task and hand back a shared handle for
    /// waiters. The task completes and stores the result even when nobody
    /// awaits it. A guard moved into the task retires the in-flight
    /// marker on every exit path, including a producer panic or the task
    /// being torn down before it ran, so a detached revalidation can
    /// never leave a dead marker that blocks future productions. On
    /// success the entry is written before the guard drops: a reader
    /// either finds the marker or finds the stored entry, never neither.
    fn start_production<F, Fut, E>(
        &self,
        key: Arc<str>,
        options: ReadOptions,
        producer: F,
        trigger: ProductionTrigger,
    ) -> SharedProduction<V>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
        E: Error + Send + Sync + 'static,
    {
        self.stats.record_production();

        let layers = self.layers.clone();
        let stats = self.stats.clone();
        let waiter_key = key.clone();
        let guard = InFlightGuard::new(self.inflight.clone(), key.clone());
        let task = tokio::spawn(async move {
            let _guard = guard;
            match producer().await {
                Ok(value) => {
                    let entry =
                        CacheEntry::new(value.clone(), options.stale_after, options.expire_after);
                    layers.write(&key, entry).await;
                    Ok(value)
                }
                Err(err) => {
                    // Failure never poisons the store: the key stays
                    // absent (cold) or keeps its stale entry (revalidation).
                    stats.record_production_failure();
                    match trigger {
                        ProductionTrigger::Cold => {
                            log::debug!("production for key {:?} failed: {}", key, err);
                        }
                        ProductionTrigger::Revalidation => {
                            stats.record_revalidation_failure();
                            log::warn!(
                                "revalidation for key {:?} failed, keeping stale entry: {}",
                                key,
                                err
                            );
                        }
                    }
                    Err(CacheOperationError::production(err))
                }
            }
        });

        // Waiter wrapper: joins the task and maps host cancellation (or a
        // producer panic) to ProductionCancelled for every waiter. Marker
        // cleanup is the guard's job, not the wrapper's: the wrapper may
        // run long after a successor production has started.
        async move {
            match task.await {
                Ok(result) => result,
                Err(join_err) => {
                    log::warn!(
                        "production task for key {:?} did not settle: {}",
                        waiter_key,
                        join_err
                    );
                    Err(CacheOperationError::ProductionCancelled)
                }
            }
        }
        .boxed()
        .shared()
    }

    pub(crate) async fn invalidate(&self, key: &str) -> bool {
        self.stats.record_invalidation();
        self.layers.remove(key).await
    }

    pub(crate) async fn invalidate_all(&self) {
        self.stats.record_invalidation();
        self.layers.clear().await;
    }

    pub(crate) async fn contains(&self, key: &str) -> bool {
        self.layers
            .read(key, Instant::now())
            .await
            .into_entry()
            .is_some()
    }

    pub(crate) fn len(&self) -> usize {
        self.layers.len()
    }

    pub(crate) fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Stop the maintenance worker and clear every layer. Reads issued
    /// after shutdown fail with `ShuttingDown`; in-flight productions are
    /// left to settle on their own.
    pub(crate) async fn shutdown(&self) {
        self.shutting_down.store(true, Ordering::Release);
        let _ = self.shutdown_tx.send(true);
        self.layers.clear().await;
    }
}
