//! Per-key in-flight production table
//!
//! At most one producer invocation is outstanding per key. Concurrent
//! callers attach to the same shared result instead of starting a second
//! production. The join-or-start decision happens under the entry's shard
//! lock, so no interleaving can start two productions for one key.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures_util::future::{BoxFuture, Shared};

use crate::cache::error::CacheOperationError;

/// The shared pending result every waiter for a key attaches to.
pub(crate) type SharedProduction<V> =
    Shared<BoxFuture<'static, Result<V, CacheOperationError>>>;

pub(crate) struct InFlightTable<V>
where
    V: Clone + Send + Sync + 'static,
{
    pending: DashMap<Arc<str>, SharedProduction<V>>,
}

impl<V> InFlightTable<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub(crate) fn new() -> Self {
        Self {
            pending: DashMap::new(),
        }
    }

    /// Attach to the production already in flight for `key`, or start one
    /// with `start`. Returns the shared result and whether this call
    /// started it. `start` runs under the shard lock and must not await.
    pub(crate) fn join_or_start<F>(&self, key: &Arc<str>, start: F) -> (SharedProduction<V>, bool)
    where
        F: FnOnce() -> SharedProduction<V>,
    {
        match self.pending.entry(key.clone()) {
            Entry::Occupied(occupied) => (occupied.get().clone(), false),
            Entry::Vacant(vacant) => {
                let production = start();
                vacant.insert(production.clone());
                (production, true)
            }
        }
    }

    /// Drop the marker for a settled production. Reached through
    /// [`InFlightGuard`], so a marker never outlives the producer call it
    /// stands for.
    pub(crate) fn finish(&self, key: &str) {
        self.pending.remove(key);
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.pending.len()
    }
}

/// Retires a production's marker when dropped.
///
/// The guard is captured by the production task's future, so the marker
/// is removed on every exit path: normal settling, a producer panic
/// unwinding the task, or the future being dropped before it ever ran.
/// Only this guard removes the marker, and a new production for the key
/// cannot start until the removal has happened, so the guard can never
/// retire a successor's marker.
pub(crate) struct InFlightGuard<V>
where
    V: Clone + Send + Sync + 'static,
{
    inflight: Arc<InFlightTable<V>>,
    key: Arc<str>,
}

impl<V> InFlightGuard<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub(crate) fn new(inflight: Arc<InFlightTable<V>>, key: Arc<str>) -> Self {
        Self { inflight, key }
    }
}

impl<V> Drop for InFlightGuard<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn drop(&mut self) {
        self.inflight.finish(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use futures_util::FutureExt;

    use super::*;

    fn ready(value: u32) -> SharedProduction<u32> {
        async move { Ok(value) }.boxed().shared()
    }

    #[tokio::test]
    async fn second_caller_joins_the_first_production() {
        let table: InFlightTable<u32> = InFlightTable::new();
        let key: Arc<str> = Arc::from("k");

        let (first, started_first) = table.join_or_start(&key, || ready(1));
        let (second, started_second) = table.join_or_start(&key, || ready(2));

        assert!(started_first);
        assert!(!started_second);
        assert_eq!(first.await.unwrap(), 1);
        assert_eq!(second.await.unwrap(), 1);
    }

    #[tokio::test]
    async fn finish_allows_a_new_production() {
        let table: InFlightTable<u32> = InFlightTable::new();
        let key: Arc<str> = Arc::from("k");

        let (_, started) = table.join_or_start(&key, || ready(1));
        assert!(started);
        table.finish(&key);
        assert_eq!(table.len(), 0);

        let (next, started) = table.join_or_start(&key, || ready(2));
        assert!(started);
        assert_eq!(next.await.unwrap(), 2);
    }
}
