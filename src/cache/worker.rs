//! Background maintenance worker
//!
//! One interval task per coordinator. Each cycle sweeps expired entries
//! out of every layer. The task stops when the coordinator signals
//! shutdown or drops its end of the watch channel.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::cache::layer::stack::LayerStack;
use crate::telemetry::CoordinatorStatistics;

pub(crate) fn spawn_maintenance<V>(
    layers: LayerStack<V>,
    stats: Arc<CoordinatorStatistics>,
    interval: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) -> JoinHandle<()>
where
    V: Clone + Send + Sync + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick fires immediately; skip it so a fresh coordinator
        // does not sweep an empty store.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let swept = layers.sweep_expired(Instant::now()).await;
                    stats.record_swept(swept);
                    if swept > 0 {
                        log::debug!("maintenance sweep removed {} expired entries", swept);
                    }
                }
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        log::debug!("maintenance worker stopping");
                        break;
                    }
                }
            }
        }
    })
}
