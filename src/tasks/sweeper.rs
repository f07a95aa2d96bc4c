//! Expiration Sweeper Task
//!
//! Background task that periodically removes entries whose TTL has elapsed.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::task::TaskTracker;
use tracing::{debug, info};

use crate::cache::{CacheItem, CacheStore};

/// Spawns a background task that periodically sweeps expired cache entries.
///
/// Every `sweep_interval` the task locks the store, evicts each entry whose
/// `created_at + ttl` is at or before the current instant, and releases the
/// lock. An entry is therefore gone at most one interval after it expires.
/// The first sweep runs one interval after the task is first polled.
///
/// The task stops as soon as `true` is sent on `shutdown_rx` or the sender is
/// dropped.
///
/// # Arguments
/// * `store` - Shared store guarded by the cache's exclusive lock
/// * `sweep_interval` - Time between sweeps
/// * `shutdown_rx` - Watch receiver for the stop signal
/// * `tracker` - Tracker the task is registered with, so shutdown can await it
///
/// # Example
/// ```ignore
/// let (shutdown_tx, shutdown_rx) = watch::channel(false);
/// let tracker = TaskTracker::new();
/// let handle = spawn_sweeper_task(store.clone(), Duration::from_secs(1), shutdown_rx, &tracker);
/// // Later, during shutdown:
/// let _ = shutdown_tx.send(true);
/// handle.await?;
/// ```
pub fn spawn_sweeper_task<I>(
    store: Arc<Mutex<CacheStore<I>>>,
    sweep_interval: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
    tracker: &TaskTracker,
) -> JoinHandle<()>
where
    I: CacheItem + ?Sized,
{
    tracker.spawn(async move {
        info!(
            sweep_interval_ms = sweep_interval.as_millis() as u64,
            "Starting expiration sweeper"
        );

        let mut ticker = interval_at(Instant::now() + sweep_interval, sweep_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        info!("Expiration sweeper stopping");
                        break;
                    }
                }
                _ = ticker.tick() => {
                    let (removed, remaining) = {
                        let mut guard = store.lock().await;
                        let removed = guard.sweep_expired(Instant::now());
                        (removed, guard.len())
                    };

                    if removed > 0 {
                        info!(removed, remaining, "Sweep removed expired entries");
                    } else {
                        debug!(remaining, "Sweep found no expired entries");
                    }
                }
            }
        }
    })
}
