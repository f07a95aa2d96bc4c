//! Cache Engine Module
//!
//! Concurrent front of the cache: a single exclusive lock around the store,
//! inline or background fills, and the expiration sweeper's lifecycle.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::task::TaskTracker;
use tracing::{debug, info};

use crate::cache::{CacheItem, CacheStats, CacheStore, EntryInfo};
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};
use crate::tasks::spawn_sweeper_task;

// == Fill Status ==
/// How a background fill ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillStatus {
    /// The item's fill succeeded
    Filled,
    /// The item's fill returned an error; the next lookup surfaces it
    Failed,
    /// The fill task panicked or was cancelled before finishing
    Aborted,
}

// == Fill Handle ==
/// Handle to the background fill started by `MemCache::admit_async`.
///
/// Dropping the handle detaches the fill; it keeps running and its outcome
/// is still recorded into the entry.
#[derive(Debug)]
pub struct FillHandle {
    key: String,
    handle: JoinHandle<FillStatus>,
}

impl FillHandle {
    // == Key ==
    /// Returns the key of the entry being filled.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns true once the fill has finished and its outcome is recorded.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Waits for the fill to finish.
    pub async fn wait(self) -> FillStatus {
        self.handle.await.unwrap_or(FillStatus::Aborted)
    }
}

// == Pending Admission ==
/// Withdraws an inline admission if its caller stops waiting (for example
/// under `tokio::time::timeout`) before the fill outcome is written back.
struct PendingAdmission<I: CacheItem + ?Sized> {
    store: Arc<Mutex<CacheStore<I>>>,
    tasks: TaskTracker,
    key: String,
    generation: u64,
    armed: bool,
}

impl<I: CacheItem + ?Sized> PendingAdmission<I> {
    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl<I: CacheItem + ?Sized> Drop for PendingAdmission<I> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        debug!(key = %self.key, generation = self.generation, "Withdrawing abandoned inline admission");

        if let Ok(mut store) = self.store.try_lock() {
            store.withdraw(&self.key, self.generation);
            return;
        }

        // Lock is busy: finish the withdrawal on a tracked task
        let Ok(runtime) = Handle::try_current() else {
            return;
        };
        let store = Arc::clone(&self.store);
        let key = std::mem::take(&mut self.key);
        let generation = self.generation;
        self.tasks.spawn_on(
            async move {
                store.lock().await.withdraw(&key, generation);
            },
            &runtime,
        );
    }
}

// == Mem Cache ==
/// Keyed, time-expiring cache of lazily filled items.
///
/// Every operation on the key map, including the sweeper's scan and a fill's
/// outcome write-back, serializes through one exclusive lock that is never
/// held while an item fills.
///
/// Lookups do not check TTL. Expired entries stay visible until the next
/// sweep, so an entry admitted at `t0` is guaranteed present before
/// `t0 + ttl` and gone by `t0 + ttl + sweep_interval`.
///
/// Dropping the cache stops the sweeper; `shutdown` additionally waits for it
/// and for outstanding fills.
pub struct MemCache<I: CacheItem + ?Sized> {
    store: Arc<Mutex<CacheStore<I>>>,
    config: CacheConfig,
    shutdown_tx: watch::Sender<bool>,
    tasks: TaskTracker,
}

impl<I: CacheItem + ?Sized> MemCache<I> {
    // == Constructor ==
    /// Creates a cache and starts its sweeper.
    ///
    /// Each non-positive argument is replaced by its default (capacity 10,
    /// sweep interval 60 000 ms, TTL 600 000 ms).
    ///
    /// # Panics
    /// Must be called from within a Tokio runtime.
    pub fn new(capacity: i64, sweep_interval_ms: i64, ttl_ms: i64) -> Self {
        Self::with_config(CacheConfig::new(capacity, sweep_interval_ms, ttl_ms))
    }

    /// Creates a cache from an explicit configuration and starts its sweeper.
    ///
    /// # Panics
    /// Must be called from within a Tokio runtime.
    pub fn with_config(config: CacheConfig) -> Self {
        let store = Arc::new(Mutex::new(CacheStore::new(
            config.capacity,
            config.default_ttl,
        )));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let tasks = TaskTracker::new();

        spawn_sweeper_task(Arc::clone(&store), config.sweep_interval, shutdown_rx, &tasks);

        Self {
            store,
            config,
            shutdown_tx,
            tasks,
        }
    }

    // == Config ==
    /// Returns the effective configuration after default substitution.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    // == Admit (inline fill) ==
    /// Admits `item` and fills it before returning.
    ///
    /// The entry is visible to lookups while the fill runs. If the fill
    /// fails, the entry is evicted and the fill error is returned from this
    /// call instead of from the next lookup, which reports `NotFound`.
    ///
    /// The caller is responsible for bounding how long the fill may take.
    /// If this future is dropped before the fill finishes (e.g. by
    /// `tokio::time::timeout`), the pending entry is withdrawn and the key
    /// can be admitted again.
    pub async fn admit(&self, item: Arc<I>) -> Result<()> {
        self.admit_inline(item, None).await
    }

    /// Like `admit`, with an entry-specific TTL (zero means the default).
    pub async fn admit_with_ttl(&self, item: Arc<I>, ttl: Duration) -> Result<()> {
        self.admit_inline(item, Some(ttl)).await
    }

    async fn admit_inline(&self, item: Arc<I>, ttl: Option<Duration>) -> Result<()> {
        let key = item.key().to_string();
        let generation = self.store.lock().await.admit(Arc::clone(&item), ttl)?;
        let mut admission = PendingAdmission {
            store: Arc::clone(&self.store),
            tasks: self.tasks.clone(),
            key: key.clone(),
            generation,
            armed: true,
        };

        let outcome = item.fill().await;

        let mut store = self.store.lock().await;
        admission.disarm();
        match outcome {
            Ok(()) => {
                if !store.record_fill(&key, generation, Ok(())) {
                    debug!(key = %key, generation, "Entry left the cache during inline fill");
                }
                Ok(())
            }
            Err(source) => {
                store.evict_failed(&key, generation);
                Err(CacheError::FillFailed { key, source })
            }
        }
    }

    // == Admit (background fill) ==
    /// Admits `item` and returns as soon as the entry is stored.
    ///
    /// The fill runs on a separate task and its outcome is written back into
    /// the entry. No ordering is promised between this call returning and a
    /// concurrent lookup: the lookup may observe the item before, during or
    /// after its fill. Await the returned handle, or use `admit`, when a fully
    /// populated item is needed.
    pub async fn admit_async(&self, item: Arc<I>) -> Result<FillHandle> {
        self.admit_background(item, None).await
    }

    /// Like `admit_async`, with an entry-specific TTL (zero means the default).
    pub async fn admit_async_with_ttl(&self, item: Arc<I>, ttl: Duration) -> Result<FillHandle> {
        self.admit_background(item, Some(ttl)).await
    }

    async fn admit_background(&self, item: Arc<I>, ttl: Option<Duration>) -> Result<FillHandle> {
        let key = item.key().to_string();
        let generation = self.store.lock().await.admit(Arc::clone(&item), ttl)?;

        let store = Arc::clone(&self.store);
        let fill_key = key.clone();
        let handle = self.tasks.spawn(async move {
            let outcome = item.fill().await;
            let status = if outcome.is_ok() {
                FillStatus::Filled
            } else {
                FillStatus::Failed
            };

            if !store.lock().await.record_fill(&fill_key, generation, outcome) {
                debug!(key = %fill_key, generation, "Dropping fill outcome for departed entry");
            }
            status
        });

        Ok(FillHandle { key, handle })
    }

    // == Lookup ==
    /// Returns the item stored under `key`.
    ///
    /// Fails with `NotFound` for an absent key. If the entry's fill failed,
    /// the entry is evicted and the fill error returned; later lookups then
    /// report `NotFound`. An item whose fill is still running is returned
    /// as-is.
    pub async fn lookup(&self, key: &str) -> Result<Arc<I>> {
        self.store.lock().await.lookup(key)
    }

    // == Remove ==
    /// Removes the entry under `key`. An absent key is a no-op.
    ///
    /// Returns whether an entry was removed.
    pub async fn remove(&self, key: &str) -> bool {
        self.store.lock().await.remove(key)
    }

    // == Inspect ==
    /// Returns a metadata snapshot of the entry under `key`.
    pub async fn inspect(&self, key: &str) -> Option<EntryInfo> {
        self.store.lock().await.inspect(key, Instant::now())
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub async fn stats(&self) -> CacheStats {
        self.store.lock().await.stats()
    }

    // == Length ==
    /// Returns the number of entries, including expired ones not yet swept.
    pub async fn len(&self) -> usize {
        self.store.lock().await.len()
    }

    // == Is Empty ==
    /// Returns true if the cache holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.store.lock().await.is_empty()
    }

    // == Shutdown ==
    /// Stops the sweeper and waits for it and every outstanding fill.
    ///
    /// Entries stay readable afterwards but are no longer swept.
    pub async fn shutdown(&self) {
        self.shutdown_tx.send_replace(true);
        self.tasks.close();
        self.tasks.wait().await;
        info!("Cache engine shut down");
    }
}
