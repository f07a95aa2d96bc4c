//! Cache Store Module
//!
//! Key-to-entry map with admission, lookup, removal, fill write-back and TTL
//! sweeping. Not synchronized on its own; `MemCache` guards it with a single
//! exclusive lock so every check-then-act below is atomic.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::cache::{CacheEntry, CacheItem, CacheStats, EntryInfo, FillState, MAX_CAPACITY_HINT};
use crate::error::{BoxError, CacheError, Result};

// == Cache Store ==
/// Entry storage with TTL metadata and fill-state tracking.
#[derive(Debug)]
pub struct CacheStore<I: ?Sized> {
    /// Key-entry storage
    entries: HashMap<String, CacheEntry<I>>,
    /// Activity counters
    stats: CacheStats,
    /// TTL for entries admitted without an explicit one
    default_ttl: Duration,
    /// Generation handed to the next admitted entry
    next_generation: u64,
}

impl<I: CacheItem + ?Sized> CacheStore<I> {
    // == Constructor ==
    /// Creates a new CacheStore.
    ///
    /// # Arguments
    /// * `capacity` - Initial capacity of the key map (a hint, not a limit;
    ///   values above `MAX_CAPACITY_HINT` are clamped)
    /// * `default_ttl` - Lifetime for entries admitted without explicit TTL
    pub fn new(capacity: usize, default_ttl: Duration) -> Self {
        Self {
            entries: HashMap::with_capacity(capacity.min(MAX_CAPACITY_HINT)),
            stats: CacheStats::new(),
            default_ttl,
            next_generation: 1,
        }
    }

    // == Admit ==
    /// Stores `item` under its key if no entry holds that key yet.
    ///
    /// A zero or missing `ttl` uses the store default. Returns the generation
    /// of the new entry, which fill write-backs must present.
    pub fn admit(&mut self, item: Arc<I>, ttl: Option<Duration>) -> Result<u64> {
        let key = item.key();
        if key.is_empty() {
            return Err(CacheError::InvalidKey("key must not be empty".to_string()));
        }
        if self.entries.contains_key(key) {
            return Err(CacheError::AlreadyExists(key.to_string()));
        }

        let ttl = ttl
            .filter(|ttl| !ttl.is_zero())
            .unwrap_or(self.default_ttl);
        let generation = self.next_generation;
        self.next_generation += 1;

        let key = key.to_string();
        self.entries
            .insert(key, CacheEntry::new(item, ttl, generation));
        self.stats.set_total_entries(self.entries.len());

        Ok(generation)
    }

    // == Lookup ==
    /// Returns the item stored under `key`.
    ///
    /// TTL is not checked here; expired entries stay visible until swept.
    /// An entry whose fill failed is removed and its fill error returned.
    pub fn lookup(&mut self, key: &str) -> Result<Arc<I>> {
        let Some(entry) = self.entries.get(key) else {
            self.stats.record_miss();
            return Err(CacheError::NotFound(key.to_string()));
        };

        if !entry.has_failed() {
            let item = Arc::clone(&entry.item);
            self.stats.record_hit();
            return Ok(item);
        }

        let fill = self.entries.remove(key).map(|entry| entry.fill);
        self.stats.set_total_entries(self.entries.len());
        match fill {
            Some(FillState::Failed(source)) => {
                self.stats.record_fill_failure();
                Err(CacheError::FillFailed {
                    key: key.to_string(),
                    source,
                })
            }
            _ => Err(CacheError::NotFound(key.to_string())),
        }
    }

    // == Remove ==
    /// Removes an entry by key. Returns whether an entry was present.
    pub fn remove(&mut self, key: &str) -> bool {
        if self.entries.remove(key).is_some() {
            self.stats.record_removal();
            self.stats.set_total_entries(self.entries.len());
            true
        } else {
            false
        }
    }

    // == Record Fill ==
    /// Records the outcome of the fill started by admission `generation`.
    ///
    /// The outcome is dropped (returns false) if the entry is gone, belongs to
    /// a later admission, or already has an outcome.
    pub fn record_fill(
        &mut self,
        key: &str,
        generation: u64,
        outcome: std::result::Result<(), BoxError>,
    ) -> bool {
        match self.entries.get_mut(key) {
            Some(entry)
                if entry.generation == generation
                    && matches!(entry.fill, FillState::Pending) =>
            {
                entry.fill = match outcome {
                    Ok(()) => FillState::Filled,
                    Err(err) => FillState::Failed(err),
                };
                true
            }
            _ => false,
        }
    }

    // == Evict Failed ==
    /// Removes the entry created by admission `generation` after its inline
    /// fill failed. Returns whether it was still present; the failure is only
    /// counted when an entry was evicted.
    pub fn evict_failed(&mut self, key: &str, generation: u64) -> bool {
        let evicted = self.remove_generation(key, generation);
        if evicted {
            self.stats.record_fill_failure();
        }
        evicted
    }

    // == Withdraw ==
    /// Removes the still-pending entry of admission `generation` whose caller
    /// stopped waiting for the inline fill. Returns whether it was removed.
    pub fn withdraw(&mut self, key: &str, generation: u64) -> bool {
        let pending = self
            .entries
            .get(key)
            .is_some_and(|entry| matches!(entry.fill, FillState::Pending));
        pending && self.remove_generation(key, generation)
    }

    fn remove_generation(&mut self, key: &str, generation: u64) -> bool {
        let owned = self
            .entries
            .get(key)
            .is_some_and(|entry| entry.generation == generation);
        if owned {
            self.entries.remove(key);
            self.stats.set_total_entries(self.entries.len());
        }
        owned
    }

    // == Sweep Expired ==
    /// Removes every entry whose `created_at + ttl` is at or before `now`.
    ///
    /// Returns the number of entries removed.
    pub fn sweep_expired(&mut self, now: Instant) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired_at(now));
        let removed = before - self.entries.len();

        self.stats.record_expirations(removed);
        self.stats.set_total_entries(self.entries.len());
        removed
    }

    // == Inspect ==
    /// Returns a metadata snapshot of the entry under `key`.
    pub fn inspect(&self, key: &str, now: Instant) -> Option<EntryInfo> {
        self.entries.get(key).map(|entry| entry.info(key, now))
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    // == Default TTL ==
    /// Returns the TTL given to entries admitted without an explicit one.
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    // == Length ==
    /// Returns the current number of entries, expired or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    // == Is Empty ==
    /// Returns true if the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
