//! Cache Entry Module
//!
//! Defines the per-key wrapper around an item with its timing and fill state.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::time::Instant;

use crate::error::BoxError;

// == Fill State ==
/// Outcome of an item's fill, recorded at most once per entry.
#[derive(Debug)]
pub enum FillState {
    /// Fill has not completed yet
    Pending,
    /// Fill completed successfully
    Filled,
    /// Fill failed; the entry is dropped on the next lookup
    Failed(BoxError),
}

impl FillState {
    fn label(&self) -> EntryState {
        match self {
            FillState::Pending => EntryState::Pending,
            FillState::Filled => EntryState::Filled,
            FillState::Failed(_) => EntryState::Failed,
        }
    }
}

// == Cache Entry ==
/// Represents a single admitted item with its metadata.
#[derive(Debug)]
pub struct CacheEntry<I: ?Sized> {
    /// The stored item
    pub item: Arc<I>,
    /// Admission instant (monotonic clock)
    pub created_at: Instant,
    /// Admission time (wall clock), informational only
    pub admitted_at: DateTime<Utc>,
    /// Lifetime fixed at admission
    pub ttl: Duration,
    /// Recorded fill outcome
    pub fill: FillState,
    /// Identifies the admission that created this entry
    pub generation: u64,
}

impl<I: ?Sized> CacheEntry<I> {
    // == Constructor ==
    /// Creates a new pending entry admitted now.
    pub fn new(item: Arc<I>, ttl: Duration, generation: u64) -> Self {
        Self {
            item,
            created_at: Instant::now(),
            admitted_at: Utc::now(),
            ttl,
            fill: FillState::Pending,
            generation,
        }
    }

    /// Instant at which the entry becomes logically dead.
    pub fn expires_at(&self) -> Instant {
        self.created_at + self.ttl
    }

    // == Is Expired ==
    /// Checks whether the entry is expired at `now`.
    ///
    /// Boundary condition: the entry is expired once `created_at + ttl` is at
    /// or before `now`.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        self.expires_at() <= now
    }

    /// Returns true if a failed fill has been recorded.
    pub fn has_failed(&self) -> bool {
        matches!(self.fill, FillState::Failed(_))
    }

    /// Builds a read-only snapshot of the entry's metadata.
    pub fn info(&self, key: &str, now: Instant) -> EntryInfo {
        EntryInfo {
            key: key.to_string(),
            admitted_at: self.admitted_at,
            ttl_ms: self.ttl.as_millis() as u64,
            remaining_ms: self.expires_at().saturating_duration_since(now).as_millis() as u64,
            state: self.fill.label(),
        }
    }
}

// == Entry Info ==
/// Serializable snapshot of an entry, without its payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryInfo {
    pub key: String,
    pub admitted_at: DateTime<Utc>,
    pub ttl_ms: u64,
    /// Zero once the TTL has elapsed, even if the entry is not swept yet
    pub remaining_ms: u64,
    pub state: EntryState,
}

/// Fill state as exposed in an `EntryInfo`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryState {
    Pending,
    Filled,
    Failed,
}
