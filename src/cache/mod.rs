//! Cache Module
//!
//! Provides an in-process keyed cache of lazily filled items with TTL
//! expiration.

mod engine;
mod entry;
mod item;
mod stats;
mod store;

#[cfg(test)]
pub(crate) mod test_item;

// Re-export public types
pub use engine::{FillHandle, FillStatus, MemCache};
pub use entry::{CacheEntry, EntryInfo, EntryState, FillState};
pub use item::CacheItem;
pub use stats::CacheStats;
pub use store::CacheStore;

// == Public Constants ==
/// Largest initial map capacity a capacity hint may request
pub const MAX_CAPACITY_HINT: usize = 1 << 16;
