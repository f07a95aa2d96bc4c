//! Cache Item Module
//!
//! Defines the capability set every cached item must provide.

use async_trait::async_trait;

use crate::error::BoxError;

// == Cache Item ==
/// A caller-supplied, payload-bearing value identified by a unique key.
///
/// The engine never interprets the payload. It only asks the item for its
/// key, runs `fill` at most once per admission, and hands the item back on
/// lookup so the caller can `read` it.
///
/// Items admitted with `MemCache::admit_async` may be read while `fill` is
/// still running. Such items must make their payload safe for concurrent
/// read and write (e.g. behind a `Mutex` or `RwLock`); the engine does not
/// guard the payload itself.
#[async_trait]
pub trait CacheItem: Send + Sync + 'static {
    /// Stable key identifying this item. Must not be empty.
    fn key(&self) -> &str;

    /// Produces the payload (fetch, read, compute...). May be slow and may fail.
    async fn fill(&self) -> Result<(), BoxError>;

    /// Returns the current payload bytes, or the outcome of the last fill.
    fn read(&self) -> Result<Vec<u8>, BoxError>;
}
