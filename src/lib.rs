//! Mini Memcache - An in-process keyed cache with lazily filled items
//!
//! Items are admitted under a unique key, filled inline or in the background,
//! looked up by key, and evicted by a periodic sweeper once their TTL elapses.

pub mod cache;
pub mod config;
pub mod error;
pub mod tasks;

pub use cache::{CacheItem, FillHandle, FillStatus, MemCache};
pub use config::CacheConfig;
pub use error::{BoxError, CacheError, Result};
