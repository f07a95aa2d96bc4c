//! Background Tasks Module
//!
//! Contains background tasks that run periodically for the lifetime of a cache.
//!
//! # Tasks
//! - Expiration Sweeper: Removes entries whose TTL elapsed at configured intervals

mod sweeper;

pub use sweeper::spawn_sweeper_task;
