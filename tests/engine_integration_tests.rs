//! Integration Tests for the Cache Engine
//!
//! Drives `MemCache` through its public API only, on real and paused time.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use mini_memcache::{BoxError, CacheError, CacheItem, FillStatus, MemCache};
use tokio_test::{assert_err, assert_ok};

// == Helper Types ==

/// Item whose fill sets its payload to the bytes of its own key.
#[derive(Debug)]
struct KeyBytesItem {
    id: String,
    data: Mutex<Vec<u8>>,
}

impl KeyBytesItem {
    fn empty(id: &str) -> Arc<Self> {
        Arc::new(Self {
            id: id.to_string(),
            data: Mutex::new(Vec::new()),
        })
    }

    fn with_data(id: &str, data: &[u8]) -> Arc<Self> {
        Arc::new(Self {
            id: id.to_string(),
            data: Mutex::new(data.to_vec()),
        })
    }
}

#[async_trait]
impl CacheItem for KeyBytesItem {
    fn key(&self) -> &str {
        &self.id
    }

    async fn fill(&self) -> Result<(), BoxError> {
        *self.data.lock().unwrap() = self.id.as_bytes().to_vec();
        Ok(())
    }

    fn read(&self) -> Result<Vec<u8>, BoxError> {
        Ok(self.data.lock().unwrap().clone())
    }
}

/// Item whose fill waits for a release signal, then fails or succeeds.
#[derive(Debug)]
struct GatedItem {
    id: String,
    release: tokio::sync::Notify,
    fail: bool,
    data: Mutex<Vec<u8>>,
}

impl GatedItem {
    fn new(id: &str, fail: bool) -> Arc<Self> {
        Arc::new(Self {
            id: id.to_string(),
            release: tokio::sync::Notify::new(),
            fail,
            data: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl CacheItem for GatedItem {
    fn key(&self) -> &str {
        &self.id
    }

    async fn fill(&self) -> Result<(), BoxError> {
        self.release.notified().await;
        if self.fail {
            return Err("origin refused connection".into());
        }
        *self.data.lock().unwrap() = b"ready".to_vec();
        Ok(())
    }

    fn read(&self) -> Result<Vec<u8>, BoxError> {
        Ok(self.data.lock().unwrap().clone())
    }
}

// == Scenario Tests ==

#[tokio::test]
async fn test_add_and_get_until_expiry() {
    let ttl_ms = 3000;
    let cache: MemCache<KeyBytesItem> = MemCache::new(1, 1000, ttl_ms);

    let data = KeyBytesItem::empty("1");
    let fill = assert_ok!(cache.admit_async(Arc::clone(&data)).await);

    let dup = cache.admit_async(Arc::clone(&data)).await;
    assert!(matches!(dup, Err(CacheError::AlreadyExists(_))));

    assert_ok!(cache.admit_async(KeyBytesItem::with_data("2", b"2")).await);

    assert_eq!(fill.wait().await, FillStatus::Filled);
    let found = assert_ok!(cache.lookup("1").await);
    assert_eq!(found.read().unwrap(), data.read().unwrap());
    assert_eq!(found.read().unwrap(), b"1");

    let missing = cache.lookup("3").await;
    assert!(matches!(missing, Err(CacheError::NotFound(_))));

    tokio::time::sleep(Duration::from_millis(ttl_ms as u64 + 500)).await;

    let expired = cache.lookup("1").await;
    assert!(matches!(expired, Err(CacheError::NotFound(_))));
}

#[tokio::test(start_paused = true)]
async fn test_lookup_during_fill_then_failure_evicts() {
    let cache: MemCache<GatedItem> = MemCache::new(4, 1000, 60_000);
    let item = GatedItem::new("gated", true);

    let handle = assert_ok!(cache.admit_async(Arc::clone(&item)).await);

    // Fill not finished: lookup succeeds with the partial payload
    let partial = assert_ok!(cache.lookup("gated").await);
    assert!(partial.read().unwrap().is_empty());

    item.release.notify_one();
    assert_eq!(handle.wait().await, FillStatus::Failed);

    let err = cache.lookup("gated").await.unwrap_err();
    assert!(matches!(err, CacheError::FillFailed { ref key, .. } if key == "gated"));
    assert!(err.to_string().contains("origin refused connection"));

    assert!(cache.lookup("gated").await.unwrap_err().is_not_found());
}

#[tokio::test(start_paused = true)]
async fn test_inline_admit_blocks_until_filled() {
    let cache = Arc::new(MemCache::<GatedItem>::new(4, 1000, 60_000));
    let item = GatedItem::new("inline", false);

    let admitting = {
        let cache = Arc::clone(&cache);
        let item = Arc::clone(&item);
        tokio::spawn(async move { cache.admit(item).await })
    };

    // Entry is visible while the inline fill is still waiting
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(!admitting.is_finished());
    assert_ok!(cache.lookup("inline").await);

    item.release.notify_one();
    assert_ok!(admitting.await.unwrap());
    assert_eq!(cache.lookup("inline").await.unwrap().read().unwrap(), b"ready");
}

#[tokio::test(start_paused = true)]
async fn test_remove_only_affects_its_key() {
    let cache: MemCache<KeyBytesItem> = MemCache::new(4, 1000, 60_000);
    cache.admit(KeyBytesItem::empty("a")).await.unwrap();
    cache.admit(KeyBytesItem::empty("b")).await.unwrap();

    assert!(!cache.remove("nope").await);
    assert_ok!(cache.lookup("a").await);

    assert!(cache.remove("a").await);
    assert_err!(cache.lookup("a").await);
    assert_eq!(cache.lookup("b").await.unwrap().read().unwrap(), b"b");

    let stats = cache.stats().await;
    assert_eq!(stats.removals, 1);
    assert_eq!(stats.total_entries, 1);
}

#[tokio::test(start_paused = true)]
async fn test_expiry_bound_with_sweep_slack() {
    let ttl = Duration::from_millis(3000);
    let sweep = Duration::from_millis(1000);
    let cache: MemCache<KeyBytesItem> = MemCache::new(4, 1000, 3000);

    // Admit halfway between sweeps
    tokio::time::sleep(Duration::from_millis(500)).await;
    cache.admit(KeyBytesItem::empty("k")).await.unwrap();

    tokio::time::sleep(ttl - Duration::from_millis(1)).await;
    assert_ok!(cache.lookup("k").await);

    tokio::time::sleep(sweep + Duration::from_millis(1)).await;
    assert!(cache.lookup("k").await.unwrap_err().is_not_found());
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_stops_sweeping() {
    let cache: MemCache<KeyBytesItem> = MemCache::new(4, 100, 200);
    cache.admit(KeyBytesItem::empty("k")).await.unwrap();

    cache.shutdown().await;
    tokio::time::sleep(Duration::from_secs(5)).await;

    // No sweeper left: the expired entry stays until removed
    assert_ok!(cache.lookup("k").await);
    assert_eq!(cache.inspect("k").await.unwrap().remaining_ms, 0);
    assert!(cache.remove("k").await);
}
