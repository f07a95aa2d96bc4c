//! In-memory item used by the unit and property tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::cache::CacheItem;
use crate::error::BoxError;

/// Item whose fill copies a prepared payload after an optional delay.
#[derive(Debug)]
pub struct TestItem {
    key: String,
    payload: Mutex<Vec<u8>>,
    source: Vec<u8>,
    delay: Duration,
    fail_with: Option<String>,
}

impl TestItem {
    /// Item with its payload already present; fill is a no-op.
    pub fn filled(key: &str, payload: &[u8]) -> Arc<Self> {
        Arc::new(Self {
            key: key.to_string(),
            payload: Mutex::new(payload.to_vec()),
            source: payload.to_vec(),
            delay: Duration::ZERO,
            fail_with: None,
        })
    }

    /// Empty item whose fill sets the payload to its key bytes.
    pub fn pending(key: &str) -> Arc<Self> {
        Self::slow(key, Duration::ZERO)
    }

    /// Like `pending`, but the fill sleeps for `delay` first.
    pub fn slow(key: &str, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            key: key.to_string(),
            payload: Mutex::new(Vec::new()),
            source: key.as_bytes().to_vec(),
            delay,
            fail_with: None,
        })
    }

    /// Item whose fill fails with `message`.
    pub fn failing(key: &str, message: &str) -> Arc<Self> {
        Self::failing_after(key, message, Duration::ZERO)
    }

    /// Like `failing`, but the fill sleeps for `delay` first.
    pub fn failing_after(key: &str, message: &str, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            key: key.to_string(),
            payload: Mutex::new(Vec::new()),
            source: Vec::new(),
            delay,
            fail_with: Some(message.to_string()),
        })
    }
}

#[async_trait]
impl CacheItem for TestItem {
    fn key(&self) -> &str {
        &self.key
    }

    async fn fill(&self) -> Result<(), BoxError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if let Some(message) = &self.fail_with {
            return Err(message.clone().into());
        }
        *self.payload.lock().unwrap() = self.source.clone();
        Ok(())
    }

    fn read(&self) -> Result<Vec<u8>, BoxError> {
        Ok(self.payload.lock().unwrap().clone())
    }
}
