//! Mini Memcache - demo driver
//!
//! Caches the contents of every file named on the command line, filling each
//! entry in the background, then reports what was cached.
//!
//! ```text
//! MEMCACHE_TTL_MS=5000 mini_memcache Cargo.toml src/lib.rs
//! ```

use std::sync::{Arc, RwLock};

use anyhow::Context;
use async_trait::async_trait;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mini_memcache::{BoxError, CacheConfig, CacheItem, MemCache};

/// Cache item whose payload is the contents of a file on disk.
struct FileItem {
    path: String,
    contents: RwLock<Option<Vec<u8>>>,
}

impl FileItem {
    fn new(path: String) -> Arc<Self> {
        Arc::new(Self {
            path,
            contents: RwLock::new(None),
        })
    }
}

#[async_trait]
impl CacheItem for FileItem {
    fn key(&self) -> &str {
        &self.path
    }

    async fn fill(&self) -> Result<(), BoxError> {
        let bytes = tokio::fs::read(&self.path).await?;
        *self.contents.write().map_err(|_| "payload lock poisoned")? = Some(bytes);
        Ok(())
    }

    fn read(&self) -> Result<Vec<u8>, BoxError> {
        self.contents
            .read()
            .map_err(|_| "payload lock poisoned")?
            .clone()
            .ok_or_else(|| format!("{} is not loaded yet", self.path).into())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mini_memcache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = CacheConfig::from_env();
    info!(
        "Configuration loaded: capacity={}, sweep_interval={}ms, default_ttl={}ms",
        config.capacity,
        config.sweep_interval.as_millis(),
        config.default_ttl.as_millis()
    );

    let paths: Vec<String> = std::env::args().skip(1).collect();
    if paths.is_empty() {
        anyhow::bail!("usage: mini_memcache <file>...");
    }

    let cache: MemCache<FileItem> = MemCache::with_config(config);

    let mut fills = Vec::new();
    for path in &paths {
        match cache.admit_async(FileItem::new(path.clone())).await {
            Ok(handle) => fills.push(handle),
            Err(err) => warn!("Skipping {}: {}", path, err),
        }
    }
    for handle in fills {
        let key = handle.key().to_string();
        info!("Fill of {} finished: {:?}", key, handle.wait().await);
    }

    for path in &paths {
        let info = cache.inspect(path).await;
        match cache.lookup(path).await {
            Ok(item) => {
                let bytes = item.read().map_err(|err| anyhow::anyhow!(err))?;
                println!("{}: {} bytes", path, bytes.len());
                if let Some(info) = info {
                    println!("{}", serde_json::to_string(&info)?);
                }
            }
            Err(err) => println!("{}: {}", path, err),
        }
    }

    let stats = cache.stats().await;
    println!(
        "{}",
        serde_json::to_string_pretty(&stats).context("Failed to serialize stats")?
    );

    cache.shutdown().await;
    Ok(())
}
