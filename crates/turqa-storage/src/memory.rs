//! In-memory key/value store using the moka crate.

use async_trait::async_trait;
use moka::future::Cache;
use tracing::debug;

use turqa_core::result::AppResult;
use turqa_core::traits::storage::KeyValueStore;

/// Default maximum number of keys held in memory.
const DEFAULT_CAPACITY: u64 = 1024;

/// In-memory key/value store using moka.
///
/// Entries never expire; the store lives as long as the process.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    /// The underlying moka cache.
    cache: Cache<String, String>,
}

impl MemoryStore {
    /// Create a new in-memory store with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a new in-memory store holding at most `max_capacity` keys.
    pub fn with_capacity(max_capacity: u64) -> Self {
        let cache = Cache::builder().max_capacity(max_capacity).build();
        Self { cache }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.cache.get(key).await)
    }

    async fn set(&self, key: &str, value: &str) -> AppResult<()> {
        self.cache.insert(key.to_string(), value.to_string()).await;
        debug!(key, "Stored value");
        Ok(())
    }

    async fn remove(&self, key: &str) -> AppResult<()> {
        self.cache.invalidate(key).await;
        debug!(key, "Removed value");
        Ok(())
    }
}
