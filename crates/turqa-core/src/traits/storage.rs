//! Key/value storage trait for persisted client state.

use async_trait::async_trait;

use crate::result::AppResult;

/// Trait for the storage scope that outlives a single process run
/// (the session record and the auth cookie live here).
///
/// Values are opaque strings; callers own the encoding. Every call is a
/// potential suspension point even when the backend is in memory.
#[async_trait]
pub trait KeyValueStore: Send + Sync + std::fmt::Debug + 'static {
    /// Get a value by key. Returns `None` if the key does not exist.
    async fn get(&self, key: &str) -> AppResult<Option<String>>;

    /// Store a value, replacing any previous one.
    async fn set(&self, key: &str, value: &str) -> AppResult<()>;

    /// Remove a key. Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> AppResult<()>;

    /// Check whether a key exists.
    async fn contains(&self, key: &str) -> AppResult<bool> {
        Ok(self.get(key).await?.is_some())
    }
}
