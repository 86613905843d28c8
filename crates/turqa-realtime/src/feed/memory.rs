//! In-memory change feed for single-node deployments and tests.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use turqa_core::result::AppResult;

use crate::event::{EventFilter, RawChange};

use super::{ChangeFeed, FeedStream};

/// In-memory change feed.
#[derive(Debug)]
pub struct MemoryChangeFeed {
    /// Collection name → broadcast sender
    collections: RwLock<HashMap<String, broadcast::Sender<RawChange>>>,
    /// Buffer size for each collection and channel
    buffer_size: usize,
}

impl MemoryChangeFeed {
    /// Create a new in-memory feed
    pub fn new(buffer_size: usize) -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
            buffer_size: buffer_size.max(1),
        }
    }

    /// Publish a change to every open channel on `collection`.
    ///
    /// Returns the number of channels that received it.
    pub async fn publish(&self, collection: &str, change: RawChange) -> usize {
        let collections = self.collections.read().await;
        collections
            .get(collection)
            .and_then(|tx| tx.send(change).ok())
            .unwrap_or(0)
    }

    /// Simulate a connection loss: every channel on `collection` closes.
    pub async fn disconnect(&self, collection: &str) {
        let removed = self.collections.write().await.remove(collection);
        if removed.is_some() {
            debug!(collection, "Memory feed disconnected");
        }
    }

    async fn sender(&self, collection: &str) -> broadcast::Sender<RawChange> {
        let mut collections = self.collections.write().await;
        collections
            .entry(collection.to_string())
            .or_insert_with(|| broadcast::channel(self.buffer_size).0)
            .clone()
    }
}

impl Default for MemoryChangeFeed {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait]
impl ChangeFeed for MemoryChangeFeed {
    async fn open(&self, collection: &str, filter: EventFilter) -> AppResult<FeedStream> {
        let mut source = self.sender(collection).await.subscribe();
        let (tx, stream) = FeedStream::channel(self.buffer_size);
        let release = stream.release.clone();
        let collection = collection.to_string();

        tokio::spawn(async move {
            loop {
                let change = tokio::select! {
                    biased;
                    _ = release.cancelled() => break,
                    r = source.recv() => r,
                };
                match change {
                    Ok(change) => {
                        if !change.kind().is_some_and(|kind| filter.matches(kind)) {
                            continue;
                        }
                        if tx.send(change).await.is_err() {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        // Changes are gone; the subscriber must see a lost channel.
                        warn!(collection = %collection, skipped, "Memory feed channel lagged, closing");
                        break;
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            debug!(collection = %collection, "Memory feed channel closed");
        });

        Ok(stream)
    }
}
