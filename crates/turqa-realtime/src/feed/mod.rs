//! Change feeds: where raw change notifications come from.

pub mod memory;
pub mod phoenix;
pub mod websocket;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use turqa_core::result::AppResult;

use crate::event::{EventFilter, RawChange};

pub use memory::MemoryChangeFeed;
pub use websocket::WebSocketChangeFeed;

/// One open channel on a feed.
///
/// The channel is closed from the feed side by dropping the sender: the
/// receiver then yields `None`. It is released from the consumer side by
/// cancelling `release`.
#[derive(Debug)]
pub struct FeedStream {
    /// Raw changes in server delivery order.
    pub events: mpsc::Receiver<RawChange>,
    /// Cancelled by the consumer to release the channel.
    pub release: CancellationToken,
}

impl FeedStream {
    /// Creates a stream pair: the sender goes to the feed's pump task.
    pub fn channel(buffer: usize) -> (mpsc::Sender<RawChange>, Self) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        (
            tx,
            Self {
                events: rx,
                release: CancellationToken::new(),
            },
        )
    }
}

/// A source of change notifications for named collections.
#[async_trait]
pub trait ChangeFeed: Send + Sync + std::fmt::Debug + 'static {
    /// Opens one channel for `collection`, delivering only changes that
    /// pass `filter`.
    async fn open(&self, collection: &str, filter: EventFilter) -> AppResult<FeedStream>;
}
