//! # turqa-realtime
//!
//! Live change notifications for backend collections. Provides:
//!
//! - Typed change events (`created` / `updated` / `deleted`)
//! - Change feeds: in-process broadcast and the hosted backend's WebSocket protocol
//! - A bridge that forwards one feed channel per subscription to a callback
//! - Subscription handles with an explicit `active` flag and terminal states

pub mod bridge;
pub mod event;
pub mod feed;
pub mod registry;
pub mod subscription;

pub use bridge::RealtimeBridge;
pub use event::{ChangeEvent, ChangeKind, EventFilter, RawChange};
pub use feed::{ChangeFeed, FeedStream, MemoryChangeFeed, WebSocketChangeFeed};
pub use registry::ChannelRegistry;
pub use subscription::{Subscription, SubscriptionId, SubscriptionStatus};
