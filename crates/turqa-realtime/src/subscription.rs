//! Subscription handles.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use uuid::Uuid;

use turqa_core::error::AppError;
use turqa_core::result::AppResult;

use crate::event::EventFilter;
use crate::registry::ChannelRegistry;

/// Unique subscription identifier
pub type SubscriptionId = Uuid;

/// Lifecycle of a subscription. Only `Active` is non-terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    /// Delivering events.
    Active,
    /// Released by its owner.
    Unsubscribed,
    /// The channel was lost. Not retried.
    Dropped,
}

/// State shared between a handle and its delivery task.
#[derive(Debug)]
pub(crate) struct Shared {
    pub(crate) id: SubscriptionId,
    pub(crate) collection: String,
    pub(crate) filter: EventFilter,
    /// Checked before every callback invocation.
    active: AtomicBool,
    status: watch::Sender<SubscriptionStatus>,
    release: CancellationToken,
    registry: Arc<ChannelRegistry>,
}

impl Shared {
    pub(crate) fn new(
        collection: &str,
        filter: EventFilter,
        release: CancellationToken,
        registry: Arc<ChannelRegistry>,
    ) -> Arc<Self> {
        let id = Uuid::new_v4();
        registry.register(collection, id);
        let (status, _) = watch::channel(SubscriptionStatus::Active);
        Arc::new(Self {
            id,
            collection: collection.to_string(),
            filter,
            active: AtomicBool::new(true),
            status,
            release,
            registry,
        })
    }

    pub(crate) fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    pub(crate) fn release_token(&self) -> &CancellationToken {
        &self.release
    }

    /// Ends the subscription. Only the first call has any effect.
    pub(crate) fn teardown(&self, status: SubscriptionStatus) -> bool {
        if !self.active.swap(false, Ordering::SeqCst) {
            return false;
        }
        self.status.send_replace(status);
        self.release.cancel();
        self.registry.release(&self.collection, self.id);

        match status {
            SubscriptionStatus::Dropped => warn!(
                subscription_id = %self.id,
                collection = %self.collection,
                "Realtime subscription dropped"
            ),
            _ => debug!(
                subscription_id = %self.id,
                collection = %self.collection,
                "Realtime subscription released"
            ),
        }
        true
    }
}

/// Handle to one live subscription.
///
/// Dropping the handle unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    shared: Arc<Shared>,
}

impl Subscription {
    pub(crate) fn new(shared: Arc<Shared>) -> Self {
        Self { shared }
    }

    /// Subscription ID.
    pub fn id(&self) -> SubscriptionId {
        self.shared.id
    }

    /// Collection name.
    pub fn collection(&self) -> &str {
        &self.shared.collection
    }

    /// Event filter.
    pub fn filter(&self) -> EventFilter {
        self.shared.filter
    }

    /// Whether events are still being delivered.
    pub fn is_active(&self) -> bool {
        self.shared.is_active()
    }

    /// Current status.
    pub fn status(&self) -> SubscriptionStatus {
        *self.shared.status.borrow()
    }

    /// Observe status changes.
    pub fn watch_status(&self) -> watch::Receiver<SubscriptionStatus> {
        self.shared.status.subscribe()
    }

    /// `Ok` while active, otherwise the reason delivery stopped.
    pub fn ensure_active(&self) -> AppResult<()> {
        match self.status() {
            SubscriptionStatus::Active => Ok(()),
            SubscriptionStatus::Dropped => Err(AppError::subscription_dropped(format!(
                "Subscription to '{}' lost its channel",
                self.shared.collection
            ))),
            SubscriptionStatus::Unsubscribed => Err(AppError::subscription_dropped(format!(
                "Subscription to '{}' was released",
                self.shared.collection
            ))),
        }
    }

    /// Wait until the subscription reaches a terminal status.
    pub async fn closed(&self) -> SubscriptionStatus {
        let mut rx = self.shared.status.subscribe();
        match rx
            .wait_for(|status| *status != SubscriptionStatus::Active)
            .await
        {
            Ok(status) => *status,
            // The sender lives in `shared`, which we hold.
            Err(_) => self.status(),
        }
    }

    /// Stop delivery and release the channel. Idempotent.
    pub fn unsubscribe(&self) {
        self.shared.teardown(SubscriptionStatus::Unsubscribed);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subscription(registry: &Arc<ChannelRegistry>) -> Subscription {
        Subscription::new(Shared::new(
            "properties",
            EventFilter::All,
            CancellationToken::new(),
            registry.clone(),
        ))
    }

    #[test]
    fn test_unsubscribe_is_idempotent() {
        let registry = Arc::new(ChannelRegistry::new());
        let sub = subscription(&registry);
        assert_eq!(registry.subscriber_count("properties"), 1);

        for _ in 0..3 {
            sub.unsubscribe();
            assert!(!sub.is_active());
            assert_eq!(sub.status(), SubscriptionStatus::Unsubscribed);
            assert_eq!(registry.subscriber_count("properties"), 0);
        }
        assert!(sub.shared.release_token().is_cancelled());
    }

    #[test]
    fn test_drop_releases() {
        let registry = Arc::new(ChannelRegistry::new());
        let sub = subscription(&registry);
        let token = sub.shared.release_token().clone();
        drop(sub);
        assert!(token.is_cancelled());
        assert_eq!(registry.total(), 0);
    }

    #[test]
    fn test_first_terminal_status_wins() {
        let registry = Arc::new(ChannelRegistry::new());
        let sub = subscription(&registry);
        assert!(sub.shared.teardown(SubscriptionStatus::Dropped));
        sub.unsubscribe();
        assert_eq!(sub.status(), SubscriptionStatus::Dropped);
        let err = sub.ensure_active().unwrap_err();
        assert_eq!(err.kind, turqa_core::ErrorKind::SubscriptionDropped);
    }

    #[tokio::test]
    async fn test_closed_resolves_on_teardown() {
        let registry = Arc::new(ChannelRegistry::new());
        let sub = subscription(&registry);
        assert!(sub.ensure_active().is_ok());
        sub.unsubscribe();
        assert_eq!(sub.closed().await, SubscriptionStatus::Unsubscribed);
    }
}
