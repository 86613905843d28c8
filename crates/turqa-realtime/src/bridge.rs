//! Realtime bridge: forwards a collection's changes to a local callback.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::{debug, error, info, warn};

use turqa_core::result::AppResult;

use crate::event::{ChangeEvent, EventFilter, RawChange};
use crate::feed::{ChangeFeed, FeedStream};
use crate::registry::ChannelRegistry;
use crate::subscription::{Shared, Subscription, SubscriptionStatus};

/// Opens per-subscription channels on a [`ChangeFeed`] and delivers typed
/// events to callbacks.
///
/// Each subscription gets its own delivery task, so events reach a
/// callback one at a time and in the order the feed produced them.
#[derive(Debug, Clone)]
pub struct RealtimeBridge {
    feed: Arc<dyn ChangeFeed>,
    registry: Arc<ChannelRegistry>,
}

impl RealtimeBridge {
    /// Creates a bridge over `feed`.
    pub fn new(feed: Arc<dyn ChangeFeed>) -> Self {
        Self {
            feed,
            registry: Arc::new(ChannelRegistry::new()),
        }
    }

    /// Live channels, for diagnostics.
    pub fn registry(&self) -> &ChannelRegistry {
        &self.registry
    }

    /// Subscribe `callback` to changes on `collection`.
    ///
    /// Opens exactly one channel. Fails only if the channel cannot be
    /// opened; later failures surface as [`SubscriptionStatus::Dropped`].
    pub async fn subscribe<T, F>(
        &self,
        collection: &str,
        filter: EventFilter,
        callback: F,
    ) -> AppResult<Subscription>
    where
        T: DeserializeOwned + Send + 'static,
        F: FnMut(ChangeEvent<T>) + Send + 'static,
    {
        let stream = self.feed.open(collection, filter).await?;
        let shared = Shared::new(
            collection,
            filter,
            stream.release.clone(),
            self.registry.clone(),
        );

        info!(
            subscription_id = %shared.id,
            collection,
            filter = %filter,
            "Realtime subscription opened"
        );

        tokio::spawn(deliver(shared.clone(), stream, callback));
        Ok(Subscription::new(shared))
    }

    /// Release `subscription`. Safe to call any number of times.
    pub fn unsubscribe(&self, subscription: &Subscription) {
        subscription.unsubscribe();
    }
}

async fn deliver<T, F>(shared: Arc<Shared>, mut stream: FeedStream, mut callback: F)
where
    T: DeserializeOwned + Send + 'static,
    F: FnMut(ChangeEvent<T>) + Send + 'static,
{
    loop {
        let next = tokio::select! {
            biased;
            _ = shared.release_token().cancelled() => break,
            next = stream.events.recv() => next,
        };
        let Some(raw) = next else {
            shared.teardown(SubscriptionStatus::Dropped);
            break;
        };
        dispatch(&shared, raw, &mut callback);
    }
    debug!(subscription_id = %shared.id, "Delivery task finished");
}

fn dispatch<T, F>(shared: &Shared, raw: RawChange, callback: &mut F)
where
    T: DeserializeOwned,
    F: FnMut(ChangeEvent<T>),
{
    if !raw.kind().is_some_and(|kind| shared.filter.matches(kind)) {
        return;
    }

    let event = match ChangeEvent::<T>::classify(raw) {
        Ok(event) => event,
        Err(e) => {
            warn!(
                subscription_id = %shared.id,
                collection = %shared.collection,
                error = %e,
                "Skipping undecodable change"
            );
            return;
        }
    };

    if !shared.is_active() {
        debug!(subscription_id = %shared.id, "Discarding change after unsubscribe");
        return;
    }

    if catch_unwind(AssertUnwindSafe(|| callback(event))).is_err() {
        error!(
            subscription_id = %shared.id,
            collection = %shared.collection,
            "Change callback panicked; channel stays open"
        );
    }
}
