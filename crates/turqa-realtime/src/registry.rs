//! Channel registry: which subscriptions hold a channel on which collection.

use std::collections::HashSet;

use dashmap::DashMap;

use crate::subscription::SubscriptionId;

/// Registry of live collection channels.
#[derive(Debug, Default)]
pub struct ChannelRegistry {
    /// Collection name → live subscription IDs.
    channels: DashMap<String, HashSet<SubscriptionId>>,
}

impl ChannelRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a live channel.
    pub fn register(&self, collection: &str, id: SubscriptionId) {
        self.channels
            .entry(collection.to_string())
            .or_default()
            .insert(id);
    }

    /// Forgets a channel. Returns `false` if it was not registered.
    pub fn release(&self, collection: &str, id: SubscriptionId) -> bool {
        let Some(mut ids) = self.channels.get_mut(collection) else {
            return false;
        };
        let removed = ids.remove(&id);
        if ids.is_empty() {
            drop(ids);
            self.channels.remove_if(collection, |_, ids| ids.is_empty());
        }
        removed
    }

    /// Live channels on `collection`.
    pub fn subscriber_count(&self, collection: &str) -> usize {
        self.channels
            .get(collection)
            .map(|ids| ids.len())
            .unwrap_or(0)
    }

    /// Live channels across all collections.
    pub fn total(&self) -> usize {
        self.channels.iter().map(|entry| entry.value().len()).sum()
    }

    /// Collections with at least one live channel, sorted.
    pub fn collections(&self) -> Vec<String> {
        let mut names: Vec<String> = self.channels.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }
}
