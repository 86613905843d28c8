//! `watch`: stream a collection's live changes as JSON lines.

use std::sync::Arc;

use clap::Args;
use serde_json::Value;

use turqa_core::config::AppConfig;
use turqa_core::error::AppError;
use turqa_realtime::{ChangeEvent, EventFilter, RealtimeBridge, SubscriptionStatus, WebSocketChangeFeed};

use crate::output;

/// Arguments for `watch`
#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Collection (table) name
    pub collection: String,

    /// Event filter: INSERT, UPDATE, DELETE or *
    #[arg(long, default_value = "*")]
    pub event: String,
}

/// Execute `watch`
pub async fn execute(args: &WatchArgs, config: &AppConfig) -> Result<(), AppError> {
    let filter: EventFilter = args.event.parse()?;

    let store = super::open_session_store(config).await?;
    if store.current_session()?.is_none() {
        return Err(AppError::unauthorized("Sign in with `turqa login` first"));
    }

    let feed = WebSocketChangeFeed::new(&config.realtime)?;
    let bridge = RealtimeBridge::new(Arc::new(feed));
    let subscription = bridge
        .subscribe(&args.collection, filter, |event: ChangeEvent<Value>| {
            output::print_line(&event);
        })
        .await?;

    output::print_success(&format!(
        "Watching '{}' ({filter}), Ctrl-C to stop",
        args.collection
    ));

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            bridge.unsubscribe(&subscription);
            Ok(())
        }
        status = subscription.closed() => match status {
            SubscriptionStatus::Dropped => subscription.ensure_active(),
            _ => Ok(()),
        },
    }
}
