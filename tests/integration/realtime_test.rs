//! Integration tests for the realtime bridge over the in-memory feed.

mod helpers;

use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;
use tokio::sync::mpsc;
use tokio::time::timeout;

use turqa_realtime::{
    ChangeEvent, ChangeKind, EventFilter, MemoryChangeFeed, RawChange, RealtimeBridge,
    SubscriptionStatus,
};

use helpers::{QUIET, WAIT};

#[derive(Debug, Clone, PartialEq, Deserialize)]
struct Property {
    id: i64,
    title: String,
    #[serde(default)]
    price: Option<u64>,
}

fn setup() -> (Arc<MemoryChangeFeed>, RealtimeBridge) {
    let feed = Arc::new(MemoryChangeFeed::new(64));
    let bridge = RealtimeBridge::new(feed.clone());
    (feed, bridge)
}

fn property(id: i64) -> serde_json::Value {
    json!({ "id": id, "title": format!("Listing {id}"), "price": 250_000 })
}

#[tokio::test]
async fn test_insert_delivers_exactly_one_created_event() {
    let (feed, bridge) = setup();
    let (tx, mut rx) = mpsc::unbounded_channel();

    let _sub = bridge
        .subscribe("properties", EventFilter::Insert, move |e: ChangeEvent<Property>| {
            let _ = tx.send(e);
        })
        .await
        .unwrap();

    feed.publish("properties", RawChange::update(property(7), property(7))).await;
    feed.publish("properties", RawChange::insert(property(42))).await;

    let event = timeout(WAIT, rx.recv()).await.unwrap().unwrap();
    assert_eq!(event.kind, ChangeKind::Created);
    assert_eq!(event.previous, None);
    let current = event.current.unwrap();
    assert_eq!(current.id, 42);
    assert_eq!(current.title, "Listing 42");
    assert_eq!(current.price, Some(250_000));

    assert!(timeout(QUIET, rx.recv()).await.is_err());
}

#[tokio::test]
async fn test_events_keep_delivery_order() {
    let (feed, bridge) = setup();
    let (tx, mut rx) = mpsc::unbounded_channel();

    let _sub = bridge
        .subscribe("properties", EventFilter::All, move |e: ChangeEvent<Property>| {
            let _ = tx.send(e);
        })
        .await
        .unwrap();

    for id in 1..=40 {
        feed.publish("properties", RawChange::insert(property(id))).await;
    }
    feed.publish("properties", RawChange::delete(property(3))).await;

    for id in 1..=40 {
        let event = timeout(WAIT, rx.recv()).await.unwrap().unwrap();
        assert_eq!(event.current.unwrap().id, id);
    }
    let last = timeout(WAIT, rx.recv()).await.unwrap().unwrap();
    assert_eq!(last.kind, ChangeKind::Deleted);
    assert_eq!(last.previous.unwrap().id, 3);
}

#[tokio::test]
async fn test_unsubscribe_is_idempotent_and_stops_delivery() {
    let (feed, bridge) = setup();
    let (tx, mut rx) = mpsc::unbounded_channel();

    let sub = bridge
        .subscribe("properties", EventFilter::All, move |e: ChangeEvent<Property>| {
            let _ = tx.send(e);
        })
        .await
        .unwrap();
    assert_eq!(bridge.registry().subscriber_count("properties"), 1);

    feed.publish("properties", RawChange::insert(property(1))).await;
    timeout(WAIT, rx.recv()).await.unwrap().unwrap();

    bridge.unsubscribe(&sub);
    for _ in 0..3 {
        bridge.unsubscribe(&sub);
        sub.unsubscribe();
    }
    assert!(!sub.is_active());
    assert_eq!(sub.status(), SubscriptionStatus::Unsubscribed);
    assert_eq!(bridge.registry().subscriber_count("properties"), 0);

    feed.publish("properties", RawChange::insert(property(2))).await;
    // The callback (and its sender) is dropped with the delivery task.
    assert!(matches!(timeout(WAIT, rx.recv()).await, Ok(None)));
}

#[tokio::test]
async fn test_dropped_connection_is_terminal() {
    let (feed, bridge) = setup();
    let sub = bridge
        .subscribe("inquiries", EventFilter::All, |_e: ChangeEvent<serde_json::Value>| {})
        .await
        .unwrap();

    feed.disconnect("inquiries").await;
    let status = timeout(WAIT, sub.closed()).await.unwrap();
    assert_eq!(status, SubscriptionStatus::Dropped);
    assert!(!sub.is_active());
    assert_eq!(
        sub.ensure_active().unwrap_err().kind,
        turqa_core::ErrorKind::SubscriptionDropped
    );
    assert_eq!(bridge.registry().total(), 0);

    // Unsubscribing after a server-side close is still fine.
    bridge.unsubscribe(&sub);
    assert_eq!(sub.status(), SubscriptionStatus::Dropped);
}

#[tokio::test]
async fn test_overflowed_feed_drops_subscription() {
    let feed = Arc::new(MemoryChangeFeed::new(2));
    let bridge = RealtimeBridge::new(feed.clone());
    let (tx, mut rx) = mpsc::unbounded_channel();

    let sub = bridge
        .subscribe("properties", EventFilter::All, move |e: ChangeEvent<Property>| {
            let _ = tx.send(e);
        })
        .await
        .unwrap();

    for id in 1..=20 {
        feed.publish("properties", RawChange::insert(property(id))).await;
    }

    let status = timeout(WAIT, sub.closed()).await.unwrap();
    assert_eq!(status, SubscriptionStatus::Dropped);
    assert!(!sub.is_active());

    let mut delivered = 0;
    while let Ok(Some(_)) = timeout(QUIET, rx.recv()).await {
        delivered += 1;
    }
    assert!(delivered < 20);
}

#[tokio::test]
async fn test_panicking_callback_does_not_kill_channel() {
    let (feed, bridge) = setup();
    let (tx, mut rx) = mpsc::unbounded_channel();

    let sub = bridge
        .subscribe("properties", EventFilter::All, move |e: ChangeEvent<Property>| {
            let id = e.current.as_ref().map(|p| p.id).unwrap_or_default();
            if id == 13 {
                panic!("unlucky listing");
            }
            let _ = tx.send(id);
        })
        .await
        .unwrap();

    for id in [12, 13, 14] {
        feed.publish("properties", RawChange::insert(property(id))).await;
    }

    assert_eq!(timeout(WAIT, rx.recv()).await.unwrap(), Some(12));
    assert_eq!(timeout(WAIT, rx.recv()).await.unwrap(), Some(14));
    assert!(sub.is_active());
}

#[tokio::test]
async fn test_undecodable_rows_are_skipped() {
    let (feed, bridge) = setup();
    let (tx, mut rx) = mpsc::unbounded_channel();

    let _sub = bridge
        .subscribe("properties", EventFilter::All, move |e: ChangeEvent<Property>| {
            let _ = tx.send(e);
        })
        .await
        .unwrap();

    feed.publish("properties", RawChange::insert(json!({ "id": "not-a-number" }))).await;
    feed.publish("properties", RawChange::insert(property(5))).await;

    let event = timeout(WAIT, rx.recv()).await.unwrap().unwrap();
    assert_eq!(event.current.unwrap().id, 5);
}

#[tokio::test]
async fn test_each_subscription_owns_one_channel() {
    let (feed, bridge) = setup();
    let (tx_a, mut rx_a) = mpsc::unbounded_channel();
    let (tx_b, mut rx_b) = mpsc::unbounded_channel();

    let a = bridge
        .subscribe("properties", EventFilter::All, move |e: ChangeEvent<Property>| {
            let _ = tx_a.send(e.kind);
        })
        .await
        .unwrap();
    let b = bridge
        .subscribe("properties", EventFilter::Delete, move |e: ChangeEvent<Property>| {
            let _ = tx_b.send(e.kind);
        })
        .await
        .unwrap();
    assert_eq!(bridge.registry().subscriber_count("properties"), 2);
    assert_ne!(a.id(), b.id());

    drop(a);
    assert_eq!(bridge.registry().subscriber_count("properties"), 1);

    feed.publish("properties", RawChange::delete(property(9))).await;
    assert_eq!(
        timeout(WAIT, rx_b.recv()).await.unwrap(),
        Some(ChangeKind::Deleted)
    );
    assert!(matches!(timeout(WAIT, rx_a.recv()).await, Ok(None)));
    assert!(b.is_active());
}
