//! Change feed over the hosted backend's realtime WebSocket.
//!
//! Each `open` dials its own socket, so one subscription maps to exactly
//! one channel and tearing one down never affects another.

use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::time;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use turqa_core::config::RealtimeConfig;
use turqa_core::error::{AppError, ErrorKind};
use turqa_core::result::AppResult;

use crate::event::{EventFilter, RawChange};

use super::phoenix::{self, Inbound};
use super::{ChangeFeed, FeedStream};

type Socket = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// Protocol version query parameter.
const PROTOCOL_VERSION: &str = "1.0.0";

/// Reference used for the join message.
const JOIN_REF: &str = "1";

/// WebSocket change feed.
#[derive(Debug, Clone)]
pub struct WebSocketChangeFeed {
    endpoint: String,
    api_key: String,
    schema: String,
    buffer_size: usize,
    heartbeat: Duration,
    connect_timeout: Duration,
}

impl WebSocketChangeFeed {
    /// Creates a feed from configuration.
    pub fn new(config: &RealtimeConfig) -> AppResult<Self> {
        let url = config.url.trim();
        if !(url.starts_with("ws://") || url.starts_with("wss://")) {
            return Err(AppError::configuration(
                "realtime.url must be a ws:// or wss:// endpoint",
            ));
        }
        let separator = if url.contains('?') { '&' } else { '?' };
        let endpoint = format!(
            "{url}{separator}apikey={}&vsn={PROTOCOL_VERSION}",
            urlencoding::encode(&config.api_key)
        );

        Ok(Self {
            endpoint,
            api_key: config.api_key.clone(),
            schema: config.schema.clone(),
            buffer_size: config.channel_buffer_size.max(1),
            heartbeat: Duration::from_secs(config.heartbeat_interval_seconds.max(1)),
            connect_timeout: Duration::from_secs(config.connect_timeout_seconds.max(1)),
        })
    }

    async fn connect(&self) -> AppResult<Socket> {
        let connecting = connect_async(self.endpoint.as_str());
        match time::timeout(self.connect_timeout, connecting).await {
            Ok(Ok((socket, _response))) => Ok(socket),
            Ok(Err(e)) => Err(AppError::with_source(
                ErrorKind::ServiceUnavailable,
                "Realtime service is unavailable",
                e,
            )),
            Err(_) => Err(AppError::service_unavailable(
                "Timed out connecting to the realtime service",
            )),
        }
    }
}

#[async_trait]
impl ChangeFeed for WebSocketChangeFeed {
    async fn open(&self, collection: &str, filter: EventFilter) -> AppResult<FeedStream> {
        let mut socket = self.connect().await?;

        let join = phoenix::join(collection, &self.schema, filter, &self.api_key, JOIN_REF);
        socket
            .send(Message::text(join.to_text()?))
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::ServiceUnavailable,
                    "Failed to join realtime channel",
                    e,
                )
            })?;

        info!(collection, filter = %filter, "Realtime channel opened");

        let (tx, stream) = FeedStream::channel(self.buffer_size);
        tokio::spawn(pump(
            socket,
            phoenix::topic_for(collection),
            tx,
            stream.release.clone(),
            self.heartbeat,
        ));
        Ok(stream)
    }
}

/// Moves frames from the socket to the channel until either side ends it.
async fn pump(
    socket: Socket,
    topic: String,
    tx: mpsc::Sender<RawChange>,
    release: CancellationToken,
    heartbeat: Duration,
) {
    let (mut sink, mut source) = socket.split();
    let mut ticker = time::interval_at(time::Instant::now() + heartbeat, heartbeat);
    let mut next_ref: u64 = 2;

    loop {
        tokio::select! {
            biased;
            _ = release.cancelled() => {
                let leave = phoenix::leave(&topic, &next_ref.to_string());
                if let Ok(text) = leave.to_text() {
                    let _ = sink.send(Message::text(text)).await;
                }
                let _ = sink.close().await;
                debug!(topic = %topic, "Realtime channel released");
                return;
            }
            _ = ticker.tick() => {
                let beat = phoenix::heartbeat(&next_ref.to_string());
                next_ref += 1;
                let sent = match beat.to_text() {
                    Ok(text) => sink.send(Message::text(text)).await,
                    Err(_) => continue,
                };
                if let Err(e) = sent {
                    warn!(topic = %topic, error = %e, "Heartbeat failed, dropping channel");
                    return;
                }
            }
            frame = source.next() => match frame {
                Some(Ok(Message::Text(text))) => match phoenix::decode(text.as_str(), &topic, JOIN_REF) {
                    Ok(Inbound::Change(change)) => {
                        if tx.send(change).await.is_err() {
                            return;
                        }
                    }
                    Ok(Inbound::Joined) => debug!(topic = %topic, "Realtime channel joined"),
                    Ok(Inbound::Closed(reason)) => {
                        warn!(topic = %topic, reason = %reason, "Realtime channel closed by server");
                        return;
                    }
                    Ok(Inbound::Ignored) => {}
                    Err(e) => warn!(topic = %topic, error = %e, "Skipping undecodable realtime frame"),
                },
                Some(Ok(Message::Close(frame))) => {
                    warn!(topic = %topic, frame = ?frame, "Realtime socket closed");
                    return;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!(topic = %topic, error = %e, "Realtime socket error");
                    return;
                }
                None => {
                    warn!(topic = %topic, "Realtime socket ended");
                    return;
                }
            },
        }
    }
}
