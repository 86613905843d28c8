//! Realtime change-feed configuration.

use serde::{Deserialize, Serialize};

/// Realtime (WebSocket change feed) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// WebSocket endpoint, e.g. `wss://xyz.example.co/realtime/v1/websocket`.
    #[serde(default)]
    pub url: String,
    /// Public API key appended as the `apikey` query parameter.
    #[serde(default)]
    pub api_key: String,
    /// Database schema the collections live in.
    #[serde(default = "default_schema")]
    pub schema: String,
    /// Buffer size of each per-subscription event channel.
    #[serde(default = "default_channel_buffer")]
    pub channel_buffer_size: usize,
    /// Heartbeat interval in seconds.
    #[serde(default = "default_heartbeat_interval")]
    pub heartbeat_interval_seconds: u64,
    /// Connect (and join) timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            api_key: String::new(),
            schema: default_schema(),
            channel_buffer_size: default_channel_buffer(),
            heartbeat_interval_seconds: default_heartbeat_interval(),
            connect_timeout_seconds: default_connect_timeout(),
        }
    }
}

fn default_schema() -> String {
    "public".to_string()
}

fn default_channel_buffer() -> usize {
    256
}

fn default_heartbeat_interval() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    10
}
