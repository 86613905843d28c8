//! Wire format of the hosted backend's realtime socket.
//!
//! Every frame is a JSON object `{topic, event, payload, ref}`. A channel
//! for collection `c` lives on topic `realtime:c`; heartbeats go to the
//! `phoenix` topic.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use turqa_core::result::AppResult;

use crate::event::{EventFilter, RawChange};

/// Topic heartbeats are sent on.
pub const HEARTBEAT_TOPIC: &str = "phoenix";

/// A protocol frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Channel topic.
    pub topic: String,
    /// Event name.
    pub event: String,
    /// Event payload.
    #[serde(default)]
    pub payload: Value,
    /// Message reference for replies.
    #[serde(rename = "ref", default)]
    pub reference: Option<String>,
}

impl Frame {
    /// Serialize to a text frame.
    pub fn to_text(&self) -> AppResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Topic for a collection channel.
pub fn topic_for(collection: &str) -> String {
    format!("realtime:{collection}")
}

/// Join request for a collection channel.
pub fn join(
    collection: &str,
    schema: &str,
    filter: EventFilter,
    access_token: &str,
    reference: &str,
) -> Frame {
    let mut payload = json!({
        "config": {
            "broadcast": { "self": false },
            "presence": { "key": "" },
            "postgres_changes": [{
                "event": filter.as_str(),
                "schema": schema,
                "table": collection,
            }],
        },
    });
    if !access_token.is_empty() {
        payload["access_token"] = Value::String(access_token.to_string());
    }
    Frame {
        topic: topic_for(collection),
        event: "phx_join".to_string(),
        payload,
        reference: Some(reference.to_string()),
    }
}

/// Leave request for a channel topic.
pub fn leave(topic: &str, reference: &str) -> Frame {
    Frame {
        topic: topic.to_string(),
        event: "phx_leave".to_string(),
        payload: json!({}),
        reference: Some(reference.to_string()),
    }
}

/// Keepalive frame.
pub fn heartbeat(reference: &str) -> Frame {
    Frame {
        topic: HEARTBEAT_TOPIC.to_string(),
        event: "heartbeat".to_string(),
        payload: json!({}),
        reference: Some(reference.to_string()),
    }
}

/// What an inbound frame means to a channel on `topic`.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// A row change.
    Change(RawChange),
    /// The join was accepted.
    Joined,
    /// The server refused or ended the channel.
    Closed(String),
    /// Nothing for this channel (heartbeat replies, presence, other topics).
    Ignored,
}

#[derive(Debug, Deserialize)]
struct ChangeData {
    #[serde(rename = "type")]
    operation: String,
    #[serde(default)]
    record: Option<Value>,
    #[serde(default)]
    old_record: Option<Value>,
    #[serde(default)]
    commit_timestamp: Option<String>,
}

/// Decode a text frame for the channel on `topic` joined with `join_ref`.
pub fn decode(text: &str, topic: &str, join_ref: &str) -> AppResult<Inbound> {
    let frame: Frame = serde_json::from_str(text)?;
    if frame.topic != topic {
        return Ok(Inbound::Ignored);
    }

    let inbound = match frame.event.as_str() {
        "postgres_changes" => {
            let data: ChangeData = serde_json::from_value(
                frame.payload.get("data").cloned().unwrap_or(Value::Null),
            )?;
            Inbound::Change(RawChange {
                operation: data.operation,
                record: data.record,
                old_record: data.old_record,
                commit_timestamp: data.commit_timestamp.as_deref().and_then(parse_timestamp),
            })
        }
        "phx_reply" if frame.reference.as_deref() == Some(join_ref) => {
            match frame.payload.get("status").and_then(Value::as_str) {
                Some("ok") => Inbound::Joined,
                _ => Inbound::Closed(format!("join refused: {}", reason(&frame.payload))),
            }
        }
        "system" if frame.payload.get("status").and_then(Value::as_str) == Some("error") => {
            Inbound::Closed(reason(&frame.payload))
        }
        "phx_error" => Inbound::Closed("channel error".to_string()),
        "phx_close" => Inbound::Closed("channel closed by server".to_string()),
        _ => Inbound::Ignored,
    };
    Ok(inbound)
}

fn reason(payload: &Value) -> String {
    payload
        .pointer("/response/reason")
        .or_else(|| payload.get("message"))
        .and_then(Value::as_str)
        .unwrap_or("unknown")
        .to_string()
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_frame() {
        let frame = join("properties", "public", EventFilter::Insert, "anon", "1");
        assert_eq!(frame.topic, "realtime:properties");
        assert_eq!(frame.event, "phx_join");
        let change = &frame.payload["config"]["postgres_changes"][0];
        assert_eq!(change["event"], "INSERT");
        assert_eq!(change["table"], "properties");
        assert_eq!(change["schema"], "public");
        assert_eq!(frame.payload["access_token"], "anon");

        let text = frame.to_text().unwrap();
        assert!(text.contains(r#""ref":"1""#));
    }

    #[test]
    fn test_decode_change() {
        let text = r#"{
            "topic": "realtime:properties",
            "event": "postgres_changes",
            "ref": null,
            "payload": {
                "ids": [1],
                "data": {
                    "schema": "public",
                    "table": "properties",
                    "type": "INSERT",
                    "commit_timestamp": "2026-03-01T10:00:00.123Z",
                    "record": {"id": 42, "title": "Villa"},
                    "old_record": null,
                    "errors": null
                }
            }
        }"#;
        let Inbound::Change(raw) = decode(text, "realtime:properties", "1").unwrap() else {
            panic!("expected a change");
        };
        assert_eq!(raw.operation, "INSERT");
        assert_eq!(raw.record.unwrap()["id"], 42);
        assert!(raw.commit_timestamp.is_some());
    }

    #[test]
    fn test_decode_join_replies() {
        let ok = r#"{"topic":"realtime:p","event":"phx_reply","ref":"1","payload":{"status":"ok","response":{}}}"#;
        assert_eq!(decode(ok, "realtime:p", "1").unwrap(), Inbound::Joined);

        let refused = r#"{"topic":"realtime:p","event":"phx_reply","ref":"1","payload":{"status":"error","response":{"reason":"unauthorized"}}}"#;
        assert_eq!(
            decode(refused, "realtime:p", "1").unwrap(),
            Inbound::Closed("join refused: unauthorized".into())
        );

        // Reply to a heartbeat, not the join.
        let other = r#"{"topic":"realtime:p","event":"phx_reply","ref":"7","payload":{"status":"ok"}}"#;
        assert_eq!(decode(other, "realtime:p", "1").unwrap(), Inbound::Ignored);
    }

    #[test]
    fn test_decode_other_topics_and_closes() {
        let hb = r#"{"topic":"phoenix","event":"phx_reply","ref":"2","payload":{"status":"ok"}}"#;
        assert_eq!(decode(hb, "realtime:p", "1").unwrap(), Inbound::Ignored);

        let close = r#"{"topic":"realtime:p","event":"phx_close","ref":null,"payload":{}}"#;
        assert!(matches!(decode(close, "realtime:p", "1").unwrap(), Inbound::Closed(_)));

        let system = r#"{"topic":"realtime:p","event":"system","payload":{"status":"error","message":"table not found"}}"#;
        assert_eq!(
            decode(system, "realtime:p", "1").unwrap(),
            Inbound::Closed("table not found".into())
        );

        assert!(decode("not json", "realtime:p", "1").is_err());
    }
}
