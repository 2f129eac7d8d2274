//! Realtime Event Types
//!
//! Events exchanged with the auto-posting server over the realtime channel.
//! On the wire each event is a Socket.IO `["name", payload]` array; here the
//! name/payload pair is mapped onto an adjacently tagged serde enum.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Events sent from the console to the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    /// Post to every enabled account right away
    PostTweet,
    /// Start the recurring scheduler
    StartAutoPosting {
        /// Minutes between runs
        interval: u32,
    },
    /// Stop the recurring scheduler
    StopAutoPosting,
    /// Ask for a full [`AppStatus`] snapshot
    GetAppStatus,
}

impl ClientEvent {
    /// Socket.IO event name
    pub fn name(&self) -> &'static str {
        match self {
            ClientEvent::PostTweet => "post_tweet",
            ClientEvent::StartAutoPosting { .. } => "start_auto_posting",
            ClientEvent::StopAutoPosting => "stop_auto_posting",
            ClientEvent::GetAppStatus => "get_app_status",
        }
    }

    /// Event payload, if the event carries one
    pub fn payload(&self) -> Option<Value> {
        match self {
            ClientEvent::StartAutoPosting { interval } => {
                Some(serde_json::json!({ "interval": interval }))
            }
            _ => None,
        }
    }
}

/// Events pushed from the server to the console
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    /// One-off notice (command results, errors)
    Status { message: String },
    /// Change of the server's current status
    StatusUpdate { status: String },
    /// Full snapshot, answer to `get_app_status`
    AppStatus(AppStatus),
}

impl ServerEvent {
    /// Build from a decoded Socket.IO event
    pub fn from_parts(name: &str, payload: Option<Value>) -> Result<Self, serde_json::Error> {
        let mut envelope = serde_json::Map::new();
        envelope.insert("event".to_string(), Value::String(name.to_string()));
        if let Some(payload) = payload {
            envelope.insert("data".to_string(), payload);
        }
        serde_json::from_value(Value::Object(envelope))
    }

    /// Socket.IO event name
    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::Status { .. } => "status",
            ServerEvent::StatusUpdate { .. } => "status_update",
            ServerEvent::AppStatus(_) => "app_status",
        }
    }
}

/// Snapshot of the server's posting state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppStatus {
    pub current_status: String,
    pub auto_posting_active: bool,
    /// Minutes between scheduled runs
    #[serde(default)]
    pub auto_posting_interval: u32,
    /// ISO 8601, absent while auto-posting is stopped
    #[serde(default)]
    pub next_post_time: Option<String>,
    /// Newest first, as ordered by the server
    #[serde(default)]
    pub recent_activities: Vec<Activity>,
}

/// One logged action
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub timestamp: String,
    pub account: String,
    pub action: String,
    pub result: String,
}
