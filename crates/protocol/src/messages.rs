use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Shared field types
// ---------------------------------------------------------------------------

/// Who wrote a chat message, seen from the client that holds it.
///
/// On the wire the local participant is `"user"` and everybody else is
/// `"other"`. Missing values are treated as remote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SenderKind {
    #[serde(rename = "user")]
    Local,
    #[default]
    #[serde(rename = "other")]
    Remote,
}

// ---------------------------------------------------------------------------
// Event payloads
// ---------------------------------------------------------------------------

/// Payload of a `connection` event.
///
/// Outbound it announces the local identity (`username`); inbound the server
/// acknowledges a peer and carries the current roster (`users`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub users: Option<Vec<String>>,
}

impl ConnectionData {
    /// Builds the announce sent right after the transport opens.
    pub fn announce(username: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            users: None,
        }
    }
}

/// Payload of a `message` event.
///
/// Outbound messages never carry an `id`; the server may attach one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub text: String,
    #[serde(default)]
    pub sender: SenderKind,
    #[serde(default)]
    pub username: String,
    #[serde(
        default,
        with = "crate::timestamp::lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Payload of a `user` event: the full roster of online participants.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserListData {
    pub users: Vec<String>,
}

/// Payload of an `error` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorData {
    pub message: String,
}
