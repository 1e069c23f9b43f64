//! Public types for the chat connection manager.

use std::time::Duration;

use chrono::{DateTime, Utc};

use livechat_protocol::constants::{PLAIN_TEXT_AUTHOR, RECONNECT_DELAY};
use livechat_protocol::{MessageData, SenderKind};

/// Connection state of the chat session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectionState {
    /// No transport is open.
    #[default]
    Disconnected,
    /// A transport is being opened.
    Connecting,
    /// The transport is open and the identity has been announced.
    Connected,
}

impl ConnectionState {
    pub fn is_connected(self) -> bool {
        self == Self::Connected
    }
}

/// Endpoint and identity a session connects with.
///
/// Both values are trimmed on construction. An empty value means the
/// collaborator supplying them is not ready yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatConfig {
    pub endpoint: String,
    pub identity: String,
}

impl ChatConfig {
    pub fn new(endpoint: impl Into<String>, identity: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into().trim().to_string(),
            identity: identity.into().trim().to_string(),
        }
    }

    /// Returns `true` when both endpoint and identity are present.
    pub fn is_ready(&self) -> bool {
        !self.endpoint.trim().is_empty() && !self.identity.trim().is_empty()
    }
}

/// Configuration for automatic reconnection.
///
/// The policy is a fixed delay with no attempt limit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectConfig {
    /// Delay between losing the transport and the next open attempt.
    pub delay: Duration,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            delay: RECONNECT_DELAY,
        }
    }
}

/// A chat message in the local log.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    /// Display key. Unique in practice, not guaranteed by the protocol.
    pub id: String,
    pub text: String,
    pub sender: SenderKind,
    pub author: String,
    pub sent_at: DateTime<Utc>,
}

impl ChatMessage {
    /// Creates a message authored by the local participant, stamped now.
    pub fn local(text: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            text: text.into(),
            sender: SenderKind::Local,
            author: author.into(),
            sent_at: Utc::now(),
        }
    }

    /// Wraps a non-protocol frame as a remote message from the placeholder author.
    pub fn plain_text(text: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            text: text.into(),
            sender: SenderKind::Remote,
            author: PLAIN_TEXT_AUTHOR.to_string(),
            sent_at: Utc::now(),
        }
    }

    /// Converts an inbound payload, filling in an id and receipt time when absent.
    pub fn from_wire(data: MessageData) -> Self {
        Self {
            id: data.id.unwrap_or_else(new_id),
            text: data.text,
            sender: data.sender,
            author: data.username,
            sent_at: data.timestamp.unwrap_or_else(Utc::now),
        }
    }

    /// Builds the outbound payload. The id stays local.
    pub fn to_wire(&self) -> MessageData {
        MessageData {
            id: None,
            text: self.text.clone(),
            sender: self.sender,
            username: self.author.clone(),
            timestamp: Some(self.sent_at),
        }
    }
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_state_default_is_disconnected() {
        assert_eq!(ConnectionState::default(), ConnectionState::Disconnected);
        assert!(ConnectionState::Connected.is_connected());
        assert!(!ConnectionState::Connecting.is_connected());
    }

    #[test]
    fn chat_config_trims_and_checks_readiness() {
        let config = ChatConfig::new("  ws://chat.test  ", " Alice ");
        assert_eq!(config.endpoint, "ws://chat.test");
        assert_eq!(config.identity, "Alice");
        assert!(config.is_ready());

        assert!(!ChatConfig::new("ws://chat.test", "   ").is_ready());
        assert!(!ChatConfig::new("", "Alice").is_ready());
    }

    #[test]
    fn reconnect_config_defaults() {
        assert_eq!(ReconnectConfig::default().delay, Duration::from_secs(5));
    }

    #[test]
    fn local_message_fields() {
        let msg = ChatMessage::local("hi", "Alice");
        assert_eq!(msg.sender, SenderKind::Local);
        assert_eq!(msg.author, "Alice");
        assert_eq!(msg.text, "hi");
        assert!(!msg.id.is_empty());
    }

    #[test]
    fn plain_text_uses_placeholder_author() {
        let msg = ChatMessage::plain_text("raw");
        assert_eq!(msg.sender, SenderKind::Remote);
        assert_eq!(msg.author, PLAIN_TEXT_AUTHOR);
    }

    #[test]
    fn from_wire_keeps_server_id_and_time() {
        let ts = livechat_protocol::timestamp::parse("2025-03-01T10:15:30.250Z").unwrap();
        let msg = ChatMessage::from_wire(MessageData {
            id: Some("srv-1".into()),
            text: "yo".into(),
            sender: SenderKind::Remote,
            username: "Bob".into(),
            timestamp: Some(ts),
        });
        assert_eq!(msg.id, "srv-1");
        assert_eq!(msg.author, "Bob");
        assert_eq!(msg.sent_at, ts);
    }

    #[test]
    fn from_wire_fills_missing_id_and_time() {
        let before = Utc::now();
        let msg = ChatMessage::from_wire(MessageData {
            id: None,
            text: "yo".into(),
            sender: SenderKind::Remote,
            username: "Bob".into(),
            timestamp: None,
        });
        assert!(!msg.id.is_empty());
        assert!(msg.sent_at >= before);
    }

    #[test]
    fn to_wire_drops_id() {
        let msg = ChatMessage::local("hi", "Alice");
        let wire = msg.to_wire();
        assert!(wire.id.is_none());
        assert_eq!(wire.sender, SenderKind::Local);
        assert_eq!(wire.username, "Alice");
        assert_eq!(wire.timestamp, Some(msg.sent_at));
    }
}
