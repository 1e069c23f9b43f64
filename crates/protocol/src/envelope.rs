use serde::{Deserialize, Serialize};

use crate::constants::{EventKind, WS_MAX_MESSAGE_SIZE};
use crate::messages::{ConnectionData, ErrorData, MessageData, UserListData};

/// Errors produced while decoding an inbound frame.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("malformed event: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("frame too large ({size} bytes)")]
    TooLarge { size: usize },
}

/// Every event exchanged with the chat endpoint.
///
/// Serialized adjacently tagged: `{ "type": "message", "data": { ... } }`.
/// Unknown `type` values fail to decode instead of being guessed at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum WsEvent {
    Connection(ConnectionData),
    Message(MessageData),
    User(UserListData),
    Error(ErrorData),
}

impl WsEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Connection(_) => EventKind::Connection,
            Self::Message(_) => EventKind::Message,
            Self::User(_) => EventKind::User,
            Self::Error(_) => EventKind::Error,
        }
    }

    /// Encodes the event as a JSON text frame.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Result of decoding one inbound text frame.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundFrame {
    /// A well-formed protocol event.
    Event(WsEvent),
    /// The frame was not JSON; carries the raw text.
    PlainText(String),
}

/// Decodes an inbound text frame.
///
/// Frames that are not JSON at all come back as [`InboundFrame::PlainText`].
/// Frames that are JSON but do not match any [`WsEvent`] shape are an error.
pub fn decode_frame(text: &str) -> Result<InboundFrame, ProtocolError> {
    if text.len() > WS_MAX_MESSAGE_SIZE {
        return Err(ProtocolError::TooLarge { size: text.len() });
    }

    let value: serde_json::Value = match serde_json::from_str(text) {
        Ok(v) => v,
        Err(_) => return Ok(InboundFrame::PlainText(text.to_string())),
    };

    let event = WsEvent::deserialize(value)?;
    Ok(InboundFrame::Event(event))
}
