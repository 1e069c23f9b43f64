use std::fmt;
use std::time::Duration;

/// Delay between a lost connection and the next attempt to reopen it.
pub const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Maximum size of a single inbound frame (1 MiB).
pub const WS_MAX_MESSAGE_SIZE: usize = 1024 * 1024;

/// Hard cap enforced by the transport. Kept above [`WS_MAX_MESSAGE_SIZE`] so
/// an oversized frame reaches the decoder and is dropped there instead of
/// failing the connection.
pub const WS_TRANSPORT_MAX_SIZE: usize = 4 * WS_MAX_MESSAGE_SIZE;

/// Capacity of the outbound frame queue feeding the write pump.
pub const WS_WRITE_QUEUE: usize = 256;

/// Author shown for frames that arrive as plain text instead of JSON events.
pub const PLAIN_TEXT_AUTHOR: &str = "Echo";

/// Discriminant of a [`WsEvent`](crate::WsEvent), mostly useful for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Connection,
    Message,
    User,
    Error,
}

impl EventKind {
    /// Value of the `type` field on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Connection => "connection",
            Self::Message => "message",
            Self::User => "user",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
