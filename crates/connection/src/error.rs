//! Errors returned by the send path.

/// Error-state text shown when a send is attempted without an open transport.
pub const NOT_CONNECTED_MESSAGE: &str = "Not connected to the chat server";

/// Error-state text shown when an open transport fails at runtime.
pub const CONNECTION_ERROR_MESSAGE: &str = "Connection to the chat server failed";

/// Error-state text shown when the transport cannot be opened at all.
pub const OPEN_FAILED_MESSAGE: &str = "Unable to establish a connection";

/// Errors produced by [`ConnectionManager::send_message`](crate::ConnectionManager::send_message).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChatError {
    #[error("not connected")]
    NotConnected,

    #[error("message is empty")]
    EmptyMessage,
}
