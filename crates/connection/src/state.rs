use tracing::debug;

use livechat_protocol::WsEvent;

use crate::types::{ChatMessage, ConnectionState};

/// Locally materialized chat state.
///
/// Owned by the [`ConnectionManager`](crate::ConnectionManager) and handed to
/// consumers as read-only clones. The mutators return `true` when something
/// actually changed so they can feed `watch::Sender::send_if_modified`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatSnapshot {
    pub state: ConnectionState,
    /// Append-only, in arrival order.
    pub messages: Vec<ChatMessage>,
    /// Roster as last reported by the server.
    pub users: Vec<String>,
    /// Last human-readable error, cleared on (re)connection.
    pub error: Option<String>,
}

impl ChatSnapshot {
    pub fn is_connected(&self) -> bool {
        self.state.is_connected()
    }

    pub fn last_message(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    /// Applies one decoded protocol event.
    pub(crate) fn apply_event(&mut self, event: WsEvent) -> bool {
        match event {
            WsEvent::Message(data) => {
                self.push_message(ChatMessage::from_wire(data));
                true
            }
            WsEvent::User(list) => self.replace_users(list.users),
            WsEvent::Connection(conn) => match conn.users {
                Some(users) => self.replace_users(users),
                None => {
                    debug!(username = ?conn.username, "connection event without roster, ignoring");
                    false
                }
            },
            WsEvent::Error(err) => self.set_error(err.message),
        }
    }

    pub(crate) fn push_message(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    pub(crate) fn replace_users(&mut self, users: Vec<String>) -> bool {
        if self.users == users {
            return false;
        }
        self.users = users;
        true
    }

    pub(crate) fn set_state(&mut self, state: ConnectionState) -> bool {
        if self.state == state {
            return false;
        }
        self.state = state;
        true
    }

    pub(crate) fn set_error(&mut self, message: impl Into<String>) -> bool {
        let message = message.into();
        if self.error.as_deref() == Some(message.as_str()) {
            return false;
        }
        self.error = Some(message);
        true
    }

    /// Transition taken when the transport opens.
    pub(crate) fn mark_connected(&mut self) -> bool {
        let changed = self.error.is_some() || self.state != ConnectionState::Connected;
        self.state = ConnectionState::Connected;
        self.error = None;
        changed
    }

    /// Transition taken when the transport fails: record the error, then drop
    /// to disconnected.
    pub(crate) fn mark_failed(&mut self, message: &str) -> bool {
        let errored = self.set_error(message);
        let dropped = self.set_state(ConnectionState::Disconnected);
        errored || dropped
    }
}
