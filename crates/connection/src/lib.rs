//! Connection manager for the livechat client.
//!
//! Owns a single WebSocket session against a chat endpoint, keeps a local
//! view of messages, online users and the last error, and reconnects on a
//! fixed delay whenever the transport drops.

pub mod error;
pub mod manager;
mod pumps;
pub(crate) mod reconnection;
pub mod state;
pub mod types;
pub mod ws_client;

#[cfg(test)]
pub(crate) mod testing;

pub use error::ChatError;
pub use manager::ConnectionManager;
pub use state::ChatSnapshot;
pub use types::{ChatConfig, ChatMessage, ConnectionState, ReconnectConfig};
pub use ws_client::{Connector, TungsteniteConnector, WsClient, WsError};

pub use livechat_protocol::SenderKind;
