//! Connection manager owning the chat session.
//!
//! Exposes an explicit `start`/`stop` lifecycle, the optimistic send path and
//! read-only snapshots of the local chat state. The connection itself is
//! supervised by a session task (see `reconnection`), which reconnects on a
//! fixed delay whenever the transport drops.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, error, info, info_span, warn};

use livechat_protocol::WsEvent;

use crate::error::{ChatError, NOT_CONNECTED_MESSAGE};
use crate::reconnection::{Session, Shared, cancel_pending_reconnect, run_session};
use crate::state::ChatSnapshot;
use crate::types::{ChatConfig, ChatMessage, ConnectionState, ReconnectConfig};
use crate::ws_client::{Connector, TungsteniteConnector};

/// The session currently bound to the manager.
struct ActiveSession {
    config: ChatConfig,
    cancel: CancellationToken,
}

/// Connection manager for a single chat endpoint.
pub struct ConnectionManager {
    shared: Arc<Shared>,
    connector: Arc<dyn Connector>,
    reconnect_config: ReconnectConfig,
    active: Mutex<Option<ActiveSession>>,
    next_session: AtomicU64,
}

impl ConnectionManager {
    /// Creates a manager that connects over `tokio-tungstenite` and retries
    /// every five seconds.
    pub fn new() -> Self {
        Self::with_connector(
            Arc::new(TungsteniteConnector::default()),
            ReconnectConfig::default(),
        )
    }

    /// Creates a manager with a custom transport and reconnection policy.
    pub fn with_connector(connector: Arc<dyn Connector>, reconnect_config: ReconnectConfig) -> Self {
        Self {
            shared: Arc::new(Shared::new()),
            connector,
            reconnect_config,
            active: Mutex::new(None),
            next_session: AtomicU64::new(1),
        }
    }

    /// Replaces the reconnection policy for sessions started afterwards.
    pub fn with_reconnect_config(mut self, reconnect_config: ReconnectConfig) -> Self {
        self.reconnect_config = reconnect_config;
        self
    }

    /// Starts a session for `config`.
    ///
    /// Does nothing while identity or endpoint is empty, or when a session for
    /// the same config is already running. A different config tears the
    /// running session down first. The open outcome is reported through the
    /// snapshot; this call never waits for it. Must be called inside a Tokio
    /// runtime.
    pub fn start(&self, config: ChatConfig) {
        if !config.is_ready() {
            debug!("identity or endpoint missing, not connecting");
            return;
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            error!("ConnectionManager::start called outside a Tokio runtime");
            return;
        };
        let Ok(mut active) = self.active.lock() else {
            return;
        };

        if let Some(current) = active.as_ref()
            && current.config == config
            && !current.cancel.is_cancelled()
        {
            debug!(url = %config.endpoint, "session already running");
            return;
        }
        if let Some(previous) = active.take() {
            info!(url = %previous.config.endpoint, "config changed, restarting session");
            self.teardown(&previous);
        }

        let id = self.next_session.fetch_add(1, Ordering::Relaxed);
        let cancel = CancellationToken::new();
        let session = Session {
            id,
            config: config.clone(),
            reconnect: self.reconnect_config.clone(),
            connector: self.connector.clone(),
            shared: self.shared.clone(),
            cancel: cancel.clone(),
        };

        self.shared
            .snapshot
            .send_if_modified(|snap| snap.set_state(ConnectionState::Connecting));

        let span = info_span!("chat_session", id, url = %config.endpoint);
        runtime.spawn(run_session(session).instrument(span));

        *active = Some(ActiveSession { config, cancel });
    }

    /// Convenience for `start(ChatConfig::new(endpoint, identity))`.
    pub fn start_with(&self, endpoint: &str, identity: &str) {
        self.start(ChatConfig::new(endpoint, identity));
    }

    /// Closes the transport, cancels any pending reconnect and goes to
    /// Disconnected. Idempotent.
    pub fn stop(&self) {
        let previous = self.active.lock().ok().and_then(|mut active| active.take());
        match previous {
            Some(session) => {
                self.teardown(&session);
                info!(url = %session.config.endpoint, "chat session stopped");
            }
            None => {
                cancel_pending_reconnect(&self.shared.reconnect_timer);
                self.shared.close_client();
            }
        }
    }

    /// Cancels the session, its timer and its transport in one step.
    fn teardown(&self, session: &ActiveSession) {
        session.cancel.cancel();
        cancel_pending_reconnect(&self.shared.reconnect_timer);
        self.shared.close_client();
        self.shared
            .snapshot
            .send_if_modified(|snap| snap.set_state(ConnectionState::Disconnected));
    }

    /// Sends a chat message.
    ///
    /// While connected the message is appended to the local log immediately
    /// and then queued for transmission. Otherwise the error state is set and
    /// nothing is appended or sent.
    pub fn send_message(&self, text: &str) -> Result<ChatMessage, ChatError> {
        if text.trim().is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        let identity = self.config().map(|c| c.identity);
        let client = self.shared.current_client().filter(|c| !c.is_closed());
        let (Some(identity), Some(client), true) = (identity, client, self.is_connected()) else {
            debug!("send attempted while not connected");
            self.shared
                .snapshot
                .send_if_modified(|snap| snap.set_error(NOT_CONNECTED_MESSAGE));
            return Err(ChatError::NotConnected);
        };

        let message = ChatMessage::local(text, identity);
        self.shared.snapshot.send_modify(|snap| snap.push_message(message.clone()));

        let frame = outbound_frame(WsEvent::Message(message.to_wire()).to_json(), text);
        if let Err(e) = client.send_text(frame) {
            warn!(error = %e, "failed to queue outbound message");
        }

        Ok(message)
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        self.shared.snapshot.borrow().state
    }

    pub fn is_connected(&self) -> bool {
        self.state().is_connected()
    }

    /// Copy of the message log.
    pub fn messages(&self) -> Vec<ChatMessage> {
        self.shared.snapshot.borrow().messages.clone()
    }

    /// Copy of the roster.
    pub fn users(&self) -> Vec<String> {
        self.shared.snapshot.borrow().users.clone()
    }

    /// Last error, if any.
    pub fn error(&self) -> Option<String> {
        self.shared.snapshot.borrow().error.clone()
    }

    /// Copy of the whole local state.
    pub fn snapshot(&self) -> ChatSnapshot {
        self.shared.snapshot.borrow().clone()
    }

    /// Subscribes to state changes. The receiver starts at the current value.
    pub fn subscribe(&self) -> watch::Receiver<ChatSnapshot> {
        self.shared.snapshot.subscribe()
    }

    /// Returns `true` while a reconnection timer is pending.
    pub fn has_pending_reconnect(&self) -> bool {
        self.shared.has_pending_reconnect()
    }

    /// Config of the running session, if any.
    pub fn config(&self) -> Option<ChatConfig> {
        self.active
            .lock()
            .ok()
            .and_then(|active| active.as_ref().map(|s| s.config.clone()))
    }
}

/// Text frame for an outbound message: the encoded event, or the raw text when
/// encoding failed.
fn outbound_frame(encoded: Result<String, serde_json::Error>, text: &str) -> String {
    match encoded {
        Ok(json) => json,
        Err(e) => {
            warn!(error = %e, "failed to encode message, sending raw text");
            text.to_string()
        }
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        self.stop();
    }
}
