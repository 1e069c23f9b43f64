//! Session loop and fixed-delay reconnection.
//!
//! One session task owns the connection lifecycle for a single
//! [`ChatConfig`]: open, read until the transport drops, wait out the
//! reconnect delay, open again. The task ends only when its session token is
//! cancelled.

use std::sync::Arc;
use std::sync::Mutex;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use livechat_protocol::{ConnectionData, InboundFrame, WsEvent};

use crate::error::{CONNECTION_ERROR_MESSAGE, OPEN_FAILED_MESSAGE};
use crate::pumps::read::{ReadOutcome, read_pump};
use crate::state::ChatSnapshot;
use crate::types::{ChatConfig, ChatMessage, ConnectionState, ReconnectConfig};
use crate::ws_client::{Connector, FrameSink, FrameStream, WsClient};

/// State shared by the manager and every session task it spawned.
pub(crate) struct Shared {
    pub(crate) snapshot: watch::Sender<ChatSnapshot>,
    /// Write handle of the open transport, tagged with its session id.
    pub(crate) client: Mutex<Option<(u64, Arc<WsClient>)>>,
    /// The single pending reconnection timer, tagged with its session id.
    pub(crate) reconnect_timer: Mutex<Option<(u64, CancellationToken)>>,
}

impl Shared {
    pub(crate) fn new() -> Self {
        let (snapshot, _) = watch::channel(ChatSnapshot::default());
        Self {
            snapshot,
            client: Mutex::new(None),
            reconnect_timer: Mutex::new(None),
        }
    }

    /// Returns the open client, if any.
    pub(crate) fn current_client(&self) -> Option<Arc<WsClient>> {
        self.client
            .lock()
            .ok()
            .and_then(|guard| guard.as_ref().map(|(_, c)| c.clone()))
    }

    /// Takes and closes the open client regardless of which session owns it.
    pub(crate) fn close_client(&self) {
        let taken = self.client.lock().ok().and_then(|mut guard| guard.take());
        if let Some((_, client)) = taken {
            client.close();
        }
    }

    pub(crate) fn has_pending_reconnect(&self) -> bool {
        self.reconnect_timer
            .lock()
            .map(|guard| guard.is_some())
            .unwrap_or(false)
    }
}

/// Cancels the pending reconnection timer, whichever session scheduled it.
pub(crate) fn cancel_pending_reconnect(slot: &Mutex<Option<(u64, CancellationToken)>>) {
    if let Ok(mut guard) = slot.lock()
        && let Some((_, timer)) = guard.take()
    {
        timer.cancel();
    }
}

/// Everything a session task needs, cloned out of the manager at spawn time.
#[derive(Clone)]
pub(crate) struct Session {
    pub(crate) id: u64,
    pub(crate) config: ChatConfig,
    pub(crate) reconnect: ReconnectConfig,
    pub(crate) connector: Arc<dyn Connector>,
    pub(crate) shared: Arc<Shared>,
    /// Liveness flag. Once cancelled the session never touches shared state.
    pub(crate) cancel: CancellationToken,
}

impl Session {
    /// Mutates the snapshot unless the session has been torn down.
    ///
    /// The liveness check runs inside the watch lock, so it is ordered with
    /// the teardown's own state write.
    fn update(&self, f: impl FnOnce(&mut ChatSnapshot) -> bool) -> bool {
        self.shared.snapshot.send_if_modified(|snap| {
            if self.cancel.is_cancelled() {
                return false;
            }
            f(snap)
        })
    }

    fn install_client(&self, client: Arc<WsClient>) -> bool {
        let Ok(mut guard) = self.shared.client.lock() else {
            return false;
        };
        if self.cancel.is_cancelled() {
            return false;
        }
        if let Some((_, stale)) = guard.replace((self.id, client)) {
            stale.close();
        }
        true
    }

    fn clear_client(&self) {
        if let Ok(mut guard) = self.shared.client.lock()
            && guard.as_ref().is_some_and(|(id, _)| *id == self.id)
        {
            *guard = None;
        }
    }

    fn apply_frame(&self, frame: InboundFrame) {
        match frame {
            InboundFrame::Event(event) => {
                self.update(|snap| snap.apply_event(event));
            }
            InboundFrame::PlainText(text) => {
                self.update(|snap| {
                    snap.push_message(ChatMessage::plain_text(text));
                    true
                });
            }
        }
    }

    /// Runs one open transport until it drops.
    async fn serve(&self, sink: FrameSink, stream: FrameStream) {
        let client = Arc::new(WsClient::spawn(sink, self.cancel.child_token()));
        if !self.install_client(client.clone()) {
            client.close();
            return;
        }

        self.update(ChatSnapshot::mark_connected);
        info!(identity = %self.config.identity, "connected");

        let announce = WsEvent::Connection(ConnectionData::announce(&self.config.identity));
        if let Err(e) = client.send_event(&announce) {
            warn!(error = %e, "failed to announce identity");
        }

        let outcome = read_pump(stream, client.cancel_token(), |frame| self.apply_frame(frame)).await;

        match outcome {
            ReadOutcome::Cancelled if self.cancel.is_cancelled() => {
                // Teardown owns the state from here.
                return;
            }
            ReadOutcome::Cancelled => {
                warn!("transport closed locally after a write failure");
                self.update(|snap| snap.set_error(CONNECTION_ERROR_MESSAGE));
            }
            ReadOutcome::Closed => debug!("transport closed by remote"),
            ReadOutcome::Failed(reason) => {
                warn!(%reason, "transport error");
                self.update(|snap| snap.set_error(CONNECTION_ERROR_MESSAGE));
            }
        }

        client.close();
        self.clear_client();
        self.update(|snap| snap.set_state(ConnectionState::Disconnected));
    }

    /// Stores a fresh reconnect timer, cancelling any previous one.
    fn schedule_reconnect(&self) -> CancellationToken {
        let timer = self.cancel.child_token();
        if let Ok(mut guard) = self.shared.reconnect_timer.lock()
            && !self.cancel.is_cancelled()
            && let Some((_, previous)) = guard.replace((self.id, timer.clone()))
        {
            previous.cancel();
        }
        timer
    }

    fn finish_reconnect(&self) {
        if let Ok(mut guard) = self.shared.reconnect_timer.lock()
            && guard.as_ref().is_some_and(|(id, _)| *id == self.id)
        {
            *guard = None;
        }
    }

    /// Waits out the reconnect delay. Returns `false` if the timer was cancelled.
    async fn wait_for_reconnect(&self) -> bool {
        let timer = self.schedule_reconnect();
        let delay = self.reconnect.delay;
        info!(
            delay_secs = format_args!("{:.1}", delay.as_secs_f64()),
            "reconnecting after delay"
        );

        let fired = tokio::select! {
            _ = timer.cancelled() => false,
            _ = tokio::time::sleep(delay) => true,
        };

        self.finish_reconnect();
        if !fired {
            debug!("reconnect cancelled");
        }
        fired && !self.cancel.is_cancelled()
    }
}

/// Session loop: open, serve, wait, repeat. No attempt limit, no backoff.
pub(crate) async fn run_session(session: Session) {
    let mut attempt: u32 = 0;

    loop {
        attempt = attempt.saturating_add(1);
        session.update(|snap| snap.set_state(ConnectionState::Connecting));
        info!(url = %session.config.endpoint, attempt, "connecting");

        let opened = tokio::select! {
            _ = session.cancel.cancelled() => return,
            result = session.connector.connect(&session.config.endpoint) => result,
        };

        match opened {
            Ok((sink, stream)) => session.serve(sink, stream).await,
            Err(e) => {
                warn!(url = %session.config.endpoint, attempt, error = %e, "connection failed");
                session.update(|snap| snap.mark_failed(OPEN_FAILED_MESSAGE));
            }
        }

        if session.cancel.is_cancelled() || !session.wait_for_reconnect().await {
            return;
        }
    }
}
