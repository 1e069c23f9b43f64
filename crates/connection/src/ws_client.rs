//! WebSocket transport for the chat session.
//!
//! A [`Connector`] opens the duplex connection and hands back its two halves.
//! [`WsClient`] owns the write half through a dedicated write pump; the read
//! half is driven by the session loop.

use std::future::Future;
use std::pin::Pin;

use futures_util::{Sink, Stream, StreamExt};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_tungstenite::tungstenite;
use tokio_util::sync::CancellationToken;
use tracing::trace;

use livechat_protocol::WsEvent;
use livechat_protocol::constants::{WS_TRANSPORT_MAX_SIZE, WS_WRITE_QUEUE};

/// Errors from the WebSocket transport.
#[derive(Debug, thiserror::Error)]
pub enum WsError {
    #[error("WebSocket error: {0}")]
    Ws(#[from] tungstenite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("outbound queue is full")]
    QueueFull,

    #[error("connection closed")]
    Closed,
}

/// Write half of an open transport.
pub type FrameSink = Pin<Box<dyn Sink<tungstenite::Message, Error = tungstenite::Error> + Send>>;

/// Read half of an open transport.
pub type FrameStream =
    Pin<Box<dyn Stream<Item = Result<tungstenite::Message, tungstenite::Error>> + Send>>;

/// Future returned by [`Connector::connect`].
pub type ConnectFuture = Pin<Box<dyn Future<Output = Result<(FrameSink, FrameStream), WsError>> + Send>>;

/// Opens transports to a chat endpoint.
pub trait Connector: Send + Sync + 'static {
    fn connect(&self, url: &str) -> ConnectFuture;
}

/// Production connector backed by `tokio-tungstenite`.
#[derive(Debug, Clone)]
pub struct TungsteniteConnector {
    /// Transport-level cap. The protocol limit is applied later by
    /// `decode_frame`, which drops the frame without closing the connection.
    max_message_size: usize,
}

impl Default for TungsteniteConnector {
    fn default() -> Self {
        Self {
            max_message_size: WS_TRANSPORT_MAX_SIZE,
        }
    }
}

impl Connector for TungsteniteConnector {
    fn connect(&self, url: &str) -> ConnectFuture {
        let url = url.to_string();
        let max = self.max_message_size;
        Box::pin(async move {
            let mut ws_config = tungstenite::protocol::WebSocketConfig::default();
            ws_config.max_message_size = Some(max);
            ws_config.max_frame_size = Some(max);
            let (ws_stream, _) =
                tokio_tungstenite::connect_async_with_config(url.as_str(), Some(ws_config), false)
                    .await?;
            let (write, read) = ws_stream.split();
            Ok((Box::pin(write) as FrameSink, Box::pin(read) as FrameStream))
        })
    }
}

/// Handle on the write side of one open transport.
///
/// Sends never block: frames are queued for the write pump. Cancelling the
/// client's token (via [`close`](Self::close) or drop) makes the pump flush a
/// Close frame and exit.
pub struct WsClient {
    write_tx: mpsc::Sender<tungstenite::Message>,
    cancel: CancellationToken,
}

impl WsClient {
    /// Starts the write pump for `sink`. Must be called inside a Tokio runtime.
    pub(crate) fn spawn(sink: FrameSink, cancel: CancellationToken) -> Self {
        let (write_tx, write_rx) = mpsc::channel::<tungstenite::Message>(WS_WRITE_QUEUE);
        tokio::spawn(crate::pumps::write::write_pump(
            sink,
            write_rx,
            cancel.clone(),
        ));
        Self { write_tx, cancel }
    }

    /// Encodes and queues a protocol event.
    pub fn send_event(&self, event: &WsEvent) -> Result<(), WsError> {
        let json = event.to_json()?;
        trace!(kind = %event.kind(), "queueing event");
        self.send_text(json)
    }

    /// Queues a raw text frame.
    pub fn send_text(&self, text: String) -> Result<(), WsError> {
        if self.is_closed() {
            return Err(WsError::Closed);
        }
        self.write_tx
            .try_send(tungstenite::Message::Text(text.into()))
            .map_err(|e| match e {
                TrySendError::Full(_) => WsError::QueueFull,
                TrySendError::Closed(_) => WsError::Closed,
            })
    }

    /// Returns `true` once the client was closed locally or its pump died.
    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled() || self.write_tx.is_closed()
    }

    /// Closes the transport. Idempotent.
    pub fn close(&self) {
        self.cancel.cancel();
    }

    pub(crate) fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }
}

impl Drop for WsClient {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
