//! WebSocket read pump: decodes inbound frames and hands them to the session.

use futures_util::{Stream, StreamExt};
use tokio_tungstenite::tungstenite;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use livechat_protocol::{InboundFrame, decode_frame};

/// Why the read pump stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ReadOutcome {
    /// The transport was closed locally (stop, teardown or a failed write).
    Cancelled,
    /// The remote end closed the connection or the stream ended.
    Closed,
    /// The transport reported an error.
    Failed(String),
}

/// Reads frames until the transport closes, fails, or `cancel` fires.
///
/// Every decoded text frame is passed to `on_frame` in arrival order.
/// Undecodable frames are logged and skipped; they never end the loop.
pub(crate) async fn read_pump<S, F>(mut read: S, cancel: &CancellationToken, mut on_frame: F) -> ReadOutcome
where
    S: Stream<Item = Result<tungstenite::Message, tungstenite::Error>> + Unpin,
    F: FnMut(InboundFrame),
{
    loop {
        tokio::select! {
            _ = cancel.cancelled() => return ReadOutcome::Cancelled,

            msg = read.next() => match msg {
                Some(Ok(tungstenite::Message::Text(text))) => {
                    handle_text_frame(&text, &mut on_frame);
                }
                Some(Ok(tungstenite::Message::Close(frame))) => {
                    debug!(frame = ?frame, "received close frame");
                    return ReadOutcome::Closed;
                }
                Some(Ok(tungstenite::Message::Ping(_) | tungstenite::Message::Pong(_))) => {
                    trace!("control frame");
                }
                Some(Ok(other)) => {
                    debug!(len = other.len(), "ignoring non-text frame");
                }
                Some(Err(e)) => {
                    warn!("WebSocket read error: {e}");
                    return ReadOutcome::Failed(e.to_string());
                }
                None => {
                    debug!("WebSocket stream ended");
                    return ReadOutcome::Closed;
                }
            },
        }
    }
}

/// Decodes one text frame. Protocol violations are swallowed with a warning.
fn handle_text_frame<F>(text: &str, on_frame: &mut F)
where
    F: FnMut(InboundFrame),
{
    match decode_frame(text) {
        Ok(frame) => {
            if let InboundFrame::Event(event) = &frame {
                trace!(kind = %event.kind(), "received event");
            } else {
                debug!(len = text.len(), "non-JSON frame, treating as plain text");
            }
            on_frame(frame);
        }
        Err(e) => warn!(error = %e, "dropping inbound frame"),
    }
}
