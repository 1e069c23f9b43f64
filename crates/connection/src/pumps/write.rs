//! WebSocket write pump: drains the outbound queue into the transport.

use futures_util::{Sink, SinkExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

/// Writes queued frames to the transport until cancelled.
///
/// A write failure cancels `cancel`, which the read side observes as a local
/// close. Frames still queued at cancellation are flushed before the final
/// Close frame.
pub(crate) async fn write_pump<S>(
    mut write: S,
    mut write_rx: mpsc::Receiver<tungstenite::Message>,
    cancel: CancellationToken,
) where
    S: Sink<tungstenite::Message, Error = tungstenite::Error> + Unpin,
{
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            msg = write_rx.recv() => {
                let Some(msg) = msg else { break };
                trace!(len = msg.len(), "writing frame");
                if let Err(e) = write.send(msg).await {
                    warn!("WebSocket write error: {e}");
                    cancel.cancel();
                    return;
                }
            }
        }
    }

    while let Ok(msg) = write_rx.try_recv() {
        if write.send(msg).await.is_err() {
            break;
        }
    }

    debug!("write pump closing transport");
    let _ = write.send(tungstenite::Message::Close(None)).await;
}
