//! In-memory transport for unit tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use futures_util::{sink, stream};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite;

use crate::ws_client::{ConnectFuture, Connector, FrameSink, FrameStream, WsError};

type Inbound = Result<tungstenite::Message, tungstenite::Error>;

/// Server side of one in-memory connection.
pub(crate) struct MockLink {
    /// Frames written by the client.
    pub(crate) outbound: mpsc::UnboundedReceiver<tungstenite::Message>,
    /// Frames delivered to the client. Dropping it ends the client's stream.
    pub(crate) inbound: mpsc::UnboundedSender<Inbound>,
}

impl MockLink {
    /// Next text frame the client wrote, parsed as JSON.
    pub(crate) async fn next_json(&mut self) -> serde_json::Value {
        loop {
            match self.outbound.recv().await {
                Some(tungstenite::Message::Text(text)) => {
                    return serde_json::from_str::<serde_json::Value>(&text)
                        .unwrap_or_else(|_| serde_json::Value::String(text.to_string()));
                }
                Some(_) => continue,
                None => panic!("client closed the link"),
            }
        }
    }

    pub(crate) fn push_text(&self, text: &str) {
        self.inbound
            .send(Ok(tungstenite::Message::Text(text.into())))
            .expect("client stream dropped");
    }
}

/// Connector that hands every accepted connection to the test.
pub(crate) struct MockConnector {
    attempts: AtomicUsize,
    refuse: AtomicBool,
    urls: Mutex<Vec<String>>,
    links: mpsc::UnboundedSender<MockLink>,
}

impl MockConnector {
    pub(crate) fn new() -> (Self, mpsc::UnboundedReceiver<MockLink>) {
        let (links, rx) = mpsc::unbounded_channel();
        let connector = Self {
            attempts: AtomicUsize::new(0),
            refuse: AtomicBool::new(false),
            urls: Mutex::new(Vec::new()),
            links,
        };
        (connector, rx)
    }

    pub(crate) fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub(crate) fn urls(&self) -> Vec<String> {
        self.urls.lock().map(|u| u.clone()).unwrap_or_default()
    }

    /// Makes subsequent connects fail until reset.
    pub(crate) fn set_refuse(&self, refuse: bool) {
        self.refuse.store(refuse, Ordering::SeqCst);
    }
}

impl Connector for MockConnector {
    fn connect(&self, url: &str) -> ConnectFuture {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut urls) = self.urls.lock() {
            urls.push(url.to_string());
        }

        if self.refuse.load(Ordering::SeqCst) {
            return Box::pin(async { Err(WsError::Ws(tungstenite::Error::ConnectionClosed)) });
        }

        let (out_tx, out_rx) = mpsc::unbounded_channel::<tungstenite::Message>();
        let (in_tx, in_rx) = mpsc::unbounded_channel::<Inbound>();

        let sink: FrameSink = Box::pin(sink::unfold(out_tx, |tx, msg: tungstenite::Message| async move {
            match tx.send(msg) {
                Ok(()) => Ok(tx),
                Err(_) => Err(tungstenite::Error::ConnectionClosed),
            }
        }));
        let stream: FrameStream = Box::pin(stream::unfold(in_rx, |mut rx| async move {
            rx.recv().await.map(|item| (item, rx))
        }));

        let _ = self.links.send(MockLink {
            outbound: out_rx,
            inbound: in_tx,
        });

        Box::pin(async move { Ok((sink, stream)) })
    }
}
