//! Transport
//!
//! The session only needs to know whether the link is up and to hand it a
//! text frame without blocking. [`ChannelTransport`] does that over a tokio
//! channel; [`connect`] wires such a channel to a WebSocket.

use futures_util::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

/// Outbound queue depth before sends start failing.
pub const CHANNEL_CAPACITY: usize = 100;

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The other end of the link is gone.
    #[error("transport closed")]
    Closed,

    /// The outbound queue is full.
    #[error("outbound queue full")]
    Full,

    /// WebSocket handshake failed.
    #[error("websocket connect failed: {0}")]
    Connect(#[from] tokio_tungstenite::tungstenite::Error),
}

/// Outbound text link.
pub trait Transport {
    /// Whether a send could currently succeed.
    fn is_open(&self) -> bool;

    /// Queue one text frame. Must not block.
    fn send_text(&mut self, text: String) -> Result<(), TransportError>;
}

/// Transport backed by a bounded tokio channel.
#[derive(Clone, Debug)]
pub struct ChannelTransport {
    sender: mpsc::Sender<String>,
}

impl ChannelTransport {
    /// Wrap an existing sender.
    pub fn new(sender: mpsc::Sender<String>) -> Self {
        Self { sender }
    }

    /// Create a transport and the receiver that drains it.
    pub fn pair(capacity: usize) -> (Self, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(tx), rx)
    }
}

impl Transport for ChannelTransport {
    fn is_open(&self) -> bool {
        !self.sender.is_closed()
    }

    fn send_text(&mut self, text: String) -> Result<(), TransportError> {
        self.sender.try_send(text).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => TransportError::Full,
            mpsc::error::TrySendError::Closed(_) => TransportError::Closed,
        })
    }
}

/// A live WebSocket link split into channels.
#[derive(Debug)]
pub struct Connection {
    /// Outbound side
    pub outgoing: ChannelTransport,
    /// Inbound text frames
    pub incoming: mpsc::Receiver<String>,
}

/// Open a WebSocket and pump it through channels. A reader task forwards text
/// frames inward; a writer task drains the outbound channel. Either side ends
/// when the socket closes, which also closes the channels.
pub async fn connect(endpoint: &str) -> Result<Connection, TransportError> {
    info!(%endpoint, "Connecting");
    let (ws_stream, _) = connect_async(endpoint).await?;
    info!(%endpoint, "WebSocket connected");

    let (mut write, mut read) = ws_stream.split();
    let (outgoing, mut outgoing_rx) = ChannelTransport::pair(CHANNEL_CAPACITY);
    let (incoming_tx, incoming) = mpsc::channel::<String>(CHANNEL_CAPACITY);

    let reader = tokio::spawn(async move {
        while let Some(frame) = read.next().await {
            match frame {
                Ok(Message::Text(text)) => {
                    if incoming_tx.send(text).await.is_err() {
                        debug!("Inbound receiver dropped");
                        break;
                    }
                }
                Ok(Message::Close(_)) => {
                    info!("Server closed connection");
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    error!("WebSocket read error: {}", e);
                    break;
                }
            }
        }
        debug!("Reader task ended");
    });

    tokio::spawn(async move {
        while let Some(text) = outgoing_rx.recv().await {
            if let Err(e) = write.send(Message::Text(text)).await {
                warn!("Failed to send message: {}", e);
                break;
            }
        }
        let _ = write.close().await;
        reader.abort();
        debug!("Writer task ended");
    });

    Ok(Connection { outgoing, incoming })
}

// =============================================================================
// TESTS
// =============================================================================
