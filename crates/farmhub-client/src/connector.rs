//! Transport seam: the `Connector` trait and its WebSocket implementation.
//!
//! The reconnect state machine in [`crate::transport`] is written against
//! this trait so it can be exercised without a network.

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::debug;

use farmhub_core::error::AppError;
use farmhub_core::result::AppResult;

/// Buffer size for the channel pairs bridging a live connection.
const WIRE_BUFFER: usize = 64;

/// A live, established connection.
///
/// Dropping `inbound` to `None` means the server went away; dropping
/// `outbound` tears the connection down.
pub struct WireConnection {
    /// Sender for raw outbound frames.
    pub outbound: mpsc::Sender<String>,
    /// Receiver for raw inbound frames.
    pub inbound: mpsc::Receiver<String>,
}

impl std::fmt::Debug for WireConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WireConnection").finish()
    }
}

/// Opens connections to the realtime endpoint.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Attempts to establish a connection to `url`.
    async fn connect(&self, url: &str) -> AppResult<WireConnection>;
}

/// Production connector backed by tokio-tungstenite.
#[derive(Debug, Default)]
pub struct WsConnector;

impl WsConnector {
    /// Creates a new WebSocket connector.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self, url: &str) -> AppResult<WireConnection> {
        let (ws_stream, _response) = connect_async(url)
            .await
            .map_err(|e| AppError::transport(format!("WebSocket connect failed: {e}")))?;

        let (mut sink, mut stream) = ws_stream.split();
        let (outbound_tx, mut outbound_rx) = mpsc::channel::<String>(WIRE_BUFFER);
        let (inbound_tx, inbound_rx) = mpsc::channel::<String>(WIRE_BUFFER);

        // Pump queued frames onto the socket.
        tokio::spawn(async move {
            while let Some(frame) = outbound_rx.recv().await {
                if sink.send(Message::Text(frame.into())).await.is_err() {
                    break;
                }
            }
            let _ = sink.close().await;
        });

        // Pump socket frames into the inbound channel; ends (and thereby
        // signals disconnect) when the socket closes or errors.
        tokio::spawn(async move {
            while let Some(result) = stream.next().await {
                match result {
                    Ok(Message::Text(text)) => {
                        if inbound_tx.send(text.to_string()).await.is_err() {
                            break;
                        }
                    }
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(e) => {
                        debug!(error = %e, "WebSocket read error");
                        break;
                    }
                }
            }
        });

        Ok(WireConnection {
            outbound: outbound_tx,
            inbound: inbound_rx,
        })
    }
}
