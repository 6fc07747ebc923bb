//! Duplex WebSocket adapter.
//!
//! A single bidirectional connection carries JSON text frames both ways.
//! The online flag flips on connect-open and connect-close; operations sent
//! while offline are silently dropped (no outbox, no replay).

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use crate::error::Error;
use crate::map::MapState;
use crate::protocol::SyncOperation;
use crate::transport::Transport;

pub struct SocketTransport {
    outbound: mpsc::UnboundedSender<String>,
    state: Arc<MapState>,
}

impl SocketTransport {
    /// Connect and spawn the reader and writer tasks on the caller's
    /// runtime. The reader runs until the server closes or errors; the
    /// writer runs until the map handle is dropped.
    pub(crate) async fn connect(url: &str, state: Arc<MapState>) -> Result<Self, Error> {
        log::info!("[Collection] Connecting to {}", url);

        let (ws_stream, response) = connect_async(url).await?;
        log::info!("[Collection] Connected (status: {})", response.status());
        state.set_online(true);

        let (mut write, mut read) = ws_stream.split();
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();

        // Forward outgoing frames
        tokio::spawn(async move {
            while let Some(frame) = rx.recv().await {
                if let Err(e) = write.send(Message::Text(frame.into())).await {
                    log::error!("[Collection] Send error: {}", e);
                    break;
                }
            }
        });

        // Read incoming frames and dispatch into the shared state
        let reader_state = state.clone();
        tokio::spawn(async move {
            while let Some(msg) = read.next().await {
                match msg {
                    Ok(Message::Text(text)) => {
                        log::debug!("[Collection] Received: {}", text);
                        match SyncOperation::decode(text.as_str()) {
                            Ok(operation) => reader_state.dispatch_remote(operation),
                            Err(e) => log::error!("[Collection] Malformed message: {}", e),
                        }
                    }
                    Ok(Message::Binary(data)) => {
                        log::debug!("[Collection] Ignoring binary frame ({} bytes)", data.len());
                    }
                    Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {
                        // Handled by tungstenite
                    }
                    Ok(Message::Close(frame)) => {
                        let (code, reason) = frame
                            .map(|f| (u16::from(f.code), f.reason.to_string()))
                            .unwrap_or((1000, String::new()));
                        log::info!("[Collection] Server closed connection: {} {}", code, reason);
                        break;
                    }
                    Ok(Message::Frame(_)) => {}
                    Err(e) => {
                        log::error!("[Collection] Read error: {}", e);
                        break;
                    }
                }
            }

            reader_state.set_online(false);
            log::info!("[Collection] Connection ended");
        });

        Ok(Self {
            outbound: tx,
            state,
        })
    }

    #[cfg(test)]
    fn for_tests(state: Arc<MapState>) -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                outbound: tx,
                state,
            },
            rx,
        )
    }
}

impl Transport for SocketTransport {
    fn send(&self, operation: &SyncOperation) {
        if !self.state.is_online() {
            log::debug!(
                "[Collection] Offline, dropping {} operation",
                operation.event_name()
            );
            return;
        }

        match operation.encode() {
            Ok(frame) => {
                if let Err(e) = self.outbound.send(frame) {
                    log::warn!("[Collection] Failed to queue frame: {}", e);
                }
            }
            Err(e) => log::error!("[Collection] Failed to encode operation: {}", e),
        }
    }
}
