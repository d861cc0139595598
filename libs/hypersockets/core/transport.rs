//! Transport abstraction
//!
//! The driver only needs four operations from the wire. Production code uses
//! `TungsteniteTransport`; tests script a fake one.

use crate::traits::{HyperSocketError, Result, WsMessage};
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::debug;

/// Message-oriented duplex channel
#[async_trait]
pub trait Transport: Send + 'static {
    /// Open the channel
    async fn connect(&mut self, url: &str) -> Result<()>;

    /// Wait for the next data frame
    ///
    /// `None` means the stream ended; `Some(Err(_))` means it failed.
    /// Must be cancel-safe: the driver drops this future when another event wins.
    async fn next_message(&mut self) -> Option<Result<WsMessage>>;

    /// Send a data frame
    async fn send(&mut self, message: WsMessage) -> Result<()>;

    /// Close the channel; a no-op when nothing is open
    async fn close(&mut self);
}

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// WebSocket transport over tokio-tungstenite
#[derive(Default)]
pub struct TungsteniteTransport {
    stream: Option<WsStream>,
}

impl TungsteniteTransport {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Transport for TungsteniteTransport {
    async fn connect(&mut self, url: &str) -> Result<()> {
        // Drop any stale stream from a previous session first
        self.close().await;

        let (stream, _) = connect_async(url)
            .await
            .map_err(|e| HyperSocketError::WebSocket(e.to_string()))?;
        self.stream = Some(stream);
        Ok(())
    }

    async fn next_message(&mut self) -> Option<Result<WsMessage>> {
        let stream = self.stream.as_mut()?;

        loop {
            match stream.next().await {
                Some(Ok(Message::Text(text))) => return Some(Ok(WsMessage::Text(text))),
                Some(Ok(Message::Binary(data))) => return Some(Ok(WsMessage::Binary(data))),
                Some(Ok(Message::Close(frame))) => {
                    let reason = frame
                        .map(|f| format!("{} {}", f.code, f.reason))
                        .unwrap_or_else(|| "no close frame".to_string());
                    return Some(Err(HyperSocketError::ConnectionClosed(reason)));
                }
                // Control frames are answered by tungstenite itself
                Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_))) => continue,
                Some(Err(e)) => return Some(Err(HyperSocketError::WebSocket(e.to_string()))),
                None => return None,
            }
        }
    }

    async fn send(&mut self, message: WsMessage) -> Result<()> {
        let stream = self.stream.as_mut().ok_or(HyperSocketError::NotConnected)?;
        let frame = match message {
            WsMessage::Text(text) => Message::Text(text),
            WsMessage::Binary(data) => Message::Binary(data),
        };
        stream
            .send(frame)
            .await
            .map_err(|e| HyperSocketError::WebSocket(e.to_string()))
    }

    async fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            debug!("[Stream] Closing WebSocket");
            let _ = stream.close(None).await;
        }
    }
}
