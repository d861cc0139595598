//! Common test utilities for HyperSockets integration tests
//!
//! `MockTransport` scripts the wire for deterministic driver tests under
//! paused tokio time; `MockWsServer` is a real WebSocket endpoint for the
//! end-to-end path through tokio-tungstenite.

#![allow(dead_code)]

use async_trait::async_trait;
use hypersockets::{HyperSocketError, MessageRouter, Result, Transport, WsMessage};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::Notify;

/// Macro for verbose test output (controlled by TEST_VERBOSE env var)
#[macro_export]
macro_rules! verbose_println {
    ($($arg:tt)*) => {
        if std::env::var("TEST_VERBOSE").is_ok() {
            println!($($arg)*);
        }
    };
}

/// Parses text frames holding an unsigned integer; everything else is dropped
pub struct NumberRouter;

impl MessageRouter for NumberRouter {
    type Message = u32;

    fn parse(&self, message: &WsMessage) -> Option<u32> {
        message.as_text()?.trim().parse().ok()
    }
}

/// What the mock transport has been asked to do so far
#[derive(Debug, Default)]
pub struct Script {
    /// Connect attempts left to fail before connects start succeeding
    pub failing_connects: u32,
    /// Frames delivered once the transport is open
    pub frames: VecDeque<WsMessage>,
    /// End the stream after the queued frames are delivered
    pub end_after_frames: bool,
    pub connect_calls: u32,
    pub close_calls: u32,
    pub sent: Vec<WsMessage>,
}

/// Scripted in-memory transport
///
/// Clones share one script, so a test keeps a handle while the driver owns
/// the transport.
#[derive(Clone, Default)]
pub struct MockTransport {
    script: Arc<Mutex<Script>>,
    open: bool,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(connects: u32) -> Self {
        let transport = Self::new();
        transport.script.lock().failing_connects = connects;
        transport
    }

    pub fn with_frames(frames: Vec<WsMessage>) -> Self {
        let transport = Self::new();
        transport.script.lock().frames.extend(frames);
        transport
    }

    pub fn script(&self) -> parking_lot::MutexGuard<'_, Script> {
        self.script.lock()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn connect(&mut self, _url: &str) -> Result<()> {
        let mut script = self.script.lock();
        script.connect_calls += 1;
        if script.failing_connects > 0 {
            script.failing_connects -= 1;
            return Err(HyperSocketError::WebSocket("connection refused".to_string()));
        }
        self.open = true;
        Ok(())
    }

    async fn next_message(&mut self) -> Option<Result<WsMessage>> {
        let next = {
            let mut script = self.script.lock();
            match script.frames.pop_front() {
                Some(frame) => Some(Some(Ok(frame))),
                None if script.end_after_frames => {
                    script.end_after_frames = false;
                    self.open = false;
                    Some(None)
                }
                None => None,
            }
        };

        match next {
            Some(result) => result,
            None => std::future::pending().await,
        }
    }

    async fn send(&mut self, message: WsMessage) -> Result<()> {
        if !self.open {
            return Err(HyperSocketError::NotConnected);
        }
        self.script.lock().sent.push(message);
        Ok(())
    }

    async fn close(&mut self) {
        self.open = false;
        self.script.lock().close_calls += 1;
    }
}

/// `MockTransport` whose connect takes `delay`, or never finishes when `None`
#[derive(Clone)]
pub struct SlowConnectTransport {
    pub inner: MockTransport,
    delay: Option<Duration>,
}

impl SlowConnectTransport {
    pub fn hanging() -> Self {
        Self {
            inner: MockTransport::new(),
            delay: None,
        }
    }

    pub fn delayed(delay: Duration) -> Self {
        Self {
            inner: MockTransport::new(),
            delay: Some(delay),
        }
    }
}

#[async_trait]
impl Transport for SlowConnectTransport {
    async fn connect(&mut self, url: &str) -> Result<()> {
        match self.delay {
            Some(delay) => tokio::time::sleep(delay).await,
            None => std::future::pending::<()>().await,
        }
        self.inner.connect(url).await
    }

    async fn next_message(&mut self) -> Option<Result<WsMessage>> {
        self.inner.next_message().await
    }

    async fn send(&mut self, message: WsMessage) -> Result<()> {
        self.inner.send(message).await
    }

    async fn close(&mut self) {
        self.inner.close().await
    }
}

/// A mock WebSocket server that sends scripted frames to every connection
pub struct MockWsServer {
    pub addr: SocketAddr,
    connections: Arc<AtomicUsize>,
    shutdown: Arc<Notify>,
}

impl MockWsServer {
    /// Start a server; each connection receives `frames`, then is either
    /// dropped (`hang_up`) or kept open echoing text back
    pub async fn start(frames: Vec<String>, hang_up: bool) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = Arc::new(Notify::new());
        let shutdown_clone = shutdown.clone();
        let connections = Arc::new(AtomicUsize::new(0));
        let connections_clone = connections.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    result = listener.accept() => {
                        match result {
                            Ok((stream, _)) => {
                                connections_clone.fetch_add(1, Ordering::SeqCst);
                                let shutdown = shutdown_clone.clone();
                                let frames = frames.clone();
                                tokio::spawn(async move {
                                    Self::handle_connection(stream, frames, hang_up, shutdown).await;
                                });
                            }
                            Err(e) => {
                                eprintln!("Accept error: {}", e);
                                break;
                            }
                        }
                    }
                    _ = shutdown_clone.notified() => {
                        break;
                    }
                }
            }
        });

        Self {
            addr,
            connections,
            shutdown,
        }
    }

    async fn handle_connection(
        stream: tokio::net::TcpStream,
        frames: Vec<String>,
        hang_up: bool,
        shutdown: Arc<Notify>,
    ) {
        use futures::{SinkExt, StreamExt};
        use tokio_tungstenite::accept_async;
        use tokio_tungstenite::tungstenite::Message;

        let ws_stream = match accept_async(stream).await {
            Ok(ws) => ws,
            Err(e) => {
                eprintln!("WebSocket handshake failed: {}", e);
                return;
            }
        };

        let (mut write, mut read) = ws_stream.split();

        for frame in frames {
            if write.send(Message::Text(frame)).await.is_err() {
                return;
            }
        }

        if hang_up {
            // Abrupt drop without a close handshake
            return;
        }

        loop {
            tokio::select! {
                msg = read.next() => {
                    match msg {
                        Some(Ok(msg)) if msg.is_text() => {
                            if write.send(msg).await.is_err() {
                                break;
                            }
                        }
                        Some(Ok(msg)) if msg.is_close() => break,
                        Some(Ok(_)) => continue,
                        Some(Err(_)) | None => break,
                    }
                }
                _ = shutdown.notified() => {
                    break;
                }
            }
        }
    }

    /// Get the WebSocket URL for this server
    pub fn ws_url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    pub fn connection_count(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    /// Shutdown the server
    pub fn shutdown(&self) {
        self.shutdown.notify_waiters();
    }
}

impl Drop for MockWsServer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Poll `check` every 10ms until it returns true or `timeout` elapses
pub async fn wait_until(timeout: Duration, mut check: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}
