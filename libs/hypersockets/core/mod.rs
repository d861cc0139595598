//! Client core: connection machine, timers, transport and the async driver
//!
//! ## Example
//!
//! ```rust,ignore
//! use hypersockets::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = hypersockets::builder()
//!         .url("wss://feed.example.com/ws")
//!         .router(MyRouter)
//!         .poll_interval(Duration::from_secs(15))
//!         .reconnect_strategy(ExponentialBackoff::live_feed())
//!         .build()
//!         .await?;
//!
//!     loop {
//!         for event in client.drain_events() {
//!             match event {
//!                 ClientEvent::Message(msg) => println!("{:?}", msg),
//!                 ClientEvent::PollDue => { /* refresh snapshots */ }
//!                 other => println!("{:?}", other),
//!             }
//!         }
//!     }
//! }
//! ```

pub mod builder;
pub mod client;
pub mod config;
pub mod connection;
pub mod connection_state;
pub mod timer;
pub mod transport;

// Re-export main types
pub use builder::{states, WebSocketClientBuilder};
pub use client::{ClientEvent, Metrics, WebSocketClient};
pub use config::ClientConfig;
pub use connection::{Action, StreamConnection};
pub use connection_state::{AtomicConnectionState, AtomicMetrics, ConnectionState};
pub use timer::{TimerId, TimerKind, TimerQueue};
pub use transport::{Transport, TungsteniteTransport};

/// Create a new WebSocket client builder
///
/// # Example
/// ```ignore
/// let client = hypersockets::builder()
///     .url("wss://feed.example.com/ws")
///     .router(LiveRouter)
///     .build()
///     .await?;
/// ```
pub fn builder() -> WebSocketClientBuilder<states::NoUrl, states::NoRouter, ()> {
    WebSocketClientBuilder::new()
}
