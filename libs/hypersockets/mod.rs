//! # HyperSockets
//!
//! A resilient streaming client for live market feeds.
//!
//! ## Features
//!
//! - **Sans-IO connection machine**: `StreamConnection` owns the connection state,
//!   reconnect backoff and poll timers; time is passed in, so it is fully deterministic
//! - **Pluggable transport**: anything implementing `Transport` (tokio-tungstenite by default)
//! - **Type-state builder**: URL and router must be set before `build()`
//! - **Ordered delivery**: messages are parsed inline and forwarded in arrival order
//! - **Host-driven suspension**: `suspend()` / `resume()` for hidden or backgrounded views

pub mod traits;
pub mod core;

// Re-export all traits
pub use traits::*;

// Re-export core client functionality
pub use core::{
    builder, client, config, connection, connection_state, timer, transport,
    states, WebSocketClientBuilder,
    ClientEvent, Metrics, WebSocketClient,
    ClientConfig,
    Action, StreamConnection,
    ConnectionState,
    TimerId, TimerKind, TimerQueue,
    Transport, TungsteniteTransport,
};

/// Type alias for Result with HyperSocketError
pub type Result<T> = std::result::Result<T, traits::HyperSocketError>;
