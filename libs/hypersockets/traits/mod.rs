//! # HyperSockets Traits
//!
//! Core traits and types shared by the connection machine and the driver:
//!
//! - **MessageRouter**: defensively parse incoming frames into typed messages
//! - **ReconnectionStrategy**: control the delay before each reconnect attempt
//!
//! ## Example
//!
//! ```rust,ignore
//! use hypersockets::*;
//!
//! struct TickerRouter;
//!
//! impl MessageRouter for TickerRouter {
//!     type Message = Ticker;
//!
//!     fn parse(&self, message: &WsMessage) -> Option<Ticker> {
//!         serde_json::from_str(message.as_text()?).ok()
//!     }
//! }
//! ```

pub mod error;
pub mod message;
pub mod reconnect;
pub mod router;

// Re-export commonly used types
pub use error::{HyperSocketError, Result};
pub use message::WsMessage;
pub use reconnect::{ExponentialBackoff, FixedDelay, NeverReconnect, ReconnectionStrategy};
pub use router::MessageRouter;
