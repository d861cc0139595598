//! Message Routing
//!
//! The router is the only place where raw frames become typed messages.
//!
//! ```text
//! Transport → frame → Router::parse → Some(message) → event channel (FIFO) → host
//!                                  └→ None          → logged, counted, dropped
//! ```
//!
//! Parsing happens inline on the driver task, so messages reach the host in
//! exactly the order the transport delivered them.

use crate::WsMessage;
use std::fmt::Debug;

/// Parses raw frames into typed messages
///
/// `parse` must never panic on unexpected input: a frame that does not have
/// the expected shape yields `None` and is dropped by the driver.
///
/// # Example
///
/// ```ignore
/// struct TradeRouter;
///
/// impl MessageRouter for TradeRouter {
///     type Message = Trade;
///
///     fn parse(&self, message: &WsMessage) -> Option<Trade> {
///         let text = message.as_text()?;
///         serde_json::from_str(text).ok()
///     }
/// }
/// ```
pub trait MessageRouter: Send + Sync + 'static {
    /// The parsed message type
    type Message: Send + Debug + 'static;

    /// Parse a raw frame; `None` drops it
    fn parse(&self, message: &WsMessage) -> Option<Self::Message>;
}
