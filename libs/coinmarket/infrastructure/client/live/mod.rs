//! Live trade stream
//!
//! Payloads are loosely typed: any field may be missing, numbers may arrive as
//! strings, and the trade body may sit at the top level or under `data`.
//! Everything is parsed defensively into `LiveMessage`; anything without a
//! recognisable shape is dropped at the router.

mod types;
mod websocket;

pub use types::{LiveMessage, LiveTrade};
pub use websocket::{build_live_client, subscription_message, LiveClient, LiveRouter};
