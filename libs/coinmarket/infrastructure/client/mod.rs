//! Clients for the market backend
//!
//! - **api**: request/response REST API (snapshots, history, trades)
//! - **live**: WebSocket trade stream on top of hypersockets

pub mod api;
pub mod flex;
pub mod live;
