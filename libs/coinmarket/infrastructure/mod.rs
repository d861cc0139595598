//! Infrastructure Layer
//!
//! Implementations of external interfaces: the market REST API, the live
//! trade stream, configuration and logging.
//! This layer depends on the domain layer but not on the application layer.

pub mod client;
pub mod config;
pub mod logging;

// Re-export commonly used types from client
pub use client::{
    api::{ApiClient, ApiError, MarketDataService, TradeService},
    live::{build_live_client, LiveClient, LiveMessage, LiveRouter, LiveTrade},
};

// Re-export config types
pub use config::{ConfigError, TerminalConfig};

pub use logging::init_tracing;
