//! Market REST API client and types
//!
//! Coin listings, single-coin snapshots, price history and trade execution.

pub mod client;
pub mod service;
pub mod types;

pub use client::{ApiClient, ApiError};
pub use service::{MarketDataService, TradeService};
pub use types::TradeOutcome;
