//! Coin Market Terminal
//!
//! Client core for a simulated-asset market: bonding-curve pricing, live
//! candle aggregation, market treemaps and the terminal views built on them.
//!
//! ## Architecture
//!
//! - **domain**: pure entities and algorithms (pool, pricing, candles, treemap)
//! - **infrastructure**: REST API client, live stream router, config, logging
//! - **application**: coin session, market overview, live feed, visualizer

pub mod application;
pub mod domain;
pub mod infrastructure;

// Re-export commonly used items
pub use domain::{
    quote_buy, quote_sell, BuyQuote, Candle, CandleAggregator, CoinSnapshot, LayoutRect,
    MarketItem, Pool, RecentTrades, SellQuote, TradeEvent, TradeReceipt, TradeSide,
    TreemapLayout, FEE,
};

pub use infrastructure::{
    init_tracing, ApiClient, ApiError, ConfigError, LiveMessage, LiveRouter, LiveTrade,
    MarketDataService, TerminalConfig, TradeService,
};

pub use application::{CoinFeed, CoinSession, MarketOverview};
