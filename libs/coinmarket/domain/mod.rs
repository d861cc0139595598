//! Domain Layer
//!
//! Pure entities and algorithms of the market simulation.
//! This layer has no dependencies on infrastructure or application layers.

pub mod candles;
pub mod models;
pub mod pricing;
pub mod recent_trades;
pub mod treemap;

// Re-export domain models
pub use models::{
    Candle, CoinSnapshot, LayoutRect, MarketItem, Pool, TradeEvent, TradeReceipt, TradeSide,
};

// Re-export domain services
pub use candles::CandleAggregator;
pub use pricing::{quote_buy, quote_sell, BuyQuote, SellQuote, FEE};
pub use recent_trades::RecentTrades;
pub use treemap::TreemapLayout;
