//! Market domain entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Pool - Constant-product liquidity pool
// =============================================================================

/// Liquidity pool backing one coin
///
/// Tradable only while both reserves are positive; `k = base * token` is
/// conserved by trades net of fee.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pool {
    /// Quote-currency (USD) reserve
    pub base_reserve: f64,
    /// Token reserve
    pub token_reserve: f64,
}

impl Pool {
    pub fn new(base_reserve: f64, token_reserve: f64) -> Self {
        Self {
            base_reserve,
            token_reserve,
        }
    }

    pub fn is_tradable(&self) -> bool {
        self.base_reserve.is_finite()
            && self.token_reserve.is_finite()
            && self.base_reserve > 0.0
            && self.token_reserve > 0.0
    }

    /// Constant product `base * token`
    pub fn k(&self) -> f64 {
        self.base_reserve * self.token_reserve
    }

    /// Spot price of one token in USD
    pub fn price(&self) -> Option<f64> {
        self.is_tradable()
            .then(|| self.base_reserve / self.token_reserve)
    }
}

// =============================================================================
// Trades
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeSide {
    Buy,
    Sell,
}

impl TradeSide {
    /// Parse the side labels used by the live stream ("buy", "BUY", "sell", ...)
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "buy" | "b" => Some(TradeSide::Buy),
            "sell" | "s" => Some(TradeSide::Sell),
            _ => None,
        }
    }
}

impl fmt::Display for TradeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeSide::Buy => f.pad("BUY"),
            TradeSide::Sell => f.pad("SELL"),
        }
    }
}

/// One executed trade as reported by the live stream
#[derive(Debug, Clone, PartialEq)]
pub struct TradeEvent {
    pub symbol: String,
    pub side: TradeSide,
    pub token_amount: f64,
    pub usd_amount: f64,
    /// Execution price in USD per token
    pub price: f64,
    pub timestamp: DateTime<Utc>,
}

/// Server confirmation of a trade
#[derive(Debug, Clone, PartialEq)]
pub enum TradeReceipt {
    Bought { token_amount: f64, usd_spent: f64 },
    Sold { token_amount: f64, usd_gained: f64 },
}

impl fmt::Display for TradeReceipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeReceipt::Bought {
                token_amount,
                usd_spent,
            } => write!(f, "bought {:.4} tokens for ${:.2}", token_amount, usd_spent),
            TradeReceipt::Sold {
                token_amount,
                usd_gained,
            } => write!(f, "sold {:.4} tokens for ${:.2}", token_amount, usd_gained),
        }
    }
}

// =============================================================================
// Candle - OHLC bucket
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub bucket_start: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl Candle {
    /// A fresh bucket opened by a single trade
    pub fn opened_at(bucket_start: DateTime<Utc>, price: f64) -> Self {
        Self {
            bucket_start,
            open: price,
            high: price,
            low: price,
            close: price,
        }
    }

    /// Fold another trade price into this bucket; `open` never changes
    pub fn absorb(&mut self, price: f64) {
        self.close = price;
        self.high = self.high.max(price);
        self.low = self.low.min(price);
    }

    /// `high >= max(open, close) >= min(open, close) >= low`, all finite
    pub fn is_consistent(&self) -> bool {
        [self.open, self.high, self.low, self.close]
            .iter()
            .all(|v| v.is_finite())
            && self.high >= self.open.max(self.close)
            && self.open.min(self.close) >= self.low
    }
}

// =============================================================================
// Snapshots
// =============================================================================

/// Full state of one coin as served by the market data API
#[derive(Debug, Clone, PartialEq)]
pub struct CoinSnapshot {
    pub symbol: String,
    pub name: String,
    pub price: f64,
    pub pool_base: f64,
    pub pool_token: f64,
    pub volume_24h: f64,
    pub change_24h: f64,
    pub circulating_supply: f64,
    /// Reported market cap, when the API provides one
    pub market_cap: Option<f64>,
}

impl CoinSnapshot {
    pub fn pool(&self) -> Pool {
        Pool::new(self.pool_base, self.pool_token)
    }

    /// Reported market cap, or `price * circulating_supply`
    pub fn market_cap(&self) -> f64 {
        self.market_cap
            .filter(|cap| cap.is_finite())
            .unwrap_or(self.price * self.circulating_supply)
    }
}

// =============================================================================
// Treemap
// =============================================================================

/// One tile of the market treemap
#[derive(Debug, Clone, PartialEq)]
pub struct MarketItem {
    pub symbol: String,
    /// Tile weight, >= 0
    pub weight: f64,
    /// 24h change in percent, drives the tile colour
    pub change_pct: f64,
}

impl MarketItem {
    pub fn new(symbol: impl Into<String>, weight: f64, change_pct: f64) -> Self {
        Self {
            symbol: symbol.into(),
            weight,
            change_pct,
        }
    }
}

/// A laid-out tile
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutRect {
    pub item: MarketItem,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl LayoutRect {
    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Area shared with another rectangle (0 when they only touch)
    pub fn overlap_area(&self, other: &LayoutRect) -> f64 {
        let dx = (self.x + self.width).min(other.x + other.width) - self.x.max(other.x);
        let dy = (self.y + self.height).min(other.y + other.height) - self.y.max(other.y);
        if dx > 0.0 && dy > 0.0 {
            dx * dy
        } else {
            0.0
        }
    }
}
