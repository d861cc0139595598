//! Live stream message types

use crate::domain::{Pool, TradeEvent, TradeSide};
use crate::infrastructure::client::flex::{de_opt_f64, de_opt_timestamp};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

// =============================================================================
// LiveTrade - One trade notification
// =============================================================================

/// Trade notification as it arrives on the stream
///
/// Example JSON:
/// ```json
/// {
///     "type": "trade",
///     "coin": "MOON",
///     "side": "buy",
///     "price": "0.0125",
///     "pool_base": 1000.5,
///     "pool_token": 80000,
///     "volume24h": 5400,
///     "change24h": -2.1,
///     "token_amount": 800,
///     "usd_amount": 10,
///     "created_at": 1709294400000
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LiveTrade {
    #[serde(default, alias = "symbol", alias = "coin_symbol")]
    pub coin: Option<String>,
    #[serde(default, alias = "trade_type", alias = "tradeType")]
    pub side: Option<String>,
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub price: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_f64", alias = "poolBase")]
    pub pool_base: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_f64", alias = "poolToken")]
    pub pool_token: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_f64", alias = "volume_24h")]
    pub volume24h: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_f64", alias = "change_24h")]
    pub change24h: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_f64", alias = "tokenAmount", alias = "amount")]
    pub token_amount: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_f64", alias = "usdAmount", alias = "total")]
    pub usd_amount: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_timestamp", alias = "createdAt", alias = "timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

impl LiveTrade {
    /// Normalised coin symbol, if present
    pub fn symbol(&self) -> Option<String> {
        self.coin
            .as_deref()
            .map(|c| c.trim().to_uppercase())
            .filter(|c| !c.is_empty())
    }

    /// Convert into a domain trade
    ///
    /// Needs a symbol and a positive, finite price. A missing side counts as
    /// a buy, a missing timestamp as arrival time, missing amounts as zero.
    pub fn to_trade_event(&self) -> Option<TradeEvent> {
        let symbol = self.symbol()?;
        let price = self.price.filter(|p| p.is_finite() && *p > 0.0)?;

        Some(TradeEvent {
            symbol,
            side: self
                .side
                .as_deref()
                .and_then(TradeSide::parse)
                .unwrap_or(TradeSide::Buy),
            token_amount: self.token_amount.unwrap_or(0.0),
            usd_amount: self.usd_amount.unwrap_or(0.0),
            price,
            timestamp: self.created_at.unwrap_or_else(Utc::now),
        })
    }

    /// Post-trade pool, when both reserves were reported
    pub fn pool(&self) -> Option<Pool> {
        Some(Pool::new(self.pool_base?, self.pool_token?))
    }
}

// =============================================================================
// LiveMessage - Tagged stream message
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum LiveMessage {
    Trade(LiveTrade),
    /// Keep-alive traffic
    Ping,
    /// Well-formed message of a type this client does not consume
    Other(String),
}

impl LiveMessage {
    /// Parse one payload; `None` when it is not a JSON object of known shape
    pub fn parse(text: &str) -> Option<Self> {
        let value: Value = serde_json::from_str(text.trim()).ok()?;
        let root = value.as_object()?;

        let kind = root
            .get("type")
            .or_else(|| root.get("event"))
            .and_then(Value::as_str)
            .map(|k| k.trim().to_ascii_lowercase());

        // Trade body may be wrapped as {type, data: {...}}
        let body = match root.get("data") {
            Some(data @ Value::Object(_)) => data.clone(),
            _ => value.clone(),
        };

        match kind.as_deref() {
            Some("trade") | Some("live-trade") => {
                serde_json::from_value::<LiveTrade>(body).ok().map(LiveMessage::Trade)
            }
            Some("ping") | Some("pong") | Some("heartbeat") => Some(LiveMessage::Ping),
            Some(other) => Some(LiveMessage::Other(other.to_string())),
            // Untyped payloads only count when they look like a trade
            None => {
                let has_trade_fields = body.get("price").is_some()
                    && (body.get("coin").is_some() || body.get("symbol").is_some());
                if has_trade_fields {
                    serde_json::from_value::<LiveTrade>(body).ok().map(LiveMessage::Trade)
                } else {
                    None
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_trade() {
        let text = r#"{
            "type": "trade", "coin": "moon", "side": "SELL", "price": "0.0125",
            "pool_base": 1000, "pool_token": "80000", "volume24h": 5400,
            "change24h": -2.1, "token_amount": 800, "usd_amount": "10",
            "created_at": "2024-03-01T12:00:00Z"
        }"#;

        let LiveMessage::Trade(trade) = LiveMessage::parse(text).unwrap() else {
            panic!("expected trade");
        };
        let event = trade.to_trade_event().unwrap();
        assert_eq!(event.symbol, "MOON");
        assert_eq!(event.side, TradeSide::Sell);
        assert_eq!(event.price, 0.0125);
        assert_eq!(event.usd_amount, 10.0);
        assert_eq!(event.timestamp.timestamp(), 1709294400);
        assert_eq!(trade.pool(), Some(Pool::new(1000.0, 80000.0)));
    }

    #[test]
    fn test_parse_nested_data_with_epoch_millis() {
        let text = r#"{"type": "trade", "data": {"symbol": "ABC", "price": 2, "created_at": 1709294400000}}"#;

        let Some(LiveMessage::Trade(trade)) = LiveMessage::parse(text) else {
            panic!("expected trade");
        };
        let event = trade.to_trade_event().unwrap();
        assert_eq!(event.symbol, "ABC");
        assert_eq!(event.side, TradeSide::Buy);
        assert_eq!(event.token_amount, 0.0);
        assert_eq!(event.timestamp.timestamp(), 1709294400);
        assert_eq!(trade.pool(), None);
    }

    #[test]
    fn test_trade_without_price_is_not_an_event() {
        let Some(LiveMessage::Trade(trade)) = LiveMessage::parse(r#"{"type": "trade", "coin": "X"}"#) else {
            panic!("expected trade");
        };
        assert!(trade.to_trade_event().is_none());

        let zero = LiveTrade {
            coin: Some("X".into()),
            price: Some(0.0),
            ..LiveTrade::default()
        };
        assert!(zero.to_trade_event().is_none());
    }

    #[test]
    fn test_keepalive_and_other_types() {
        assert_eq!(LiveMessage::parse(r#"{"type": "ping"}"#), Some(LiveMessage::Ping));
        assert_eq!(LiveMessage::parse(r#"{"type": "HEARTBEAT"}"#), Some(LiveMessage::Ping));
        assert_eq!(
            LiveMessage::parse(r#"{"type": "subscribed", "coin": "X"}"#),
            Some(LiveMessage::Other("subscribed".into()))
        );
    }

    #[test]
    fn test_malformed_payloads() {
        assert_eq!(LiveMessage::parse("not json"), None);
        assert_eq!(LiveMessage::parse("[1, 2, 3]"), None);
        assert_eq!(LiveMessage::parse(r#"{"hello": "world"}"#), None);
        assert_eq!(LiveMessage::parse(r#"{"type": "trade", "coin": 42}"#), None);
    }

    #[test]
    fn test_untyped_trade_shape() {
        assert!(matches!(
            LiveMessage::parse(r#"{"coin": "X", "price": 1.5}"#),
            Some(LiveMessage::Trade(_))
        ));
    }
}
