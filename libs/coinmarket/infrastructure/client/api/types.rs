//! Market API wire types
//!
//! Every numeric field goes through the lenient readers in `flex`, so both
//! `"price": 1.5` and `"price": "1.5"` decode. Conversion into domain types
//! happens here; nothing outside this module sees the wire shapes.

use super::client::ApiError;
use crate::domain::{Candle, CoinSnapshot, TradeReceipt};
use crate::infrastructure::client::flex::{de_opt_f64, de_opt_timestamp};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Coin as returned by `/coins` and `/coins/{symbol}`
#[derive(Debug, Clone, Deserialize)]
pub struct CoinDto {
    pub symbol: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "de_opt_f64", alias = "currentPrice", alias = "current_price")]
    pub price: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_f64", alias = "poolBase", alias = "pool_base_currency_amount")]
    pub pool_base: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_f64", alias = "poolToken", alias = "pool_coin_amount")]
    pub pool_token: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_f64", alias = "volume_24h", alias = "volume24hr")]
    pub volume24h: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_f64", alias = "change_24h")]
    pub change24h: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_f64", alias = "circulatingSupply")]
    pub circulating_supply: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_f64", alias = "marketCap")]
    pub market_cap: Option<f64>,
}

impl CoinDto {
    /// `None` when the symbol is blank
    pub fn into_snapshot(self) -> Option<CoinSnapshot> {
        let symbol = self.symbol.trim().to_uppercase();
        if symbol.is_empty() {
            return None;
        }
        Some(CoinSnapshot {
            name: self.name.unwrap_or_else(|| symbol.clone()),
            symbol,
            price: self.price.unwrap_or(0.0),
            pool_base: self.pool_base.unwrap_or(0.0),
            pool_token: self.pool_token.unwrap_or(0.0),
            volume_24h: self.volume24h.unwrap_or(0.0),
            change_24h: self.change24h.unwrap_or(0.0),
            circulating_supply: self.circulating_supply.unwrap_or(0.0),
            market_cap: self.market_cap,
        })
    }
}

/// `/coins` answers with either a bare array or `{coins: [...]}`
///
/// An `{error}` body is an API error even under a 2xx status. Decoded from a
/// `Value` rather than an untagged enum: buffered untagged content loses
/// number fidelity under serde_json's `arbitrary_precision`.
pub fn decode_coin_list(value: serde_json::Value) -> Result<Vec<CoinDto>, ApiError> {
    let list = match value {
        serde_json::Value::Object(mut object) => match object.remove("coins") {
            Some(coins) => coins,
            None => {
                return Err(match object.get("error") {
                    Some(error) => ApiError::ApiError(format!(
                        "Failed to fetch coins: {}",
                        error.as_str().map(str::to_string).unwrap_or_else(|| error.to_string())
                    )),
                    None => ApiError::DeserializeFailed("coin listing without `coins`".to_string()),
                })
            }
        },
        other => other,
    };
    serde_json::from_value(list).map_err(|e| ApiError::DeserializeFailed(e.to_string()))
}

#[derive(Debug, Deserialize)]
pub struct CoinEnvelope {
    pub coin: CoinDto,
}

/// One history point; `time` is epoch seconds, epoch millis or RFC 3339
#[derive(Debug, Clone, Deserialize)]
pub struct CandleDto {
    #[serde(default, deserialize_with = "de_opt_timestamp", alias = "bucket_start", alias = "timestamp")]
    pub time: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub open: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub high: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub low: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub close: Option<f64>,
}

impl CandleDto {
    pub fn into_candle(self) -> Option<Candle> {
        Some(Candle {
            bucket_start: self.time?,
            open: self.open?,
            high: self.high?,
            low: self.low?,
            close: self.close?,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct HistoryEnvelope {
    #[serde(default)]
    pub series: Vec<CandleDto>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyRequest {
    pub usd_amount: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SellRequest {
    pub token_amount: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoughtDto {
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub token_amount: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub usd_spent: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoldDto {
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub token_amount: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub usd_gained: Option<f64>,
}

/// `{ok, bought}` / `{ok, sold}` / `{error}`
#[derive(Debug, Clone, Deserialize)]
pub struct TradeResponse {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub bought: Option<BoughtDto>,
    #[serde(default)]
    pub sold: Option<SoldDto>,
    #[serde(default)]
    pub error: Option<String>,
}

/// How a trade response resolved
#[derive(Debug, Clone, PartialEq)]
pub enum TradeOutcome {
    Filled(TradeReceipt),
    Rejected(String),
    Malformed,
}

impl TradeResponse {
    pub fn outcome(self) -> TradeOutcome {
        if let Some(message) = self.error {
            return TradeOutcome::Rejected(message);
        }
        if !self.ok {
            return TradeOutcome::Malformed;
        }
        if let Some(bought) = self.bought {
            return TradeOutcome::Filled(TradeReceipt::Bought {
                token_amount: bought.token_amount.unwrap_or(0.0),
                usd_spent: bought.usd_spent.unwrap_or(0.0),
            });
        }
        if let Some(sold) = self.sold {
            return TradeOutcome::Filled(TradeReceipt::Sold {
                token_amount: sold.token_amount.unwrap_or(0.0),
                usd_gained: sold.usd_gained.unwrap_or(0.0),
            });
        }
        TradeOutcome::Malformed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coin_with_string_numbers() {
        let json = r#"{
            "symbol": "moon",
            "name": "Moon Coin",
            "price": "0.0125",
            "pool_base": 1000,
            "pool_token": "80000",
            "volume24h": null,
            "change24h": -3.5,
            "circulating_supply": "1000000"
        }"#;

        let coin = serde_json::from_str::<CoinDto>(json)
            .unwrap()
            .into_snapshot()
            .unwrap();
        assert_eq!(coin.symbol, "MOON");
        assert_eq!(coin.price, 0.0125);
        assert_eq!(coin.pool_token, 80000.0);
        assert_eq!(coin.volume_24h, 0.0);
        assert_eq!(coin.change_24h, -3.5);
        assert_eq!(coin.market_cap(), 12500.0);
    }

    #[test]
    fn test_coin_list_shapes() {
        let bare = decode_coin_list(serde_json::json!([{"symbol": "A", "price": 2}, {"symbol": "B"}])).unwrap();
        assert_eq!(bare.len(), 2);
        assert_eq!(bare[0].price, Some(2.0));

        let wrapped = decode_coin_list(serde_json::json!({"coins": [{"symbol": "A", "price": "3"}]})).unwrap();
        assert_eq!(wrapped.len(), 1);
        assert_eq!(wrapped[0].price, Some(3.0));

        assert!(matches!(
            decode_coin_list(serde_json::json!("nope")),
            Err(ApiError::DeserializeFailed(_))
        ));
    }

    #[test]
    fn test_coin_list_error_body_is_not_an_empty_market() {
        let err = decode_coin_list(serde_json::json!({"error": "Service unavailable"})).unwrap_err();
        match err {
            ApiError::ApiError(message) => assert!(message.contains("Service unavailable")),
            other => panic!("unexpected error: {:?}", other),
        }

        assert!(matches!(
            decode_coin_list(serde_json::json!({"error": {"code": 503}})),
            Err(ApiError::ApiError(_))
        ));
        assert!(matches!(
            decode_coin_list(serde_json::json!({"data": []})),
            Err(ApiError::DeserializeFailed(_))
        ));
        assert!(decode_coin_list(serde_json::json!({"coins": []})).unwrap().is_empty());
    }

    #[test]
    fn test_history_skips_incomplete_points() {
        let json = r#"{"series": [
            {"time": 1709294400, "open": 1, "high": 2, "low": 0.5, "close": "1.5"},
            {"time": 1709294700, "open": 1.5, "high": 1.6, "low": 1.4},
            {"time": "2024-03-01T12:10:00Z", "open": 1.5, "high": 1.8, "low": 1.5, "close": 1.7}
        ]}"#;

        let history: HistoryEnvelope = serde_json::from_str(json).unwrap();
        let candles: Vec<Candle> = history
            .series
            .into_iter()
            .filter_map(CandleDto::into_candle)
            .collect();

        assert_eq!(candles.len(), 2);
        assert_eq!(candles[0].close, 1.5);
        assert_eq!(candles[1].bucket_start.timestamp(), 1709295000);
    }

    #[test]
    fn test_trade_outcomes() {
        let bought: TradeResponse =
            serde_json::from_str(r#"{"ok": true, "bought": {"tokenAmount": 120.5, "usdSpent": 10}}"#).unwrap();
        assert_eq!(
            bought.outcome(),
            TradeOutcome::Filled(TradeReceipt::Bought {
                token_amount: 120.5,
                usd_spent: 10.0
            })
        );

        let sold: TradeResponse =
            serde_json::from_str(r#"{"ok": true, "sold": {"tokenAmount": "5", "usdGained": "0.25"}}"#).unwrap();
        assert!(matches!(sold.outcome(), TradeOutcome::Filled(TradeReceipt::Sold { .. })));

        let rejected: TradeResponse =
            serde_json::from_str(r#"{"error": "Insufficient balance"}"#).unwrap();
        assert_eq!(
            rejected.outcome(),
            TradeOutcome::Rejected("Insufficient balance".to_string())
        );

        let empty: TradeResponse = serde_json::from_str(r#"{"ok": true}"#).unwrap();
        assert_eq!(empty.outcome(), TradeOutcome::Malformed);
    }
}
