//! Service seams used by the application layer
//!
//! Views talk to these traits rather than to `ApiClient`, so tests can swap
//! in scripted services.

use super::client::{ApiClient, ApiError};
use super::types::CandleDto;
use crate::domain::{Candle, CoinSnapshot, TradeReceipt};
use async_trait::async_trait;
use tracing::debug;

/// Server-authoritative trade execution
#[async_trait]
pub trait TradeService: Send + Sync {
    async fn buy(&self, symbol: &str, usd_amount: f64) -> Result<TradeReceipt, ApiError>;

    async fn sell(&self, symbol: &str, token_amount: f64) -> Result<TradeReceipt, ApiError>;
}

/// Snapshot and history reads
#[async_trait]
pub trait MarketDataService: Send + Sync {
    async fn list_coins(&self) -> Result<Vec<CoinSnapshot>, ApiError>;

    async fn get_coin(&self, symbol: &str) -> Result<CoinSnapshot, ApiError>;

    /// Candles ordered as served; incomplete points are skipped
    async fn get_coin_history(&self, symbol: &str, hours: u32) -> Result<Vec<Candle>, ApiError>;
}

#[async_trait]
impl TradeService for ApiClient {
    async fn buy(&self, symbol: &str, usd_amount: f64) -> Result<TradeReceipt, ApiError> {
        self.submit_buy(symbol, usd_amount).await
    }

    async fn sell(&self, symbol: &str, token_amount: f64) -> Result<TradeReceipt, ApiError> {
        self.submit_sell(symbol, token_amount).await
    }
}

#[async_trait]
impl MarketDataService for ApiClient {
    async fn list_coins(&self) -> Result<Vec<CoinSnapshot>, ApiError> {
        let coins = self.fetch_coins().await?;
        let total = coins.len();
        let snapshots: Vec<CoinSnapshot> =
            coins.into_iter().filter_map(|c| c.into_snapshot()).collect();

        if snapshots.len() < total {
            debug!("[API] Skipped {} coins without a symbol", total - snapshots.len());
        }
        Ok(snapshots)
    }

    async fn get_coin(&self, symbol: &str) -> Result<CoinSnapshot, ApiError> {
        self.fetch_coin(symbol)
            .await?
            .into_snapshot()
            .ok_or_else(|| ApiError::DeserializeFailed(format!("coin {} has no symbol", symbol)))
    }

    async fn get_coin_history(&self, symbol: &str, hours: u32) -> Result<Vec<Candle>, ApiError> {
        let history = self.fetch_history(symbol, hours).await?;
        let total = history.series.len();
        let candles: Vec<Candle> = history
            .series
            .into_iter()
            .filter_map(CandleDto::into_candle)
            .collect();

        if candles.len() < total {
            debug!(
                "[API] Skipped {} incomplete history points for {}",
                total - candles.len(),
                symbol
            );
        }
        Ok(candles)
    }
}
