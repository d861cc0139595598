use super::types::{
    decode_coin_list, BuyRequest, CoinDto, CoinEnvelope, HistoryEnvelope, SellRequest,
    TradeOutcome, TradeResponse,
};
use crate::domain::TradeReceipt;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Deserialization failed: {0}")]
    DeserializeFailed(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// The trade service refused the order; the message is shown as-is
    #[error("{0}")]
    Rejected(String),
}

pub type Result<T> = std::result::Result<T, ApiError>;

/// Market API client
pub struct ApiClient {
    base_url: String,
    client: Client,
}

impl ApiClient {
    /// Create a client with a per-request timeout
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn coin_url(&self, symbol: &str, suffix: &str) -> String {
        format!(
            "{}/coins/{}{}",
            self.base_url,
            symbol.trim().to_uppercase(),
            suffix
        )
    }

    /// Fetch every listed coin
    pub async fn fetch_coins(&self) -> Result<Vec<CoinDto>> {
        let url = format!("{}/coins", self.base_url);
        debug!("[API] GET {}", url);

        let response = self.client.get(&url).send().await?;
        let value: serde_json::Value = Self::decode(response, "coins").await?;
        decode_coin_list(value)
    }

    /// Fetch one coin
    pub async fn fetch_coin(&self, symbol: &str) -> Result<CoinDto> {
        let url = self.coin_url(symbol, "");
        debug!("[API] GET {}", url);

        let response = self.client.get(&url).send().await?;
        let envelope: CoinEnvelope = Self::decode(response, "coin").await?;
        Ok(envelope.coin)
    }

    /// Fetch the server-computed candle history for the last `hours`
    pub async fn fetch_history(&self, symbol: &str, hours: u32) -> Result<HistoryEnvelope> {
        let url = self.coin_url(symbol, "/history");
        let hours_str = hours.to_string();
        let params = [("hours", hours_str.as_str())];
        debug!("[API] GET {} with params {:?}", url, params);

        let response = self.client.get(&url).query(&params).send().await?;
        Self::decode(response, "history").await
    }

    /// Spend `usd_amount` on `symbol`
    pub async fn submit_buy(&self, symbol: &str, usd_amount: f64) -> Result<TradeReceipt> {
        let url = self.coin_url(symbol, "/buy");
        self.submit_trade(&url, &BuyRequest { usd_amount }).await
    }

    /// Sell `token_amount` of `symbol`
    pub async fn submit_sell(&self, symbol: &str, token_amount: f64) -> Result<TradeReceipt> {
        let url = self.coin_url(symbol, "/sell");
        self.submit_trade(&url, &SellRequest { token_amount }).await
    }

    async fn submit_trade<B: Serialize>(&self, url: &str, body: &B) -> Result<TradeReceipt> {
        debug!("[API] POST {}", url);

        let response = self.client.post(url).json(body).send().await?;
        let status = response.status();

        if status == 429 {
            warn!("[API] Rate limit exceeded");
            return Err(ApiError::RateLimitExceeded);
        }

        // Rejections carry `{error}` with a 4xx status, so read the body either way
        let text = response.text().await?;
        match serde_json::from_str::<TradeResponse>(&text) {
            Ok(parsed) => match parsed.outcome() {
                TradeOutcome::Filled(receipt) => Ok(receipt),
                TradeOutcome::Rejected(message) => {
                    warn!("[API] Trade rejected: {}", message);
                    Err(ApiError::Rejected(message))
                }
                TradeOutcome::Malformed if status.is_success() => Err(
                    ApiError::DeserializeFailed(format!("unexpected trade response: {}", text)),
                ),
                TradeOutcome::Malformed => Err(ApiError::ApiError(format!(
                    "Trade failed ({}): {}",
                    status, text
                ))),
            },
            Err(e) if status.is_success() => Err(ApiError::DeserializeFailed(e.to_string())),
            Err(_) => Err(ApiError::ApiError(format!(
                "Trade failed ({}): {}",
                status, text
            ))),
        }
    }

    async fn decode<T: DeserializeOwned>(response: Response, what: &str) -> Result<T> {
        let status = response.status();

        if status == 429 {
            warn!("[API] Rate limit exceeded");
            return Err(ApiError::RateLimitExceeded);
        }

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ApiError::ApiError(format!(
                "Failed to fetch {} ({}): {}",
                what, status, error_text
            )));
        }

        response
            .json()
            .await
            .map_err(|e| ApiError::DeserializeFailed(e.to_string()))
    }
}
