//! Whole-market overview
//!
//! Holds the latest full listing and turns it into treemap tiles. Weights
//! are market capitalisations; the tile colour follows the 24h change.

use crate::domain::{CoinSnapshot, LayoutRect, MarketItem, TreemapLayout};
use crate::infrastructure::client::api::{ApiError, MarketDataService};
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use tracing::info;

#[derive(Debug, Clone, Default)]
pub struct MarketOverview {
    /// Ranked by market cap, largest first
    coins: Vec<CoinSnapshot>,
    updated_at: Option<DateTime<Utc>>,
}

impl MarketOverview {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the listing
    pub fn update(&mut self, mut coins: Vec<CoinSnapshot>) {
        coins.sort_by(|a, b| {
            b.market_cap()
                .partial_cmp(&a.market_cap())
                .unwrap_or(Ordering::Equal)
        });
        self.coins = coins;
        self.updated_at = Some(Utc::now());
    }

    /// Re-fetch the listing; on error the previous one stays in place
    pub async fn refresh<M>(&mut self, api: &M) -> Result<usize, ApiError>
    where
        M: MarketDataService + ?Sized,
    {
        let coins = api.list_coins().await?;
        let count = coins.len();
        self.update(coins);
        info!("[Market] Refreshed {} coins", count);
        Ok(count)
    }

    pub fn coins(&self) -> &[CoinSnapshot] {
        &self.coins
    }

    pub fn get(&self, symbol: &str) -> Option<&CoinSnapshot> {
        self.coins.iter().find(|c| c.symbol.eq_ignore_ascii_case(symbol))
    }

    pub fn position(&self, symbol: &str) -> Option<usize> {
        self.coins.iter().position(|c| c.symbol.eq_ignore_ascii_case(symbol))
    }

    pub fn len(&self) -> usize {
        self.coins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coins.is_empty()
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    /// Treemap input, one item per coin
    pub fn items(&self) -> Vec<MarketItem> {
        self.coins
            .iter()
            .map(|c| MarketItem::new(c.symbol.clone(), c.market_cap().max(0.0), c.change_24h))
            .collect()
    }

    pub fn layout(&self, area: TreemapLayout) -> Vec<LayoutRect> {
        area.layout(&self.items())
    }

    pub fn total_market_cap(&self) -> f64 {
        self.coins.iter().map(|c| c.market_cap().max(0.0)).sum()
    }

    pub fn total_volume(&self) -> f64 {
        self.coins.iter().map(|c| c.volume_24h.max(0.0)).sum()
    }

    /// Up to `n` biggest gainers and losers by 24h change
    pub fn top_movers(&self, n: usize) -> (Vec<&CoinSnapshot>, Vec<&CoinSnapshot>) {
        let mut by_change: Vec<&CoinSnapshot> = self.coins.iter().collect();
        by_change.sort_by(|a, b| {
            b.change_24h
                .partial_cmp(&a.change_24h)
                .unwrap_or(Ordering::Equal)
        });

        let gainers = by_change
            .iter()
            .filter(|c| c.change_24h > 0.0)
            .take(n)
            .copied()
            .collect();
        let losers = by_change
            .iter()
            .rev()
            .filter(|c| c.change_24h < 0.0)
            .take(n)
            .copied()
            .collect();
        (gainers, losers)
    }
}
