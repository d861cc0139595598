//! Bounded newest-first trade log

use super::models::TradeEvent;
use std::collections::VecDeque;

pub const DEFAULT_RECENT_TRADES: usize = 50;

#[derive(Debug, Clone)]
pub struct RecentTrades {
    trades: VecDeque<TradeEvent>,
    capacity: usize,
}

impl Default for RecentTrades {
    fn default() -> Self {
        Self::new(DEFAULT_RECENT_TRADES)
    }
}

impl RecentTrades {
    pub fn new(capacity: usize) -> Self {
        Self {
            trades: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Record a trade; the oldest one falls off once full
    pub fn push(&mut self, trade: TradeEvent) {
        if self.capacity == 0 {
            return;
        }
        self.trades.push_front(trade);
        self.trades.truncate(self.capacity);
    }

    /// Newest first
    pub fn iter(&self) -> impl Iterator<Item = &TradeEvent> {
        self.trades.iter()
    }

    pub fn latest(&self) -> Option<&TradeEvent> {
        self.trades.front()
    }

    pub fn clear(&mut self) {
        self.trades.clear();
    }

    pub fn len(&self) -> usize {
        self.trades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trades.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::TradeSide;
    use chrono::Utc;

    fn trade(price: f64) -> TradeEvent {
        TradeEvent {
            symbol: "MOON".into(),
            side: TradeSide::Buy,
            token_amount: 1.0,
            usd_amount: price,
            price,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_newest_first_and_bounded() {
        let mut trades = RecentTrades::new(3);
        for price in 1..=5 {
            trades.push(trade(price as f64));
        }

        let prices: Vec<f64> = trades.iter().map(|t| t.price).collect();
        assert_eq!(prices, vec![5.0, 4.0, 3.0]);
        assert_eq!(trades.latest().map(|t| t.price), Some(5.0));
    }

    #[test]
    fn test_zero_capacity_stays_empty() {
        let mut trades = RecentTrades::new(0);
        trades.push(trade(1.0));
        assert!(trades.is_empty());
    }

    #[test]
    fn test_clear() {
        let mut trades = RecentTrades::default();
        trades.push(trade(1.0));
        trades.clear();
        assert_eq!(trades.len(), 0);
        assert_eq!(trades.capacity(), DEFAULT_RECENT_TRADES);
    }
}
