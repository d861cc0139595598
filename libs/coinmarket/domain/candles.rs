//! Live OHLC aggregation
//!
//! Buckets are anchored to the first trade of the session: a trade opens a
//! new bucket at its own timestamp once it falls `bucket_width` or more past
//! the start of the last bucket. Buckets are therefore not aligned to
//! wall-clock marks and can drift from server-computed history until the next
//! full reload.

use super::models::{Candle, TradeEvent};
use chrono::{DateTime, Duration, Utc};
use std::collections::VecDeque;
use tracing::warn;

pub const DEFAULT_BUCKET_MINUTES: i64 = 5;
pub const DEFAULT_MAX_CANDLES: usize = 150;

/// Folds trades, in delivery order, into a bounded candle series
#[derive(Debug, Clone)]
pub struct CandleAggregator {
    candles: VecDeque<Candle>,
    bucket_width: Duration,
    max_candles: usize,
}

impl Default for CandleAggregator {
    fn default() -> Self {
        Self::new(Duration::minutes(DEFAULT_BUCKET_MINUTES), DEFAULT_MAX_CANDLES)
    }
}

impl CandleAggregator {
    /// `max_candles` is clamped to at least 1
    pub fn new(bucket_width: Duration, max_candles: usize) -> Self {
        let max_candles = max_candles.max(1);
        Self {
            candles: VecDeque::with_capacity(max_candles + 1),
            bucket_width,
            max_candles,
        }
    }

    pub fn bucket_width(&self) -> Duration {
        self.bucket_width
    }

    pub fn max_candles(&self) -> usize {
        self.max_candles
    }

    /// Fold one trade into the series
    ///
    /// Returns false when the trade price is unusable (non-positive or not
    /// finite); such trades are logged and leave the series untouched.
    pub fn ingest(&mut self, event: &TradeEvent) -> bool {
        self.ingest_price(event.timestamp, event.price)
    }

    pub fn ingest_price(&mut self, timestamp: DateTime<Utc>, price: f64) -> bool {
        if !(price.is_finite() && price > 0.0) {
            warn!("[Coin] Ignoring trade with unusable price {}", price);
            return false;
        }

        let width = self.bucket_width;
        match self.candles.back_mut() {
            Some(last) if timestamp - last.bucket_start < width => last.absorb(price),
            _ => self.candles.push_back(Candle::opened_at(timestamp, price)),
        }

        while self.candles.len() > self.max_candles {
            self.candles.pop_front();
        }
        true
    }

    /// Replace the whole series, e.g. after a history reload or symbol switch
    ///
    /// Nothing from the previous series survives. Candles are ordered by
    /// `bucket_start`, inconsistent ones are discarded, and only the most
    /// recent `max_candles` are kept.
    pub fn replace_series(&mut self, series: Vec<Candle>) {
        let mut series: Vec<Candle> = series.into_iter().filter(Candle::is_consistent).collect();
        series.sort_by_key(|c| c.bucket_start);

        let skip = series.len().saturating_sub(self.max_candles);
        self.candles.clear();
        self.candles.extend(series.into_iter().skip(skip));
    }

    pub fn clear(&mut self) {
        self.candles.clear();
    }

    pub fn candles(&self) -> &VecDeque<Candle> {
        &self.candles
    }

    pub fn last(&self) -> Option<&Candle> {
        self.candles.back()
    }

    pub fn last_price(&self) -> Option<f64> {
        self.candles.back().map(|c| c.close)
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    /// Lowest low and highest high across the series, for chart scaling
    pub fn price_range(&self) -> Option<(f64, f64)> {
        self.candles.iter().fold(None, |range, c| match range {
            None => Some((c.low, c.high)),
            Some((lo, hi)) => Some((lo.min(c.low), hi.max(c.high))),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_bucket_boundaries_follow_first_trade() {
        let mut agg = CandleAggregator::default();
        let start = t0();

        agg.ingest_price(start, 10.0);
        agg.ingest_price(start + Duration::minutes(1), 14.0);
        agg.ingest_price(start + Duration::minutes(4), 7.0);
        agg.ingest_price(start + Duration::minutes(6), 9.0);

        assert_eq!(agg.len(), 2);
        let first = agg.candles()[0];
        assert_eq!(first.bucket_start, start);
        assert_eq!(first.open, 10.0);
        assert_eq!(first.high, 14.0);
        assert_eq!(first.low, 7.0);
        assert_eq!(first.close, 7.0);

        let second = agg.candles()[1];
        assert_eq!(second.bucket_start, start + Duration::minutes(6));
        assert_eq!(second.open, 9.0);
    }

    #[test]
    fn test_exact_width_opens_new_bucket() {
        let mut agg = CandleAggregator::default();
        agg.ingest_price(t0(), 1.0);
        agg.ingest_price(t0() + Duration::minutes(5), 2.0);
        assert_eq!(agg.len(), 2);
    }

    #[test]
    fn test_caps_and_evicts_oldest() {
        let mut agg = CandleAggregator::default();
        for i in 0..1000 {
            agg.ingest_price(t0() + Duration::minutes(6 * i), 1.0 + i as f64);
        }

        assert_eq!(agg.len(), 150);
        assert_eq!(agg.candles()[0].bucket_start, t0() + Duration::minutes(6 * 850));
        assert_eq!(agg.last_price(), Some(1000.0));
    }

    #[test]
    fn test_rejects_unusable_prices() {
        let mut agg = CandleAggregator::default();
        assert!(!agg.ingest_price(t0(), 0.0));
        assert!(!agg.ingest_price(t0(), -3.0));
        assert!(!agg.ingest_price(t0(), f64::NAN));
        assert!(agg.is_empty());

        agg.ingest_price(t0(), 5.0);
        assert!(!agg.ingest_price(t0(), f64::INFINITY));
        assert!(agg.last().unwrap().is_consistent());
    }

    #[test]
    fn test_late_trade_merges_into_last_bucket() {
        let mut agg = CandleAggregator::default();
        agg.ingest_price(t0(), 5.0);
        agg.ingest_price(t0() - Duration::minutes(30), 6.0);

        assert_eq!(agg.len(), 1);
        assert_eq!(agg.last().unwrap().close, 6.0);
    }

    #[test]
    fn test_replace_series_discards_previous_state() {
        let mut agg = CandleAggregator::new(Duration::minutes(5), 3);
        agg.ingest_price(t0(), 100.0);

        let series: Vec<Candle> = (0..5)
            .map(|i| Candle::opened_at(t0() - Duration::minutes(5 * (5 - i)), 1.0 + i as f64))
            .collect();
        agg.replace_series(series);

        assert_eq!(agg.len(), 3);
        let closes: Vec<f64> = agg.candles().iter().map(|c| c.close).collect();
        assert_eq!(closes, vec![3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_replace_series_drops_inconsistent_candles() {
        let mut agg = CandleAggregator::default();
        let mut broken = Candle::opened_at(t0(), 10.0);
        broken.high = 5.0;

        agg.replace_series(vec![broken, Candle::opened_at(t0() + Duration::minutes(5), 11.0)]);
        assert_eq!(agg.len(), 1);
        assert_eq!(agg.price_range(), Some((11.0, 11.0)));
    }
}
