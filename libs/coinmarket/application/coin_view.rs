//! Single-coin session
//!
//! Owns everything the coin view shows for one symbol: the last snapshot,
//! the mirrored pool, the candle series and recent trades. Live messages
//! mutate it in delivery order; a load or symbol switch replaces it wholesale.

use crate::domain::{
    quote_buy, quote_sell, BuyQuote, CandleAggregator, Candle, CoinSnapshot, Pool, RecentTrades,
    SellQuote, TradeReceipt,
};
use crate::infrastructure::client::api::{ApiError, MarketDataService, TradeService};
use crate::infrastructure::config::ChartConfig;
use crate::infrastructure::LiveMessage;
use tracing::{debug, info, warn};

pub struct CoinSession {
    symbol: String,
    snapshot: Option<CoinSnapshot>,
    pool: Option<Pool>,
    candles: CandleAggregator,
    recent: RecentTrades,
    history_hours: u32,
}

impl CoinSession {
    pub fn new(symbol: &str, config: &ChartConfig) -> Self {
        Self {
            symbol: normalize(symbol),
            snapshot: None,
            pool: None,
            candles: CandleAggregator::new(config.bucket_width(), config.max_candles),
            recent: RecentTrades::new(config.recent_trades),
            history_hours: config.history_hours,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Drop all state and follow another coin
    pub fn switch_symbol(&mut self, symbol: &str) {
        self.symbol = normalize(symbol);
        self.snapshot = None;
        self.pool = None;
        self.candles.clear();
        self.recent.clear();
    }

    /// Fetch snapshot and history, replacing whatever was loaded before
    pub async fn load<M>(&mut self, api: &M) -> Result<(), ApiError>
    where
        M: MarketDataService + ?Sized,
    {
        let snapshot = api.get_coin(&self.symbol).await?;
        let history = api.get_coin_history(&self.symbol, self.history_hours).await?;
        info!(
            "[Coin] Loaded {} with {} history points",
            self.symbol,
            history.len()
        );
        self.seed(snapshot, history);
        Ok(())
    }

    /// Install a fresh snapshot and candle series
    pub fn seed(&mut self, snapshot: CoinSnapshot, history: Vec<Candle>) {
        self.recent.clear();
        self.candles.replace_series(history);
        self.apply_snapshot(snapshot);
    }

    /// Take pool and stats from a snapshot of this coin; candles are kept
    pub fn apply_snapshot(&mut self, snapshot: CoinSnapshot) -> bool {
        if snapshot.symbol != self.symbol {
            debug!(
                "[Coin] Ignoring snapshot for {} while viewing {}",
                snapshot.symbol, self.symbol
            );
            return false;
        }
        self.pool = Some(snapshot.pool());
        self.snapshot = Some(snapshot);
        true
    }

    /// Fold one live message; returns true when state changed
    pub fn apply_live(&mut self, message: &LiveMessage) -> bool {
        let LiveMessage::Trade(trade) = message else {
            return false;
        };
        if trade.symbol().as_deref() != Some(self.symbol.as_str()) {
            return false;
        }

        let mut changed = false;

        if let Some(pool) = trade.pool().filter(Pool::is_tradable) {
            self.pool = Some(pool);
            changed = true;
        }

        if let Some(snapshot) = self.snapshot.as_mut() {
            if let Some(pool) = self.pool {
                snapshot.pool_base = pool.base_reserve;
                snapshot.pool_token = pool.token_reserve;
            }
            if let Some(volume) = trade.volume24h {
                snapshot.volume_24h = volume;
            }
            if let Some(change) = trade.change24h {
                snapshot.change_24h = change;
            }
        }

        if let Some(event) = trade.to_trade_event() {
            if self.candles.ingest(&event) {
                if let Some(snapshot) = self.snapshot.as_mut() {
                    snapshot.price = event.price;
                }
                self.recent.push(event);
                changed = true;
            }
        }

        changed
    }

    /// Local estimate for spending `usd_in`
    pub fn quote_buy(&self, usd_in: f64) -> Option<BuyQuote> {
        quote_buy(self.pool.as_ref()?, usd_in)
    }

    /// Local estimate for selling `token_in`
    pub fn quote_sell(&self, token_in: f64) -> Option<SellQuote> {
        quote_sell(self.pool.as_ref()?, token_in)
    }

    /// Submit a buy, then re-fetch the coin
    ///
    /// Local state only changes through the re-fetch; a rejection leaves it
    /// untouched and comes back as `ApiError::Rejected` with the server's text.
    pub async fn execute_buy<T, M>(
        &mut self,
        trades: &T,
        market: &M,
        usd_amount: f64,
    ) -> Result<TradeReceipt, ApiError>
    where
        T: TradeService + ?Sized,
        M: MarketDataService + ?Sized,
    {
        let receipt = trades.buy(&self.symbol, usd_amount).await?;
        info!("[Coin] {} {}", self.symbol, receipt);
        self.refresh_snapshot(market).await;
        Ok(receipt)
    }

    /// Submit a sell, then re-fetch the coin
    pub async fn execute_sell<T, M>(
        &mut self,
        trades: &T,
        market: &M,
        token_amount: f64,
    ) -> Result<TradeReceipt, ApiError>
    where
        T: TradeService + ?Sized,
        M: MarketDataService + ?Sized,
    {
        let receipt = trades.sell(&self.symbol, token_amount).await?;
        info!("[Coin] {} {}", self.symbol, receipt);
        self.refresh_snapshot(market).await;
        Ok(receipt)
    }

    /// Re-fetch the snapshot; failures are logged and leave state as is
    pub async fn refresh_snapshot<M>(&mut self, market: &M) -> bool
    where
        M: MarketDataService + ?Sized,
    {
        match market.get_coin(&self.symbol).await {
            Ok(snapshot) => self.apply_snapshot(snapshot),
            Err(e) => {
                warn!("[Coin] Failed to refresh {}: {}", self.symbol, e);
                false
            }
        }
    }

    pub fn snapshot(&self) -> Option<&CoinSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn pool(&self) -> Option<Pool> {
        self.pool
    }

    pub fn candles(&self) -> &CandleAggregator {
        &self.candles
    }

    pub fn recent_trades(&self) -> &RecentTrades {
        &self.recent
    }

    /// Latest traded price, falling back to the snapshot
    pub fn last_price(&self) -> Option<f64> {
        self.recent
            .latest()
            .map(|t| t.price)
            .or_else(|| self.snapshot.as_ref().map(|s| s.price))
            .filter(|p| *p > 0.0)
    }
}

fn normalize(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::LiveTrade;
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone, Utc};
    use parking_lot::Mutex;

    fn snapshot(symbol: &str, base: f64, token: f64) -> CoinSnapshot {
        CoinSnapshot {
            symbol: symbol.to_string(),
            name: symbol.to_string(),
            price: base / token,
            pool_base: base,
            pool_token: token,
            volume_24h: 0.0,
            change_24h: 0.0,
            circulating_supply: 1_000_000.0,
            market_cap: None,
        }
    }

    /// Scripted market: trades succeed or fail, every fetch returns the next pool
    struct FakeMarket {
        pool: Mutex<(f64, f64)>,
        reject_with: Option<String>,
        coin_fetches: Mutex<u32>,
    }

    impl FakeMarket {
        fn new(base: f64, token: f64) -> Self {
            Self {
                pool: Mutex::new((base, token)),
                reject_with: None,
                coin_fetches: Mutex::new(0),
            }
        }
    }

    #[async_trait]
    impl MarketDataService for FakeMarket {
        async fn list_coins(&self) -> Result<Vec<CoinSnapshot>, ApiError> {
            let (base, token) = *self.pool.lock();
            Ok(vec![snapshot("MOON", base, token)])
        }

        async fn get_coin(&self, symbol: &str) -> Result<CoinSnapshot, ApiError> {
            *self.coin_fetches.lock() += 1;
            let (base, token) = *self.pool.lock();
            Ok(snapshot(symbol, base, token))
        }

        async fn get_coin_history(&self, _symbol: &str, _hours: u32) -> Result<Vec<Candle>, ApiError> {
            let start = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
            Ok((0..3)
                .map(|i| Candle::opened_at(start + Duration::minutes(5 * i), 1.0 + i as f64))
                .collect())
        }
    }

    #[async_trait]
    impl TradeService for FakeMarket {
        async fn buy(&self, _symbol: &str, usd_amount: f64) -> Result<TradeReceipt, ApiError> {
            if let Some(message) = &self.reject_with {
                return Err(ApiError::Rejected(message.clone()));
            }
            let mut pool = self.pool.lock();
            let quote = quote_buy(&Pool::new(pool.0, pool.1), usd_amount)
                .ok_or_else(|| ApiError::Rejected("bad amount".into()))?;
            *pool = (quote.pool_after.base_reserve, quote.pool_after.token_reserve);
            Ok(TradeReceipt::Bought {
                token_amount: quote.tokens_out,
                usd_spent: usd_amount,
            })
        }

        async fn sell(&self, _symbol: &str, _token_amount: f64) -> Result<TradeReceipt, ApiError> {
            Err(ApiError::Rejected(
                self.reject_with.clone().unwrap_or_else(|| "no balance".into()),
            ))
        }
    }

    fn trade(coin: &str, price: f64, minutes: i64) -> LiveMessage {
        LiveMessage::Trade(LiveTrade {
            coin: Some(coin.to_string()),
            side: Some("buy".into()),
            price: Some(price),
            pool_base: Some(1000.0 + minutes as f64),
            pool_token: Some(1_000_000.0),
            created_at: Some(Utc.with_ymd_and_hms(2024, 3, 1, 13, 0, 0).unwrap() + Duration::minutes(minutes)),
            ..LiveTrade::default()
        })
    }

    #[tokio::test]
    async fn test_load_seeds_pool_and_history() {
        let market = FakeMarket::new(1000.0, 1_000_000.0);
        let mut session = CoinSession::new("moon", &ChartConfig::default());

        session.load(&market).await.unwrap();

        assert_eq!(session.symbol(), "MOON");
        assert_eq!(session.pool(), Some(Pool::new(1000.0, 1_000_000.0)));
        assert_eq!(session.candles().len(), 3);
        assert!(session.recent_trades().is_empty());
    }

    #[test]
    fn test_live_trades_feed_candles_and_pool() {
        let mut session = CoinSession::new("MOON", &ChartConfig::default());
        session.seed(snapshot("MOON", 1000.0, 1_000_000.0), Vec::new());

        assert!(session.apply_live(&trade("moon", 0.002, 0)));
        assert!(session.apply_live(&trade("MOON", 0.003, 1)));
        assert!(session.apply_live(&trade("MOON", 0.004, 6)));

        assert_eq!(session.candles().len(), 2);
        assert_eq!(session.recent_trades().len(), 3);
        assert_eq!(session.last_price(), Some(0.004));
        assert_eq!(session.pool(), Some(Pool::new(1006.0, 1_000_000.0)));
        assert_eq!(session.snapshot().unwrap().price, 0.004);
    }

    #[test]
    fn test_other_symbols_and_non_trades_are_ignored() {
        let mut session = CoinSession::new("MOON", &ChartConfig::default());
        session.seed(snapshot("MOON", 1000.0, 1_000_000.0), Vec::new());

        assert!(!session.apply_live(&trade("SUN", 5.0, 0)));
        assert!(!session.apply_live(&LiveMessage::Ping));
        assert!(!session.apply_live(&LiveMessage::Other("subscribed".into())));
        assert!(session.candles().is_empty());
        assert!(!session.apply_snapshot(snapshot("SUN", 1.0, 1.0)));
    }

    #[test]
    fn test_quotes_need_a_tradable_pool() {
        let mut session = CoinSession::new("MOON", &ChartConfig::default());
        assert!(session.quote_buy(10.0).is_none());

        session.seed(snapshot("MOON", 1000.0, 1_000_000.0), Vec::new());
        let quote = session.quote_buy(100.0).unwrap();
        assert!(quote.tokens_out > 0.0);
        assert!(session.quote_sell(quote.tokens_out).unwrap().usd_out < 100.0);

        session.seed(snapshot("MOON", 0.0, 1_000_000.0), Vec::new());
        assert!(session.quote_sell(1.0).is_none());
    }

    #[tokio::test]
    async fn test_buy_refetches_instead_of_mutating_locally() {
        let market = FakeMarket::new(1000.0, 1_000_000.0);
        let mut session = CoinSession::new("MOON", &ChartConfig::default());
        session.load(&market).await.unwrap();

        let receipt = session.execute_buy(&market, &market, 100.0).await.unwrap();
        assert!(matches!(receipt, TradeReceipt::Bought { .. }));

        let (base, token) = *market.pool.lock();
        assert_eq!(session.pool(), Some(Pool::new(base, token)));
        assert_eq!(*market.coin_fetches.lock(), 2);
    }

    #[tokio::test]
    async fn test_rejection_is_verbatim_and_leaves_state() {
        let mut market = FakeMarket::new(1000.0, 1_000_000.0);
        market.reject_with = Some("Insufficient balance".into());
        let mut session = CoinSession::new("MOON", &ChartConfig::default());
        session.load(&market).await.unwrap();
        let before = session.pool();

        let err = session.execute_buy(&market, &market, 100.0).await.unwrap_err();
        assert_eq!(err.to_string(), "Insufficient balance");

        let err = session.execute_sell(&market, &market, 5.0).await.unwrap_err();
        assert!(matches!(err, ApiError::Rejected(ref m) if m == "Insufficient balance"));

        assert_eq!(session.pool(), before);
        assert_eq!(*market.coin_fetches.lock(), 1);
    }

    #[test]
    fn test_switch_symbol_clears_state() {
        let mut session = CoinSession::new("MOON", &ChartConfig::default());
        session.seed(snapshot("MOON", 1000.0, 1_000_000.0), Vec::new());
        session.apply_live(&trade("MOON", 0.002, 0));

        session.switch_symbol("sun");
        assert_eq!(session.symbol(), "SUN");
        assert!(session.snapshot().is_none());
        assert!(session.candles().is_empty());
        assert!(session.recent_trades().is_empty());
        assert_eq!(session.last_price(), None);
    }
}
