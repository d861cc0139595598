//! Coin Feed - headless live view of one coin
//!
//! Streams trades for a symbol, folds them into candles and logs each trade
//! with the current buy/sell estimate.
//!
//! Usage: coin_feed [SYMBOL]   (defaults to the largest coin by market cap)

use anyhow::{Context, Result};
use coinmarket::application::{CoinFeed, CoinSession, MarketOverview};
use coinmarket::{init_tracing, ApiClient, LiveMessage, TerminalConfig};
use coinmarket_terminal::bin_common::{
    load_config_from_env, parse_args, BinaryRunner, ConfigType, RunConfig, ShutdownSignal,
};
use hypersockets::ClientEvent;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Trade size used for the logged estimates
const ESTIMATE_USD: f64 = 10.0;

struct CoinFeedApp {
    run_config: RunConfig,
    api: ApiClient,
    session: CoinSession,
    feed: Option<CoinFeed>,
    trades_seen: u64,
}

impl CoinFeedApp {
    async fn new(config: &TerminalConfig, symbol: Option<String>) -> Result<Self> {
        let api = ApiClient::new(config.api.base_url.clone(), config.api.request_timeout())?;

        let symbol = match symbol {
            Some(symbol) => symbol,
            None => {
                let mut market = MarketOverview::new();
                market.refresh(&api).await?;
                market
                    .coins()
                    .first()
                    .map(|c| c.symbol.clone())
                    .context("no coins listed")?
            }
        };

        let mut session = CoinSession::new(&symbol, &config.chart);
        if let Err(e) = session.load(&api).await {
            warn!("[Coin] Initial load of {} failed: {}", symbol, e);
        }

        let feed = CoinFeed::connect(&config.api.ws_url, &config.stream, &symbol).await?;

        Ok(Self {
            run_config: RunConfig::new(format!("Coin Feed ({})", session.symbol()))
                .with_heartbeat(Duration::from_secs(60))
                .with_loop_interval(Duration::from_millis(100)),
            api,
            session,
            feed: Some(feed),
            trades_seen: 0,
        })
    }

    async fn handle(&mut self, event: ClientEvent<LiveMessage>) {
        match event {
            ClientEvent::StateChanged(state) => info!("[Live] Stream {}", state),
            ClientEvent::Message(message) => {
                if self.session.apply_live(&message) {
                    self.trades_seen += 1;
                    self.log_trade();
                }
            }
            ClientEvent::PollDue => {
                self.session.refresh_snapshot(&self.api).await;
            }
            ClientEvent::ReconnectScheduled { attempt, delay } => {
                info!("[Live] Reconnect attempt {} in {:?}", attempt, delay);
            }
            ClientEvent::Error(e) => warn!("[Live] {}", e),
        }
    }

    fn log_trade(&self) {
        let Some(trade) = self.session.recent_trades().latest() else {
            return;
        };
        let buy = self
            .session
            .quote_buy(ESTIMATE_USD)
            .map(|q| format!("{:.4} tokens", q.tokens_out))
            .unwrap_or_else(|| "n/a".to_string());
        info!(
            "[Coin] {} {} {:.4} @ {:.8} | candles {} | ${} buys ~{}",
            trade.symbol,
            trade.side,
            trade.token_amount,
            trade.price,
            self.session.candles().len(),
            ESTIMATE_USD,
            buy
        );
    }
}

impl BinaryRunner for CoinFeedApp {
    async fn run(&mut self, mut shutdown: ShutdownSignal) -> Result<()> {
        let mut last_heartbeat = Instant::now();

        loop {
            let events = match &self.feed {
                Some(feed) => feed.drain(),
                None => break,
            };
            for event in events {
                self.handle(event).await;
            }

            if last_heartbeat.elapsed() >= self.run_config.heartbeat {
                if let Some(metrics) = self.feed.as_ref().and_then(CoinFeed::metrics) {
                    info!(
                        "Heartbeat: {} | received {} dropped {} reconnects {}",
                        metrics.connection_state,
                        metrics.messages_received,
                        metrics.messages_dropped,
                        metrics.reconnect_count
                    );
                }
                last_heartbeat = Instant::now();
            }

            if !shutdown.sleep(self.run_config.loop_interval).await {
                info!("Shutdown signal received");
                break;
            }
        }

        if let Some(feed) = self.feed.take() {
            feed.shutdown().await?;
        }
        Ok(())
    }

    fn config(&self) -> &RunConfig {
        &self.run_config
    }

    fn stats(&self) -> Option<String> {
        Some(format!(
            "{} trades applied, {} candles",
            self.trades_seen,
            self.session.candles().len()
        ))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load config first (before logging is initialized)
    let config_path = load_config_from_env(ConfigType::Terminal);
    let config = TerminalConfig::load(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;

    init_tracing(&config.log_level);
    config.log();

    let symbol = parse_args().into_iter().next();
    let mut app = CoinFeedApp::new(&config, symbol).await?;
    app.execute().await
}
