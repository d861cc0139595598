//! Main application state and logic for the terminal

use anyhow::Result;
use hypersockets::{ClientEvent, ConnectionState};
use tokio::runtime::Handle;
use tracing::{info, warn};

use crate::application::{CoinFeed, CoinSession, MarketOverview};
use crate::domain::{BuyQuote, SellQuote};
use crate::infrastructure::{ApiClient, ApiError, LiveMessage, TerminalConfig};

const MIN_TRADE_USD: f64 = 1.0;
const MAX_TRADE_USD: f64 = 100_000.0;
const DEFAULT_TRADE_USD: f64 = 10.0;

/// Main application state
pub struct App {
    api: ApiClient,
    config: TerminalConfig,
    /// Full-market listing behind the treemap
    pub market: MarketOverview,
    /// State of the selected coin
    pub session: CoinSession,
    feed: Option<CoinFeed>,
    /// Index into `market.coins()`
    pub selected_index: usize,
    /// USD size used for buys and sell sizing
    pub trade_size_usd: f64,
    pub connection: ConnectionState,
    /// Whether the terminal is unfocused
    pub suspended: bool,
    pub should_quit: bool,
    /// Status message to show in footer
    pub status_message: Option<String>,
    runtime: Handle,
}

impl App {
    /// Load the market, pick the largest coin and start its live feed
    pub async fn initialize(runtime: Handle, config: TerminalConfig) -> Result<Self> {
        let api = ApiClient::new(config.api.base_url.clone(), config.api.request_timeout())?;

        let mut market = MarketOverview::new();
        if let Err(e) = market.refresh(&api).await {
            warn!("[Market] Initial listing failed: {}", e);
        }

        let first = market
            .coins()
            .first()
            .map(|c| c.symbol.clone())
            .unwrap_or_default();
        let mut session = CoinSession::new(&first, &config.chart);

        let mut status_message = None;
        let mut feed = None;
        if first.is_empty() {
            status_message = Some("No coins listed".to_string());
        } else {
            if let Err(e) = session.load(&api).await {
                status_message = Some(format!("Load failed: {}", e));
            }
            feed = Some(CoinFeed::connect(&config.api.ws_url, &config.stream, &first).await?);
        }

        Ok(Self {
            api,
            config,
            market,
            session,
            feed,
            selected_index: 0,
            trade_size_usd: DEFAULT_TRADE_USD,
            connection: ConnectionState::Connecting,
            suspended: false,
            should_quit: false,
            status_message,
            runtime,
        })
    }

    /// Apply every queued feed event; called once per frame
    pub fn tick(&mut self) {
        let events = match &self.feed {
            Some(feed) => feed.drain(),
            None => return,
        };

        for event in events {
            self.handle_event(event);
        }
    }

    fn handle_event(&mut self, event: ClientEvent<LiveMessage>) {
        match event {
            ClientEvent::StateChanged(state) => {
                self.connection = state;
            }
            ClientEvent::Message(message) => {
                self.session.apply_live(&message);
            }
            ClientEvent::PollDue => self.refresh(),
            ClientEvent::ReconnectScheduled { attempt, delay } => {
                self.status_message = Some(format!(
                    "Stream lost, retry {} in {:.1}s",
                    attempt + 1,
                    delay.as_secs_f64()
                ));
            }
            ClientEvent::Error(e) => {
                self.status_message = Some(format!("Stream error: {}", e));
            }
        }
    }

    /// Re-fetch the listing and the selected coin's snapshot
    pub fn refresh(&mut self) {
        let api = &self.api;
        let market = &mut self.market;
        let session = &mut self.session;

        let listed = self.runtime.block_on(async {
            let listed = market.refresh(api).await;
            session.refresh_snapshot(api).await;
            listed
        });

        if let Err(e) = listed {
            self.status_message = Some(format!("Refresh failed: {}", e));
        }
        self.clamp_selection();
    }

    fn clamp_selection(&mut self) {
        // Keep following the same coin when the ranking moves
        if let Some(idx) = self.market.position(self.session.symbol()) {
            self.selected_index = idx;
        } else if self.selected_index >= self.market.len() {
            self.selected_index = self.market.len().saturating_sub(1);
        }
    }

    pub fn next_coin(&mut self) {
        if !self.market.is_empty() {
            self.select((self.selected_index + 1) % self.market.len());
        }
    }

    pub fn prev_coin(&mut self) {
        if !self.market.is_empty() {
            let len = self.market.len();
            self.select((self.selected_index + len - 1) % len);
        }
    }

    /// Switch the session and live feed to another coin
    fn select(&mut self, index: usize) {
        let Some(symbol) = self.market.coins().get(index).map(|c| c.symbol.clone()) else {
            return;
        };
        self.selected_index = index;
        if symbol == self.session.symbol() {
            return;
        }

        self.session.switch_symbol(&symbol);
        self.connection = ConnectionState::Connecting;

        let api = &self.api;
        let session = &mut self.session;
        let config = &self.config;
        let feed = &mut self.feed;

        let result = self.runtime.block_on(async {
            match feed.as_mut() {
                Some(feed) => {
                    feed.switch_symbol(&symbol).await?;
                }
                None => {
                    *feed = Some(CoinFeed::connect(&config.api.ws_url, &config.stream, &symbol).await?);
                }
            }
            session.load(api).await?;
            Ok::<(), anyhow::Error>(())
        });

        self.status_message = match result {
            Ok(()) => None,
            Err(e) => Some(format!("Switch to {} failed: {}", symbol, e)),
        };
    }

    pub fn increase_size(&mut self) {
        self.trade_size_usd = (self.trade_size_usd * 2.0).min(MAX_TRADE_USD);
    }

    pub fn decrease_size(&mut self) {
        self.trade_size_usd = (self.trade_size_usd / 2.0).max(MIN_TRADE_USD);
    }

    pub fn buy_quote(&self) -> Option<BuyQuote> {
        self.session.quote_buy(self.trade_size_usd)
    }

    /// Tokens worth `trade_size_usd` at the last price
    pub fn sell_size(&self) -> Option<f64> {
        self.session.last_price().map(|p| self.trade_size_usd / p)
    }

    pub fn sell_quote(&self) -> Option<SellQuote> {
        self.session.quote_sell(self.sell_size()?)
    }

    pub fn buy(&mut self) {
        let usd = self.trade_size_usd;
        let api = &self.api;
        let session = &mut self.session;
        let result = self
            .runtime
            .block_on(async { session.execute_buy(api, api, usd).await });
        self.report_trade(result);
    }

    pub fn sell(&mut self) {
        let Some(tokens) = self.sell_size() else {
            self.status_message = Some("No price yet".to_string());
            return;
        };
        let api = &self.api;
        let session = &mut self.session;
        let result = self
            .runtime
            .block_on(async { session.execute_sell(api, api, tokens).await });
        self.report_trade(result);
    }

    fn report_trade(&mut self, result: std::result::Result<crate::domain::TradeReceipt, ApiError>) {
        self.status_message = Some(match result {
            Ok(receipt) => format!("{} {}", self.session.symbol(), receipt),
            Err(ApiError::Rejected(message)) => message,
            Err(e) => format!("Trade failed: {}", e),
        });
    }

    /// Terminal lost focus
    pub fn suspend(&mut self) {
        if self.suspended {
            return;
        }
        self.suspended = true;
        if let Some(feed) = &self.feed {
            if let Err(e) = feed.suspend() {
                warn!("[Live] Suspend failed: {}", e);
            }
        }
    }

    /// Terminal regained focus
    pub fn resume(&mut self) {
        if !self.suspended {
            return;
        }
        self.suspended = false;
        if let Some(feed) = &self.feed {
            if let Err(e) = feed.resume() {
                warn!("[Live] Resume failed: {}", e);
            }
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_open()
    }

    /// Shutdown the application
    pub fn shutdown(&mut self) {
        info!("[Visualizer] Shutting down...");
        if let Some(feed) = self.feed.take() {
            let _ = self.runtime.block_on(feed.shutdown());
        }
    }
}
