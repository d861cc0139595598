//! Live feed for the coin being viewed
//!
//! Wraps one `LiveClient` at a time. Switching symbol shuts the old client
//! down completely before the new one is spawned, so two subscriptions never
//! overlap and no timer of the old one survives.

use crate::infrastructure::config::StreamConfig;
use crate::infrastructure::{build_live_client, LiveClient, LiveMessage};
use hypersockets::{ClientEvent, ConnectionState, Metrics};
use tracing::info;

pub struct CoinFeed {
    ws_url: String,
    config: StreamConfig,
    symbol: String,
    client: Option<LiveClient>,
}

impl CoinFeed {
    /// Start streaming `symbol`; returns before the first connect completes
    pub async fn connect(
        ws_url: &str,
        config: &StreamConfig,
        symbol: &str,
    ) -> hypersockets::Result<Self> {
        let symbol = symbol.trim().to_uppercase();
        let client = build_live_client(ws_url, config, &symbol).await?;
        Ok(Self {
            ws_url: ws_url.to_string(),
            config: config.clone(),
            symbol,
            client: Some(client),
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Tear down the current client, then follow `symbol`
    ///
    /// Returns the old client's final metrics.
    pub async fn switch_symbol(&mut self, symbol: &str) -> hypersockets::Result<Option<Metrics>> {
        let symbol = symbol.trim().to_uppercase();
        let previous = match self.client.take() {
            Some(client) => Some(client.shutdown().await?),
            None => None,
        };
        info!("[Live] Switching feed from {} to {}", self.symbol, symbol);

        self.client = Some(build_live_client(&self.ws_url, &self.config, &symbol).await?);
        self.symbol = symbol;
        Ok(previous)
    }

    /// Every event queued since the last call, in order
    pub fn drain(&self) -> Vec<ClientEvent<LiveMessage>> {
        self.client
            .as_ref()
            .map(LiveClient::drain_events)
            .unwrap_or_default()
    }

    pub fn suspend(&self) -> hypersockets::Result<()> {
        match &self.client {
            Some(client) => client.suspend(),
            None => Ok(()),
        }
    }

    pub fn resume(&self) -> hypersockets::Result<()> {
        match &self.client {
            Some(client) => client.resume(),
            None => Ok(()),
        }
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.client
            .as_ref()
            .map(LiveClient::connection_state)
            .unwrap_or(ConnectionState::Closed)
    }

    pub fn metrics(&self) -> Option<Metrics> {
        self.client.as_ref().map(LiveClient::metrics)
    }

    /// Close for good and report final metrics
    pub async fn shutdown(mut self) -> hypersockets::Result<Option<Metrics>> {
        match self.client.take() {
            Some(client) => Ok(Some(client.shutdown().await?)),
            None => Ok(None),
        }
    }
}
