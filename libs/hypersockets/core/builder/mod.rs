pub mod states;

use crate::client::WebSocketClient;
use crate::config::ClientConfig;
use crate::traits::*;
use crate::transport::{Transport, TungsteniteTransport};
use states::*;
use std::time::Duration;

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Type-state builder for WebSocketClient
///
/// This builder uses Rust's type system to enforce that required
/// fields (URL and router) are set before the client can be built.
pub struct WebSocketClientBuilder<U, Ro, R>
where
    U: UrlState,
    Ro: RouterState,
{
    _state: TypeState<U, Ro>,
    url: Option<String>,
    router: Option<R>,
    subscriptions: Vec<WsMessage>,
    connect_timeout: Duration,
    poll_interval: Option<Duration>,
    reconnect_strategy: Option<Box<dyn ReconnectionStrategy>>,
}

impl WebSocketClientBuilder<NoUrl, NoRouter, ()> {
    /// Create a new builder instance
    pub fn new() -> Self {
        Self {
            _state: TypeState::new(),
            url: None,
            router: None,
            subscriptions: Vec::new(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            poll_interval: None,
            reconnect_strategy: None,
        }
    }
}

impl Default for WebSocketClientBuilder<NoUrl, NoRouter, ()> {
    fn default() -> Self {
        Self::new()
    }
}

// URL setting
impl<Ro, R> WebSocketClientBuilder<NoUrl, Ro, R>
where
    Ro: RouterState,
{
    pub fn url(self, url: impl Into<String>) -> WebSocketClientBuilder<HasUrl, Ro, R> {
        WebSocketClientBuilder {
            _state: TypeState::new(),
            url: Some(url.into()),
            router: self.router,
            subscriptions: self.subscriptions,
            connect_timeout: self.connect_timeout,
            poll_interval: self.poll_interval,
            reconnect_strategy: self.reconnect_strategy,
        }
    }
}

// Router setting
impl<U> WebSocketClientBuilder<U, NoRouter, ()>
where
    U: UrlState,
{
    pub fn router<NewR>(self, router: NewR) -> WebSocketClientBuilder<U, HasRouter, NewR>
    where
        NewR: MessageRouter,
    {
        WebSocketClientBuilder {
            _state: TypeState::new(),
            url: self.url,
            router: Some(router),
            subscriptions: self.subscriptions,
            connect_timeout: self.connect_timeout,
            poll_interval: self.poll_interval,
            reconnect_strategy: self.reconnect_strategy,
        }
    }
}

// Optional configuration methods
impl<U, Ro, R> WebSocketClientBuilder<U, Ro, R>
where
    U: UrlState,
    Ro: RouterState,
{
    pub fn reconnect_strategy(mut self, strategy: impl ReconnectionStrategy + 'static) -> Self {
        self.reconnect_strategy = Some(Box::new(strategy));
        self
    }

    /// Sent again after every successful open
    pub fn subscription(mut self, message: WsMessage) -> Self {
        self.subscriptions.push(message);
        self
    }

    pub fn subscriptions(mut self, messages: Vec<WsMessage>) -> Self {
        self.subscriptions.extend(messages);
        self
    }

    /// Emit `ClientEvent::PollDue` on this interval, independent of the stream
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

// Build methods - only available when all required fields are set
impl<R> WebSocketClientBuilder<HasUrl, HasRouter, R>
where
    R: MessageRouter,
{
    /// Finish the configuration without spawning anything
    pub fn into_config(self) -> Result<ClientConfig<R>> {
        let url = self
            .url
            .ok_or_else(|| HyperSocketError::Configuration("URL must be set".to_string()))?;
        let router = self
            .router
            .ok_or_else(|| HyperSocketError::Configuration("Router must be set".to_string()))?;

        if !(url.starts_with("ws://") || url.starts_with("wss://")) {
            return Err(HyperSocketError::Configuration(format!(
                "URL must use ws:// or wss://, got {}",
                url
            )));
        }
        if self.poll_interval == Some(Duration::ZERO) {
            return Err(HyperSocketError::Configuration(
                "poll interval must be non-zero".to_string(),
            ));
        }

        let reconnect_strategy = self
            .reconnect_strategy
            .unwrap_or_else(|| Box::new(ExponentialBackoff::live_feed()));

        Ok(ClientConfig {
            url,
            router,
            subscriptions: self.subscriptions,
            connect_timeout: self.connect_timeout,
            poll_interval: self.poll_interval,
            reconnect_strategy,
        })
    }

    /// Spawn the client over a tokio-tungstenite WebSocket
    ///
    /// Returns immediately; the first connect happens on the driver task and
    /// is reported through `ClientEvent::StateChanged`.
    pub async fn build(self) -> Result<WebSocketClient<R>> {
        self.build_with_transport(TungsteniteTransport::new())
    }

    /// Spawn the client over a caller-supplied transport
    pub fn build_with_transport<T: Transport>(self, transport: T) -> Result<WebSocketClient<R>> {
        let config = self.into_config()?;
        Ok(WebSocketClient::spawn(config, transport))
    }
}
