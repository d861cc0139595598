use crate::traits::*;
use std::time::Duration;

/// Configuration for a `WebSocketClient`
///
/// Built with the type-state builder; URL and router are mandatory.
pub struct ClientConfig<R>
where
    R: MessageRouter,
{
    /// Stream URL (wss:// or ws://)
    pub(crate) url: String,

    /// Parses raw frames into typed messages
    pub(crate) router: R,

    /// Frames sent after every successful open
    pub(crate) subscriptions: Vec<WsMessage>,

    /// Upper bound for a single connect attempt
    pub(crate) connect_timeout: Duration,

    /// Optional poll fallback interval
    pub(crate) poll_interval: Option<Duration>,

    /// Reconnection strategy
    pub(crate) reconnect_strategy: Box<dyn ReconnectionStrategy>,
}

impl<R> ClientConfig<R>
where
    R: MessageRouter,
{
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    pub fn poll_interval(&self) -> Option<Duration> {
        self.poll_interval
    }
}
