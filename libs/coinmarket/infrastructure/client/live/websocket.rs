//! Live stream router and client builder

use super::types::LiveMessage;
use crate::infrastructure::config::StreamConfig;
use hypersockets::{MessageRouter, WebSocketClient, WebSocketClientBuilder, WsMessage};
use tracing::{debug, info};

/// Streaming client specialised to the live trade feed
pub type LiveClient = WebSocketClient<LiveRouter>;

// =============================================================================
// Router - Parses live stream payloads
// =============================================================================

#[derive(Debug, Default, Clone, Copy)]
pub struct LiveRouter;

impl LiveRouter {
    pub fn new() -> Self {
        Self
    }
}

impl MessageRouter for LiveRouter {
    type Message = LiveMessage;

    fn parse(&self, message: &WsMessage) -> Option<LiveMessage> {
        let text = match message {
            WsMessage::Text(text) => text.as_str(),
            WsMessage::Binary(data) => std::str::from_utf8(data).ok()?,
        };

        let parsed = LiveMessage::parse(text);
        if parsed.is_none() {
            debug!("[Live] Unparseable payload: {}", truncate(text, 200));
        }
        parsed
    }
}

fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

// =============================================================================
// Client Builder
// =============================================================================

/// Subscription frame for one coin's trades
pub fn subscription_message(symbol: &str) -> WsMessage {
    let payload = serde_json::json!({
        "type": "subscribe",
        "coin": symbol.trim().to_uppercase(),
    });
    WsMessage::text(payload.to_string())
}

/// Build the live client for `symbol`
///
/// Returns immediately; connection progress arrives as client events. The
/// subscription is re-sent after every reconnect.
pub async fn build_live_client(
    ws_url: &str,
    config: &StreamConfig,
    symbol: &str,
) -> hypersockets::Result<LiveClient> {
    info!("[Live] Connecting to {} for {}", ws_url, symbol);

    let mut builder = WebSocketClientBuilder::new()
        .url(ws_url)
        .router(LiveRouter::new())
        .reconnect_strategy(config.reconnect_strategy())
        .connect_timeout(config.connect_timeout())
        .subscription(subscription_message(symbol));

    if let Some(interval) = config.poll_interval() {
        builder = builder.poll_interval(interval);
    }

    builder.build().await
}
