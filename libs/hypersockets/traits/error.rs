use thiserror::Error;

/// Main error type for hypersockets
#[derive(Error, Debug)]
pub enum HyperSocketError {
    /// WebSocket protocol or I/O error
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// Connection closed by the remote side or the stream ended
    #[error("Connection closed: {0}")]
    ConnectionClosed(String),

    /// Connect attempt did not complete in time
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Operation requires an open transport
    #[error("Not connected")]
    NotConnected,

    /// Channel send error
    #[error("Channel send error: {0}")]
    ChannelSend(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Driver task failed to join
    #[error("Driver task failed: {0}")]
    Join(String),
}

/// Result type for hypersockets operations
pub type Result<T> = std::result::Result<T, HyperSocketError>;
