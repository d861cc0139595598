use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Lifecycle state of one logical stream subscription
///
/// ```text
/// Connecting ──open──> Open ──close()──> Closed
///     ^                  │
///     │               failure
///     │                  v
///     └──delay──── Reconnecting(n)
/// ```
///
/// The attempt counter in `Reconnecting` grows with each consecutive failure
/// and starts over after every successful `Open`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    Connecting,
    Open,
    Closed,
    Reconnecting(u32),
}

impl ConnectionState {
    pub fn is_open(&self) -> bool {
        matches!(self, ConnectionState::Open)
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, ConnectionState::Closed)
    }

    pub fn is_reconnecting(&self) -> bool {
        matches!(self, ConnectionState::Reconnecting(_))
    }

    /// Index of the pending reconnect attempt, 0 unless reconnecting
    pub fn attempt(&self) -> u32 {
        match self {
            ConnectionState::Reconnecting(n) => *n,
            _ => 0,
        }
    }

    fn encode(self) -> u64 {
        let (tag, attempt) = match self {
            ConnectionState::Connecting => (0u64, 0u32),
            ConnectionState::Open => (1, 0),
            ConnectionState::Closed => (2, 0),
            ConnectionState::Reconnecting(n) => (3, n),
        };
        (tag << 32) | attempt as u64
    }

    fn decode(raw: u64) -> Self {
        let attempt = (raw & 0xFFFF_FFFF) as u32;
        match raw >> 32 {
            0 => ConnectionState::Connecting,
            1 => ConnectionState::Open,
            3 => ConnectionState::Reconnecting(attempt),
            _ => ConnectionState::Closed,
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Connecting => write!(f, "connecting"),
            ConnectionState::Open => write!(f, "open"),
            ConnectionState::Closed => write!(f, "closed"),
            ConnectionState::Reconnecting(n) => write!(f, "reconnecting (attempt {})", n),
        }
    }
}

/// Lock-free snapshot of the driver's connection state
///
/// Written only by the driver task; read by the host at any time.
#[derive(Debug)]
pub struct AtomicConnectionState {
    raw: AtomicU64,
}

impl AtomicConnectionState {
    pub fn new(state: ConnectionState) -> Self {
        Self {
            raw: AtomicU64::new(state.encode()),
        }
    }

    #[inline]
    pub fn get(&self) -> ConnectionState {
        ConnectionState::decode(self.raw.load(Ordering::Acquire))
    }

    #[inline]
    pub fn set(&self, state: ConnectionState) {
        self.raw.store(state.encode(), Ordering::Release);
    }
}

/// Counters updated by the driver task
#[derive(Debug, Default)]
pub struct AtomicMetrics {
    messages_sent: AtomicU64,
    messages_received: AtomicU64,
    messages_dropped: AtomicU64,
    reconnect_count: AtomicU64,
    pending_timers: AtomicU64,
}

impl AtomicMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn increment_sent(&self) {
        self.messages_sent.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn increment_received(&self) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn increment_dropped(&self) {
        self.messages_dropped.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn increment_reconnects(&self) {
        self.reconnect_count.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn set_pending_timers(&self, count: usize) {
        self.pending_timers.store(count as u64, Ordering::Relaxed);
    }

    pub fn messages_sent(&self) -> u64 {
        self.messages_sent.load(Ordering::Relaxed)
    }

    pub fn messages_received(&self) -> u64 {
        self.messages_received.load(Ordering::Relaxed)
    }

    pub fn messages_dropped(&self) -> u64 {
        self.messages_dropped.load(Ordering::Relaxed)
    }

    pub fn reconnect_count(&self) -> u64 {
        self.reconnect_count.load(Ordering::Relaxed)
    }

    pub fn pending_timers(&self) -> usize {
        self.pending_timers.load(Ordering::Relaxed) as usize
    }
}
