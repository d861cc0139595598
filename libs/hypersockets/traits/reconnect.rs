use std::time::Duration;

/// Trait for defining reconnection strategies
///
/// The connection machine owns the attempt counter; strategies are pure
/// functions of it.
pub trait ReconnectionStrategy: Send + Sync {
    /// Get the delay before the next reconnection attempt
    ///
    /// # Arguments
    /// * `attempt` - Number of consecutive failures before this one (0-indexed)
    ///
    /// # Returns
    /// * `Some(duration)` - Wait this long before reconnecting
    /// * `None` - Stop reconnecting
    fn next_delay(&self, attempt: u32) -> Option<Duration>;

    /// Check if we should continue reconnecting
    fn should_reconnect(&self, attempt: u32) -> bool;
}

impl<S: ReconnectionStrategy + ?Sized> ReconnectionStrategy for Box<S> {
    fn next_delay(&self, attempt: u32) -> Option<Duration> {
        (**self).next_delay(attempt)
    }

    fn should_reconnect(&self, attempt: u32) -> bool {
        (**self).should_reconnect(attempt)
    }
}

/// Exponential backoff reconnection strategy
///
/// `delay = min(max_delay, initial_delay * 2^min(attempt, max_exponent))`
///
/// The exponent is capped so the multiplication never overflows no matter how
/// long the transport stays down.
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    initial_delay: Duration,
    max_delay: Duration,
    max_exponent: u32,
    max_attempts: Option<u32>,
}

impl ExponentialBackoff {
    /// Default exponent cap used by `new`
    pub const DEFAULT_MAX_EXPONENT: u32 = 6;

    /// Create a new exponential backoff strategy
    ///
    /// # Arguments
    /// * `initial_delay` - The delay before the first reconnect
    /// * `max_delay` - The maximum delay between reconnects
    /// * `max_attempts` - Maximum number of attempts (None = unlimited)
    pub fn new(initial_delay: Duration, max_delay: Duration, max_attempts: Option<u32>) -> Self {
        Self {
            initial_delay,
            max_delay,
            max_exponent: Self::DEFAULT_MAX_EXPONENT,
            max_attempts,
        }
    }

    /// Override the exponent cap
    pub fn with_max_exponent(mut self, max_exponent: u32) -> Self {
        self.max_exponent = max_exponent;
        self
    }

    /// 500ms doubling up to 30s, exponent capped at 6, unlimited attempts
    pub fn live_feed() -> Self {
        Self::new(Duration::from_millis(500), Duration::from_secs(30), None)
    }
}

impl ReconnectionStrategy for ExponentialBackoff {
    fn next_delay(&self, attempt: u32) -> Option<Duration> {
        if !self.should_reconnect(attempt) {
            return None;
        }

        let exponent = attempt.min(self.max_exponent).min(63);
        let factor = 1u64 << exponent;
        let delay_ms = (self.initial_delay.as_millis() as u64).saturating_mul(factor);
        let capped_ms = delay_ms.min(self.max_delay.as_millis() as u64);
        Some(Duration::from_millis(capped_ms))
    }

    fn should_reconnect(&self, attempt: u32) -> bool {
        self.max_attempts.map_or(true, |max| attempt < max)
    }
}

/// Fixed delay reconnection strategy
#[derive(Debug, Clone)]
pub struct FixedDelay {
    delay: Duration,
    max_attempts: Option<u32>,
}

impl FixedDelay {
    pub fn new(delay: Duration, max_attempts: Option<u32>) -> Self {
        Self { delay, max_attempts }
    }
}

impl ReconnectionStrategy for FixedDelay {
    fn next_delay(&self, attempt: u32) -> Option<Duration> {
        if !self.should_reconnect(attempt) {
            return None;
        }
        Some(self.delay)
    }

    fn should_reconnect(&self, attempt: u32) -> bool {
        self.max_attempts.map_or(true, |max| attempt < max)
    }
}

/// Never reconnect strategy
///
/// The first failure moves the connection straight to `Closed`.
#[derive(Debug, Clone)]
pub struct NeverReconnect;

impl ReconnectionStrategy for NeverReconnect {
    fn next_delay(&self, _attempt: u32) -> Option<Duration> {
        None
    }

    fn should_reconnect(&self, _attempt: u32) -> bool {
        false
    }
}
