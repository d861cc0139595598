//! Connection state machine
//!
//! `StreamConnection` decides *what* should happen to one logical stream
//! subscription; the driver (`client.rs`) or a test decides *how*. Every entry
//! point takes the current time and returns the actions to perform, so the
//! machine never sleeps, spawns or touches the network.
//!
//! ```text
//! start ──> Connecting ──on_open──> Open
//!               │                    │
//!          on_failure            on_failure
//!               v                    v
//!         Reconnecting(n) <──────────┘
//!               │
//!        Reconnect timer / resume
//!               v
//!          Connecting ...
//!
//! close() from any state ──> Closed (timers cleared, never reconnects)
//! ```

use super::connection_state::ConnectionState;
use super::timer::{TimerKind, TimerQueue};
use crate::traits::ReconnectionStrategy;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Side effect requested by the machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Open the transport, then report `on_open` or `on_failure`
    Connect,
    /// Close the transport if it is open
    CloseTransport,
    /// Refresh snapshot data out of band
    Poll,
    /// A reconnect timer was armed
    ReconnectScheduled { attempt: u32, delay: Duration },
    /// The connection state changed
    StateChanged(ConnectionState),
}

/// State machine for one live-data subscription
pub struct StreamConnection<S = Box<dyn ReconnectionStrategy>> {
    state: ConnectionState,
    strategy: S,
    /// Attempt index used for the next backoff delay
    attempt: u32,
    started: bool,
    suspended: bool,
    poll_interval: Option<Duration>,
    timers: TimerQueue,
}

impl<S: ReconnectionStrategy> StreamConnection<S> {
    pub fn new(strategy: S) -> Self {
        Self {
            state: ConnectionState::Connecting,
            strategy,
            attempt: 0,
            started: false,
            suspended: false,
            poll_interval: None,
            timers: TimerQueue::new(),
        }
    }

    /// Enable the periodic poll fallback
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_deadline()
    }

    /// Begin the first connect attempt
    pub fn start(&mut self, now: Instant) -> Vec<Action> {
        if self.started || self.state.is_closed() {
            return Vec::new();
        }
        self.started = true;
        self.state = ConnectionState::Connecting;

        if let Some(interval) = self.poll_interval {
            if !self.suspended {
                self.timers.schedule(TimerKind::Poll, now + interval);
            }
        }
        vec![Action::StateChanged(self.state), Action::Connect]
    }

    /// The transport finished connecting
    pub fn on_open(&mut self, _now: Instant) -> Vec<Action> {
        match self.state {
            ConnectionState::Connecting => {
                info!("[Stream] Connection open");
                self.state = ConnectionState::Open;
                self.attempt = 0;
                self.timers.cancel(TimerKind::Reconnect);
                vec![Action::StateChanged(self.state)]
            }
            ConnectionState::Closed => {
                debug!("[Stream] Opened after close, discarding transport");
                vec![Action::CloseTransport]
            }
            other => {
                warn!("[Stream] Unexpected open while {}", other);
                Vec::new()
            }
        }
    }

    /// A connect attempt failed or an open connection dropped abnormally
    ///
    /// Both cases share one scheduling path.
    pub fn on_failure(&mut self, now: Instant, reason: &str) -> Vec<Action> {
        match self.state {
            ConnectionState::Closed => {
                debug!("[Stream] Failure after close ignored: {}", reason);
                return Vec::new();
            }
            ConnectionState::Reconnecting(_) => {
                debug!("[Stream] Failure while already reconnecting ignored: {}", reason);
                return Vec::new();
            }
            ConnectionState::Connecting | ConnectionState::Open => {}
        }

        let attempt = self.attempt;
        self.attempt = self.attempt.saturating_add(1);

        let Some(delay) = self.strategy.next_delay(attempt) else {
            warn!("[Stream] Reconnection strategy exhausted after {} attempts: {}", attempt, reason);
            self.state = ConnectionState::Closed;
            self.timers.cancel_all();
            return vec![Action::StateChanged(self.state), Action::CloseTransport];
        };

        self.state = ConnectionState::Reconnecting(attempt);
        let mut actions = vec![Action::StateChanged(self.state)];

        if self.suspended {
            info!("[Stream] Connection lost while suspended ({}), reconnecting on resume", reason);
        } else {
            warn!("[Stream] Connection lost ({}), reconnecting in {:?} (attempt {})", reason, delay, attempt);
            self.timers.schedule(TimerKind::Reconnect, now + delay);
            actions.push(Action::ReconnectScheduled { attempt, delay });
        }
        actions
    }

    /// Fire every timer that is due
    pub fn tick(&mut self, now: Instant) -> Vec<Action> {
        let mut actions = Vec::new();
        if self.suspended {
            return actions;
        }

        for (_, kind) in self.timers.pop_due(now) {
            match kind {
                TimerKind::Reconnect => {
                    if self.state.is_reconnecting() {
                        self.state = ConnectionState::Connecting;
                        actions.push(Action::StateChanged(self.state));
                        actions.push(Action::Connect);
                    }
                }
                TimerKind::Poll => {
                    if self.state.is_closed() {
                        continue;
                    }
                    actions.push(Action::Poll);
                    if let Some(interval) = self.poll_interval {
                        self.timers.schedule(TimerKind::Poll, now + interval);
                    }
                }
            }
        }
        actions
    }

    /// The host is hidden: stop polling and backoff timers
    ///
    /// An open transport stays open; only timers are paused.
    pub fn suspend(&mut self) -> Vec<Action> {
        if self.suspended || self.state.is_closed() {
            return Vec::new();
        }
        debug!("[Stream] Suspended with {} pending timers", self.timers.len());
        self.suspended = true;
        self.timers.cancel_all();
        Vec::new()
    }

    /// The host is visible again: one fresh poll and, if the connection is
    /// down, one immediate connect attempt
    pub fn resume(&mut self, now: Instant) -> Vec<Action> {
        if !self.suspended || self.state.is_closed() {
            return Vec::new();
        }
        debug!("[Stream] Resumed while {}", self.state);
        self.suspended = false;

        let mut actions = Vec::new();
        if let Some(interval) = self.poll_interval {
            actions.push(Action::Poll);
            self.timers.schedule(TimerKind::Poll, now + interval);
        }
        if self.state.is_reconnecting() {
            self.state = ConnectionState::Connecting;
            actions.push(Action::StateChanged(self.state));
            actions.push(Action::Connect);
        }
        actions
    }

    /// Intentional close: no reconnection, no pending timers
    pub fn close(&mut self) -> Vec<Action> {
        if self.state.is_closed() {
            return Vec::new();
        }
        info!("[Stream] Closing connection");
        self.state = ConnectionState::Closed;
        self.timers.cancel_all();
        vec![Action::StateChanged(self.state), Action::CloseTransport]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{ExponentialBackoff, NeverReconnect};

    fn machine() -> StreamConnection<ExponentialBackoff> {
        StreamConnection::new(ExponentialBackoff::live_feed())
    }

    #[test]
    fn test_start_requests_connect_once() {
        let now = Instant::now();
        let mut conn = machine();

        let actions = conn.start(now);
        assert!(actions.contains(&Action::Connect));
        assert_eq!(conn.state(), ConnectionState::Connecting);
        assert!(conn.start(now).is_empty());
    }

    #[test]
    fn test_open_resets_attempts() {
        let now = Instant::now();
        let mut conn = machine();
        conn.start(now);

        conn.on_failure(now, "refused");
        assert_eq!(conn.state(), ConnectionState::Reconnecting(0));
        conn.tick(now + Duration::from_millis(500));
        conn.on_failure(now, "refused");
        assert_eq!(conn.state(), ConnectionState::Reconnecting(1));

        conn.tick(now + Duration::from_secs(5));
        conn.on_open(now);
        assert_eq!(conn.state(), ConnectionState::Open);

        let actions = conn.on_failure(now, "reset");
        assert!(actions.contains(&Action::ReconnectScheduled {
            attempt: 0,
            delay: Duration::from_millis(500),
        }));
    }

    #[test]
    fn test_close_is_terminal() {
        let now = Instant::now();
        let mut conn = machine().with_poll_interval(Duration::from_secs(10));
        conn.start(now);
        conn.on_open(now);

        let actions = conn.close();
        assert!(actions.contains(&Action::CloseTransport));
        assert_eq!(conn.pending_timers(), 0);

        assert!(conn.on_failure(now, "late error").is_empty());
        assert!(conn.resume(now).is_empty());
        assert_eq!(conn.state(), ConnectionState::Closed);
    }

    #[test]
    fn test_open_after_close_discards_transport() {
        let now = Instant::now();
        let mut conn = machine();
        conn.start(now);
        conn.close();

        assert_eq!(conn.on_open(now), vec![Action::CloseTransport]);
    }

    #[test]
    fn test_exhausted_strategy_closes() {
        let now = Instant::now();
        let mut conn = StreamConnection::new(NeverReconnect);
        conn.start(now);

        let actions = conn.on_failure(now, "refused");
        assert!(actions.contains(&Action::StateChanged(ConnectionState::Closed)));
        assert_eq!(conn.pending_timers(), 0);
    }

    #[test]
    fn test_reconnect_timer_fires_connect() {
        let now = Instant::now();
        let mut conn = machine();
        conn.start(now);
        conn.on_failure(now, "refused");

        assert!(conn.tick(now + Duration::from_millis(499)).is_empty());
        let actions = conn.tick(now + Duration::from_millis(500));
        assert!(actions.contains(&Action::Connect));
        assert_eq!(conn.state(), ConnectionState::Connecting);
    }
}
