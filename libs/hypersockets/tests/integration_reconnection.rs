//! Integration tests for reconnection
//!
//! Strategy arithmetic first, then the connection machine's scheduling under
//! consecutive failures with explicit time.

use hypersockets::traits::reconnect::{
    ExponentialBackoff, FixedDelay, NeverReconnect, ReconnectionStrategy,
};
use hypersockets::{Action, ConnectionState, StreamConnection};
use std::time::{Duration, Instant};

/// Macro for verbose test output
macro_rules! verbose_println {
    ($($arg:tt)*) => {
        if std::env::var("TEST_VERBOSE").is_ok() {
            println!($($arg)*);
        }
    };
}

fn scheduled_delay(actions: &[Action]) -> Option<(u32, Duration)> {
    actions.iter().find_map(|action| match action {
        Action::ReconnectScheduled { attempt, delay } => Some((*attempt, *delay)),
        _ => None,
    })
}

#[test]
fn test_exponential_backoff_full_sequence() {
    verbose_println!("Testing exponential backoff full sequence...");

    let strategy = ExponentialBackoff::new(
        Duration::from_millis(100),
        Duration::from_secs(10),
        Some(5),
    );

    let expected_delays = [100, 200, 400, 800, 1600];

    for (attempt, &expected_ms) in expected_delays.iter().enumerate() {
        let delay = strategy.next_delay(attempt as u32).unwrap();
        verbose_println!("  Attempt {}: {:?}", attempt, delay);
        assert_eq!(
            delay.as_millis(),
            expected_ms,
            "Unexpected delay at attempt {}",
            attempt
        );
    }

    // Attempt 5 should return None (max_attempts = 5)
    assert!(
        strategy.next_delay(5).is_none(),
        "Should return None after max attempts"
    );
}

#[test]
fn test_exponential_backoff_with_capping() {
    let strategy = ExponentialBackoff::new(
        Duration::from_millis(500),
        Duration::from_secs(2),
        None,
    );

    let delays: Vec<u64> = (0..6)
        .map(|i| strategy.next_delay(i).unwrap().as_millis() as u64)
        .collect();

    verbose_println!("  Delays: {:?}", delays);
    assert_eq!(delays, vec![500, 1000, 2000, 2000, 2000, 2000]);
}

#[test]
fn test_live_feed_formula_holds_for_every_attempt() {
    let strategy = ExponentialBackoff::live_feed();

    for attempt in 0..200u32 {
        let expected = 30_000u64.min(500 * 2u64.pow(attempt.min(6)));
        assert_eq!(
            strategy.next_delay(attempt),
            Some(Duration::from_millis(expected)),
            "attempt {}",
            attempt
        );
    }
}

#[test]
fn test_fixed_delay_with_max_attempts() {
    let strategy = FixedDelay::new(Duration::from_millis(500), Some(3));

    assert_eq!(strategy.next_delay(0), Some(Duration::from_millis(500)));
    assert_eq!(strategy.next_delay(2), Some(Duration::from_millis(500)));
    assert!(strategy.next_delay(3).is_none());
}

#[test]
fn test_never_reconnect_always_fails() {
    let strategy = NeverReconnect;

    for attempt in 0..10 {
        assert!(strategy.next_delay(attempt).is_none());
        assert!(!strategy.should_reconnect(attempt));
    }
}

#[test]
fn test_seven_consecutive_failures_follow_backoff() {
    verbose_println!("Testing seven consecutive connect failures...");

    let mut now = Instant::now();
    let mut conn = StreamConnection::new(ExponentialBackoff::live_feed());
    conn.start(now);

    let mut delays = Vec::new();
    for expected_attempt in 0..7u32 {
        let actions = conn.on_failure(now, "connection refused");
        let (attempt, delay) = scheduled_delay(&actions).expect("reconnect should be scheduled");
        assert_eq!(attempt, expected_attempt);
        assert_eq!(conn.state(), ConnectionState::Reconnecting(expected_attempt));
        verbose_println!("  Attempt {}: {:?}", attempt, delay);
        delays.push(delay.as_millis());

        // Nothing fires a millisecond early
        assert!(conn.tick(now + delay - Duration::from_millis(1)).is_empty());

        now += delay;
        let actions = conn.tick(now);
        assert!(actions.contains(&Action::Connect));
        assert_eq!(conn.state(), ConnectionState::Connecting);
    }

    assert_eq!(delays, vec![500, 1000, 2000, 4000, 8000, 16000, 30000]);
}

#[test]
fn test_open_connection_drop_reconnects() {
    let now = Instant::now();
    let mut conn = StreamConnection::new(ExponentialBackoff::live_feed());
    conn.start(now);
    conn.on_open(now);

    // A remote close is never treated as intentional
    let actions = conn.on_failure(now, "closed by server");
    assert_eq!(
        scheduled_delay(&actions),
        Some((0, Duration::from_millis(500)))
    );
    assert!(conn.state().is_reconnecting());
}

#[test]
fn test_failure_while_suspended_waits_for_resume() {
    let now = Instant::now();
    let mut conn = StreamConnection::new(ExponentialBackoff::live_feed());
    conn.start(now);
    conn.on_open(now);
    conn.suspend();

    let actions = conn.on_failure(now, "reset");
    assert!(scheduled_delay(&actions).is_none());
    assert_eq!(conn.pending_timers(), 0);
    assert!(conn.tick(now + Duration::from_secs(120)).is_empty());

    let actions = conn.resume(now + Duration::from_secs(120));
    assert!(actions.contains(&Action::Connect));
    assert_eq!(conn.state(), ConnectionState::Connecting);
}

#[test]
fn test_limited_strategy_ends_closed() {
    let now = Instant::now();
    let mut conn = StreamConnection::new(FixedDelay::new(Duration::from_secs(1), Some(2)));
    conn.start(now);

    conn.on_failure(now, "refused");
    conn.tick(now + Duration::from_secs(1));
    conn.on_failure(now, "refused");
    conn.tick(now + Duration::from_secs(2));
    let actions = conn.on_failure(now, "refused");

    assert!(actions.contains(&Action::StateChanged(ConnectionState::Closed)));
    assert_eq!(conn.pending_timers(), 0);
}
