//! Headless run loop support
//!
//! `BinaryRunner::execute` installs the Ctrl+C listener once, logs a start
//! and stop banner around `run`, and hands `run` the shared shutdown signal.

use std::time::Duration;
use tokio::sync::watch;
use tracing::info;

const DEFAULT_LOOP_INTERVAL: Duration = Duration::from_millis(100);
const DEFAULT_HEARTBEAT: Duration = Duration::from_secs(60);

/// Name and pacing of a headless binary
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub name: String,
    pub heartbeat: Duration,
    pub loop_interval: Duration,
}

impl RunConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            heartbeat: DEFAULT_HEARTBEAT,
            loop_interval: DEFAULT_LOOP_INTERVAL,
        }
    }

    pub fn with_heartbeat(mut self, heartbeat: Duration) -> Self {
        self.heartbeat = heartbeat;
        self
    }

    /// Zero keeps the default
    pub fn with_loop_interval(mut self, interval: Duration) -> Self {
        if !interval.is_zero() {
            self.loop_interval = interval;
        }
        self
    }
}

/// Process-wide stop request, observed by every clone
///
/// Set once and never cleared. A Ctrl+C that lands while the loop is busy
/// elsewhere is still seen by the next `sleep`.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl ShutdownSignal {
    /// Listen for Ctrl+C on a background task
    pub fn ctrl_c() -> Self {
        let (tx, signal) = Self::manual();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Received shutdown signal (Ctrl+C)");
                let _ = tx.send(true);
            }
        });
        signal
    }

    /// Signal triggered by sending `true` on the returned sender
    pub fn manual() -> (watch::Sender<bool>, Self) {
        let (tx, rx) = watch::channel(false);
        (tx, Self { rx })
    }

    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Sleep for `duration`; false when shutdown was requested first
    pub async fn sleep(&mut self, duration: Duration) -> bool {
        if self.is_triggered() {
            return false;
        }
        let triggered = async {
            // A dropped sender without a signal means no shutdown is coming
            if self.rx.wait_for(|&stop| stop).await.is_err() {
                std::future::pending::<()>().await;
            }
        };
        tokio::select! {
            _ = tokio::time::sleep(duration) => true,
            _ = triggered => false,
        }
    }
}

/// A long-running headless binary
pub trait BinaryRunner {
    /// Main loop; return once `shutdown` fires
    async fn run(&mut self, shutdown: ShutdownSignal) -> anyhow::Result<()>;

    fn config(&self) -> &RunConfig;

    /// Summary line for the stop banner
    fn stats(&self) -> Option<String> {
        None
    }

    async fn execute(&mut self) -> anyhow::Result<()> {
        let shutdown = ShutdownSignal::ctrl_c();

        info!("==== {} started (Ctrl+C to stop) ====", self.config().name);
        let result = self.run(shutdown).await;

        info!("==== {} stopped ====", self.config().name);
        if let Some(stats) = self.stats() {
            info!("{}", stats);
        }
        result
    }
}
