use crate::config::ClientConfig;
use crate::connection::{Action, StreamConnection};
use crate::connection_state::{AtomicConnectionState, AtomicMetrics, ConnectionState};
use crate::transport::Transport;
use crate::traits::*;
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Internal command messages for client control
#[derive(Debug)]
enum ClientCommand {
    /// Send a frame to the server
    Send(WsMessage),
    /// Host went to the background
    Suspend,
    /// Host came back to the foreground
    Resume,
    /// Close the connection for good
    Shutdown,
}

/// Events delivered to the host, in the order they happened
#[derive(Debug, Clone)]
pub enum ClientEvent<M> {
    /// Connection state changed
    StateChanged(ConnectionState),
    /// A frame parsed into a message
    Message(M),
    /// The poll fallback fired; refresh snapshot data
    PollDue,
    /// A reconnect attempt was scheduled
    ReconnectScheduled { attempt: u32, delay: Duration },
    /// Non-fatal error (connect failure, dropped connection)
    Error(String),
}

/// Client metrics snapshot
#[derive(Debug, Clone)]
pub struct Metrics {
    pub messages_sent: u64,
    pub messages_received: u64,
    pub messages_dropped: u64,
    pub reconnect_count: u64,
    pub pending_timers: usize,
    pub connection_state: ConnectionState,
}

/// Streaming client driving a `StreamConnection` over a `Transport`
///
/// The driver runs as one tokio task. Frames are parsed inline by the router
/// and forwarded over a single FIFO channel, so the host observes messages in
/// delivery order. The host pulls events with `try_recv_event` from its own
/// loop and owns whatever state it folds them into.
///
/// Dropping the client asks the driver to close; `shutdown` additionally
/// waits for it and reports final metrics.
pub struct WebSocketClient<R>
where
    R: MessageRouter,
{
    state: Arc<AtomicConnectionState>,
    metrics: Arc<AtomicMetrics>,
    command_tx: mpsc::UnboundedSender<ClientCommand>,
    event_rx: Receiver<ClientEvent<R::Message>>,
    task_handle: Option<tokio::task::JoinHandle<()>>,
}

impl<R> WebSocketClient<R>
where
    R: MessageRouter,
{
    /// Spawn the driver task; must be called inside a tokio runtime
    pub(crate) fn spawn<T: Transport>(config: ClientConfig<R>, transport: T) -> Self {
        let state = Arc::new(AtomicConnectionState::new(ConnectionState::Connecting));
        let metrics = Arc::new(AtomicMetrics::new());
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = unbounded();

        let mut machine = StreamConnection::new(config.reconnect_strategy);
        if let Some(interval) = config.poll_interval {
            machine = machine.with_poll_interval(interval);
        }

        let driver = Driver {
            url: config.url,
            router: config.router,
            subscriptions: config.subscriptions,
            connect_timeout: config.connect_timeout,
            transport,
            machine,
            state: Arc::clone(&state),
            metrics: Arc::clone(&metrics),
            event_tx,
        };

        let task_handle = tokio::spawn(driver.run(command_rx));

        Self {
            state,
            metrics,
            command_tx,
            event_rx,
            task_handle: Some(task_handle),
        }
    }

    /// Queue a frame for the server
    pub fn send(&self, message: WsMessage) -> Result<()> {
        self.command(ClientCommand::Send(message))
    }

    /// Pause poll and backoff timers while the host is hidden
    pub fn suspend(&self) -> Result<()> {
        self.command(ClientCommand::Suspend)
    }

    /// Resume after `suspend`: one fresh poll, one connect attempt if down
    pub fn resume(&self) -> Result<()> {
        self.command(ClientCommand::Resume)
    }

    fn command(&self, command: ClientCommand) -> Result<()> {
        self.command_tx
            .send(command)
            .map_err(|e| HyperSocketError::ChannelSend(e.to_string()))
    }

    /// Get current connection state
    #[inline]
    pub fn connection_state(&self) -> ConnectionState {
        self.state.get()
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        self.state.get().is_open()
    }

    /// Get current metrics
    pub fn metrics(&self) -> Metrics {
        Metrics {
            messages_sent: self.metrics.messages_sent(),
            messages_received: self.metrics.messages_received(),
            messages_dropped: self.metrics.messages_dropped(),
            reconnect_count: self.metrics.reconnect_count(),
            pending_timers: self.metrics.pending_timers(),
            connection_state: self.state.get(),
        }
    }

    /// Try to receive an event (non-blocking)
    pub fn try_recv_event(&self) -> Option<ClientEvent<R::Message>> {
        self.event_rx.try_recv().ok()
    }

    /// Receive an event, waiting at most `timeout`
    pub fn recv_event_timeout(&self, timeout: Duration) -> Option<ClientEvent<R::Message>> {
        match self.event_rx.recv_timeout(timeout) {
            Ok(event) => Some(event),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Drain every event currently queued
    pub fn drain_events(&self) -> Vec<ClientEvent<R::Message>> {
        self.event_rx.try_iter().collect()
    }

    /// Close the connection and wait for the driver to exit
    ///
    /// Returns the final metrics; `pending_timers` is always 0 after a close.
    pub async fn shutdown(mut self) -> Result<Metrics> {
        info!("[Stream] Shutting down client");
        let _ = self.command_tx.send(ClientCommand::Shutdown);

        if let Some(handle) = self.task_handle.take() {
            handle
                .await
                .map_err(|e| HyperSocketError::Join(e.to_string()))?;
        }

        Ok(self.metrics())
    }
}

impl<R> Drop for WebSocketClient<R>
where
    R: MessageRouter,
{
    fn drop(&mut self) {
        if self.task_handle.is_some() {
            debug!("[Stream] Client dropped without shutdown, closing driver");
            let _ = self.command_tx.send(ClientCommand::Shutdown);
        }
    }
}

/// What woke the driver up
enum Step {
    Frame(Option<Result<WsMessage>>),
    Command(Option<ClientCommand>),
    TimerDue,
}

/// Owns the transport and the machine for the lifetime of one client
struct Driver<R, T>
where
    R: MessageRouter,
    T: Transport,
{
    url: String,
    router: R,
    subscriptions: Vec<WsMessage>,
    connect_timeout: Duration,
    transport: T,
    machine: StreamConnection,
    state: Arc<AtomicConnectionState>,
    metrics: Arc<AtomicMetrics>,
    event_tx: Sender<ClientEvent<R::Message>>,
}

/// Current time on tokio's clock, so paused test time drives the machine too
fn now() -> Instant {
    tokio::time::Instant::now().into_std()
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)).await,
        None => std::future::pending().await,
    }
}

impl<R, T> Driver<R, T>
where
    R: MessageRouter,
    T: Transport,
{
    async fn run(mut self, mut command_rx: mpsc::UnboundedReceiver<ClientCommand>) {
        let mut pending: VecDeque<Action> = self.machine.start(now()).into();

        loop {
            while let Some(action) = pending.pop_front() {
                let follow_up = self.perform(action, &mut command_rx).await;
                pending.extend(follow_up);
            }
            self.metrics.set_pending_timers(self.machine.pending_timers());

            if self.machine.state().is_closed() {
                break;
            }

            let deadline = self.machine.next_deadline();
            let is_open = self.machine.state().is_open();

            let step = tokio::select! {
                frame = self.transport.next_message(), if is_open => Step::Frame(frame),
                command = command_rx.recv() => Step::Command(command),
                _ = sleep_until(deadline) => Step::TimerDue,
            };

            let actions = match step {
                Step::Frame(Some(Ok(message))) => {
                    self.dispatch(message);
                    Vec::new()
                }
                Step::Frame(Some(Err(e))) => {
                    self.emit(ClientEvent::Error(e.to_string()));
                    self.machine.on_failure(now(), &e.to_string())
                }
                Step::Frame(None) => self.machine.on_failure(now(), "stream ended"),
                Step::Command(Some(ClientCommand::Send(message))) => self.send(message).await,
                Step::Command(Some(ClientCommand::Suspend)) => self.machine.suspend(),
                Step::Command(Some(ClientCommand::Resume)) => self.machine.resume(now()),
                Step::Command(Some(ClientCommand::Shutdown)) | Step::Command(None) => {
                    self.machine.close()
                }
                Step::TimerDue => self.machine.tick(now()),
            };
            pending.extend(actions);
        }

        self.transport.close().await;
        info!("[Stream] Driver exiting");
    }

    async fn perform(
        &mut self,
        action: Action,
        command_rx: &mut mpsc::UnboundedReceiver<ClientCommand>,
    ) -> Vec<Action> {
        match action {
            Action::Connect => self.connect(command_rx).await,
            Action::CloseTransport => {
                self.transport.close().await;
                Vec::new()
            }
            Action::Poll => {
                self.emit(ClientEvent::PollDue);
                Vec::new()
            }
            Action::ReconnectScheduled { attempt, delay } => {
                self.metrics.increment_reconnects();
                self.emit(ClientEvent::ReconnectScheduled { attempt, delay });
                Vec::new()
            }
            Action::StateChanged(state) => {
                self.state.set(state);
                self.emit(ClientEvent::StateChanged(state));
                Vec::new()
            }
        }
    }

    /// Open the transport while still serving commands
    ///
    /// `Shutdown` drops the in-flight attempt. Suspend and resume are applied
    /// to the machine right away; outbound frames wait for the open.
    async fn connect(&mut self, command_rx: &mut mpsc::UnboundedReceiver<ClientCommand>) -> Vec<Action> {
        debug!("[Stream] Connecting to {}", self.url);

        let mut actions = Vec::new();
        let mut outbox = Vec::new();

        let result = {
            let attempt = tokio::time::timeout(self.connect_timeout, self.transport.connect(&self.url));
            tokio::pin!(attempt);

            loop {
                tokio::select! {
                    result = &mut attempt => break result,
                    command = command_rx.recv() => match command {
                        Some(ClientCommand::Suspend) => {
                            actions.extend(self.machine.suspend());
                            self.metrics.set_pending_timers(self.machine.pending_timers());
                        }
                        Some(ClientCommand::Resume) => {
                            actions.extend(self.machine.resume(now()));
                            self.metrics.set_pending_timers(self.machine.pending_timers());
                        }
                        Some(ClientCommand::Send(message)) => outbox.push(message),
                        Some(ClientCommand::Shutdown) | None => {
                            info!("[Stream] Connect to {} abandoned by shutdown", self.url);
                            actions.extend(self.machine.close());
                            return actions;
                        }
                    },
                }
            }
        };

        let error = match result {
            Ok(Ok(())) => {
                actions.extend(self.machine.on_open(now()));
                if !self.machine.state().is_open() {
                    return actions;
                }
                match self.send_subscriptions().await {
                    Ok(()) => {
                        for message in outbox {
                            actions.extend(self.send(message).await);
                        }
                        return actions;
                    }
                    Err(e) => e,
                }
            }
            Ok(Err(e)) => e,
            Err(_) => HyperSocketError::Timeout(format!("connect to {}", self.url)),
        };

        if !outbox.is_empty() {
            warn!("[Stream] Dropping {} outbound messages after failed connect", outbox.len());
        }
        error!("[Stream] Failed to connect: {}", error);
        self.emit(ClientEvent::Error(error.to_string()));
        actions.extend(self.machine.on_failure(now(), &error.to_string()));
        actions
    }

    async fn send_subscriptions(&mut self) -> Result<()> {
        for subscription in self.subscriptions.clone() {
            self.transport.send(subscription).await?;
            self.metrics.increment_sent();
        }
        if !self.subscriptions.is_empty() {
            debug!("[Stream] Sent {} subscription messages", self.subscriptions.len());
        }
        Ok(())
    }

    async fn send(&mut self, message: WsMessage) -> Vec<Action> {
        if !self.machine.state().is_open() {
            warn!("[Stream] Dropping outbound message while {}", self.machine.state());
            return Vec::new();
        }
        match self.transport.send(message).await {
            Ok(()) => {
                self.metrics.increment_sent();
                Vec::new()
            }
            Err(e) => {
                self.emit(ClientEvent::Error(e.to_string()));
                self.machine.on_failure(now(), &e.to_string())
            }
        }
    }

    fn dispatch(&self, message: WsMessage) {
        self.metrics.increment_received();
        match self.router.parse(&message) {
            Some(parsed) => self.emit(ClientEvent::Message(parsed)),
            None => {
                self.metrics.increment_dropped();
                warn!("[Stream] Dropped unparseable message ({} bytes)", message.len());
            }
        }
    }

    fn emit(&self, event: ClientEvent<R::Message>) {
        // The host may have stopped listening; the driver keeps going until closed
        let _ = self.event_tx.send(event);
    }
}
