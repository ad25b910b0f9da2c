//! Connection manager
//!
//! Owns the socket lifecycle for one feed session: connect, subscribe,
//! reconnect with exponential backoff, resubscribe after every reconnect,
//! and tear down on request. Runs as a single task; transport events, timer
//! expiry, and consumer commands are multiplexed on one select loop, so the
//! sink has exactly one writer.

use super::sink::MessageSink;
use super::types::{ControlFrame, FeedMessage};
use crate::ws::{Connection, Transport, WsConfig, WsError};
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, RwLock};

/// Commands from the consumer handle
#[derive(Debug)]
pub(crate) enum Command {
    /// Replace the subscription set
    UpdateSymbols(BTreeSet<String>),
    /// Tear the session down
    Close,
}

/// State shared between the manager task and the consumer handle
#[derive(Debug)]
pub(crate) struct SessionState {
    pub connected: AtomicBool,
    pub last_error: RwLock<Option<String>>,
    pub sink: RwLock<MessageSink>,
}

impl SessionState {
    pub fn new(sink_capacity: usize) -> Self {
        Self {
            connected: AtomicBool::new(false),
            last_error: RwLock::new(None),
            sink: RwLock::new(MessageSink::new(sink_capacity)),
        }
    }

    /// State for a session that failed configuration checks and never runs
    pub fn with_config_error(sink_capacity: usize, error: impl Into<String>) -> Self {
        Self {
            connected: AtomicBool::new(false),
            last_error: RwLock::new(Some(error.into())),
            sink: RwLock::new(MessageSink::new(sink_capacity)),
        }
    }
}

/// Reconnect delay for the given attempt number (first attempt = 1)
///
/// Doubles per attempt from `initial` up to `max`. The shift operand is
/// clamped so the multiplier cannot overflow however long a flaky session
/// keeps counting.
pub(crate) fn backoff_delay(initial: Duration, max: Duration, attempt: u32) -> Duration {
    let exp = attempt.saturating_sub(1).min(16);
    initial.saturating_mul(1u32 << exp).min(max)
}

/// What the state machine does next
enum Step {
    /// Open a new socket
    Connect,
    /// Pump the open socket
    Drive(Box<dyn Connection>),
    /// Wait out the backoff delay, then reconnect
    Backoff(Duration),
    /// Terminal: session released
    Done,
}

/// Events multiplexed inside the drive loop
enum DriveEvent {
    Frame(Option<Result<String, WsError>>),
    Cmd(Option<Command>),
}

/// State machine driving one feed session
pub(crate) struct ConnectionManager {
    config: WsConfig,
    transport: Box<dyn Transport>,
    symbols: BTreeSet<String>,
    /// Consecutive failed-connection count; reset on every successful open
    attempt: u32,
    shared: Arc<SessionState>,
    cmd_rx: mpsc::Receiver<Command>,
}

impl ConnectionManager {
    pub fn new(
        config: WsConfig,
        transport: Box<dyn Transport>,
        symbols: BTreeSet<String>,
        shared: Arc<SessionState>,
        cmd_rx: mpsc::Receiver<Command>,
    ) -> Self {
        Self {
            config,
            transport,
            symbols,
            attempt: 0,
            shared,
            cmd_rx,
        }
    }

    /// Run the session to completion
    pub async fn run(mut self) {
        let mut step = Step::Connect;
        loop {
            step = match step {
                Step::Connect => self.connect_once().await,
                Step::Drive(conn) => self.drive(conn).await,
                Step::Backoff(delay) => self.await_reconnect(delay).await,
                Step::Done => break,
            };
        }
        self.shared.connected.store(false, Ordering::SeqCst);
        tracing::debug!("feed session released");
    }

    /// Open a socket; commands are still honored while the handshake is in
    /// flight, and a close aborts it
    async fn connect_once(&mut self) -> Step {
        tracing::info!(url = %self.config.url, symbols = self.symbols.len(), "connecting to feed");

        let outcome = {
            let Self {
                transport,
                cmd_rx,
                config,
                symbols,
                ..
            } = self;
            let url = config.connect_url();
            let connect = transport.connect(&url);
            tokio::pin!(connect);
            loop {
                tokio::select! {
                    res = &mut connect => break Some(res),
                    cmd = cmd_rx.recv() => match cmd {
                        Some(Command::UpdateSymbols(next)) if next.is_empty() => break None,
                        Some(Command::UpdateSymbols(next)) => *symbols = next,
                        Some(Command::Close) | None => break None,
                    }
                }
            }
        };

        match outcome {
            None => Step::Done,
            Some(Ok(conn)) => self.on_open(conn).await,
            Some(Err(e)) => self.on_disconnect(e.to_string()).await,
        }
    }

    /// Handshake complete: resubscribe the full current set
    ///
    /// The feed does not persist subscriptions across a dropped socket, so
    /// every open sends the whole set, not a delta.
    async fn on_open(&mut self, mut conn: Box<dyn Connection>) -> Step {
        for symbol in self.symbols.clone() {
            if let Err(e) = send_frame(conn.as_mut(), &ControlFrame::subscribe(symbol)).await {
                return self.on_disconnect(e.to_string()).await;
            }
        }

        self.attempt = 0;
        *self.shared.last_error.write().await = None;
        self.shared.connected.store(true, Ordering::SeqCst);
        tracing::info!(symbols = self.symbols.len(), "feed connected, subscriptions sent");
        Step::Drive(conn)
    }

    /// Pump the open socket until it drops or the consumer intervenes
    async fn drive(&mut self, mut conn: Box<dyn Connection>) -> Step {
        loop {
            let event = tokio::select! {
                frame = conn.next_text() => DriveEvent::Frame(frame),
                cmd = self.cmd_rx.recv() => DriveEvent::Cmd(cmd),
            };

            match event {
                DriveEvent::Frame(Some(Ok(text))) => {
                    self.shared
                        .sink
                        .write()
                        .await
                        .append(FeedMessage::from_text(text));
                }
                DriveEvent::Frame(Some(Err(e))) => {
                    conn.close().await;
                    return self.on_disconnect(e.to_string()).await;
                }
                DriveEvent::Frame(None) => {
                    return self.on_disconnect("connection closed by feed".to_string()).await;
                }
                DriveEvent::Cmd(Some(Command::UpdateSymbols(next))) => {
                    if next.is_empty() {
                        return self.teardown(conn).await;
                    }
                    if let Err(e) = self.apply_symbol_diff(conn.as_mut(), next).await {
                        conn.close().await;
                        return self.on_disconnect(e.to_string()).await;
                    }
                }
                DriveEvent::Cmd(Some(Command::Close)) | DriveEvent::Cmd(None) => {
                    return self.teardown(conn).await;
                }
            }
        }
    }

    /// Send unsubscribe/subscribe frames for the symbol delta on a live socket
    async fn apply_symbol_diff(
        &mut self,
        conn: &mut dyn Connection,
        next: BTreeSet<String>,
    ) -> Result<(), WsError> {
        for removed in self.symbols.difference(&next) {
            send_frame(conn, &ControlFrame::unsubscribe(removed.clone())).await?;
        }
        for added in next.difference(&self.symbols) {
            send_frame(conn, &ControlFrame::subscribe(added.clone())).await?;
        }
        tracing::debug!(symbols = next.len(), "subscription set updated");
        self.symbols = next;
        Ok(())
    }

    /// Caller-initiated release: best-effort unsubscribe, then terminal Idle
    async fn teardown(&mut self, mut conn: Box<dyn Connection>) -> Step {
        for symbol in self.symbols.clone() {
            // Unsubscribe failures on the way out are swallowed; teardown
            // always runs to completion.
            let _ = send_frame(conn.as_mut(), &ControlFrame::unsubscribe(symbol)).await;
        }
        conn.close().await;
        self.shared.connected.store(false, Ordering::SeqCst);
        tracing::info!("feed session closed");
        Step::Done
    }

    /// Transport error or unsolicited close: record it and schedule a retry
    async fn on_disconnect(&mut self, reason: String) -> Step {
        self.shared.connected.store(false, Ordering::SeqCst);
        *self.shared.last_error.write().await = Some(reason.clone());

        self.attempt += 1;
        let delay = backoff_delay(
            self.config.initial_reconnect_delay,
            self.config.max_reconnect_delay,
            self.attempt,
        );
        tracing::warn!(
            error = %reason,
            attempt = self.attempt,
            delay_ms = delay.as_millis() as u64,
            "feed disconnected, reconnect scheduled"
        );
        Step::Backoff(delay)
    }

    /// Wait out the backoff delay; a close cancels the pending reconnect
    async fn await_reconnect(&mut self, delay: Duration) -> Step {
        let sleep = tokio::time::sleep(delay);
        tokio::pin!(sleep);
        loop {
            let cmd = tokio::select! {
                _ = &mut sleep => return Step::Connect,
                cmd = self.cmd_rx.recv() => cmd,
            };
            match cmd {
                Some(Command::UpdateSymbols(next)) if next.is_empty() => return Step::Done,
                Some(Command::UpdateSymbols(next)) => self.symbols = next,
                Some(Command::Close) | None => return Step::Done,
            }
        }
    }
}

/// Serialize and send one control frame
async fn send_frame(conn: &mut dyn Connection, frame: &ControlFrame) -> Result<(), WsError> {
    match serde_json::to_string(frame) {
        Ok(text) => conn.send_text(&text).await,
        Err(e) => Err(WsError::SendFailed(e.to_string())),
    }
}
