//! Consumer interface to the streaming feed
//!
//! [`FeedClient::subscribe`] spawns one connection-manager task per session
//! and hands back a [`FeedHandle`]. The handle never surfaces transport
//! failures as errors; the consumer observes a connectivity flag, an
//! optional last-error string, and the bounded message buffer.

use super::manager::{Command, ConnectionManager, SessionState};
use super::sink::DEFAULT_SINK_CAPACITY;
use super::types::{FeedMessage, TradeRecord};
use crate::ws::{Transport, WsConfig, WsError, WsTransport};
use std::collections::BTreeSet;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Streaming feed client
///
/// Cheap to construct; each [`subscribe`](Self::subscribe) call creates an
/// independent session with its own socket and message buffer.
pub struct FeedClient {
    config: WsConfig,
    sink_capacity: usize,
}

impl FeedClient {
    /// Create a client with the given transport configuration
    pub fn new(config: WsConfig) -> Self {
        Self {
            config,
            sink_capacity: DEFAULT_SINK_CAPACITY,
        }
    }

    /// Set how many inbound messages each session retains
    pub fn sink_capacity(mut self, capacity: usize) -> Self {
        self.sink_capacity = capacity;
        self
    }

    /// Open a live feed session for the given symbols
    ///
    /// With no access token configured, no connection is attempted: the
    /// returned handle reports the configuration error through
    /// [`FeedHandle::last_error`] and stays disconnected.
    pub fn subscribe<I, S>(&self, symbols: I) -> FeedHandle
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.subscribe_with(Box::new(WsTransport::new()), symbols)
    }

    /// Open a session over a caller-supplied transport
    ///
    /// This is the seam the test harness uses to script connection outcomes.
    pub fn subscribe_with<I, S>(&self, transport: Box<dyn Transport>, symbols: I) -> FeedHandle
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let symbols: BTreeSet<String> = symbols.into_iter().map(Into::into).collect();
        let (cmd_tx, cmd_rx) = mpsc::channel(16);

        if symbols.is_empty() {
            tracing::warn!("no symbols provided, returning inert session");
            return FeedHandle {
                shared: Arc::new(SessionState::new(self.sink_capacity)),
                cmd_tx,
                task: None,
            };
        }

        if !self.config.has_token() {
            tracing::error!("feed access token missing, not connecting");
            let shared = Arc::new(SessionState::with_config_error(
                self.sink_capacity,
                WsError::MissingToken.to_string(),
            ));
            // cmd_rx drops here; handle commands become no-ops
            return FeedHandle {
                shared,
                cmd_tx,
                task: None,
            };
        }

        let shared = Arc::new(SessionState::new(self.sink_capacity));
        let manager = ConnectionManager::new(
            self.config.clone(),
            transport,
            symbols,
            Arc::clone(&shared),
            cmd_rx,
        );
        let task = tokio::spawn(manager.run());

        FeedHandle {
            shared,
            cmd_tx,
            task: Some(task),
        }
    }
}

/// Handle to one live feed session
///
/// Dropping the handle without calling [`close`](Self::close) tears the
/// session down as well, once the manager observes the closed command
/// channel.
pub struct FeedHandle {
    shared: Arc<SessionState>,
    cmd_tx: mpsc::Sender<Command>,
    task: Option<JoinHandle<()>>,
}

impl FeedHandle {
    /// Whether the socket is currently open with subscriptions sent
    pub fn connected(&self) -> bool {
        self.shared.connected.load(Ordering::SeqCst)
    }

    /// Most recent transport or configuration error, cleared on every
    /// successful open
    pub async fn last_error(&self) -> Option<String> {
        self.shared.last_error.read().await.clone()
    }

    /// Point-in-time view of the retained messages, oldest first
    pub async fn messages(&self) -> Vec<FeedMessage> {
        self.shared.sink.read().await.snapshot()
    }

    /// Trade records extracted from the retained messages, oldest first
    pub async fn trades(&self) -> Vec<TradeRecord> {
        self.messages()
            .await
            .iter()
            .flat_map(|m| m.trades())
            .collect()
    }

    /// Messages appended over the session's lifetime, including evicted ones
    pub async fn total_messages(&self) -> u64 {
        self.shared.sink.read().await.total_appended()
    }

    /// Replace the subscription set
    ///
    /// On a live connection this unsubscribes removed symbols and subscribes
    /// added ones; otherwise the new set takes effect on the next open. An
    /// empty set releases the session.
    pub async fn update_symbols<I, S>(&self, symbols: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let symbols: BTreeSet<String> = symbols.into_iter().map(Into::into).collect();
        // Ignored after teardown
        let _ = self.cmd_tx.send(Command::UpdateSymbols(symbols)).await;
    }

    /// Release the session: unsubscribe, close the socket, cancel any
    /// pending reconnect
    ///
    /// Idempotent; a second call is a no-op. Returns once teardown has
    /// completed, so no reconnect can fire afterwards.
    pub async fn close(&mut self) {
        let _ = self.cmd_tx.send(Command::Close).await;
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}
