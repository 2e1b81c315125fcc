//! Connection state and connection error streams.
//!
//! [`ConnectionStateStore`] is owned by one manager and shared with readers.
//! It keeps the current [`ConnectionState`] in a watch channel, so new
//! observers see the latest value immediately, and fans out
//! [`ConnectionError`]s through a broadcast channel that replays the most
//! recent error to late subscribers.

use std::sync::{Mutex, PoisonError};

use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

use sphinx_core::constants::CONNECTION_ERROR_CHANNEL_CAPACITY;

use crate::transport::TransportFault;

/// Lifecycle state of the realtime connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No socket instance has been built, or it was torn down.
    Uninitialized,
    /// A socket instance exists.
    Initialized(InitializedState),
}

/// Sub-states reported by a built socket instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitializedState {
    /// The engine connection opened.
    Opened,
    Connecting,
    /// Connected; refreshed on every ping.
    Connected {
        /// Milliseconds since the unix epoch of the last connect or ping.
        at_millis: i64,
    },
    Disconnected,
    Reconnecting,
    Reconnected,
    /// The engine connection closed.
    Closed,
}

impl ConnectionState {
    pub fn is_uninitialized(&self) -> bool {
        matches!(self, Self::Uninitialized)
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Initialized(InitializedState::Connected { .. }))
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "uninitialized"),
            Self::Initialized(state) => write!(f, "{state}"),
        }
    }
}

impl std::fmt::Display for InitializedState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Opened => write!(f, "opened"),
            Self::Connecting => write!(f, "connecting"),
            Self::Connected { at_millis } => write!(f, "connected@{at_millis}"),
            Self::Disconnected => write!(f, "disconnected"),
            Self::Reconnecting => write!(f, "reconnecting"),
            Self::Reconnected => write!(f, "reconnected"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

/// Non-fatal transport failures, surfaced only through the error stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    Error(Option<TransportFault>),
    ConnectError(Option<TransportFault>),
    ReconnectError(Option<TransportFault>),
    UpgradeError(Option<TransportFault>),
}

impl ConnectionError {
    pub fn fault(&self) -> Option<&TransportFault> {
        match self {
            Self::Error(f)
            | Self::ConnectError(f)
            | Self::ReconnectError(f)
            | Self::UpgradeError(f) => f.as_ref(),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Error(_) => "ERROR",
            Self::ConnectError(_) => "CONNECT_ERROR",
            Self::ReconnectError(_) => "RECONNECT_ERROR",
            Self::UpgradeError(_) => "UPGRADE_ERROR",
        }
    }
}

impl std::fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.fault() {
            Some(fault) => write!(f, "{}: {fault}", self.label()),
            None => write!(f, "{}", self.label()),
        }
    }
}

/// Shared connection state for one socket manager.
///
/// Readers subscribe freely; only the manager writes.
pub struct ConnectionStateStore {
    state: watch::Sender<ConnectionState>,
    errors: ConnectionErrorStream,
}

impl ConnectionStateStore {
    pub fn new() -> Self {
        let (state, _) = watch::channel(ConnectionState::Uninitialized);
        Self {
            state,
            errors: ConnectionErrorStream::new(CONNECTION_ERROR_CHANNEL_CAPACITY),
        }
    }

    pub fn current(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Watch state changes. The receiver starts at the current value.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    pub fn subscribe_errors(&self) -> ConnectionErrorSubscription {
        self.errors.subscribe()
    }

    /// Move to `next` unless the store is uninitialized.
    ///
    /// Returns whether the state changed. Callbacks from a transport that was
    /// already torn down land here and are ignored.
    pub(crate) fn transition(&self, next: InitializedState) -> bool {
        let mut previous = None;
        let changed = self.state.send_if_modified(|current| {
            if current.is_uninitialized() {
                return false;
            }
            let next = ConnectionState::Initialized(next);
            if *current == next {
                return false;
            }
            previous = Some(std::mem::replace(current, next));
            true
        });

        if let Some(previous) = previous {
            debug!("socket state: {previous} -> {next}");
        }
        changed
    }

    /// Replace the state unconditionally.
    pub(crate) fn force(&self, next: ConnectionState) {
        let previous = self.state.send_replace(next);
        if previous != next {
            info!("socket state: {previous} -> {next}");
        }
    }

    /// Back to `Uninitialized`, dropping any replayable error.
    pub(crate) fn reset(&self) {
        self.force(ConnectionState::Uninitialized);
        self.errors.clear();
    }

    pub(crate) fn emit_error(&self, error: ConnectionError) {
        self.errors.emit(error);
    }
}

impl Default for ConnectionStateStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Broadcast stream of connection errors with single-value replay.
pub struct ConnectionErrorStream {
    sender: broadcast::Sender<ConnectionError>,
    // Held across both the replay read and the channel subscribe so a new
    // subscriber sees each error exactly once.
    last: Mutex<Option<ConnectionError>>,
}

impl ConnectionErrorStream {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            last: Mutex::new(None),
        }
    }

    pub fn subscribe(&self) -> ConnectionErrorSubscription {
        let last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
        ConnectionErrorSubscription {
            replay: last.clone(),
            receiver: self.sender.subscribe(),
        }
    }

    /// Publish an error. Never fails; with no subscribers the error is only
    /// kept for replay.
    pub fn emit(&self, error: ConnectionError) {
        let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
        *last = Some(error.clone());
        if let Ok(count) = self.sender.send(error) {
            debug!("connection error delivered to {count} subscriber(s)");
        }
    }

    fn clear(&self) {
        self.last.lock().unwrap_or_else(PoisonError::into_inner).take();
    }
}

/// One subscriber's view of the error stream.
pub struct ConnectionErrorSubscription {
    replay: Option<ConnectionError>,
    receiver: broadcast::Receiver<ConnectionError>,
}

impl ConnectionErrorSubscription {
    /// Next error, waiting if none is pending. `None` once the stream's
    /// owner is gone.
    pub async fn recv(&mut self) -> Option<ConnectionError> {
        if let Some(error) = self.replay.take() {
            return Some(error);
        }
        loop {
            match self.receiver.recv().await {
                Ok(error) => return Some(error),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("connection error subscriber lagged, skipped {skipped}");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Next error if one is already pending.
    pub fn try_recv(&mut self) -> Option<ConnectionError> {
        if let Some(error) = self.replay.take() {
            return Some(error);
        }
        loop {
            match self.receiver.try_recv() {
                Ok(error) => return Some(error),
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                Err(_) => return None,
            }
        }
    }
}
