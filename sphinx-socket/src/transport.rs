//! Adapter between the socket manager and a realtime transport library.
//!
//! The manager never talks to a socket library directly. A
//! [`TransportFactory`] builds a [`Transport`] for a relay url and wires the
//! library's native callbacks into a [`TransportEventHandler`], which receives
//! them as typed [`TransportEvent`]s.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::HeaderMap;
use thiserror::Error;

use sphinx_core::config::SocketConfig;
use sphinx_core::relay::RelayUrl;

/// Transport mechanisms the library may use, in preference order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    /// HTTP long-polling.
    Polling,
    /// Upgraded websocket connection.
    WebSocket,
}

impl TransportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Polling => "polling",
            Self::WebSocket => "websocket",
        }
    }
}

/// Options handed to [`TransportFactory::build`].
#[derive(Debug, Clone)]
pub struct TransportOptions {
    /// Reconnect automatically after the connection drops.
    pub reconnection: bool,
    /// Connect timeout. The HTTP client itself runs without timeouts.
    pub timeout: Duration,
    /// Allow upgrading from polling to websocket.
    pub upgrade: bool,
    /// Reuse a previously successful upgrade on the next connection.
    pub remember_upgrade: bool,
    /// Available transports, first entry is tried first.
    pub transports: Vec<TransportKind>,
    /// Client for handshake and polling requests.
    pub http_client: reqwest::Client,
}

impl TransportOptions {
    pub fn from_config(config: &SocketConfig, http_client: reqwest::Client) -> Self {
        Self {
            reconnection: config.reconnection,
            timeout: config.connect_timeout(),
            upgrade: config.upgrade,
            remember_upgrade: config.remember_upgrade,
            transports: vec![TransportKind::Polling, TransportKind::WebSocket],
            http_client,
        }
    }
}

/// A failure reported by the transport library.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct TransportFault {
    pub message: String,
}

impl TransportFault {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Everything a transport can report back to the manager.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    Connect,
    Connecting,
    Disconnect,
    Reconnect,
    Reconnecting,
    ReconnectError(Option<TransportFault>),
    ReconnectFailed,
    Ping,
    Pong,
    /// A payload pushed by the relay, as raw JSON text.
    Message(String),
    Error(Option<TransportFault>),
    ConnectError(Option<TransportFault>),
    ConnectTimeout,
    /// The underlying engine connection opened.
    Open,
    /// The underlying engine connection closed.
    Close,
    UpgradeError(Option<TransportFault>),
}

impl TransportEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Connect => "connect",
            Self::Connecting => "connecting",
            Self::Disconnect => "disconnect",
            Self::Reconnect => "reconnect",
            Self::Reconnecting => "reconnecting",
            Self::ReconnectError(_) => "reconnect_error",
            Self::ReconnectFailed => "reconnect_failed",
            Self::Ping => "ping",
            Self::Pong => "pong",
            Self::Message(_) => "message",
            Self::Error(_) => "error",
            Self::ConnectError(_) => "connect_error",
            Self::ConnectTimeout => "connect_timeout",
            Self::Open => "open",
            Self::Close => "close",
            Self::UpgradeError(_) => "upgrade_error",
        }
    }
}

/// Receives transport callbacks.
///
/// Called from the transport's own threads, possibly concurrently with
/// `connect`/`disconnect` on the manager. Implementations must not block.
pub trait TransportEventHandler: Send + Sync {
    /// Invoked before every handshake or polling request.
    fn on_request_headers(&self, headers: &mut HeaderMap);

    fn on_event(&self, event: TransportEvent);
}

/// A live transport session.
pub trait Transport: Send + Sync {
    /// Start (or resume) connecting. Returns immediately.
    fn connect(&self);

    /// Close the connection. The transport can be connected again later.
    fn disconnect(&self);

    fn is_connected(&self) -> bool;
}

/// Builds transports for a relay url.
pub trait TransportFactory: Send + Sync {
    fn build(
        &self,
        url: &RelayUrl,
        options: TransportOptions,
        handler: Arc<dyn TransportEventHandler>,
    ) -> Result<Arc<dyn Transport>, TransportFault>;
}
