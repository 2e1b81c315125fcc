//! Shared test utilities for integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use tokio::sync::mpsc;

use sphinx_core::config::NetworkConfig;
use sphinx_core::error::{SphinxError, SphinxResult};
use sphinx_core::relay::{AuthorizationToken, RelayCredentials, RelayUrl};
use sphinx_socket::{
    NetworkClient, RelayDataHandler, SocketIOManager, SphinxSocketIOMessage,
    SphinxSocketIOMessageListener, Transport, TransportEvent, TransportEventHandler,
    TransportFactory, TransportFault, TransportOptions,
};

pub const TOKEN: &str = "test-auth-token";
pub const RELAY_URL: &str = "https://relay.test:3001";

/// How long tests wait for an asynchronous delivery.
pub const DELIVERY_TIMEOUT: Duration = Duration::from_secs(2);

pub fn credentials() -> RelayCredentials {
    credentials_for(RELAY_URL)
}

pub fn credentials_for(url: &str) -> RelayCredentials {
    RelayCredentials::new(
        AuthorizationToken::new(TOKEN).expect("valid token"),
        RelayUrl::new(url).expect("valid url"),
    )
}

/// Raw relay payload: `{"type": kind, "response": response}`.
pub fn envelope(kind: &str, response: serde_json::Value) -> String {
    serde_json::json!({ "type": kind, "response": response }).to_string()
}

pub fn message_payload(kind: &str, id: i64) -> String {
    envelope(
        kind,
        serde_json::json!({ "id": id, "uuid": format!("msg-{id}"), "type": 0, "sender": 1 }),
    )
}

// ---- Transport ----

/// In-memory transport. Tests drive it by emitting events into the handler
/// the manager registered.
pub struct FakeTransport {
    pub url: RelayUrl,
    pub options: TransportOptions,
    handler: Arc<dyn TransportEventHandler>,
    connected: AtomicBool,
    connect_calls: AtomicUsize,
    disconnect_calls: AtomicUsize,
}

impl FakeTransport {
    pub fn emit(&self, event: TransportEvent) {
        self.handler.on_event(event);
    }

    pub fn emit_message(&self, raw: impl Into<String>) {
        self.emit(TransportEvent::Message(raw.into()));
    }

    /// Headers the transport would send with a handshake request.
    pub fn request_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        self.handler.on_request_headers(&mut headers);
        headers
    }

    pub fn connect_calls(&self) -> usize {
        self.connect_calls.load(Ordering::SeqCst)
    }

    pub fn disconnect_calls(&self) -> usize {
        self.disconnect_calls.load(Ordering::SeqCst)
    }
}

impl Transport for FakeTransport {
    fn connect(&self) {
        self.connect_calls.fetch_add(1, Ordering::SeqCst);
        self.connected.store(true, Ordering::SeqCst);
    }

    fn disconnect(&self) {
        self.disconnect_calls.fetch_add(1, Ordering::SeqCst);
        self.connected.store(false, Ordering::SeqCst);
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

#[derive(Default)]
pub struct FakeTransportFactory {
    builds: AtomicUsize,
    failing: AtomicBool,
    transports: Mutex<Vec<Arc<FakeTransport>>>,
}

impl FakeTransportFactory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn build_count(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// The most recently built transport.
    pub fn last(&self) -> Arc<FakeTransport> {
        self.transports
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no transport built yet")
    }
}

impl TransportFactory for FakeTransportFactory {
    fn build(
        &self,
        url: &RelayUrl,
        options: TransportOptions,
        handler: Arc<dyn TransportEventHandler>,
    ) -> Result<Arc<dyn Transport>, TransportFault> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(TransportFault::new("malformed relay url"));
        }
        self.builds.fetch_add(1, Ordering::SeqCst);
        let transport = Arc::new(FakeTransport {
            url: url.clone(),
            options,
            handler,
            connected: AtomicBool::new(false),
            connect_calls: AtomicUsize::new(0),
            disconnect_calls: AtomicUsize::new(0),
        });
        self.transports.lock().unwrap().push(transport.clone());
        Ok(transport)
    }
}

// ---- Credentials ----

/// Credential store with fixed contents.
#[derive(Default)]
pub struct StaticRelayData {
    url: Option<RelayUrl>,
    token: Option<AuthorizationToken>,
    lookups: AtomicUsize,
}

impl StaticRelayData {
    pub fn empty() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with(credentials: RelayCredentials) -> Arc<Self> {
        Arc::new(Self {
            url: Some(credentials.url),
            token: Some(credentials.token),
            lookups: AtomicUsize::new(0),
        })
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RelayDataHandler for StaticRelayData {
    async fn persist_relay_url(&self, _url: &RelayUrl) -> SphinxResult<()> {
        Err(SphinxError::Internal("read-only store".into()))
    }

    async fn retrieve_relay_url(&self) -> Option<RelayUrl> {
        self.url.clone()
    }

    async fn persist_authorization_token(&self, _token: &AuthorizationToken) -> SphinxResult<()> {
        Err(SphinxError::Internal("read-only store".into()))
    }

    async fn retrieve_authorization_token(&self) -> Option<AuthorizationToken> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.token.clone()
    }
}

// ---- Listeners ----

/// Forwards every message it receives to a channel.
pub struct RecordingListener {
    tx: mpsc::UnboundedSender<SphinxSocketIOMessage>,
}

impl RecordingListener {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<SphinxSocketIOMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { tx }), rx)
    }
}

#[async_trait]
impl SphinxSocketIOMessageListener for RecordingListener {
    async fn on_socket_io_message_received(
        &self,
        message: &SphinxSocketIOMessage,
    ) -> SphinxResult<()> {
        let _ = self.tx.send(message.clone());
        Ok(())
    }

    fn name(&self) -> &str {
        "RecordingListener"
    }
}

/// Never finishes handling a message.
#[derive(Default)]
pub struct BlockingListener {
    pub started: AtomicUsize,
}

#[async_trait]
impl SphinxSocketIOMessageListener for BlockingListener {
    async fn on_socket_io_message_received(
        &self,
        _message: &SphinxSocketIOMessage,
    ) -> SphinxResult<()> {
        self.started.fetch_add(1, Ordering::SeqCst);
        std::future::pending::<()>().await;
        Ok(())
    }
}

/// Fails every delivery, by error or by panic.
pub struct FailingListener {
    pub panics: bool,
}

#[async_trait]
impl SphinxSocketIOMessageListener for FailingListener {
    async fn on_socket_io_message_received(
        &self,
        message: &SphinxSocketIOMessage,
    ) -> SphinxResult<()> {
        if self.panics {
            panic!("listener cannot handle {}", message.kind_name());
        }
        Err(SphinxError::Listener(format!("rejected {}", message.kind_name())))
    }
}

// ---- Manager ----

pub struct TestHarness {
    pub manager: Arc<SocketIOManager>,
    pub factory: Arc<FakeTransportFactory>,
    pub network: Arc<NetworkClient>,
    pub relay_data: Arc<StaticRelayData>,
}

pub fn harness() -> TestHarness {
    harness_with(StaticRelayData::with(credentials()))
}

pub fn harness_with(relay_data: Arc<StaticRelayData>) -> TestHarness {
    sphinx_core::logging::init_console_logging("sphinx_socket=debug,warn");
    let factory = FakeTransportFactory::new();
    let network = Arc::new(NetworkClient::new(NetworkConfig::default()));
    let manager = SocketIOManager::builder(relay_data.clone(), network.clone(), factory.clone())
        .build();
    TestHarness {
        manager,
        factory,
        network,
        relay_data,
    }
}

/// Next message from a recording listener, or `None` on timeout.
pub async fn next_message(
    rx: &mut mpsc::UnboundedReceiver<SphinxSocketIOMessage>,
) -> Option<SphinxSocketIOMessage> {
    tokio::time::timeout(DELIVERY_TIMEOUT, rx.recv())
        .await
        .ok()
        .flatten()
}

/// Assert nothing arrives within a short window.
pub async fn assert_no_message(rx: &mut mpsc::UnboundedReceiver<SphinxSocketIOMessage>) {
    let waited = tokio::time::timeout(Duration::from_millis(100), rx.recv()).await;
    assert!(
        !matches!(waited, Ok(Some(_))),
        "unexpected message delivered"
    );
}
