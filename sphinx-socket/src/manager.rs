//! Realtime socket connection manager.
//!
//! Owns at most one socket instance at a time, built lazily on the first
//! `connect` from the supplied or stored relay credentials. Transport
//! callbacks drive the connection state, feed the error stream and hand
//! classified messages to the registered listeners.

use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::{debug, error, info, trace, warn};
use uuid::Uuid;

use sphinx_core::config::SocketConfig;
use sphinx_core::error::{SphinxError, SphinxResult};
use sphinx_core::relay::{AuthorizationToken, RelayCredentials};

use crate::classifier::MessageClassifier;
use crate::credentials::RelayDataHandler;
use crate::listener::{ListenerRegistry, SharedListener};
use crate::network::{NetworkClient, NetworkClientClearedListener};
use crate::scope::DispatchScope;
use crate::state::{
    ConnectionError, ConnectionErrorSubscription, ConnectionState, ConnectionStateStore,
    InitializedState,
};
use crate::transport::{
    Transport, TransportEvent, TransportEventHandler, TransportFactory, TransportOptions,
};

/// State shared between the manager and the callbacks of its instances.
struct SocketShared {
    state: ConnectionStateStore,
    listeners: ListenerRegistry,
    classifier: MessageClassifier,
}

/// A built socket and everything tied to its lifetime.
struct ConnectionInstance {
    id: Uuid,
    transport: Arc<dyn Transport>,
    // Kept for the lifetime of the transport, which was built from it.
    #[allow(dead_code)]
    http_client: reqwest::Client,
    credentials: RelayCredentials,
    scope: Arc<DispatchScope>,
}

impl std::fmt::Debug for ConnectionInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionInstance")
            .field("id", &self.id)
            .field("relay_url", &self.credentials.url)
            .field("connected", &self.transport.is_connected())
            .field("scope", &self.scope)
            .finish()
    }
}

/// Builder for [`SocketIOManager`].
pub struct SocketIOManagerBuilder {
    relay_data: Arc<dyn RelayDataHandler>,
    network: Arc<NetworkClient>,
    factory: Arc<dyn TransportFactory>,
    socket_config: SocketConfig,
}

impl SocketIOManagerBuilder {
    /// Transport options used for every instance. Defaults to
    /// [`SocketConfig::default`].
    pub fn socket_config(mut self, config: SocketConfig) -> Self {
        self.socket_config = config;
        self
    }

    /// Build the manager and register it for network client clears.
    pub fn build(self) -> Arc<SocketIOManager> {
        let manager = Arc::new(SocketIOManager {
            lock: tokio::sync::Mutex::new(()),
            instance: Mutex::new(None),
            shared: Arc::new(SocketShared {
                state: ConnectionStateStore::new(),
                listeners: ListenerRegistry::new(),
                classifier: MessageClassifier::new(),
            }),
            relay_data: self.relay_data,
            network: self.network,
            factory: self.factory,
            socket_config: self.socket_config,
        });

        let weak: Weak<dyn NetworkClientClearedListener> = Arc::downgrade(&manager) as _;
        manager.network.add_listener(weak);
        manager
    }
}

/// Connection manager for the relay's realtime socket.
pub struct SocketIOManager {
    /// Serializes `connect` and `shutdown`.
    lock: tokio::sync::Mutex<()>,
    instance: Mutex<Option<Arc<ConnectionInstance>>>,
    shared: Arc<SocketShared>,
    relay_data: Arc<dyn RelayDataHandler>,
    network: Arc<NetworkClient>,
    factory: Arc<dyn TransportFactory>,
    socket_config: SocketConfig,
}

impl SocketIOManager {
    pub fn builder(
        relay_data: Arc<dyn RelayDataHandler>,
        network: Arc<NetworkClient>,
        factory: Arc<dyn TransportFactory>,
    ) -> SocketIOManagerBuilder {
        SocketIOManagerBuilder {
            relay_data,
            network,
            factory,
            socket_config: SocketConfig::default(),
        }
    }

    fn instance_slot(&self) -> MutexGuard<'_, Option<Arc<ConnectionInstance>>> {
        self.instance.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn current_instance(&self) -> Option<Arc<ConnectionInstance>> {
        self.instance_slot().clone()
    }

    /// Connect to the relay, building the socket on first use.
    ///
    /// An existing instance is reused and asked to connect again; the
    /// credentials argument is then ignored. Without an instance, the
    /// supplied credentials are used, falling back to the stored ones.
    /// Only credential and build failures are returned; connection
    /// problems after that are reported on the state and error streams.
    pub async fn connect(&self, credentials: Option<RelayCredentials>) -> SphinxResult<()> {
        let _guard = self.lock.lock().await;

        if let Some(instance) = self.current_instance() {
            debug!("reusing socket instance {}", instance.id);
            instance.transport.connect();
            return Ok(());
        }

        let instance = Arc::new(self.build_instance(credentials).await?);
        *self.instance_slot() = Some(instance.clone());
        info!(
            "socket instance {} built for {}",
            instance.id, instance.credentials.url
        );
        instance.transport.connect();
        Ok(())
    }

    async fn build_instance(
        &self,
        credentials: Option<RelayCredentials>,
    ) -> SphinxResult<ConnectionInstance> {
        let credentials = match credentials {
            Some(credentials) => credentials,
            None => self
                .relay_data
                .retrieve_relay_url_and_token()
                .await
                .map_err(|e| {
                    warn!("cannot build socket: {e}");
                    e
                })?,
        };

        let http_client = self.network.streaming_client()?;
        let options = TransportOptions::from_config(&self.socket_config, http_client.clone());

        let handle = Handle::try_current()
            .map_err(|e| SphinxError::Internal(format!("no tokio runtime for dispatch: {e}")))?;
        let scope = Arc::new(DispatchScope::new(handle));
        let id = Uuid::new_v4();

        let router = Arc::new(SocketEventRouter {
            instance_id: id,
            token: credentials.token.clone(),
            shared: self.shared.clone(),
            scope: scope.clone(),
        });

        let built = std::panic::catch_unwind(AssertUnwindSafe(|| {
            self.factory.build(&credentials.url, options, router)
        }));
        let transport = match built {
            Ok(Ok(transport)) => transport,
            Ok(Err(fault)) => {
                error!("failed to create socket-io instance: {fault}");
                return Err(SphinxError::SocketBuild(fault.to_string()));
            }
            Err(_) => {
                error!("failed to create socket-io instance: transport factory panicked");
                return Err(SphinxError::SocketBuild("transport factory panicked".into()));
            }
        };

        self.shared
            .state
            .force(ConnectionState::Initialized(InitializedState::Disconnected));

        Ok(ConnectionInstance {
            id,
            transport,
            http_client,
            credentials,
            scope,
        })
    }

    /// Ask the transport to disconnect. The instance is kept and a later
    /// `connect` reuses it.
    pub fn disconnect(&self) {
        if let Some(instance) = self.current_instance() {
            debug!("disconnecting socket instance {}", instance.id);
            instance.transport.disconnect();
        }
    }

    pub fn is_connected(&self) -> bool {
        self.current_instance()
            .map(|instance| instance.transport.is_connected())
            .unwrap_or(false)
    }

    /// Tear down the instance and drop all listeners.
    pub async fn shutdown(&self) {
        let _guard = self.lock.lock().await;
        self.teardown("shutdown");
        self.shared.listeners.clear();
    }

    /// Disconnect, cancel pending deliveries and forget the instance.
    fn teardown(&self, reason: &str) -> bool {
        let Some(instance) = self.instance_slot().take() else {
            return false;
        };
        instance.transport.disconnect();
        instance.scope.cancel();
        self.shared.state.reset();
        info!("socket instance {} torn down ({reason})", instance.id);
        true
    }

    pub fn add_listener(&self, listener: SharedListener) -> bool {
        let added = self.shared.listeners.add(listener.clone());
        if added {
            debug!("listener {} registered", listener.name());
        }
        added
    }

    pub fn remove_listener(&self, listener: &SharedListener) -> bool {
        let removed = self.shared.listeners.remove(listener);
        if removed {
            if let Some(instance) = self.current_instance() {
                instance.scope.release(listener);
            }
            debug!("listener {} removed", listener.name());
        }
        removed
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.shared.state.current()
    }

    /// Watch connection state. Starts at the current value.
    pub fn connection_state_stream(&self) -> watch::Receiver<ConnectionState> {
        self.shared.state.subscribe()
    }

    /// Subscribe to connection errors. The most recent error, if any, is
    /// delivered first.
    pub fn connection_error_stream(&self) -> ConnectionErrorSubscription {
        self.shared.state.subscribe_errors()
    }

    /// Id of the live socket instance.
    pub fn instance_id(&self) -> Option<Uuid> {
        self.current_instance().map(|instance| instance.id)
    }

    pub fn classifier(&self) -> &MessageClassifier {
        &self.shared.classifier
    }
}

impl NetworkClientClearedListener for SocketIOManager {
    /// Best effort: the instance is torn down whether or not the lock could
    /// be taken, and the lock is only released if it was.
    fn network_client_cleared(&self) {
        let guard = self.lock.try_lock().ok();
        if guard.is_none() {
            debug!("network client cleared while connect in progress");
        }
        self.teardown("network client cleared");
        drop(guard);
    }
}

impl Drop for SocketIOManager {
    fn drop(&mut self) {
        if let Some(instance) = self.instance_slot().take() {
            instance.transport.disconnect();
            instance.scope.cancel();
        }
    }
}

/// Transport callbacks for one socket instance.
struct SocketEventRouter {
    instance_id: Uuid,
    token: AuthorizationToken,
    shared: Arc<SocketShared>,
    scope: Arc<DispatchScope>,
}

impl SocketEventRouter {
    fn set_state(&self, next: InitializedState) {
        self.shared.state.transition(next);
    }

    fn report(&self, error: ConnectionError) {
        error!("socket {}: {error}", self.instance_id);
        self.shared.state.emit_error(error);
    }

    fn handle_message(&self, raw: String) {
        trace!("socket {} MESSAGE: {raw}", self.instance_id);
        if !self.shared.listeners.has_listeners() {
            return;
        }
        match self.shared.classifier.classify(&raw) {
            Ok(message) => {
                self.shared.listeners.dispatch(message, &self.scope);
            }
            Err(e) => error!("socket {}: dropping message: {e}", self.instance_id),
        }
    }
}

impl TransportEventHandler for SocketEventRouter {
    fn on_request_headers(&self, headers: &mut HeaderMap) {
        let name = HeaderName::from_bytes(AuthorizationToken::HEADER.as_bytes());
        let value = HeaderValue::from_str(self.token.as_str());
        match (name, value) {
            (Ok(name), Ok(mut value)) => {
                value.set_sensitive(true);
                headers.insert(name, value);
            }
            (Err(e), _) => error!("adding authorization to request headers failed: {e}"),
            (_, Err(e)) => error!("adding authorization to request headers failed: {e}"),
        }
    }

    fn on_event(&self, event: TransportEvent) {
        if self.scope.is_cancelled() {
            debug!(
                "socket {} torn down, ignoring {}",
                self.instance_id,
                event.name()
            );
            return;
        }

        match event {
            TransportEvent::Connect => self.set_state(InitializedState::Connected {
                at_millis: chrono::Utc::now().timestamp_millis(),
            }),
            TransportEvent::Ping => self.set_state(InitializedState::Connected {
                at_millis: chrono::Utc::now().timestamp_millis(),
            }),
            TransportEvent::Connecting => self.set_state(InitializedState::Connecting),
            TransportEvent::Disconnect => self.set_state(InitializedState::Disconnected),
            TransportEvent::Reconnect => self.set_state(InitializedState::Reconnected),
            TransportEvent::Reconnecting => self.set_state(InitializedState::Reconnecting),
            TransportEvent::Open => self.set_state(InitializedState::Opened),
            TransportEvent::Close => self.set_state(InitializedState::Closed),
            TransportEvent::ConnectTimeout
            | TransportEvent::ReconnectFailed
            | TransportEvent::Pong => {
                debug!("socket {} {}", self.instance_id, event.name())
            }
            TransportEvent::Error(fault) => self.report(ConnectionError::Error(fault)),
            TransportEvent::ConnectError(fault) => {
                self.report(ConnectionError::ConnectError(fault))
            }
            TransportEvent::ReconnectError(fault) => {
                self.report(ConnectionError::ReconnectError(fault))
            }
            TransportEvent::UpgradeError(fault) => {
                self.report(ConnectionError::UpgradeError(fault))
            }
            TransportEvent::Message(raw) => self.handle_message(raw),
        }
    }
}
