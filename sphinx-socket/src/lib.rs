//! Sphinx Socket - realtime connection to a Sphinx relay.
//!
//! This crate provides the socket connection manager that handles:
//! - Lazy construction of a single socket instance from relay credentials
//! - Connection state and connection error streams
//! - Classification of relay payloads into typed messages
//! - Isolated, ordered delivery to registered message listeners
//! - Teardown when the shared network client is cleared

pub mod classifier;
pub mod credentials;
pub mod listener;
pub mod manager;
pub mod message;
pub mod network;
pub mod scope;
pub mod state;
pub mod transport;

// Re-export key types
pub use classifier::MessageClassifier;
pub use credentials::{ConfigRelayDataHandler, RelayDataHandler};
pub use listener::{ListenerRegistry, SharedListener, SphinxSocketIOMessageListener};
pub use manager::{SocketIOManager, SocketIOManagerBuilder};
pub use message::{json_type, Group, Member, MessageType, SphinxSocketIOMessage};
pub use network::{NetworkClient, NetworkClientClearedListener};
pub use state::{
    ConnectionError, ConnectionErrorStream, ConnectionErrorSubscription, ConnectionState,
    ConnectionStateStore, InitializedState,
};
pub use transport::{
    Transport, TransportEvent, TransportEventHandler, TransportFactory, TransportFault,
    TransportKind, TransportOptions,
};
