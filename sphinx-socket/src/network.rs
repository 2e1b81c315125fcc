//! Shared HTTP client and its clear notifications.
//!
//! Components that derive their own clients from the shared one (the socket
//! manager builds a streaming client without timeouts) register a
//! [`NetworkClientClearedListener`] so they can tear down before the shared
//! client goes away.

use std::sync::{Mutex, PoisonError, RwLock, Weak};
use std::time::Duration;

use reqwest::Client;
use tracing::{debug, info};

use sphinx_core::config::NetworkConfig;
use sphinx_core::constants;
use sphinx_core::error::{SphinxError, SphinxResult};
use sphinx_core::platform::Platform;

/// Notified when the shared network client is cleared.
pub trait NetworkClientClearedListener: Send + Sync {
    /// Called before the shared client is dropped. Must not block.
    fn network_client_cleared(&self);
}

fn user_agent() -> String {
    format!(
        "{}/{} ({})",
        constants::APP_NAME,
        constants::APP_VERSION,
        Platform::current()
    )
}

/// Owner of the shared `reqwest::Client`.
pub struct NetworkClient {
    config: NetworkConfig,
    client: RwLock<Option<Client>>,
    listeners: Mutex<Vec<Weak<dyn NetworkClientClearedListener>>>,
}

impl NetworkClient {
    pub fn new(config: NetworkConfig) -> Self {
        Self {
            config,
            client: RwLock::new(None),
            listeners: Mutex::new(Vec::new()),
        }
    }

    /// The shared client for REST calls, built on first use.
    pub fn client(&self) -> SphinxResult<Client> {
        if let Some(client) = self
            .client
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            return Ok(client.clone());
        }

        let mut slot = self.client.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(client) = slot.as_ref() {
            return Ok(client.clone());
        }

        let mut builder = Client::builder()
            .user_agent(user_agent())
            .timeout(Duration::from_millis(self.config.request_timeout_ms))
            .connect_timeout(Duration::from_millis(self.config.connect_timeout_ms))
            .pool_max_idle_per_host(5)
            .tcp_keepalive(Duration::from_secs(30));
        if self.config.accept_self_signed_certs {
            builder = builder.danger_accept_invalid_certs(true);
        }

        let client = builder
            .build()
            .map_err(|e| SphinxError::Http(format!("failed to build HTTP client: {e}")))?;
        debug!("shared network client built");
        *slot = Some(client.clone());
        Ok(client)
    }

    /// A fresh client for long-lived streaming connections.
    ///
    /// No request, connect or idle timeouts; the transport applies its own
    /// connect timeout.
    pub fn streaming_client(&self) -> SphinxResult<Client> {
        let mut builder = Client::builder()
            .user_agent(user_agent())
            .pool_idle_timeout(None)
            .tcp_keepalive(Duration::from_secs(30));
        if self.config.accept_self_signed_certs {
            builder = builder.danger_accept_invalid_certs(true);
        }
        builder
            .build()
            .map_err(|e| SphinxError::Http(format!("failed to build streaming client: {e}")))
    }

    /// Register a listener. Held weakly; dropped listeners are pruned.
    pub fn add_listener(&self, listener: Weak<dyn NetworkClientClearedListener>) -> bool {
        let mut listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        listeners.retain(|l| l.strong_count() > 0);
        if listeners.iter().any(|l| Weak::ptr_eq(l, &listener)) {
            return false;
        }
        listeners.push(listener);
        true
    }

    pub fn remove_listener(&self, listener: &Weak<dyn NetworkClientClearedListener>) -> bool {
        let mut listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        let before = listeners.len();
        listeners.retain(|l| l.strong_count() > 0 && !Weak::ptr_eq(l, listener));
        listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|l| l.strong_count() > 0)
            .count()
    }

    /// Notify every listener, then drop the shared client.
    ///
    /// The next [`client`](Self::client) call builds a new one.
    pub fn clear(&self) {
        let live: Vec<_> = {
            let mut listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
            listeners.retain(|l| l.strong_count() > 0);
            listeners.iter().filter_map(Weak::upgrade).collect()
        };

        info!("clearing network client, notifying {} listener(s)", live.len());
        for listener in live {
            listener.network_client_cleared();
        }

        self.client
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Default)]
    struct Counter(AtomicUsize);

    impl NetworkClientClearedListener for Counter {
        fn network_client_cleared(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_clear_notifies_live_listeners() {
        let network = NetworkClient::new(NetworkConfig::default());
        let counter = Arc::new(Counter::default());
        let weak: Weak<dyn NetworkClientClearedListener> = Arc::downgrade(&counter) as _;

        assert!(network.add_listener(weak.clone()));
        assert!(!network.add_listener(weak.clone()));

        network.clear();
        network.clear();
        assert_eq!(counter.0.load(Ordering::SeqCst), 2);

        assert!(network.remove_listener(&weak));
        network.clear();
        assert_eq!(counter.0.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_dropped_listener_is_pruned() {
        let network = NetworkClient::new(NetworkConfig::default());
        let counter = Arc::new(Counter::default());
        network.add_listener(Arc::downgrade(&counter) as Weak<dyn NetworkClientClearedListener>);
        assert_eq!(network.listener_count(), 1);
        drop(counter);
        assert_eq!(network.listener_count(), 0);
        network.clear();
    }

    #[test]
    fn test_user_agent_names_app_and_platform() {
        let agent = user_agent();
        assert!(agent.starts_with(constants::APP_NAME));
        assert!(agent.ends_with(&format!("({})", Platform::current())));
    }

    #[test]
    fn test_clients_build() {
        let network = NetworkClient::new(NetworkConfig::default());
        assert!(network.client().is_ok());
        assert!(network.streaming_client().is_ok());
    }
}
