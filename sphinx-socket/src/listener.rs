//! Message listeners and the registry the manager dispatches to.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tracing::debug;

use sphinx_core::error::SphinxResult;

use crate::message::SphinxSocketIOMessage;
use crate::scope::DispatchScope;

/// Receives every classified realtime message.
///
/// Deliveries to one listener happen in arrival order. A slow or failing
/// listener never delays or affects the others.
#[async_trait]
pub trait SphinxSocketIOMessageListener: Send + Sync {
    async fn on_socket_io_message_received(
        &self,
        message: &SphinxSocketIOMessage,
    ) -> SphinxResult<()>;

    /// Name used in logs when a delivery fails.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

pub type SharedListener = Arc<dyn SphinxSocketIOMessageListener>;

/// Listener identity is the allocation, not the value.
pub(crate) fn same_listener(a: &SharedListener, b: &SharedListener) -> bool {
    Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
}

/// Ordered set of listeners, guarded by its own lock.
#[derive(Default)]
pub struct ListenerRegistry {
    listeners: Mutex<Vec<SharedListener>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<SharedListener>> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a listener. Returns `false` if it was already present.
    pub fn add(&self, listener: SharedListener) -> bool {
        let mut listeners = self.lock();
        if listeners.iter().any(|l| same_listener(l, &listener)) {
            return false;
        }
        listeners.push(listener);
        true
    }

    /// Unregister a listener. Returns `false` if it was not present.
    pub fn remove(&self, listener: &SharedListener) -> bool {
        let mut listeners = self.lock();
        let before = listeners.len();
        listeners.retain(|l| !same_listener(l, listener));
        listeners.len() != before
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn has_listeners(&self) -> bool {
        !self.lock().is_empty()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Copy of the current listeners in registration order.
    pub fn snapshot(&self) -> Vec<SharedListener> {
        self.lock().clone()
    }

    /// Hand `message` to every current listener through `scope`.
    ///
    /// Returns how many listeners it was submitted to. Never waits for a
    /// listener to finish.
    pub fn dispatch(&self, message: SphinxSocketIOMessage, scope: &DispatchScope) -> usize {
        let listeners = self.snapshot();
        if listeners.is_empty() {
            return 0;
        }
        let submitted = scope.submit(&listeners, Arc::new(message));
        debug!("socket message submitted to {submitted}/{} listener(s)", listeners.len());
        submitted
    }
}
