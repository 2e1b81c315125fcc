//! Supervisory scope for listener deliveries of one socket instance.
//!
//! Each listener gets a mailbox drained by its own worker task, so one
//! listener sees messages in arrival order while a stuck listener only
//! stalls its own mailbox. Cancelling the scope stops every worker at its
//! next await point without waiting for in-flight deliveries.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, PoisonError};

use futures::FutureExt;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::listener::SharedListener;
use crate::message::SphinxSocketIOMessage;

type Mailbox = mpsc::UnboundedSender<Arc<SphinxSocketIOMessage>>;

pub struct DispatchScope {
    handle: Handle,
    token: CancellationToken,
    mailboxes: Mutex<HashMap<usize, Mailbox>>,
}

fn listener_key(listener: &SharedListener) -> usize {
    Arc::as_ptr(listener) as *const () as usize
}

impl DispatchScope {
    /// Create a scope whose workers run on `handle`.
    pub fn new(handle: Handle) -> Self {
        Self {
            handle,
            token: CancellationToken::new(),
            mailboxes: Mutex::new(HashMap::new()),
        }
    }

    /// Queue `message` for each listener, starting workers as needed.
    ///
    /// Mailboxes of listeners missing from `listeners` are closed; their
    /// workers finish what is queued and exit. Returns the number of
    /// mailboxes the message was queued on.
    pub fn submit(
        &self,
        listeners: &[SharedListener],
        message: Arc<SphinxSocketIOMessage>,
    ) -> usize {
        if self.token.is_cancelled() {
            debug!("dispatch scope cancelled, dropping {}", message.kind_name());
            return 0;
        }

        let mut mailboxes = self.mailboxes.lock().unwrap_or_else(PoisonError::into_inner);
        mailboxes.retain(|key, _| listeners.iter().any(|l| listener_key(l) == *key));

        let mut queued = 0;
        for listener in listeners {
            let mailbox = mailboxes
                .entry(listener_key(listener))
                .or_insert_with(|| self.spawn_worker(listener.clone()));
            if mailbox.send(message.clone()).is_ok() {
                queued += 1;
            }
        }
        queued
    }

    fn spawn_worker(&self, listener: SharedListener) -> Mailbox {
        let (tx, rx) = mpsc::unbounded_channel();
        self.handle
            .spawn(run_mailbox(listener, rx, self.token.child_token()));
        tx
    }

    /// Close the mailbox of `listener`. Its worker finishes what is queued,
    /// then exits and drops the listener.
    pub fn release(&self, listener: &SharedListener) -> bool {
        self.mailboxes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&listener_key(listener))
            .is_some()
    }

    /// Stop all workers. Queued messages are dropped.
    pub fn cancel(&self) {
        self.token.cancel();
        self.mailboxes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Number of listeners with a running mailbox.
    pub fn worker_count(&self) -> usize {
        self.mailboxes.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl Drop for DispatchScope {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

impl std::fmt::Debug for DispatchScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchScope")
            .field("cancelled", &self.token.is_cancelled())
            .field("workers", &self.worker_count())
            .finish()
    }
}

async fn run_mailbox(
    listener: SharedListener,
    mut rx: mpsc::UnboundedReceiver<Arc<SphinxSocketIOMessage>>,
    token: CancellationToken,
) {
    loop {
        let message = tokio::select! {
            biased;
            _ = token.cancelled() => break,
            next = rx.recv() => match next {
                Some(message) => message,
                None => break,
            },
        };

        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            _ = deliver(&listener, &message) => {}
        }
    }
    debug!("listener worker for {} stopped", listener.name());
}

/// Run one delivery, logging failures and panics instead of propagating them.
async fn deliver(listener: &SharedListener, message: &SphinxSocketIOMessage) {
    let outcome = AssertUnwindSafe(listener.on_socket_io_message_received(message))
        .catch_unwind()
        .await;

    match outcome {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!(
            listener = listener.name(),
            kind = message.kind_name(),
            "socket message listener failed: {e}"
        ),
        Err(panic) => error!(
            listener = listener.name(),
            kind = message.kind_name(),
            "socket message listener panicked: {}",
            panic_message(&panic)
        ),
    }
}

fn panic_message(panic: &Box<dyn std::any::Any + Send>) -> String {
    panic
        .downcast_ref::<String>()
        .map(|s| s.as_str())
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic")
        .to_string()
}
