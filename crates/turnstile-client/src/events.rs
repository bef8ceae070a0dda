//! Lifecycle event stream
//!
//! A broadcast channel replaces ad-hoc callback wiring: `subscribe()`
//! hands out an independent receiver, dropping it unsubscribes, and
//! slow consumers lag rather than block the client.

use serde::Serialize;
use tokio::sync::broadcast;
use turnstile_core::{LockSnapshot, OperationKind, TransactionHandle};

/// Push notifications emitted as reads complete and transactions move
/// through their lifecycle
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ClientEvent {
    LockUpdated { snapshot: LockSnapshot },
    TransactionUpdated { handle: TransactionHandle },
    Error {
        operation: Option<OperationKind>,
        message: String,
    },
}

pub(crate) struct EventBus {
    sender: broadcast::Sender<ClientEvent>,
}

impl EventBus {
    pub(crate) fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.sender.subscribe()
    }

    /// Events are notifications, not state; with no subscriber they are
    /// dropped
    pub(crate) fn emit(&self, event: ClientEvent) {
        let _ = self.sender.send(event);
    }
}
