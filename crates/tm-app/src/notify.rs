//! Optional run notifications.
//!
//! Observers subscribe to a broadcast channel; publishing never fails and
//! nothing in the page depends on delivery.

use tm_core::{Protocol, RunNumber};
use tokio::sync::broadcast;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Running,
    Completed,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunNotification {
    pub project: String,
    pub protocol: Protocol,
    pub run: RunNumber,
    pub phase: RunPhase,
    pub message: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Notifier {
    tx: broadcast::Sender<RunNotification>,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(64)
    }
}

impl Notifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn publish(&self, notification: RunNotification) {
        // No receivers is fine.
        let _ = self.tx.send(notification);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RunNotification> {
        self.tx.subscribe()
    }
}
