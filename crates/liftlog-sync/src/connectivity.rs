//! # Connectivity Monitor
//!
//! A single reactive online/offline boolean. The host pushes transition
//! events; subscribers wake on every change. No polling.
//!
//! ```text
//! host "online"/"offline" ──► ConnectivityMonitor ──► watch<bool> ──► engines
//! ```

use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

/// Transition events reported by the host environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityEvent {
    Online,
    Offline,
}

/// Process-wide online/offline signal.
#[derive(Debug, Clone)]
pub struct ConnectivityMonitor {
    tx: Arc<watch::Sender<bool>>,
}

impl ConnectivityMonitor {
    /// Creates a monitor seeded with the host's best-effort initial answer.
    pub fn new(initially_online: bool) -> Self {
        let (tx, _) = watch::channel(initially_online);
        ConnectivityMonitor { tx: Arc::new(tx) }
    }

    /// Applies a host transition event.
    pub fn handle_event(&self, event: ConnectivityEvent) {
        self.set_online(event == ConnectivityEvent::Online);
    }

    /// Sets the current value. Subscribers are only woken on a change.
    pub fn set_online(&self, online: bool) {
        let changed = self.tx.send_if_modified(|current| {
            if *current == online {
                false
            } else {
                *current = online;
                true
            }
        });

        if changed {
            info!(online, "Connectivity changed");
        }
    }

    pub fn is_online(&self) -> bool {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

impl Default for ConnectivityMonitor {
    fn default() -> Self {
        ConnectivityMonitor::new(true)
    }
}
