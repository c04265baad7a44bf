//! Network presence signal.
//!
//! Presence is push-based: the host platform reports online/offline
//! transitions through a [`PresenceReporter`] and the monitor reads the last
//! reported value. Nothing is probed here.

use tokio::sync::watch;

/// Creates the two halves of a presence signal, starting online.
pub struct NetworkPresence;

impl NetworkPresence {
    pub fn new() -> (PresenceReporter, PresenceReceiver) {
        let (tx, rx) = watch::channel(true);
        (PresenceReporter { tx }, PresenceReceiver { rx })
    }
}

/// Push side, held by whatever observes the platform's network state
#[derive(Debug, Clone)]
pub struct PresenceReporter {
    tx: watch::Sender<bool>,
}

impl PresenceReporter {
    /// Report the current network presence. Only transitions are forwarded.
    pub fn set_online(&self, online: bool) {
        let changed = self.tx.send_if_modified(|current| {
            if *current == online {
                return false;
            }
            *current = online;
            true
        });

        if changed {
            tracing::info!(online, "Network presence changed");
        }
    }

    /// True once nothing reads this signal any more.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Read side, consumed by the monitor
#[derive(Debug, Clone)]
pub struct PresenceReceiver {
    rx: watch::Receiver<bool>,
}

impl PresenceReceiver {
    pub fn current(&self) -> bool {
        *self.rx.borrow()
    }

    /// Wait for the next transition. `None` once every reporter is gone.
    pub async fn next_transition(&mut self) -> Option<bool> {
        self.rx.changed().await.ok()?;
        Some(*self.rx.borrow_and_update())
    }
}
