use chrono::{DateTime, Utc};

use crate::snapshot::ConnectivitySnapshot;

/// Identifies one issued probe. Ids are strictly increasing per aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProbeId(pub u64);

/// Raw signal update fed into the aggregator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Presence(bool),
    ProbeIssued(ProbeId),
    ProbeCompleted { id: ProbeId, reachable: bool, at: DateTime<Utc> },
    /// Forget everything, back to the optimistic initial snapshot
    Reset,
}

/// Outcome of applying one signal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Changed,
    Unchanged,
    /// Completion of a probe that is no longer the most recently issued one
    Stale,
}

/// Folds raw signals into the current [`ConnectivitySnapshot`].
///
/// Holds the previous `is_api_connected` while a probe is in flight and only
/// accepts the completion of the most recently issued probe.
#[derive(Debug, Default)]
pub struct Aggregator {
    snapshot: ConnectivitySnapshot,
    latest_issued: Option<ProbeId>,
    next_id: u64,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> ConnectivitySnapshot {
        self.snapshot
    }

    /// Allocate the id for the next probe. Does not mark it issued.
    pub fn next_probe_id(&mut self) -> ProbeId {
        self.next_id += 1;
        ProbeId(self.next_id)
    }

    pub fn in_flight(&self) -> Option<ProbeId> {
        self.latest_issued
    }

    pub fn apply(&mut self, signal: Signal) -> Applied {
        let before = self.snapshot;

        match signal {
            Signal::Presence(online) => {
                self.snapshot.is_online = online;
            }
            Signal::ProbeIssued(id) => {
                self.latest_issued = Some(id);
            }
            Signal::ProbeCompleted { id, reachable, at } => {
                if self.latest_issued != Some(id) {
                    tracing::debug!(probe = id.0, latest = ?self.latest_issued, "Discarding stale probe result");
                    return Applied::Stale;
                }
                self.latest_issued = None;
                self.snapshot.is_api_connected = reachable;
                self.snapshot.last_checked = Some(at);
            }
            Signal::Reset => {
                self.snapshot = ConnectivitySnapshot::default();
                self.latest_issued = None;
            }
        }

        if self.snapshot == before { Applied::Unchanged } else { Applied::Changed }
    }
}
