use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Last known connectivity of the client.
///
/// `is_connected` is not a field: it is always recomputed from the two raw
/// signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectivitySnapshot {
    /// Platform-reported network presence
    pub is_online: bool,

    /// Outcome of the most recent completed reachability probe
    pub is_api_connected: bool,

    /// Completion time of the most recent probe attempt, success or failure
    pub last_checked: Option<DateTime<Utc>>,
}

impl Default for ConnectivitySnapshot {
    /// Optimistic until the first sample completes.
    fn default() -> Self {
        Self { is_online: true, is_api_connected: true, last_checked: None }
    }
}

impl ConnectivitySnapshot {
    pub fn is_connected(&self) -> bool {
        self.is_online && self.is_api_connected
    }

    pub fn state(&self) -> ConnectionState {
        if self.is_connected() { ConnectionState::Connected } else { ConnectionState::Disconnected }
    }

    /// Why the client is disconnected, if it is.
    pub fn disconnect_reason(&self) -> Option<DisconnectReason> {
        if !self.is_online {
            Some(DisconnectReason::NoInternet)
        } else if !self.is_api_connected {
            Some(DisconnectReason::ServerUnreachable)
        } else {
            None
        }
    }
}

/// Derived connectivity state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Connected,
    Disconnected,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionState::Connected => write!(f, "connected"),
            ConnectionState::Disconnected => write!(f, "disconnected"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisconnectReason {
    NoInternet,
    ServerUnreachable,
}

impl std::fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DisconnectReason::NoInternet => write!(f, "no internet"),
            DisconnectReason::ServerUnreachable => write!(f, "server unreachable"),
        }
    }
}
