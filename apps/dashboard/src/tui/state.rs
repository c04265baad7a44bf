use connectivity::{ConnectivitySnapshot, Indicator, IndicatorView};
use std::time::{Duration, Instant};

const STATUS_TTL: Duration = Duration::from_secs(3);

/// Application state
pub struct AppState {
    pub snapshot: ConnectivitySnapshot,
    pub api_url: String,
    pub show_help: bool,

    // Status notifications
    pub status_message: Option<(String, Instant)>,

    // Set whenever something visible changed
    pub dirty: bool,
}

impl AppState {
    pub fn new(api_url: String, snapshot: ConnectivitySnapshot) -> Self {
        Self { snapshot, api_url, show_help: false, status_message: None, dirty: true }
    }

    /// The connection status indicator, `None` while connected
    pub fn indicator(&self) -> Option<IndicatorView> {
        Indicator::from_snapshot(&self.snapshot)
    }

    pub fn update_snapshot(&mut self, snapshot: ConnectivitySnapshot) {
        if snapshot.is_connected() && !self.snapshot.is_connected() {
            self.set_status("Connection restored");
        }
        self.snapshot = snapshot;
        self.dirty = true;
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some((message.into(), Instant::now()));
        self.dirty = true;
    }

    /// Clear expired status notifications
    pub fn clear_expired_status(&mut self) {
        if let Some((_, at)) = &self.status_message {
            if at.elapsed() >= STATUS_TTL {
                self.status_message = None;
                self.dirty = true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_restoring_connection_sets_status() {
        let lost = ConnectivitySnapshot { is_api_connected: false, ..ConnectivitySnapshot::default() };
        let mut state = AppState::new("http://fleet/health".into(), lost);
        assert!(state.indicator().is_some());

        state.dirty = false;
        state.update_snapshot(ConnectivitySnapshot::default());

        assert!(state.dirty);
        assert!(state.indicator().is_none());
        assert_eq!(state.status_message.as_ref().map(|(m, _)| m.as_str()), Some("Connection restored"));
    }
}
