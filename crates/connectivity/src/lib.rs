//! Connectivity-health monitor for the fleet dashboard.
//!
//! Answers two questions continuously: does the client have network access,
//! and is the fleet API reachable. Views subscribe through a
//! [`MonitorHandle`] and are notified only when the answer changes.

pub mod aggregator;
pub mod config;
pub mod indicator;
pub mod monitor;
pub mod presence;
pub mod probe;
pub mod snapshot;

// Re-export main types
pub use config::{ConfigError, MonitorConfig, ProbeMethod};
pub use indicator::{ForceCheck, Indicator, IndicatorView, Retry};
pub use monitor::{ConnectivityMonitor, MonitorClosed, MonitorHandle, Subscription};
pub use presence::{NetworkPresence, PresenceReceiver, PresenceReporter};
pub use probe::{HttpProbe, Probe, ProbeError, ProbeSuccess};
pub use snapshot::{ConnectionState, ConnectivitySnapshot, DisconnectReason};
