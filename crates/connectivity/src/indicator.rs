//! View model for the ConnectionStatus indicator.
//!
//! The indicator is hidden while connected. Otherwise it explains whether the
//! network or the server is the problem and offers a retry.

use chrono::{DateTime, Local, Utc};

use crate::monitor::Subscription;
use crate::snapshot::{ConnectivitySnapshot, DisconnectReason};

/// Anything that can trigger a forced connectivity check
pub trait ForceCheck {
    fn force_check(&self);
}

impl ForceCheck for Subscription {
    fn force_check(&self) {
        Subscription::force_check(self);
    }
}

/// What the indicator shows while disconnected
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndicatorView {
    pub reason: DisconnectReason,
    pub message: &'static str,
    pub detail: &'static str,
    pub last_checked: Option<DateTime<Utc>>,
    pub retry: Retry,
}

impl IndicatorView {
    /// Human-readable "last checked" label in local time
    pub fn last_checked_label(&self) -> String {
        match self.last_checked {
            Some(at) => format!("Last checked {}", at.with_timezone(&Local).format("%H:%M:%S")),
            None => "Not checked yet".to_string(),
        }
    }
}

/// The retry affordance. Each activation triggers exactly one forced check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Retry {
    pub label: &'static str,
}

impl Retry {
    pub fn activate(&self, target: &impl ForceCheck) {
        tracing::info!("Manual connectivity retry requested");
        target.force_check();
    }
}

pub struct Indicator;

impl Indicator {
    /// `None` means render nothing.
    pub fn from_snapshot(snapshot: &ConnectivitySnapshot) -> Option<IndicatorView> {
        let reason = snapshot.disconnect_reason()?;

        let (message, detail) = match reason {
            DisconnectReason::NoInternet => {
                ("No internet connection", "Check your network connection. Changes may not be saved.")
            }
            DisconnectReason::ServerUnreachable => {
                ("Server unreachable", "The fleet API is not responding. Data shown may be out of date.")
            }
        };

        Some(IndicatorView {
            reason,
            message,
            detail,
            last_checked: snapshot.last_checked,
            retry: Retry { label: "Retry" },
        })
    }
}
