use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Local, Utc};
use connectivity::{ConnectivitySnapshot, DisconnectReason, Indicator, MonitorHandle};
use serde::Serialize;

/// What `check --json` prints
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckReport {
    pub is_online: bool,
    pub is_api_connected: bool,
    pub is_connected: bool,
    pub last_checked: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<DisconnectReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

impl From<&ConnectivitySnapshot> for CheckReport {
    fn from(snapshot: &ConnectivitySnapshot) -> Self {
        let view = Indicator::from_snapshot(snapshot);
        Self {
            is_online: snapshot.is_online,
            is_api_connected: snapshot.is_api_connected,
            is_connected: snapshot.is_connected(),
            last_checked: snapshot.last_checked,
            reason: view.as_ref().map(|v| v.reason),
            message: view.as_ref().map(|v| v.message),
        }
    }
}

impl std::fmt::Display for CheckReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.message {
            None => write!(f, "connected")?,
            Some(message) => write!(f, "disconnected: {message}")?,
        }
        if let Some(at) = self.last_checked {
            write!(f, " (checked {})", at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S"))?;
        }
        Ok(())
    }
}

/// Wait for the first completed sample, print it, and report whether the
/// client is connected.
pub async fn run(monitor: &MonitorHandle, probe_timeout: Duration, json: bool) -> Result<bool> {
    let snapshot = first_sample(monitor, probe_timeout + Duration::from_secs(1)).await?;
    let report = CheckReport::from(&snapshot);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{report}");
    }

    Ok(report.is_connected)
}

async fn first_sample(monitor: &MonitorHandle, limit: Duration) -> Result<ConnectivitySnapshot> {
    // Subscribing starts sampling immediately
    let mut sub = monitor.subscribe()?;

    tokio::time::timeout(limit, async {
        loop {
            let snapshot = sub.changed().await?;
            if snapshot.last_checked.is_some() {
                return Ok::<_, anyhow::Error>(snapshot);
            }
        }
    })
    .await
    .context("Timed out waiting for the first connectivity check")?
}
