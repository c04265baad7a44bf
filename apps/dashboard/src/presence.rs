use std::time::Duration;

use connectivity::PresenceReporter;
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};

const DIAL_TIMEOUT: Duration = Duration::from_secs(2);

/// Platform presence adapter: the machine counts as online while a TCP
/// connection to a well-known address can be opened.
pub struct PresenceWatcher {
    addr: String,
    every: Duration,
}

impl PresenceWatcher {
    pub fn new(addr: String, every: Duration) -> Self {
        Self { addr, every }
    }

    pub async fn check_once(&self) -> bool {
        match timeout(DIAL_TIMEOUT, TcpStream::connect(&self.addr)).await {
            Ok(Ok(_)) => true,
            Ok(Err(e)) => {
                tracing::debug!(addr = %self.addr, error = %e, "Presence dial failed");
                false
            }
            Err(_) => {
                tracing::debug!(addr = %self.addr, "Presence dial timed out");
                false
            }
        }
    }

    /// Keep reporting presence until the reporter's monitor goes away
    pub fn spawn(self, reporter: PresenceReporter) -> JoinHandle<()> {
        tokio::spawn(async move {
            while !reporter.is_closed() {
                sleep(self.every).await;
                reporter.set_online(self.check_once().await);
            }
        })
    }
}
