//! Integration tests for the connectivity monitor
//!
//! These run on a paused clock so interval and timeout behaviour is
//! deterministic. Probes are scripted instead of hitting the network.

use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use connectivity::{
    ConnectionState, ConnectivityMonitor, ConnectivitySnapshot, DisconnectReason, Indicator,
    MonitorConfig, NetworkPresence, Probe, ProbeError, ProbeSuccess,
};
use tokio::time::{sleep, timeout};

const POLL: Duration = Duration::from_secs(30);

/// One scripted probe answer
#[derive(Clone, Copy)]
struct Step {
    delay: Duration,
    reachable: bool,
}

fn step(delay_ms: u64, reachable: bool) -> Step {
    Step { delay: Duration::from_millis(delay_ms), reachable }
}

/// Probe that replays a script, then keeps answering with the fallback
#[derive(Clone)]
struct ScriptedProbe {
    script: Arc<Mutex<VecDeque<Step>>>,
    fallback: Step,
    calls: Arc<AtomicUsize>,
}

impl ScriptedProbe {
    fn always(reachable: bool) -> Self {
        Self::scripted(Vec::new(), reachable)
    }

    fn scripted(steps: Vec<Step>, fallback: bool) -> Self {
        Self {
            script: Arc::new(Mutex::new(steps.into())),
            fallback: step(0, fallback),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Probe for ScriptedProbe {
    async fn probe(&self) -> Result<ProbeSuccess, ProbeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front().unwrap_or(self.fallback);

        sleep(next.delay).await;
        if next.reachable {
            Ok(ProbeSuccess { latency_ms: next.delay.as_millis() as u64, status_code: Some(204) })
        } else {
            Err(ProbeError::Status(503))
        }
    }
}

fn test_config() -> MonitorConfig {
    MonitorConfig {
        poll_interval_ms: POLL.as_millis() as u64,
        probe_timeout_ms: 5_000,
        ..MonitorConfig::default()
    }
}

#[tokio::test(start_paused = true)]
async fn test_no_probe_without_subscribers() {
    let probe = ScriptedProbe::always(true);
    let (_reporter, presence) = NetworkPresence::new();
    let monitor = ConnectivityMonitor::spawn(test_config(), probe.clone(), presence);

    monitor.force_check();
    sleep(POLL * 5).await;

    assert_eq!(probe.calls(), 0);
    assert_eq!(monitor.snapshot(), ConnectivitySnapshot::default());
}

#[tokio::test(start_paused = true)]
async fn test_first_subscriber_samples_then_polls_on_interval() {
    let probe = ScriptedProbe::always(true);
    let (_reporter, presence) = NetworkPresence::new();
    let monitor = ConnectivityMonitor::spawn(test_config(), probe.clone(), presence);

    let mut sub = monitor.subscribe().unwrap();
    let first = sub.changed().await.unwrap();
    assert!(first.last_checked.is_some());
    assert!(first.is_connected());
    assert_eq!(probe.calls(), 1);

    sleep(POLL + Duration::from_secs(1)).await;
    assert_eq!(probe.calls(), 2);

    sleep(POLL).await;
    assert_eq!(probe.calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_last_detach_stops_sampling_and_discards_snapshot() {
    let probe = ScriptedProbe::always(false);
    let (_reporter, presence) = NetworkPresence::new();
    let monitor = ConnectivityMonitor::spawn(test_config(), probe.clone(), presence);

    let mut first = monitor.subscribe().unwrap();
    let second = monitor.subscribe().unwrap();
    let snapshot = first.changed().await.unwrap();
    assert!(!snapshot.is_api_connected);

    drop(second);
    sleep(POLL + Duration::from_secs(1)).await;
    assert_eq!(probe.calls(), 2, "one subscriber left, still polling");

    drop(first);
    sleep(Duration::from_millis(1)).await;
    assert_eq!(monitor.snapshot(), ConnectivitySnapshot::default());

    sleep(POLL * 4).await;
    assert_eq!(probe.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_detach_discards_in_flight_probe() {
    let probe = ScriptedProbe::scripted(vec![step(2_000, false)], false);
    let (_reporter, presence) = NetworkPresence::new();
    let monitor = ConnectivityMonitor::spawn(test_config(), probe.clone(), presence);

    let sub = monitor.subscribe().unwrap();
    sleep(Duration::from_millis(500)).await;
    assert_eq!(probe.calls(), 1);
    drop(sub);

    sleep(Duration::from_secs(5)).await;
    assert_eq!(monitor.snapshot(), ConnectivitySnapshot::default());
}

#[tokio::test(start_paused = true)]
async fn test_force_check_when_idle_produces_one_sample_and_resets_phase() {
    let probe = ScriptedProbe::always(true);
    let (_reporter, presence) = NetworkPresence::new();
    let monitor = ConnectivityMonitor::spawn(test_config(), probe.clone(), presence);

    let mut sub = monitor.subscribe().unwrap();
    sub.changed().await.unwrap();
    sleep(Duration::from_secs(20)).await;
    assert_eq!(probe.calls(), 1);

    let before = Utc::now();
    sub.force_check();
    let forced = sub.changed().await.unwrap();
    assert_eq!(probe.calls(), 2);
    assert!(forced.last_checked.unwrap() >= before);
    assert_eq!(sub.poll_changed(), None, "one forced check, one snapshot");

    // Originally due at 30s; now due 30s after the forced sample
    sleep(Duration::from_secs(15)).await;
    assert_eq!(probe.calls(), 2);
    sleep(Duration::from_secs(16)).await;
    assert_eq!(probe.calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_force_check_joins_in_flight_probe() {
    let probe = ScriptedProbe::scripted(vec![step(2_000, false)], true);
    let (_reporter, presence) = NetworkPresence::new();
    let monitor = ConnectivityMonitor::spawn(test_config(), probe.clone(), presence);

    let mut sub = monitor.subscribe().unwrap();
    for _ in 0..6 {
        sleep(Duration::from_millis(300)).await;
        sub.force_check();
    }
    assert_eq!(probe.calls(), 1, "retries while running add no request");

    // The slow answer lands at 2s and is applied
    let snapshot = sub.changed().await.unwrap();
    assert!(snapshot.last_checked.is_some());
    assert!(!snapshot.is_api_connected);
    assert_eq!(probe.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_reconnect_during_probe_keeps_previous_api_state() {
    let probe = ScriptedProbe::scripted(vec![step(0, false), step(2_000, true)], true);
    let (reporter, presence) = NetworkPresence::new();
    let monitor = ConnectivityMonitor::spawn(test_config(), probe.clone(), presence);

    let mut sub = monitor.subscribe().unwrap();
    assert!(!sub.changed().await.unwrap().is_api_connected);

    reporter.set_online(false);
    sleep(Duration::from_millis(10)).await;
    sub.force_check();
    sleep(Duration::from_millis(10)).await;
    reporter.set_online(true);
    sleep(Duration::from_millis(100)).await;

    // Online again, but the running check has not answered yet
    let snapshot = sub.snapshot();
    assert!(snapshot.is_online);
    assert!(!snapshot.is_api_connected);
    assert!(!snapshot.is_connected());
    assert_eq!(probe.calls(), 2, "reconnect joins the running check");

    sleep(Duration::from_secs(3)).await;
    assert!(sub.snapshot().is_connected());
    assert_eq!(probe.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_scheduled_tick_coalesces_into_in_flight_probe() {
    let config = MonitorConfig { poll_interval_ms: 1_000, probe_timeout_ms: 5_000, ..test_config() };
    let probe = ScriptedProbe::scripted(vec![step(2_500, true)], true);
    let (_reporter, presence) = NetworkPresence::new();
    let monitor = ConnectivityMonitor::spawn(config, probe.clone(), presence);

    let _sub = monitor.subscribe().unwrap();
    sleep(Duration::from_millis(2_200)).await;

    // Ticks at 1s and 2s found the first probe still running
    assert_eq!(probe.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_hung_probe_times_out_as_unreachable() {
    let config = MonitorConfig { probe_timeout_ms: 1_000, ..test_config() };
    let probe = ScriptedProbe::scripted(vec![step(60_000, true)], true);
    let (_reporter, presence) = NetworkPresence::new();
    let monitor = ConnectivityMonitor::spawn(config, probe, presence);

    let mut sub = monitor.subscribe().unwrap();
    let state = sub.state_changed().await.unwrap();
    assert_eq!(state, ConnectionState::Disconnected);
    assert_eq!(sub.snapshot().disconnect_reason(), Some(DisconnectReason::ServerUnreachable));
}

#[tokio::test(start_paused = true)]
async fn test_identical_samples_do_not_flip_state() {
    let probe = ScriptedProbe::always(true);
    let (_reporter, presence) = NetworkPresence::new();
    let monitor = ConnectivityMonitor::spawn(test_config(), probe.clone(), presence);

    let mut sub = monitor.subscribe().unwrap();
    let waited = timeout(POLL * 4, sub.state_changed()).await;

    assert!(waited.is_err(), "state never left Connected");
    assert!(probe.calls() >= 4);
}

#[tokio::test(start_paused = true)]
async fn test_last_checked_advance_still_notifies_snapshot_watchers() {
    let probe = ScriptedProbe::always(true);
    let (_reporter, presence) = NetworkPresence::new();
    let monitor = ConnectivityMonitor::spawn(test_config(), probe, presence);

    let mut sub = monitor.subscribe().unwrap();
    let first = sub.changed().await.unwrap();
    let second = sub.changed().await.unwrap();

    assert_eq!(first.is_connected(), second.is_connected());
    assert!(second.last_checked > first.last_checked);
}

#[tokio::test(start_paused = true)]
async fn test_offline_shows_no_internet_and_reconnect_rechecks() {
    let probe = ScriptedProbe::always(true);
    let (reporter, presence) = NetworkPresence::new();
    let monitor = ConnectivityMonitor::spawn(test_config(), probe.clone(), presence);

    let mut sub = monitor.subscribe().unwrap();
    sub.changed().await.unwrap();
    assert_eq!(probe.calls(), 1);

    reporter.set_online(false);
    assert_eq!(sub.state_changed().await.unwrap(), ConnectionState::Disconnected);
    let view = Indicator::from_snapshot(&sub.snapshot()).unwrap();
    assert_eq!(view.reason, DisconnectReason::NoInternet);
    assert_eq!(probe.calls(), 1, "going offline does not probe");

    reporter.set_online(true);
    assert_eq!(sub.state_changed().await.unwrap(), ConnectionState::Connected);
    sleep(Duration::from_millis(10)).await;
    assert_eq!(probe.calls(), 2, "regaining the network probes immediately");
}

#[tokio::test(start_paused = true)]
async fn test_retry_from_indicator_issues_exactly_one_probe() {
    let probe = ScriptedProbe::always(false);
    let (_reporter, presence) = NetworkPresence::new();
    let monitor = ConnectivityMonitor::spawn(test_config(), probe.clone(), presence);

    let mut sub = monitor.subscribe().unwrap();
    let snapshot = sub.changed().await.unwrap();
    let view = Indicator::from_snapshot(&snapshot).expect("indicator visible while unreachable");
    assert_eq!(view.message, "Server unreachable");

    view.retry.activate(&sub);
    sub.changed().await.unwrap();
    sleep(Duration::from_secs(1)).await;
    assert_eq!(probe.calls(), 2);
}

#[tokio::test]
async fn test_subscription_outlives_monitor_handle() {
    let _ = tracing_subscriber::fmt::try_init();

    let (_reporter, presence) = NetworkPresence::new();
    let monitor = ConnectivityMonitor::spawn(test_config(), ScriptedProbe::always(true), presence);
    let mut sub = monitor.subscribe().unwrap();
    sub.changed().await.unwrap();

    // Handles keep the task alive; the subscription alone is enough
    drop(monitor);
    sub.force_check();
    assert!(sub.changed().await.is_ok());
}

#[tokio::test(start_paused = true)]
async fn test_poll_changed_reports_each_update_once() {
    let probe = ScriptedProbe::always(false);
    let (_reporter, presence) = NetworkPresence::new();
    let monitor = ConnectivityMonitor::spawn(test_config(), probe, presence);

    let mut sub = monitor.subscribe().unwrap();
    assert_eq!(sub.poll_changed(), None);

    sleep(Duration::from_millis(10)).await;
    let snapshot = sub.poll_changed().expect("first sample published");
    assert!(!snapshot.is_api_connected);
    assert_eq!(sub.poll_changed(), None);
}

/// Log sink shared with a thread-local subscriber
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl CapturedLogs {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

#[tokio::test(start_paused = true)]
async fn test_detach_while_disconnected_is_not_logged_as_restored() {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let probe = ScriptedProbe::always(false);
    let (_reporter, presence) = NetworkPresence::new();
    let monitor = ConnectivityMonitor::spawn(test_config(), probe, presence);

    let mut sub = monitor.subscribe().unwrap();
    assert_eq!(sub.state_changed().await.unwrap(), ConnectionState::Disconnected);
    drop(sub);
    sleep(Duration::from_millis(10)).await;

    assert_eq!(monitor.snapshot(), ConnectivitySnapshot::default());
    let output = logs.contents();
    assert!(output.contains("Connectivity lost"));
    assert!(!output.contains("Connectivity restored"));
}
