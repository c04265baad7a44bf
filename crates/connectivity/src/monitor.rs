use std::sync::Arc;

use chrono::Utc;
use futures::StreamExt;
use futures::future::BoxFuture;
use futures::stream::FuturesUnordered;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::time::{Interval, MissedTickBehavior, interval, timeout};

use crate::aggregator::{Aggregator, Applied, ProbeId, Signal};
use crate::config::MonitorConfig;
use crate::presence::PresenceReceiver;
use crate::probe::{Probe, ProbeError, ProbeSuccess};
use crate::snapshot::{ConnectionState, ConnectivitySnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("connectivity monitor has shut down")]
pub struct MonitorClosed;

#[derive(Debug)]
enum Command {
    Attach,
    Detach,
    ForceCheck,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    Scheduled,
    Forced,
    Reconnected,
}

type ProbeOutcome = (ProbeId, Result<ProbeSuccess, ProbeError>);

/// Entry point: spawns the monitor task and hands out its context object
pub struct ConnectivityMonitor;

impl ConnectivityMonitor {
    /// Spawn the monitor on the current tokio runtime.
    ///
    /// Nothing is probed until the first [`MonitorHandle::subscribe`]. The
    /// task exits once every handle and subscription has been dropped.
    pub fn spawn(
        config: MonitorConfig,
        probe: impl Probe + 'static,
        presence: PresenceReceiver,
    ) -> MonitorHandle {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(ConnectivitySnapshot::default());
        let (state_tx, state_rx) = watch::channel(ConnectionState::Connected);

        let actor = MonitorActor {
            config,
            probe: Arc::new(probe),
            presence,
            presence_open: true,
            commands: command_rx,
            aggregator: Aggregator::new(),
            snapshot_tx,
            state_tx,
            subscribers: 0,
            timer: None,
            in_flight: FuturesUnordered::new(),
        };
        tokio::spawn(actor.run());

        MonitorHandle { commands: command_tx, snapshot_rx, state_rx }
    }
}

/// Shared handle to the running monitor. Cheap to clone, pass it to every
/// view that needs connectivity.
#[derive(Debug, Clone)]
pub struct MonitorHandle {
    commands: mpsc::UnboundedSender<Command>,
    snapshot_rx: watch::Receiver<ConnectivitySnapshot>,
    state_rx: watch::Receiver<ConnectionState>,
}

impl MonitorHandle {
    /// Attach a subscriber. The first one starts sampling.
    pub fn subscribe(&self) -> Result<Subscription, MonitorClosed> {
        self.commands.send(Command::Attach).map_err(|_| MonitorClosed)?;

        let mut snapshot_rx = self.snapshot_rx.clone();
        snapshot_rx.borrow_and_update();
        let mut state_rx = self.state_rx.clone();
        state_rx.borrow_and_update();

        Ok(Subscription { commands: self.commands.clone(), snapshot_rx, state_rx })
    }

    /// Request an immediate out-of-cycle sample. Ignored while nobody is
    /// subscribed.
    pub fn force_check(&self) {
        let _ = self.commands.send(Command::ForceCheck);
    }

    pub fn snapshot(&self) -> ConnectivitySnapshot {
        *self.snapshot_rx.borrow()
    }
}

/// A live attachment to the monitor. Dropping it detaches.
#[derive(Debug)]
pub struct Subscription {
    commands: mpsc::UnboundedSender<Command>,
    snapshot_rx: watch::Receiver<ConnectivitySnapshot>,
    state_rx: watch::Receiver<ConnectionState>,
}

impl Subscription {
    pub fn snapshot(&self) -> ConnectivitySnapshot {
        *self.snapshot_rx.borrow()
    }

    /// Fire-and-forget; the result arrives as the next snapshot update.
    pub fn force_check(&self) {
        let _ = self.commands.send(Command::ForceCheck);
    }

    /// Wait until any snapshot field changes, including `last_checked`.
    pub async fn changed(&mut self) -> Result<ConnectivitySnapshot, MonitorClosed> {
        self.snapshot_rx.changed().await.map_err(|_| MonitorClosed)?;
        Ok(*self.snapshot_rx.borrow_and_update())
    }

    /// Latest snapshot if it changed since last seen, without waiting.
    pub fn poll_changed(&mut self) -> Option<ConnectivitySnapshot> {
        match self.snapshot_rx.has_changed() {
            Ok(true) => Some(*self.snapshot_rx.borrow_and_update()),
            _ => None,
        }
    }

    /// Wait until the derived connected/disconnected state flips.
    pub async fn state_changed(&mut self) -> Result<ConnectionState, MonitorClosed> {
        self.state_rx.changed().await.map_err(|_| MonitorClosed)?;
        Ok(*self.state_rx.borrow_and_update())
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let _ = self.commands.send(Command::Detach);
    }
}

struct MonitorActor {
    config: MonitorConfig,
    probe: Arc<dyn Probe>,
    presence: PresenceReceiver,
    presence_open: bool,
    commands: mpsc::UnboundedReceiver<Command>,
    aggregator: Aggregator,
    snapshot_tx: watch::Sender<ConnectivitySnapshot>,
    state_tx: watch::Sender<ConnectionState>,
    subscribers: usize,
    timer: Option<Interval>,
    in_flight: FuturesUnordered<BoxFuture<'static, ProbeOutcome>>,
}

/// Next tick of the sampling interval, or never while stopped
async fn next_tick(timer: &mut Option<Interval>) {
    match timer {
        Some(timer) => {
            timer.tick().await;
        }
        None => std::future::pending().await,
    }
}

impl MonitorActor {
    async fn run(mut self) {
        tracing::debug!("Connectivity monitor task started");

        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => break,
                },
                transition = self.presence.next_transition(), if self.presence_open => match transition {
                    Some(online) => self.on_presence(online),
                    None => {
                        tracing::debug!("Presence source closed, keeping last reported value");
                        self.presence_open = false;
                    }
                },
                _ = next_tick(&mut self.timer) => self.sample(Trigger::Scheduled),
                Some((id, result)) = self.in_flight.next(), if !self.in_flight.is_empty() => {
                    self.on_probe_completed(id, result);
                }
            }
        }

        tracing::debug!("Connectivity monitor task stopped");
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Attach => {
                self.subscribers += 1;
                if self.subscribers == 1 {
                    self.start();
                }
            }
            Command::Detach => {
                self.subscribers = self.subscribers.saturating_sub(1);
                if self.subscribers == 0 {
                    self.stop();
                }
            }
            Command::ForceCheck => {
                if self.subscribers == 0 {
                    tracing::debug!("Ignoring forced check with no subscribers");
                    return;
                }
                self.sample(Trigger::Forced);
            }
        }
    }

    fn start(&mut self) {
        tracing::info!(
            poll_interval_ms = self.config.poll_interval_ms,
            probe_timeout_ms = self.config.probe_timeout_ms,
            "Starting connectivity monitoring"
        );

        let online = self.presence.current();
        self.apply(Signal::Presence(online));

        // First tick completes immediately
        let mut timer = interval(self.config.poll_interval());
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.timer = Some(timer);
    }

    fn stop(&mut self) {
        tracing::info!(in_flight = self.in_flight.len(), "Last subscriber detached, stopping connectivity monitoring");

        self.timer = None;
        self.in_flight = FuturesUnordered::new();

        // Not a connectivity change, so publish quietly
        self.aggregator.apply(Signal::Reset);
        self.snapshot_tx.send_replace(self.aggregator.snapshot());
        self.state_tx.send_replace(ConnectionState::Connected);
    }

    fn on_presence(&mut self, online: bool) {
        if self.subscribers == 0 {
            return;
        }

        let was_online = self.aggregator.snapshot().is_online;
        self.apply(Signal::Presence(online));

        if online && !was_online && self.config.recheck_on_reconnect {
            self.sample(Trigger::Reconnected);
        }
    }

    fn sample(&mut self, trigger: Trigger) {
        if trigger != Trigger::Scheduled {
            if let Some(timer) = self.timer.as_mut() {
                // Next scheduled sample is relative to this one
                timer.reset();
            }
        }

        // Any sample requested while a probe is running joins that probe
        if let Some(pending) = self.aggregator.in_flight() {
            tracing::debug!(probe = pending.0, ?trigger, "Probe still in flight, joining it");
            return;
        }

        let id = self.aggregator.next_probe_id();
        self.apply(Signal::ProbeIssued(id));
        tracing::debug!(probe = id.0, ?trigger, "Issuing API probe");

        let probe = Arc::clone(&self.probe);
        let limit = self.config.probe_timeout();
        self.in_flight.push(Box::pin(async move {
            let result = timeout(limit, probe.probe()).await.unwrap_or(Err(ProbeError::Timeout(limit)));
            (id, result)
        }));
    }

    fn on_probe_completed(&mut self, id: ProbeId, result: Result<ProbeSuccess, ProbeError>) {
        let reachable = match &result {
            Ok(success) => {
                tracing::trace!(probe = id.0, latency_ms = success.latency_ms, "API probe completed");
                true
            }
            Err(e) => {
                tracing::debug!(probe = id.0, error = %e, "API probe failed");
                false
            }
        };

        self.apply(Signal::ProbeCompleted { id, reachable, at: Utc::now() });
    }

    fn apply(&mut self, signal: Signal) {
        if self.aggregator.apply(signal) != Applied::Changed {
            return;
        }

        let snapshot = self.aggregator.snapshot();
        self.snapshot_tx.send_replace(snapshot);

        let state = snapshot.state();
        let flipped = self.state_tx.send_if_modified(|current| {
            if *current == state {
                return false;
            }
            *current = state;
            true
        });

        if flipped {
            match snapshot.disconnect_reason() {
                None => tracing::info!("Connectivity restored"),
                Some(reason) => tracing::warn!(%reason, "Connectivity lost"),
            }
        }
    }
}
