// ── Polling orchestrator ──
//
// Drives the sampling cadence. Each tick snapshots the fleet, fans out
// one blocking sampler per device (bounded by a session semaphore),
// runs every sample through the counter tracker and hands it to the
// store. Cycles may overlap when a device is slow; nothing is shared
// between them except the tracker and the store.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use hnm_snmp::Connector;
use serde::Serialize;
use tokio::sync::{Mutex, Semaphore, mpsc, watch};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::PollerConfig;
use crate::error::CoreError;
use crate::model::{DeviceDescriptor, InterfaceSample, Link, OperStatus, Topology, series_key};
use crate::sampler::DeviceSampler;
use crate::store::SampleStore;
use crate::topology::{TopologyBuilder, save_topology};
use crate::tracker::CounterTracker;

/// Lifecycle state of the polling engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EngineState {
    /// No tick loop running.
    Stopped,
    /// Tick loop running, no cycle in flight.
    Idle,
    /// At least one cycle in flight.
    Polling,
}

/// Outcome of one sampling cycle.
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub cycle: u64,
    pub started: DateTime<Utc>,
    pub devices: usize,
    /// Devices whose poll failed, sorted by name.
    pub failed: Vec<String>,
    /// Samples accepted by the store.
    pub samples: usize,
    pub persist_failures: usize,
    pub elapsed: Duration,
}

/// Everything a cycle polls: the device set plus the link set it feeds.
#[derive(Debug, Clone, Default)]
pub struct Fleet {
    pub devices: Vec<DeviceDescriptor>,
    pub topology: Topology,
}

/// A change pushed from outside (configuration reload, file watcher).
#[derive(Debug, Clone)]
pub enum FleetUpdate {
    Devices(Vec<DeviceDescriptor>),
    Topology(Topology),
    Fleet(Fleet),
}

/// Current traffic on one topology link, from its source interface.
#[derive(Debug, Clone, Serialize)]
pub struct LinkLoad {
    #[serde(flatten)]
    pub link: Link,
    pub in_bps: f64,
    pub out_bps: f64,
    /// `None` while the source interface has not been sampled.
    pub status: Option<OperStatus>,
    pub sampled_at: Option<DateTime<Utc>>,
}

// ── Engine ───────────────────────────────────────────────────────────

/// The sampling loop and its collaborators.
///
/// Cheaply cloneable via `Arc<EngineInner>`. Fleet swaps go through an
/// `ArcSwap`, so a cycle always sees either the old or the new fleet in
/// full.
#[derive(Clone)]
pub struct PollingEngine {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    config: PollerConfig,
    fleet: ArcSwap<Fleet>,
    sampler: DeviceSampler,
    builder: TopologyBuilder,
    tracker: CounterTracker,
    store: Arc<dyn SampleStore>,
    /// Shared by sampling and discovery.
    sessions: Arc<Semaphore>,
    state: watch::Sender<EngineState>,
    report: watch::Sender<Option<Arc<CycleReport>>>,
    cycles: AtomicU64,
    in_flight: AtomicUsize,
    running: AtomicBool,
    cancel: CancellationToken,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl PollingEngine {
    pub fn new(
        config: PollerConfig,
        connector: Arc<dyn Connector>,
        store: Arc<dyn SampleStore>,
        fleet: Fleet,
    ) -> Self {
        let sessions = Arc::new(Semaphore::new(config.max_sessions.max(1)));
        let (state, _) = watch::channel(EngineState::Stopped);
        let (report, _) = watch::channel(None);

        Self {
            inner: Arc::new(EngineInner {
                sampler: DeviceSampler::new(Arc::clone(&connector)),
                builder: TopologyBuilder::with_sessions(connector, Arc::clone(&sessions)),
                config,
                fleet: ArcSwap::from_pointee(fleet),
                tracker: CounterTracker::new(),
                store,
                sessions,
                state,
                report,
                cycles: AtomicU64::new(0),
                in_flight: AtomicUsize::new(0),
                running: AtomicBool::new(false),
                cancel: CancellationToken::new(),
                task_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn config(&self) -> &PollerConfig {
        &self.inner.config
    }

    pub fn store(&self) -> &Arc<dyn SampleStore> {
        &self.inner.store
    }

    /// The fleet the next cycle will poll.
    pub fn fleet(&self) -> Arc<Fleet> {
        self.inner.fleet.load_full()
    }

    pub fn state(&self) -> watch::Receiver<EngineState> {
        self.inner.state.subscribe()
    }

    /// Report of the most recently finished cycle.
    pub fn reports(&self) -> watch::Receiver<Option<Arc<CycleReport>>> {
        self.inner.report.subscribe()
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Spawn the tick loop (and the rediscovery loop, if configured).
    pub async fn start(&self) {
        if self.inner.running.swap(true, Ordering::SeqCst) {
            debug!("engine already running");
            return;
        }
        self.inner.state.send_replace(EngineState::Idle);

        let mut handles = self.inner.task_handles.lock().await;
        handles.push(tokio::spawn(tick_task(
            self.clone(),
            self.inner.config.interval,
            self.inner.cancel.clone(),
        )));
        if let Some(period) = self.inner.config.discovery_interval {
            handles.push(tokio::spawn(discovery_task(
                self.clone(),
                period,
                self.inner.cancel.clone(),
            )));
        }
        info!(
            interval_secs = self.inner.config.interval.as_secs_f64(),
            devices = self.fleet().devices.len(),
            "polling engine started"
        );
    }

    /// Apply fleet updates from `updates` until the sender goes away or the
    /// engine shuts down.
    pub async fn follow(&self, updates: mpsc::Receiver<FleetUpdate>) {
        let task = tokio::spawn(follow_task(
            self.clone(),
            updates,
            self.inner.cancel.clone(),
        ));
        self.inner.task_handles.lock().await.push(task);
    }

    /// Stop the loops. In-flight cycles are allowed to finish.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();
        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }
        self.inner.running.store(false, Ordering::SeqCst);
        self.inner.state.send_replace(EngineState::Stopped);
        debug!("polling engine stopped");
    }

    // ── Fleet swaps ──────────────────────────────────────────────────

    pub fn apply(&self, update: FleetUpdate) {
        match update {
            FleetUpdate::Devices(devices) => self.reload_devices(devices),
            FleetUpdate::Topology(topology) => self.reload_topology(topology),
            FleetUpdate::Fleet(fleet) => self.reload(fleet),
        }
    }

    /// Replace the whole fleet. Takes effect at the next tick.
    pub fn reload(&self, fleet: Fleet) {
        let fleet = Arc::new(fleet);
        let previous = self.inner.fleet.swap(Arc::clone(&fleet));
        self.forget_removed(&previous.devices, &fleet.devices);
        info!(devices = fleet.devices.len(), "fleet reloaded");
    }

    pub fn reload_devices(&self, devices: Vec<DeviceDescriptor>) {
        // Diff against the fleet the swap actually replaced.
        let previous = self.inner.fleet.rcu(|current| Fleet {
            devices: devices.clone(),
            topology: current.topology.clone(),
        });
        self.forget_removed(&previous.devices, &devices);
        info!(devices = devices.len(), "device set reloaded");
    }

    pub fn reload_topology(&self, topology: Topology) {
        let links = topology.len();
        self.inner.fleet.rcu(|current| Fleet {
            devices: current.devices.clone(),
            topology: topology.clone(),
        });
        info!(links, "topology reloaded");
    }

    fn forget_removed(&self, previous: &[DeviceDescriptor], current: &[DeviceDescriptor]) {
        let current: HashSet<&str> = current.iter().map(|d| d.name.as_str()).collect();
        for device in previous.iter().filter(|d| !current.contains(d.name.as_str())) {
            debug!(device = %device.name, "device left the fleet");
            self.inner.tracker.forget_device(&device.name);
        }
    }

    // ── Cycles ───────────────────────────────────────────────────────

    /// Poll every device in the current fleet once.
    pub async fn run_cycle(&self) -> CycleReport {
        let fleet = self.inner.fleet.load_full();
        let cycle = self.inner.cycles.fetch_add(1, Ordering::Relaxed) + 1;
        self.enter_cycle();

        let started = Utc::now();
        let clock = Instant::now();
        let mut tasks = JoinSet::new();
        for device in fleet.devices.iter().cloned() {
            let sampler = self.inner.sampler.clone();
            let sessions = Arc::clone(&self.inner.sessions);
            tasks.spawn(async move {
                let name = device.name.clone();
                let Ok(_permit) = sessions.acquire_owned().await else {
                    return (name, Err(CoreError::Internal("session pool closed".into())));
                };
                let result = tokio::task::spawn_blocking(move || sampler.poll(&device))
                    .await
                    .unwrap_or_else(|e| Err(CoreError::Internal(format!("sampler task: {e}"))));
                (name, result)
            });
        }

        let mut report = CycleReport {
            cycle,
            started,
            devices: fleet.devices.len(),
            failed: Vec::new(),
            samples: 0,
            persist_failures: 0,
            elapsed: Duration::ZERO,
        };
        while let Some(joined) = tasks.join_next().await {
            let (device, result) = match joined {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!(cycle, error = %e, "sampling task panicked");
                    continue;
                }
            };
            match result {
                Ok(samples) => self.record(samples, &mut report),
                Err(e) => {
                    warn!(cycle, device = %device, error = %e, "device poll failed");
                    report.failed.push(device);
                }
            }
        }

        report.failed.sort();
        report.elapsed = clock.elapsed();
        debug!(
            cycle,
            samples = report.samples,
            failed = report.failed.len(),
            elapsed_ms = report.elapsed.as_millis(),
            "cycle complete"
        );
        self.leave_cycle();
        let report_arc = Arc::new(report.clone());
        self.inner.report.send_replace(Some(report_arc));
        report
    }

    fn record(&self, samples: Vec<InterfaceSample>, report: &mut CycleReport) {
        for mut sample in samples {
            self.inner.tracker.observe(&mut sample);
            match self.inner.store.persist(&sample) {
                Ok(()) => report.samples += 1,
                Err(e) => {
                    warn!(series = %sample.series_key(), error = %e, "failed to persist sample");
                    report.persist_failures += 1;
                }
            }
        }
    }

    fn enter_cycle(&self) {
        if self.inner.in_flight.fetch_add(1, Ordering::SeqCst) == 0 {
            self.inner.state.send_replace(EngineState::Polling);
        }
    }

    fn leave_cycle(&self) {
        if self.inner.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
            let next = if self.inner.running.load(Ordering::SeqCst) {
                EngineState::Idle
            } else {
                EngineState::Stopped
            };
            self.inner.state.send_replace(next);
        }
    }

    // ── Topology ─────────────────────────────────────────────────────

    /// Rediscover the topology of the current fleet and swap it in.
    /// Manual links from the current topology are kept.
    pub async fn discover(&self) -> Topology {
        let fleet = self.fleet();
        let discovered = self.inner.builder.build(&fleet.devices).await;
        let manual: Vec<Link> = self.fleet().topology.manual_links().cloned().collect();
        let merged = discovered.with_manual_links(manual);
        self.reload_topology(merged.clone());
        merged
    }

    /// Per-link traffic from the latest sample of each link's source
    /// interface.
    pub fn link_loads(&self) -> Result<Vec<LinkLoad>, CoreError> {
        let latest: HashMap<String, InterfaceSample> = self
            .inner
            .store
            .latest_per_series()?
            .into_iter()
            .map(|s| (s.series_key(), s))
            .collect();

        let fleet = self.fleet();
        Ok(fleet
            .topology
            .links
            .iter()
            .map(|link| {
                let sample = latest.get(&series_key(&link.source_device, &link.source_interface));
                LinkLoad {
                    link: link.clone(),
                    in_bps: sample.map_or(0.0, |s| s.in_bps),
                    out_bps: sample.map_or(0.0, |s| s.out_bps),
                    status: sample.map(|s| s.status),
                    sampled_at: sample.map(|s| s.timestamp),
                }
            })
            .collect())
    }
}

// ── Background tasks ─────────────────────────────────────────────────

async fn tick_task(engine: PollingEngine, period: Duration, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut cycles = JoinSet::new();

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                while cycles.try_join_next().is_some() {}
                if !cycles.is_empty() {
                    debug!(in_flight = cycles.len(), "previous cycle still running");
                }
                let engine = engine.clone();
                cycles.spawn(async move {
                    engine.run_cycle().await;
                });
            }
        }
    }

    // let in-flight sessions finish or time out on their own
    while cycles.join_next().await.is_some() {}
}

async fn discovery_task(engine: PollingEngine, period: Duration, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                let topology = engine.discover().await;
                if let Some(path) = &engine.inner.config.topology_path {
                    if let Err(e) = save_topology(path, &topology) {
                        warn!(error = %e, "failed to save rediscovered topology");
                    }
                }
            }
        }
    }
}

async fn follow_task(
    engine: PollingEngine,
    mut updates: mpsc::Receiver<FleetUpdate>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            update = updates.recv() => {
                let Some(update) = update else {
                    debug!("fleet update source closed");
                    break;
                };
                engine.apply(update);
            }
        }
    }
}
