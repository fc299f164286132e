//! Long-running engine: tick loop, optional rediscovery, hot reload.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tabled::Tabled;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use hnm_config::{FileWatch, watch_file};
use hnm_core::{
    CycleReport, Fleet, FleetUpdate, LinkLoad, MemoryStore, PollingEngine, load_topology,
    save_topology,
};

use crate::cli::{GlobalOpts, OutputFormat, RunArgs};
use crate::error::CliError;
use crate::output;

use super::Context;

// ── Per-cycle output ────────────────────────────────────────────────

#[derive(Serialize)]
struct CycleOutput<'a> {
    #[serde(flatten)]
    report: &'a CycleReport,
    links: Vec<LinkLoad>,
}

#[derive(Tabled)]
struct LinkLoadRow {
    #[tabled(rename = "Source")]
    source: String,
    #[tabled(rename = "Interface")]
    interface: String,
    #[tabled(rename = "Target")]
    target: String,
    #[tabled(rename = "Type")]
    medium: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "In")]
    in_rate: String,
    #[tabled(rename = "Out")]
    out_rate: String,
}

impl LinkLoadRow {
    fn new(load: &LinkLoad, color: bool) -> Self {
        Self {
            source: load.link.source_device.clone(),
            interface: load.link.source_interface.clone(),
            target: load.link.target_device.clone(),
            medium: load.link.medium.to_string(),
            status: load
                .status
                .map_or_else(|| "-".into(), |s| output::paint_status(s, color)),
            in_rate: output::format_bps(load.in_bps),
            out_rate: output::format_bps(load.out_bps),
        }
    }
}

fn summary(report: &CycleReport) -> String {
    let mut line = format!(
        "cycle {}: {} device(s), {} sample(s) in {:.2}s",
        report.cycle,
        report.devices,
        report.samples,
        report.elapsed.as_secs_f64()
    );
    if !report.failed.is_empty() {
        line.push_str(&format!(", unreachable: {}", report.failed.join(", ")));
    }
    if report.persist_failures > 0 {
        line.push_str(&format!(", {} not stored", report.persist_failures));
    }
    line
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(ctx: &Context, args: RunArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let devices = ctx.devices(&[])?;
    let poller = ctx.poller_config();
    let topology_path = ctx.topology_path();
    let topology = load_topology(&topology_path)?;
    let store = Arc::new(MemoryStore::new(poller.retention));

    let engine = PollingEngine::new(
        poller,
        Context::connector(),
        store,
        Fleet { devices, topology },
    );

    if args.discover {
        let topology = engine.discover().await;
        save_topology(&topology_path, &topology)?;
        info!(links = topology.len(), path = %topology_path.display(), "topology rediscovered");
    }

    let (updates, rx) = mpsc::channel(8);
    engine.follow(rx).await;
    let mut watchers = Vec::new();
    if let Some(watch) = try_watch(&topology_path) {
        watchers.push(tokio::spawn(follow_topology(watch, updates.clone())));
    }
    if let Some(watch) = try_watch(&ctx.config_path) {
        watchers.push(tokio::spawn(follow_config(watch, updates)));
    }

    engine.start().await;
    let color = output::should_color(&global.color);
    let mut reports = engine.reports();
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = &mut shutdown => {
                if let Err(e) = result {
                    warn!(error = %e, "cannot listen for Ctrl-C, stopping");
                }
                break;
            }
            changed = reports.changed() => {
                if changed.is_err() {
                    break;
                }
                let report = reports.borrow_and_update().clone();
                if let Some(report) = report {
                    print_cycle(&engine, &report, global, color);
                }
            }
        }
    }

    info!("shutting down");
    for watcher in watchers {
        watcher.abort();
    }
    engine.shutdown().await;
    Ok(())
}

fn print_cycle(engine: &PollingEngine, report: &CycleReport, global: &GlobalOpts, color: bool) {
    let links = match engine.link_loads() {
        Ok(links) => links,
        Err(e) => {
            warn!(error = %e, "cannot read link loads");
            Vec::new()
        }
    };
    let cycle = CycleOutput { report, links };
    let out = output::render_single(
        &global.output,
        &cycle,
        |c| {
            if c.links.is_empty() {
                return summary(c.report);
            }
            let table = output::render_list(
                &OutputFormat::Table,
                &c.links,
                |l| LinkLoadRow::new(l, color),
                |_| String::new(),
            );
            format!("{}\n{table}", summary(c.report))
        },
        |c| c.report.cycle.to_string(),
    );
    output::print_output(&out, global.quiet);
}

// ── Hot reload ──────────────────────────────────────────────────────

fn try_watch(path: &Path) -> Option<FileWatch> {
    match watch_file(path) {
        Ok(watch) => Some(watch),
        Err(e) => {
            warn!(error = %e, "changes to {} will not be picked up", path.display());
            None
        }
    }
}

async fn follow_topology(mut watch: FileWatch, updates: mpsc::Sender<FleetUpdate>) {
    while watch.changed().await.is_some() {
        match load_topology(watch.path()) {
            Ok(topology) => {
                debug!(links = topology.len(), "topology document changed");
                if updates.send(FleetUpdate::Topology(topology)).await.is_err() {
                    break;
                }
            }
            // Half-written files parse badly; the next write event retries.
            Err(e) => warn!(error = %e, "keeping previous topology"),
        }
    }
}

async fn follow_config(mut watch: FileWatch, updates: mpsc::Sender<FleetUpdate>) {
    let path: PathBuf = watch.path().to_path_buf();
    while watch.changed().await.is_some() {
        match hnm_config::load_config_from(&path) {
            Ok(config) => {
                debug!(devices = config.devices.len(), "config file changed");
                let devices = config.device_descriptors();
                if updates.send(FleetUpdate::Devices(devices)).await.is_err() {
                    break;
                }
            }
            Err(e) => warn!(error = %e, "keeping previous device set"),
        }
    }
}
