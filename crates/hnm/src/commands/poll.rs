//! One-shot sampling rounds.

use std::sync::Arc;
use std::time::Duration;

use tabled::Tabled;
use tracing::{debug, info};

use hnm_core::{Fleet, InterfaceSample, MemoryStore, PollingEngine, SampleStore, Topology};

use crate::cli::{GlobalOpts, PollArgs};
use crate::error::CliError;
use crate::output;

use super::Context;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct SampleRow {
    #[tabled(rename = "Device")]
    device: String,
    #[tabled(rename = "Interface")]
    interface: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "In")]
    in_rate: String,
    #[tabled(rename = "Out")]
    out_rate: String,
    #[tabled(rename = "Sampled")]
    sampled: String,
}

impl SampleRow {
    fn new(s: &InterfaceSample, color: bool) -> Self {
        Self {
            device: s.device.clone(),
            interface: s.interface.clone(),
            status: output::paint_status(s.status, color),
            in_rate: output::format_bps(s.in_bps),
            out_rate: output::format_bps(s.out_bps),
            sampled: s.timestamp.format("%H:%M:%S").to_string(),
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(ctx: &Context, args: PollArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let devices = ctx.devices(&args.devices)?;
    let poller = ctx.poller_config();
    let interval = args.interval.map_or(poller.interval, Duration::from_secs);
    let store = Arc::new(MemoryStore::new(poller.retention));
    let engine = PollingEngine::new(
        poller,
        Context::connector(),
        Arc::clone(&store) as Arc<dyn SampleStore>,
        Fleet {
            devices,
            topology: Topology::default(),
        },
    );

    let rounds = args.rounds.max(1);
    let mut failed = Vec::new();
    for round in 1..=rounds {
        if round > 1 {
            debug!(seconds = interval.as_secs_f64(), "waiting for next round");
            tokio::time::sleep(interval).await;
        }
        let report = engine.run_cycle().await;
        info!(
            round,
            samples = report.samples,
            failed = report.failed.len(),
            "sampling round complete"
        );
        failed = report.failed;
    }

    let mut samples = store.latest_per_series()?;
    if samples.is_empty() && !failed.is_empty() {
        return Err(CliError::ConnectionFailed {
            target: failed.join(", "),
            reason: "No device returned interface counters.".into(),
        });
    }
    samples.sort_by(|a, b| (&a.device, a.index).cmp(&(&b.device, b.index)));

    let color = output::should_color(&global.color);
    let out = output::render_list(
        &global.output,
        &samples,
        |s| SampleRow::new(s, color),
        InterfaceSample::series_key,
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
