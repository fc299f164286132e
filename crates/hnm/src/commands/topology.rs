//! Topology command handlers.

use serde::Serialize;
use tabled::Tabled;

use hnm_core::{Link, LinkMedium, classify, load_topology};

use crate::cli::{GlobalOpts, TopologyArgs, TopologyCommand};
use crate::error::CliError;
use crate::output;

use super::Context;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
pub(super) struct LinkRow {
    #[tabled(rename = "Source")]
    source: String,
    #[tabled(rename = "Interface")]
    interface: String,
    #[tabled(rename = "Target")]
    target: String,
    #[tabled(rename = "Remote Port")]
    remote: String,
    #[tabled(rename = "Type")]
    medium: String,
    #[tabled(rename = "Origin")]
    origin: &'static str,
}

impl From<&Link> for LinkRow {
    fn from(l: &Link) -> Self {
        Self {
            source: l.source_device.clone(),
            interface: l.source_interface.clone(),
            target: l.target_device.clone(),
            remote: l.target_interface.clone().unwrap_or_default(),
            medium: l.medium.to_string(),
            origin: if l.manual { "manual" } else { "discovered" },
        }
    }
}

/// `source/interface -> target` for plain output.
pub(super) fn link_id(l: &Link) -> String {
    format!("{}/{} -> {}", l.source_device, l.source_interface, l.target_device)
}

#[derive(Serialize)]
struct Classification {
    label: String,
    #[serde(rename = "type")]
    medium: LinkMedium,
}

#[derive(Tabled)]
struct ClassificationRow {
    #[tabled(rename = "Label")]
    label: String,
    #[tabled(rename = "Type")]
    medium: String,
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(ctx: &Context, args: TopologyArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        TopologyCommand::Show => {
            let topology = load_topology(&ctx.topology_path())?;
            let out = output::render_list(
                &global.output,
                &topology.links,
                |l| LinkRow::from(l),
                link_id,
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        TopologyCommand::Classify { labels } => {
            let results: Vec<Classification> = labels
                .into_iter()
                .map(|label| Classification {
                    medium: classify(&label),
                    label,
                })
                .collect();
            let out = output::render_list(
                &global.output,
                &results,
                |c| ClassificationRow {
                    label: c.label.clone(),
                    medium: c.medium.to_string(),
                },
                |c| c.medium.to_string(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
