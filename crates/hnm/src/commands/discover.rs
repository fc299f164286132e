//! Topology discovery command.

use tracing::info;

use hnm_core::{TopologyBuilder, load_topology, save_topology};

use crate::cli::{DiscoverArgs, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::Context;
use super::topology::{LinkRow, link_id};

pub async fn handle(ctx: &Context, args: DiscoverArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let devices = ctx.devices(&[])?;
    let path = ctx.topology_path();
    let existing = load_topology(&path)?;

    let builder = TopologyBuilder::new(Context::connector(), ctx.config.poller.max_sessions);
    let discovered = builder.build(&devices).await;
    let topology = discovered.with_manual_links(existing.manual_links().cloned());
    info!(links = topology.len(), "discovery finished");

    if args.save {
        save_topology(&path, &topology)?;
        if !global.quiet {
            eprintln!("Topology saved to {}", path.display());
        }
    }

    let out = output::render_list(
        &global.output,
        &topology.links,
        |l| LinkRow::from(l),
        link_id,
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
