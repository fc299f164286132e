use std::collections::HashMap;

use hnm_snmp::{Oid, Session, SnmpValue};
use tracing::{debug, trace};

use super::{local_port_names, non_empty_text};
use crate::model::{Link, UNRESOLVED_INTERFACE};
use crate::oids;

pub(super) fn neighbors(
    session: &mut dyn Session,
    device: &str,
) -> Result<Vec<Link>, hnm_snmp::Error> {
    let mut entries: Vec<(Vec<u32>, String)> = Vec::new();
    session.walk(
        &Oid::from(oids::MNDP_NEIGHBOR_IDENTITY),
        &mut |index: &[u32], value: SnmpValue| match non_empty_text(&value) {
            Some(identity) => entries.push((index.to_vec(), identity)),
            None => debug!(device, ?index, "neighbor without an identity"),
        },
    )?;

    if entries.is_empty() {
        return Ok(Vec::new());
    }

    // The neighbor table gives the local interface as an ifIndex; the
    // remote port is not exposed.
    let names = local_port_names(session, device);
    let interface_root = Oid::from(oids::MNDP_NEIGHBOR_INTERFACE);
    let links = entries
        .into_iter()
        .map(|(index, identity)| {
            let source_interface = match session.get(&interface_root.join(&index)) {
                Ok(value) => local_interface(&value, &names),
                Err(e) => {
                    trace!(device, ?index, error = %e, "neighbor interface unavailable");
                    None
                }
            }
            .unwrap_or_else(|| UNRESOLVED_INTERFACE.to_owned());
            Link::discovered(device, source_interface, identity, None)
        })
        .collect();
    Ok(links)
}

/// Name of the interface an interface-id value points at. Indexes
/// without an `ifName` get the sampler's `if-N` placeholder so link loads
/// still join; agents that report a name directly are taken at their word.
fn local_interface(value: &SnmpValue, names: &HashMap<u32, String>) -> Option<String> {
    match value {
        SnmpValue::Integer(_) | SnmpValue::Gauge32(_) => {
            let if_index = value.as_i64().and_then(|v| u32::try_from(v).ok())?;
            Some(
                names
                    .get(&if_index)
                    .cloned()
                    .unwrap_or_else(|| format!("if-{if_index}")),
            )
        }
        _ => non_empty_text(value),
    }
}
