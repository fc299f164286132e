use hnm_snmp::{Oid, Session, SnmpValue};
use tracing::{debug, trace};

use super::{local_port_names, non_empty_text};
use crate::model::Link;
use crate::oids;

/// One row of lldpRemTable: `(timeMark, localPortNum, remIndex)` and the
/// advertised system name.
struct RemoteEntry {
    suffix: [u32; 3],
    system_name: String,
}

pub(super) fn neighbors(
    session: &mut dyn Session,
    device: &str,
) -> Result<Vec<Link>, hnm_snmp::Error> {
    let local_ports = local_port_names(session, device);

    let mut entries = Vec::new();
    session.walk(
        &Oid::from(oids::LLDP_REM_SYS_NAME),
        &mut |index: &[u32], value: SnmpValue| {
            let Ok(suffix) = <[u32; 3]>::try_from(index) else {
                trace!(device, ?index, "malformed lldpRemSysName index");
                return;
            };
            match non_empty_text(&value) {
                Some(system_name) => entries.push(RemoteEntry { suffix, system_name }),
                None => debug!(device, ?index, "neighbor without a system name"),
            }
        },
    )?;

    let port_id_root = Oid::from(oids::LLDP_REM_PORT_ID);
    let links = entries
        .into_iter()
        .map(|entry| {
            let [_, local_port, _] = entry.suffix;
            let source_interface = local_ports
                .get(&local_port)
                .cloned()
                .unwrap_or_else(|| format!("port-{local_port}"));
            let target_interface = match session.get(&port_id_root.join(&entry.suffix)) {
                Ok(value) => non_empty_text(&value),
                Err(e) => {
                    trace!(device, local_port, error = %e, "remote port id unavailable");
                    None
                }
            };
            Link::discovered(device, source_interface, entry.system_name, target_interface)
        })
        .collect();
    Ok(links)
}
