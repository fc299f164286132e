// ── Neighbor discovery walker ──
//
// Reads neighbor tables from one device. The protocols that apply come
// from the device family; each protocol gets its own session so a
// failure in one never costs the other its links.

mod lldp;
mod mndp;

use std::collections::HashMap;
use std::sync::Arc;

use hnm_snmp::{Connector, Oid, Session, SnmpValue};
use tracing::{debug, warn};

use crate::error::CoreError;
use crate::model::{DeviceDescriptor, DiscoveryProtocol, Link};
use crate::oids;

/// Discovers the neighbors of single devices.
#[derive(Clone)]
pub struct NeighborWalker {
    connector: Arc<dyn Connector>,
}

impl NeighborWalker {
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self { connector }
    }

    /// Links observed from `device`, in protocol order.
    ///
    /// Protocol failures are logged and contribute no links.
    pub fn discover(&self, device: &DeviceDescriptor) -> Vec<Link> {
        let mut links = Vec::new();
        for &protocol in device.family.discovery_protocols() {
            match self.discover_with(device, protocol) {
                Ok(found) => {
                    debug!(device = %device.name, %protocol, links = found.len(), "neighbors discovered");
                    links.extend(found);
                }
                Err(e) => {
                    warn!(device = %device.name, %protocol, error = %e, "neighbor discovery failed");
                }
            }
        }
        links
    }

    /// Run a single discovery protocol against `device`.
    pub fn discover_with(
        &self,
        device: &DeviceDescriptor,
        protocol: DiscoveryProtocol,
    ) -> Result<Vec<Link>, CoreError> {
        let mut session = self.connector.connect(&device.session_config())?;
        let links = match protocol {
            DiscoveryProtocol::Lldp => lldp::neighbors(session.as_mut(), &device.name)?,
            DiscoveryProtocol::Mndp => mndp::neighbors(session.as_mut(), &device.name)?,
        };
        Ok(links)
    }
}

/// Text of a fetched value, `None` when absent or blank.
fn non_empty_text(value: &SnmpValue) -> Option<String> {
    value
        .as_text()
        .map(|s| s.trim().to_owned())
        .filter(|s| !s.is_empty())
}

/// `ifIndex` to `ifName`. LLDP local port numbers and MNDP interface ids
/// both match `ifIndex` on the devices we poll.
fn local_port_names(session: &mut dyn Session, device: &str) -> HashMap<u32, String> {
    let mut names = HashMap::new();
    let walked = session.walk(
        &Oid::from(oids::IF_NAME),
        &mut |index: &[u32], value: SnmpValue| {
            if let ([if_index], Some(name)) = (index, non_empty_text(&value)) {
                names.insert(*if_index, name);
            }
        },
    );
    if let Err(e) = walked {
        warn!(device, error = %e, "ifName walk failed, local ports will be numbered");
    }
    names
}
