// ── Device domain types ──

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::config::SnmpCredentials;

/// Device family. Only used to pick the discovery protocols that apply.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[non_exhaustive]
pub enum DeviceFamily {
    MikroTik,
    UniFi,
    EdgeRouter,
    #[default]
    Generic,
}

/// Neighbor-discovery protocols the walker knows how to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "UPPERCASE")]
pub enum DiscoveryProtocol {
    /// IEEE 802.1AB, readable on any standards-compliant device.
    Lldp,
    /// MikroTik Neighbor Discovery, via the vendor neighbor table.
    Mndp,
}

impl DeviceFamily {
    /// Discovery protocols to run against a device of this family, in order.
    pub fn discovery_protocols(self) -> &'static [DiscoveryProtocol] {
        match self {
            Self::MikroTik => &[DiscoveryProtocol::Lldp, DiscoveryProtocol::Mndp],
            Self::UniFi | Self::EdgeRouter | Self::Generic => &[DiscoveryProtocol::Lldp],
        }
    }
}

/// A device in the polled fleet.
///
/// Immutable for the duration of a polling cycle; a configuration reload
/// replaces the whole fleet.
#[derive(Debug, Clone)]
pub struct DeviceDescriptor {
    pub name: String,
    /// Hostname or IP address.
    pub host: String,
    pub family: DeviceFamily,
    pub snmp: SnmpCredentials,
}

impl DeviceDescriptor {
    pub fn new(name: impl Into<String>, host: impl Into<String>, family: DeviceFamily) -> Self {
        Self {
            name: name.into(),
            host: host.into(),
            family,
            snmp: SnmpCredentials::default(),
        }
    }

    /// Session parameters for the polling protocol.
    pub fn session_config(&self) -> hnm_snmp::SessionConfig {
        hnm_snmp::SessionConfig {
            host: self.host.clone(),
            port: self.snmp.port,
            community: self.snmp.community.clone(),
            timeout: self.snmp.timeout,
            retries: self.snmp.retries,
        }
    }
}
