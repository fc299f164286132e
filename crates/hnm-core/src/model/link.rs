// ── Topology link types ──

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Placeholder for a local interface the walker could not resolve.
pub const UNRESOLVED_INTERFACE: &str = "unknown";

/// Physical medium of a link, inferred from the source interface label.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString,
)]
pub enum LinkMedium {
    #[serde(rename = "10g")]
    #[strum(serialize = "10g")]
    TenGig,
    #[serde(rename = "1g")]
    #[strum(serialize = "1g")]
    OneGig,
    #[default]
    #[serde(rename = "ethernet")]
    #[strum(serialize = "ethernet")]
    Ethernet,
    #[serde(rename = "wireless")]
    #[strum(serialize = "wireless")]
    Wireless,
}

/// A directed adjacency between two devices.
///
/// Uniqueness within a topology is on `(source_device, source_interface,
/// target_device)`; see [`Link::dedup_key`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub source_device: String,
    pub source_interface: String,
    pub target_device: String,
    /// Remote port, when the discovery protocol reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_interface: Option<String>,
    #[serde(rename = "type")]
    pub medium: LinkMedium,
    /// Operator-declared rather than discovered.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub manual: bool,
}

impl Link {
    /// A discovered link; the medium is classified from `source_interface`.
    pub fn discovered(
        source_device: impl Into<String>,
        source_interface: impl Into<String>,
        target_device: impl Into<String>,
        target_interface: Option<String>,
    ) -> Self {
        let source_interface = source_interface.into();
        Self {
            medium: crate::classify::classify(&source_interface),
            source_device: source_device.into(),
            source_interface,
            target_device: target_device.into(),
            target_interface,
            manual: false,
        }
    }

    pub fn dedup_key(&self) -> (&str, &str, &str) {
        (
            &self.source_device,
            &self.source_interface,
            &self.target_device,
        )
    }
}

/// The set of links connecting the fleet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topology {
    #[serde(default)]
    pub links: Vec<Link>,
}

impl Topology {
    pub fn new(links: Vec<Link>) -> Self {
        Self { links }
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    /// Links whose source is `device`.
    pub fn links_from<'a>(&'a self, device: &'a str) -> impl Iterator<Item = &'a Link> + 'a {
        self.links.iter().filter(move |l| l.source_device == device)
    }

    /// Manual links only.
    pub fn manual_links(&self) -> impl Iterator<Item = &Link> {
        self.links.iter().filter(|l| l.manual)
    }
}
