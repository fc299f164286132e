// ── Domain model ──

mod device;
mod link;
mod sample;

pub use device::{DeviceDescriptor, DeviceFamily, DiscoveryProtocol};
pub use link::{Link, LinkMedium, Topology, UNRESOLVED_INTERFACE};
pub use sample::{InterfaceSample, OperStatus, series_key};
