// hnm-snmp: Blocking SNMPv2c session layer (OIDs, values, table walks)

pub mod error;
pub mod memory;
pub mod oid;
pub mod session;
pub mod transport;
pub mod udp;
pub mod value;

pub use error::Error;
pub use memory::{MemoryAgent, MemoryConnector};
pub use oid::Oid;
pub use session::{Connector, Session};
pub use transport::SessionConfig;
pub use udp::UdpConnector;
pub use value::SnmpValue;
