//! Interface telemetry sampling and topology discovery.
//!
//! This crate owns the polling and discovery logic of the `hnm` workspace:
//!
//! - **[`PollingEngine`]** - Drives the sampling cadence. Each tick fans out
//!   one [`DeviceSampler`] per device (bounded by a session semaphore),
//!   runs the results through the [`CounterTracker`] and hands them to a
//!   [`SampleStore`]. The fleet can be swapped atomically while running.
//!
//! - **[`CounterTracker`]** - Per-series state turning cumulative octet
//!   counters into bit rates, with counter resets reported as zero.
//!
//! - **[`NeighborWalker`] / [`TopologyBuilder`]** - LLDP (and, on MikroTik,
//!   MNDP) neighbor tables folded into a deduplicated [`Topology`], plus the
//!   YAML document it is persisted as.
//!
//! - **[`MemoryStore`] / [`SampleStream`]** - In-process sample store with
//!   bounded history and a reactive latest-per-series view.
//!
//! The polling protocol itself lives in `hnm-snmp`; everything here talks to
//! devices through its `Connector` trait.

pub mod classify;
pub mod config;
pub mod discovery;
pub mod error;
pub mod model;
pub mod oids;
pub mod orchestrator;
pub mod sampler;
pub mod store;
pub mod stream;
pub mod topology;
pub mod tracker;

// ── Primary re-exports ──────────────────────────────────────────────
pub use classify::classify;
pub use config::{PollerConfig, SnmpCredentials};
pub use discovery::NeighborWalker;
pub use error::CoreError;
pub use orchestrator::{CycleReport, EngineState, Fleet, FleetUpdate, LinkLoad, PollingEngine};
pub use sampler::DeviceSampler;
pub use store::{MemoryStore, SampleStore};
pub use stream::SampleStream;
pub use topology::{TopologyBuilder, dedup_links, load_topology, save_topology};
pub use tracker::CounterTracker;

pub use model::{
    DeviceDescriptor, DeviceFamily, DiscoveryProtocol, InterfaceSample, Link, LinkMedium,
    OperStatus, Topology, UNRESOLVED_INTERFACE, series_key,
};
