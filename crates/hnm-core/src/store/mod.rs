// ── Sample store collaborator ──
//
// The orchestrator hands every enriched sample to a `SampleStore`.
// `MemoryStore` is the in-process implementation; durable backends
// implement the same trait.

mod collection;
mod memory;

pub use memory::MemoryStore;

use crate::error::CoreError;
use crate::model::InterfaceSample;

/// Append/query contract for interface samples.
pub trait SampleStore: Send + Sync {
    /// Record one sample.
    fn persist(&self, sample: &InterfaceSample) -> Result<(), CoreError>;

    /// The most recent sample of every series.
    fn latest_per_series(&self) -> Result<Vec<InterfaceSample>, CoreError>;

    /// Up to `limit` samples of one series, newest first.
    fn history(
        &self,
        device: &str,
        interface: &str,
        limit: usize,
    ) -> Result<Vec<InterfaceSample>, CoreError>;
}
