// ── Topology builder ──
//
// Runs neighbor discovery across the fleet and folds the observations
// into one deduplicated link set. Also owns the YAML document format the
// topology is persisted in.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use hnm_snmp::Connector;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::discovery::NeighborWalker;
use crate::error::CoreError;
use crate::model::{DeviceDescriptor, Link, Topology};

/// Builds a [`Topology`] by discovering every device's neighbors.
#[derive(Clone)]
pub struct TopologyBuilder {
    walker: NeighborWalker,
    sessions: Arc<Semaphore>,
}

impl TopologyBuilder {
    pub fn new(connector: Arc<dyn Connector>, max_sessions: usize) -> Self {
        Self::with_sessions(connector, Arc::new(Semaphore::new(max_sessions.max(1))))
    }

    /// Share a session budget with another component (the polling engine).
    pub fn with_sessions(connector: Arc<dyn Connector>, sessions: Arc<Semaphore>) -> Self {
        Self {
            walker: NeighborWalker::new(connector),
            sessions,
        }
    }

    /// Discover every device concurrently and deduplicate the result.
    ///
    /// Links are concatenated in device order before deduplication, so the
    /// result is deterministic for a given fleet and network.
    pub async fn build(&self, devices: &[DeviceDescriptor]) -> Topology {
        let handles: Vec<_> = devices
            .iter()
            .cloned()
            .map(|device| {
                let walker = self.walker.clone();
                let sessions = Arc::clone(&self.sessions);
                tokio::spawn(async move {
                    let _permit = sessions.acquire_owned().await.ok()?;
                    let name = device.name.clone();
                    match tokio::task::spawn_blocking(move || walker.discover(&device)).await {
                        Ok(links) => Some(links),
                        Err(e) => {
                            warn!(device = %name, error = %e, "discovery task failed");
                            None
                        }
                    }
                })
            })
            .collect();

        let mut links = Vec::new();
        for handle in handles {
            match handle.await {
                Ok(Some(found)) => links.extend(found),
                Ok(None) => {}
                Err(e) => warn!(error = %e, "discovery task panicked"),
            }
        }

        let raw = links.len();
        let topology = Topology::new(dedup_links(links));
        info!(
            devices = devices.len(),
            raw,
            links = topology.len(),
            "topology discovery complete"
        );
        topology
    }

    /// Discover one device synchronously (no deduplication across devices).
    pub fn discover_device(&self, device: &DeviceDescriptor) -> Vec<Link> {
        self.walker.discover(device)
    }
}

/// Keep the first link seen for each `(source_device, source_interface,
/// target_device)`, preserving input order.
pub fn dedup_links(links: Vec<Link>) -> Vec<Link> {
    let mut seen: HashSet<(String, String, String)> = HashSet::with_capacity(links.len());
    links
        .into_iter()
        .filter(|link| {
            let (source_device, source_interface, target_device) = link.dedup_key();
            let fresh = seen.insert((
                source_device.to_owned(),
                source_interface.to_owned(),
                target_device.to_owned(),
            ));
            if !fresh {
                debug!(
                    source = %source_device,
                    interface = %source_interface,
                    target = %target_device,
                    "dropping duplicate link"
                );
            }
            fresh
        })
        .collect()
}

impl Topology {
    /// Merge operator-declared links ahead of `self`'s links, so a manual
    /// link wins its dedup key over anything discovered.
    pub fn with_manual_links<I>(self, manual: I) -> Topology
    where
        I: IntoIterator<Item = Link>,
    {
        let links = manual
            .into_iter()
            .map(|mut link| {
                link.manual = true;
                link
            })
            .chain(self.links)
            .collect();
        Topology::new(dedup_links(links))
    }
}

// ── Persistence ──────────────────────────────────────────────────────

/// Read a topology document. A missing file is an empty topology.
pub fn load_topology(path: &Path) -> Result<Topology, CoreError> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no topology document yet");
            return Ok(Topology::default());
        }
        Err(e) => return Err(topology_error(path, &e)),
    };
    if text.trim().is_empty() {
        return Ok(Topology::default());
    }
    serde_yaml::from_str(&text).map_err(|e| topology_error(path, &e))
}

/// Write a topology document, creating parent directories as needed.
pub fn save_topology(path: &Path, topology: &Topology) -> Result<(), CoreError> {
    let yaml = serde_yaml::to_string(topology).map_err(|e| topology_error(path, &e))?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| topology_error(path, &e))?;
    }
    std::fs::write(path, yaml).map_err(|e| topology_error(path, &e))?;
    debug!(path = %path.display(), links = topology.len(), "topology saved");
    Ok(())
}

fn topology_error(path: &Path, err: &dyn std::fmt::Display) -> CoreError {
    CoreError::Topology {
        path: path.display().to_string(),
        message: err.to_string(),
    }
}
