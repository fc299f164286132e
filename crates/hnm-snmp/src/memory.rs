// ── In-memory agent ──
//
// A table-backed stand-in for a real agent, for tests that must not
// touch the network.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::Error;
use crate::oid::Oid;
use crate::session::{Connector, Session};
use crate::transport::SessionConfig;
use crate::value::SnmpValue;

/// A fixed MIB view served from memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryAgent {
    objects: BTreeMap<Oid, SnmpValue>,
    failing_walks: BTreeSet<Oid>,
}

impl MemoryAgent {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a single object.
    pub fn with(mut self, oid: impl Into<Oid>, value: impl Into<SnmpValue>) -> Self {
        self.objects.insert(oid.into(), value.into());
        self
    }

    /// Install a table column: one row per `(index, value)` below `root`.
    pub fn with_column<I, V>(mut self, root: impl Into<Oid>, rows: I) -> Self
    where
        I: IntoIterator<Item = (Vec<u32>, V)>,
        V: Into<SnmpValue>,
    {
        let root = root.into();
        for (index, value) in rows {
            self.objects.insert(root.join(&index), value.into());
        }
        self
    }

    /// Make every walk rooted at `root` fail, as an agent without that MIB would.
    pub fn failing_walk(mut self, root: impl Into<Oid>) -> Self {
        self.failing_walks.insert(root.into());
        self
    }
}

/// Hands out sessions against registered [`MemoryAgent`]s, keyed by host.
#[derive(Debug, Default)]
pub struct MemoryConnector {
    agents: HashMap<String, Arc<MemoryAgent>>,
    connects: AtomicUsize,
}

impl MemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_agent(mut self, host: impl Into<String>, agent: MemoryAgent) -> Self {
        self.agents.insert(host.into(), Arc::new(agent));
        self
    }

    /// Number of sessions opened so far (successful or not).
    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::Relaxed)
    }
}

impl Connector for MemoryConnector {
    fn connect(&self, config: &SessionConfig) -> Result<Box<dyn Session>, Error> {
        self.connects.fetch_add(1, Ordering::Relaxed);
        let agent = self
            .agents
            .get(&config.host)
            .ok_or_else(|| Error::Connect {
                target: config.target(),
                reason: "host unreachable".into(),
            })?;
        Ok(Box::new(MemorySession {
            agent: Arc::clone(agent),
            target: config.target(),
        }))
    }
}

struct MemorySession {
    agent: Arc<MemoryAgent>,
    target: String,
}

impl Session for MemorySession {
    fn walk(
        &mut self,
        root: &Oid,
        visit: &mut dyn FnMut(&[u32], SnmpValue),
    ) -> Result<usize, Error> {
        if self.agent.failing_walks.contains(root) {
            return Err(Error::Request {
                target: self.target.clone(),
                reason: format!("walk of {root} rejected"),
            });
        }

        let mut visited = 0;
        for (oid, value) in self.agent.objects.range(root.clone()..) {
            let Some(index) = oid.strip_prefix(root) else {
                if oid == root {
                    continue;
                }
                break;
            };
            visit(index, value.clone());
            visited += 1;
        }
        Ok(visited)
    }

    fn get(&mut self, oid: &Oid) -> Result<SnmpValue, Error> {
        self.agent
            .objects
            .get(oid)
            .filter(|v| !v.is_absent())
            .cloned()
            .ok_or_else(|| Error::NoSuchObject {
                oid: oid.to_string(),
            })
    }
}
