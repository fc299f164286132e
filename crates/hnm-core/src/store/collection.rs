// ── Bounded per-series sample collection ──
//
// Concurrent storage keyed by series with push-based change
// notification via `watch` channels.

use std::collections::VecDeque;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::watch;

use crate::model::InterfaceSample;

/// Latest-per-series snapshot, sorted by series key.
pub(crate) type Snapshot = Arc<Vec<Arc<InterfaceSample>>>;

/// Per-series ring buffers of samples.
///
/// Every insert bumps a version counter and rebuilds the latest-per-series
/// snapshot that subscribers receive.
pub(crate) struct SeriesCollection {
    /// `device/interface` -> samples, oldest first.
    series: DashMap<String, VecDeque<Arc<InterfaceSample>>>,

    /// Samples kept per series.
    retention: usize,

    /// Version counter, bumped on every mutation.
    version: watch::Sender<u64>,

    snapshot: watch::Sender<Snapshot>,
}

impl SeriesCollection {
    pub(crate) fn new(retention: usize) -> Self {
        let (version, _) = watch::channel(0u64);
        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));

        Self {
            series: DashMap::new(),
            retention: retention.max(1),
            version,
            snapshot,
        }
    }

    /// Append a sample to its series. Returns `true` if the series was new.
    pub(crate) fn push(&self, key: String, sample: InterfaceSample) -> bool {
        let is_new = {
            let mut entry = self.series.entry(key).or_default();
            let is_new = entry.is_empty();
            entry.push_back(Arc::new(sample));
            while entry.len() > self.retention {
                entry.pop_front();
            }
            is_new
        };

        self.rebuild_snapshot();
        self.bump_version();

        is_new
    }

    /// The newest sample of one series.
    pub(crate) fn latest(&self, key: &str) -> Option<Arc<InterfaceSample>> {
        self.series.get(key).and_then(|s| s.back().cloned())
    }

    /// Up to `limit` samples of one series, newest first.
    pub(crate) fn history(&self, key: &str, limit: usize) -> Vec<Arc<InterfaceSample>> {
        self.series
            .get(key)
            .map(|s| s.iter().rev().take(limit).cloned().collect())
            .unwrap_or_default()
    }

    /// Remove a series. Returns `true` if it existed.
    pub(crate) fn remove(&self, key: &str) -> bool {
        let removed = self.series.remove(key).is_some();
        if removed {
            self.rebuild_snapshot();
            self.bump_version();
        }
        removed
    }

    /// Get the current snapshot (cheap `Arc` clone).
    pub(crate) fn snapshot(&self) -> Snapshot {
        self.snapshot.borrow().clone()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshot.subscribe()
    }

    pub(crate) fn version(&self) -> u64 {
        *self.version.borrow()
    }

    pub(crate) fn len(&self) -> usize {
        self.series.len()
    }

    pub(crate) fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.series.iter().map(|r| r.key().clone()).collect();
        keys.sort();
        keys
    }

    // ── Private helpers ──────────────────────────────────────────────

    fn rebuild_snapshot(&self) {
        let mut latest: Vec<(String, Arc<InterfaceSample>)> = self
            .series
            .iter()
            .filter_map(|r| r.value().back().map(|s| (r.key().clone(), Arc::clone(s))))
            .collect();
        latest.sort_by(|a, b| a.0.cmp(&b.0));
        let values = latest.into_iter().map(|(_, s)| s).collect();
        // `send_modify` updates unconditionally, even with zero receivers.
        self.snapshot.send_modify(|snap| *snap = Arc::new(values));
    }

    fn bump_version(&self) {
        self.version.send_modify(|v| *v += 1);
    }
}
