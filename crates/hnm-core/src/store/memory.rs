use tracing::trace;

use super::SampleStore;
use super::collection::SeriesCollection;
use crate::error::CoreError;
use crate::model::{InterfaceSample, series_key};
use crate::stream::SampleStream;

/// Samples kept per series unless configured otherwise.
pub const DEFAULT_RETENTION: usize = 100;

/// In-process sample store with bounded per-series history.
pub struct MemoryStore {
    samples: SeriesCollection,
}

impl MemoryStore {
    pub fn new(retention: usize) -> Self {
        Self {
            samples: SeriesCollection::new(retention),
        }
    }

    /// Subscribe to the latest-per-series view.
    pub fn subscribe(&self) -> SampleStream {
        SampleStream::new(self.samples.subscribe())
    }

    /// Drop every series of `device`.
    pub fn remove_device(&self, device: &str) -> usize {
        let prefix = format!("{device}/");
        self.samples
            .keys()
            .into_iter()
            .filter(|key| key.starts_with(&prefix))
            .filter(|key| self.samples.remove(key))
            .count()
    }

    /// Number of series held.
    pub fn series_count(&self) -> usize {
        self.samples.len()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(DEFAULT_RETENTION)
    }
}

impl SampleStore for MemoryStore {
    fn persist(&self, sample: &InterfaceSample) -> Result<(), CoreError> {
        let key = sample.series_key();
        if self.samples.push(key.clone(), sample.clone()) {
            trace!(series = %key, "new series");
        }
        Ok(())
    }

    fn latest_per_series(&self) -> Result<Vec<InterfaceSample>, CoreError> {
        Ok(self
            .samples
            .snapshot()
            .iter()
            .map(|s| InterfaceSample::clone(s))
            .collect())
    }

    fn history(
        &self,
        device: &str,
        interface: &str,
        limit: usize,
    ) -> Result<Vec<InterfaceSample>, CoreError> {
        Ok(self
            .samples
            .history(&series_key(device, interface), limit)
            .iter()
            .map(|s| InterfaceSample::clone(s))
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::OperStatus;

    fn sample(device: &str, interface: &str, secs: i64) -> InterfaceSample {
        InterfaceSample {
            device: device.into(),
            interface: interface.into(),
            index: 1,
            timestamp: Utc.timestamp_opt(1_700_000_000, 0).unwrap() + Duration::seconds(secs),
            in_octets: 0,
            out_octets: 0,
            in_bps: 0.0,
            out_bps: 0.0,
            status: OperStatus::Up,
        }
    }

    #[test]
    fn latest_is_one_row_per_series() {
        let store = MemoryStore::default();
        for secs in 0..3 {
            store.persist(&sample("core", "ether1", secs)).unwrap();
            store.persist(&sample("core", "ether2", secs)).unwrap();
        }
        let latest = store.latest_per_series().unwrap();
        assert_eq!(latest.len(), 2);
        assert!(latest.iter().all(|s| s.timestamp == sample("x", "y", 2).timestamp));
    }

    #[test]
    fn history_is_newest_first_and_limited() {
        let store = MemoryStore::new(100);
        for secs in 0..10 {
            store.persist(&sample("core", "ether1", secs)).unwrap();
        }
        let history = store.history("core", "ether1", 3).unwrap();
        let ts: Vec<_> = history.iter().map(|s| s.timestamp).collect();
        assert_eq!(
            ts,
            vec![
                sample("", "", 9).timestamp,
                sample("", "", 8).timestamp,
                sample("", "", 7).timestamp,
            ]
        );
        assert!(store.history("core", "missing", 3).unwrap().is_empty());
    }

    #[test]
    fn remove_device_drops_only_its_series() {
        let store = MemoryStore::default();
        store.persist(&sample("core", "ether1", 0)).unwrap();
        store.persist(&sample("core", "ether2", 0)).unwrap();
        store.persist(&sample("core2", "ether1", 0)).unwrap();
        assert_eq!(store.remove_device("core"), 2);
        assert_eq!(store.series_count(), 1);
    }

    #[tokio::test]
    async fn subscribers_see_new_samples() {
        let store = MemoryStore::default();
        let mut stream = store.subscribe();
        assert!(stream.current().is_empty());

        store.persist(&sample("core", "ether1", 0)).unwrap();
        let snap = stream.changed().await.unwrap();
        assert_eq!(snap.len(), 1);
        assert_eq!(stream.latest().len(), 1);
    }
}
