// ── Reactive sample streams ──
//
// Subscription types for consuming latest-per-series changes from a
// `MemoryStore`.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::model::InterfaceSample;

type Snapshot = Arc<Vec<Arc<InterfaceSample>>>;

/// A subscription to the latest sample of every series.
///
/// Provides both point-in-time snapshot access and change notification via
/// [`changed()`](Self::changed) or by converting to a `Stream`.
pub struct SampleStream {
    current: Snapshot,
    receiver: watch::Receiver<Snapshot>,
}

impl SampleStream {
    pub(crate) fn new(receiver: watch::Receiver<Snapshot>) -> Self {
        let current = receiver.borrow().clone();
        Self { current, receiver }
    }

    /// Snapshot captured at creation or at the last `changed()`.
    pub fn current(&self) -> &Snapshot {
        &self.current
    }

    /// The latest snapshot (may have changed since creation).
    pub fn latest(&self) -> Snapshot {
        self.receiver.borrow().clone()
    }

    /// Wait for the next change, returning the new snapshot.
    /// Returns `None` if the store has been dropped.
    pub async fn changed(&mut self) -> Option<Snapshot> {
        self.receiver.changed().await.ok()?;
        let snap = self.receiver.borrow_and_update().clone();
        self.current = snap.clone();
        Some(snap)
    }

    pub fn into_stream(self) -> SampleWatchStream {
        SampleWatchStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// `Stream` adapter backed by a `watch::Receiver`.
pub struct SampleWatchStream {
    inner: WatchStream<Snapshot>,
}

impl Stream for SampleWatchStream {
    type Item = Snapshot;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use futures_util::StreamExt;
    use tokio_test::{assert_pending, assert_ready};

    use crate::model::{InterfaceSample, OperStatus};
    use crate::store::{MemoryStore, SampleStore};

    fn sample(interface: &str) -> InterfaceSample {
        InterfaceSample {
            device: "core".into(),
            interface: interface.into(),
            index: 1,
            timestamp: Utc::now(),
            in_octets: 0,
            out_octets: 0,
            in_bps: 0.0,
            out_bps: 0.0,
            status: OperStatus::Up,
        }
    }

    #[test]
    fn changed_wakes_on_persist() {
        let store = MemoryStore::default();
        let mut stream = store.subscribe();

        let mut changed = tokio_test::task::spawn(stream.changed());
        assert_pending!(changed.poll());

        store.persist(&sample("ether1")).unwrap();
        assert!(changed.is_woken());
        let snap = assert_ready!(changed.poll()).unwrap();
        assert_eq!(snap.len(), 1);
    }

    #[tokio::test]
    async fn into_stream_yields_snapshots() {
        let store = MemoryStore::default();
        let mut snapshots = store.subscribe().into_stream();

        // the first item is the snapshot at subscription time
        assert!(snapshots.next().await.unwrap().is_empty());

        store.persist(&sample("ether1")).unwrap();
        store.persist(&sample("ether2")).unwrap();
        let latest = snapshots.next().await.unwrap();
        assert_eq!(latest.len(), 2);
    }
}
