// ── Counter-delta tracker ──
//
// Turns cumulative octet counters into bit rates. One `SeriesState` per
// `device/interface` key; `DashMap`'s entry guard serializes updates to
// the same key while different keys proceed independently.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::model::InterfaceSample;

#[derive(Debug, Clone, Copy, PartialEq)]
struct SeriesState {
    in_octets: u64,
    out_octets: u64,
    timestamp: DateTime<Utc>,
}

impl From<&InterfaceSample> for SeriesState {
    fn from(sample: &InterfaceSample) -> Self {
        Self {
            in_octets: sample.in_octets,
            out_octets: sample.out_octets,
            timestamp: sample.timestamp,
        }
    }
}

/// Per-series counter state, owned by whoever drives the sampling loop.
#[derive(Debug, Default)]
pub struct CounterTracker {
    series: DashMap<String, SeriesState>,
}

impl CounterTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fill in `in_bps`/`out_bps` from the previous observation of the same
    /// series, then record `sample` as the new previous observation.
    ///
    /// Rates stay zero for the first sample of a series and when the clock
    /// did not advance. A counter lower than last time (reset or wrap)
    /// reports zero for that direction only.
    pub fn observe(&self, sample: &mut InterfaceSample) {
        let next = SeriesState::from(&*sample);
        match self.series.entry(sample.series_key()) {
            Entry::Vacant(slot) => {
                slot.insert(next);
            }
            Entry::Occupied(mut slot) => {
                let last = *slot.get();
                if let Some(secs) = elapsed_secs(last.timestamp, next.timestamp) {
                    sample.in_bps = rate(last.in_octets, next.in_octets, secs);
                    sample.out_bps = rate(last.out_octets, next.out_octets, secs);
                }
                slot.insert(next);
            }
        }
    }

    /// Forget a series, e.g. after its device left the fleet.
    pub fn forget(&self, device: &str, interface: &str) {
        self.series
            .remove(&crate::model::series_key(device, interface));
    }

    /// Forget every series of `device`.
    pub fn forget_device(&self, device: &str) {
        let prefix = format!("{device}/");
        self.series.retain(|key, _| !key.starts_with(&prefix));
    }

    /// Number of tracked series.
    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

fn elapsed_secs(last: DateTime<Utc>, now: DateTime<Utc>) -> Option<f64> {
    let elapsed = (now - last).to_std().ok()?;
    let secs = elapsed.as_secs_f64();
    (secs > 0.0).then_some(secs)
}

#[allow(clippy::cast_precision_loss)]
fn rate(last: u64, now: u64, secs: f64) -> f64 {
    if now >= last {
        (now - last) as f64 * 8.0 / secs
    } else {
        0.0
    }
}
