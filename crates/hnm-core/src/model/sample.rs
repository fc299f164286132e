// ── Interface sample types ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;

/// Interface operational status as reported by ifOperStatus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum OperStatus {
    Up,
    Down,
}

impl OperStatus {
    /// ifOperStatus `up(1)`; every other value is treated as down.
    pub fn from_if_oper_status(raw: i64) -> Self {
        if raw == 1 { Self::Up } else { Self::Down }
    }

    pub fn is_up(self) -> bool {
        matches!(self, Self::Up)
    }
}

/// One interface reading from one poll.
///
/// Counters are cumulative octet counts straight from the device. The
/// bit-rate fields are filled in by the counter tracker and stay zero until
/// a previous sample exists for the same series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterfaceSample {
    pub device: String,
    pub interface: String,
    /// ifIndex the interface was read from.
    pub index: u32,
    pub timestamp: DateTime<Utc>,
    pub in_octets: u64,
    pub out_octets: u64,
    /// Inbound rate in bits per second.
    pub in_bps: f64,
    /// Outbound rate in bits per second.
    pub out_bps: f64,
    pub status: OperStatus,
}

impl InterfaceSample {
    /// Key of the series this sample belongs to (`device/interface`).
    pub fn series_key(&self) -> String {
        series_key(&self.device, &self.interface)
    }
}

/// Series key for a device/interface pair.
///
/// Plain concatenation: names that themselves contain `/` may collide.
pub fn series_key(device: &str, interface: &str) -> String {
    format!("{device}/{interface}")
}
