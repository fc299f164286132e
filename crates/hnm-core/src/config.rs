// ── Runtime configuration ──
//
// These types describe *what* to poll and *how often*. They carry
// credential data and tuning, but never touch disk: hnm-config builds
// them from the TOML document and hands them in.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

/// Polling-protocol credentials and session tuning for one device.
#[derive(Debug, Clone)]
pub struct SnmpCredentials {
    /// v2c community string.
    pub community: SecretString,
    pub port: u16,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Extra attempts after a failed request.
    pub retries: u32,
}

impl Default for SnmpCredentials {
    fn default() -> Self {
        Self {
            community: SecretString::from("public".to_owned()),
            port: hnm_snmp::transport::DEFAULT_PORT,
            timeout: hnm_snmp::transport::DEFAULT_TIMEOUT,
            retries: hnm_snmp::transport::DEFAULT_RETRIES,
        }
    }
}

/// Cadence and resource limits for the polling engine.
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Time between sampling ticks.
    pub interval: Duration,
    /// Time between topology rediscoveries. `None` = on demand only.
    pub discovery_interval: Option<Duration>,
    /// Upper bound on concurrently open device sessions.
    pub max_sessions: usize,
    /// Samples kept per series by the in-memory store.
    pub retention: usize,
    /// Where periodic rediscovery writes its result, if anywhere.
    pub topology_path: Option<PathBuf>,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            discovery_interval: None,
            max_sessions: 16,
            retention: 100,
            topology_path: None,
        }
    }
}
