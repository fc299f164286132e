// ── Core error types ──
//
// Errors surfaced by hnm-core. Consumers never see raw protocol errors;
// the `From<hnm_snmp::Error>` impl translates them into domain variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("cannot open session to {target}: {reason}")]
    ConnectionFailed { target: String, reason: String },

    #[error("{target} did not respond after {attempts} attempt(s)")]
    Timeout { target: String, attempts: u32 },

    // ── Protocol errors ──────────────────────────────────────────────
    #[error("walk failed: {message}")]
    Walk { message: String },

    #[error("object not found: {oid}")]
    NotFound { oid: String },

    // ── Collaborator errors ──────────────────────────────────────────
    #[error("store rejected sample for {series}: {message}")]
    Store { series: String, message: String },

    #[error("topology document {path}: {message}")]
    Topology { path: String, message: String },

    #[error("configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// `true` when the device could not be reached at all this cycle.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::ConnectionFailed { .. } | Self::Timeout { .. })
    }
}

// ── Conversion from protocol-layer errors ────────────────────────────

impl From<hnm_snmp::Error> for CoreError {
    fn from(err: hnm_snmp::Error) -> Self {
        match err {
            hnm_snmp::Error::Connect { target, reason } => {
                CoreError::ConnectionFailed { target, reason }
            }
            hnm_snmp::Error::Timeout { target, attempts } => {
                CoreError::Timeout { target, attempts }
            }
            hnm_snmp::Error::NoSuchObject { oid } => CoreError::NotFound { oid },
            e @ (hnm_snmp::Error::Request { .. }
            | hnm_snmp::Error::Protocol { .. }
            | hnm_snmp::Error::WalkLoop { .. }) => CoreError::Walk {
                message: e.to_string(),
            },
            hnm_snmp::Error::InvalidOid(oid) => {
                CoreError::Internal(format!("invalid OID '{oid}'"))
            }
        }
    }
}
