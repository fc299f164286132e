use thiserror::Error;

/// Top-level error type for the `hnm-snmp` crate.
///
/// Covers session setup, request/response exchange and table walking.
/// `hnm-core` maps these into per-device diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Session ─────────────────────────────────────────────────────
    /// The UDP session could not be opened (resolution, bind, connect).
    #[error("cannot open session to {target}: {reason}")]
    Connect { target: String, reason: String },

    /// No response after the full retry budget.
    #[error("no response from {target} after {attempts} attempt(s)")]
    Timeout { target: String, attempts: u32 },

    // ── Exchange ────────────────────────────────────────────────────
    /// A request could not be sent or its response could not be decoded.
    #[error("request to {target} failed: {reason}")]
    Request { target: String, reason: String },

    /// The agent answered with a non-zero error-status.
    #[error("agent returned error status {status} for {oid}")]
    Protocol { oid: String, status: u32 },

    /// The requested object does not exist on the agent.
    #[error("no such object: {oid}")]
    NoSuchObject { oid: String },

    // ── Walks ───────────────────────────────────────────────────────
    /// The agent returned an OID that does not advance past the cursor.
    #[error("walk under {root} stopped: agent returned non-increasing OID {oid}")]
    WalkLoop { root: String, oid: String },

    // ── Data ────────────────────────────────────────────────────────
    /// A textual OID could not be parsed.
    #[error("invalid OID '{0}'")]
    InvalidOid(String),
}

impl Error {
    /// Returns `true` if retrying the same request might succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Request { .. })
    }

    /// Returns `true` if the agent reported the object as absent.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NoSuchObject { .. })
    }
}
