//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use hnm_config::ConfigError;
use hnm_core::CoreError;

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach {target}")]
    #[diagnostic(
        code(hnm::connection_failed),
        help(
            "{reason}\n\
             Check the device address, that SNMP v2c is enabled, and the community string."
        )
    )]
    ConnectionFailed { target: String, reason: String },

    #[error("{target} did not answer after {attempts} attempt(s)")]
    #[diagnostic(
        code(hnm::timeout),
        help("Raise devices.snmp.timeout or devices.snmp.retries in the config file.")
    )]
    Timeout { target: String, attempts: u32 },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(hnm::not_found),
        help("Run: hnm {list_command} to see configured {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    #[error("No devices configured")]
    #[diagnostic(
        code(hnm::no_devices),
        help(
            "Add [[devices]] entries to {path}\n\
             Create a starter file with: hnm config init"
        )
    )]
    NoDevices { path: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(hnm::validation))]
    Validation { field: String, reason: String },

    #[error("Config file already exists at {path}")]
    #[diagnostic(code(hnm::config_exists), help("Use --force to overwrite it."))]
    ConfigExists { path: String },

    // ── Engine ───────────────────────────────────────────────────────
    #[error("Topology document {path} is unusable: {message}")]
    #[diagnostic(
        code(hnm::topology),
        help("Each link needs source_device, source_interface and target_device.")
    )]
    Topology { path: String, message: String },

    #[error("Sample store failed for {series}: {message}")]
    #[diagnostic(code(hnm::store))]
    Store { series: String, message: String },

    #[error("{0}")]
    #[diagnostic(code(hnm::engine))]
    Engine(String),

    // ── Configuration ────────────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(code(hnm::config))]
    Config(Box<ConfigError>),

    // ── IO ───────────────────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Validation { .. } | Self::ConfigExists { .. } | Self::Config(_) => {
                exit_code::USAGE
            }
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { target, reason } => {
                CliError::ConnectionFailed { target, reason }
            }
            CoreError::Timeout { target, attempts } => CliError::Timeout { target, attempts },
            CoreError::Topology { path, message } => CliError::Topology { path, message },
            CoreError::Store { series, message } => CliError::Store { series, message },
            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },
            e @ (CoreError::Walk { .. } | CoreError::NotFound { .. } | CoreError::Internal(_)) => {
                CliError::Engine(e.to_string())
            }
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::Io(e) => CliError::Io(e),
            other => CliError::Config(Box::new(other)),
        }
    }
}
