//! Configuration for the hnm poller.
//!
//! TOML document, environment overrides, community-string resolution
//! (env + keyring + plaintext), validation, and translation into
//! `hnm_core` types. [`watch`] turns file changes into reload signals.

pub mod watch;

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use hnm_core::{DeviceDescriptor, DeviceFamily, PollerConfig, SnmpCredentials};

pub use watch::{FileWatch, watch_file};

/// Environment variable that overrides the config file location.
pub const CONFIG_PATH_ENV: &str = "HNM_CONFIG_PATH";

/// Keyring service under which community strings are stored.
pub const KEYRING_SERVICE: &str = "hnm";

const DEFAULT_COMMUNITY: &str = "public";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("cannot watch {path}: {source}")]
    Watch {
        path: String,
        #[source]
        source: notify::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub poller: PollerSection,

    #[serde(default)]
    pub paths: PathsSection,

    #[serde(default)]
    pub devices: Vec<DeviceEntry>,
}

/// `[poller]`: cadence and limits, in seconds where timed.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PollerSection {
    /// Sampling interval.
    #[serde(default = "default_live")]
    pub live: u64,

    /// Rediscovery interval, 0 = on demand only.
    #[serde(default)]
    pub discovery: u64,

    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,

    /// Samples kept per series in memory.
    #[serde(default = "default_retention")]
    pub retention: usize,
}

impl Default for PollerSection {
    fn default() -> Self {
        Self {
            live: default_live(),
            discovery: 0,
            max_sessions: default_max_sessions(),
            retention: default_retention(),
        }
    }
}

fn default_live() -> u64 {
    10
}
fn default_max_sessions() -> usize {
    16
}
fn default_retention() -> usize {
    100
}

/// `[paths]`. Relative paths are resolved against the config file's
/// directory.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PathsSection {
    #[serde(default = "default_topology_path")]
    pub topology: PathBuf,
}

impl Default for PathsSection {
    fn default() -> Self {
        Self {
            topology: default_topology_path(),
        }
    }
}

fn default_topology_path() -> PathBuf {
    PathBuf::from("topology.yaml")
}

/// One `[[devices]]` entry.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeviceEntry {
    pub name: String,

    /// Hostname or IP address.
    pub host: String,

    /// Device family: "mikrotik", "unifi", "edgerouter" or "generic".
    #[serde(rename = "type", default)]
    pub family: DeviceFamily,

    #[serde(default)]
    pub snmp: SnmpSection,
}

/// `[devices.snmp]`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SnmpSection {
    /// Only "v2c" is supported.
    #[serde(default = "default_version")]
    pub version: String,

    /// Community string (plaintext, prefer keyring or env var).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub community: Option<String>,

    /// Environment variable holding the community string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub community_env: Option<String>,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default = "default_retries")]
    pub retries: u32,
}

impl Default for SnmpSection {
    fn default() -> Self {
        Self {
            version: default_version(),
            community: None,
            community_env: None,
            port: default_port(),
            timeout: default_timeout(),
            retries: default_retries(),
        }
    }
}

fn default_version() -> String {
    "v2c".into()
}
fn default_port() -> u16 {
    161
}
fn default_timeout() -> u64 {
    2
}
fn default_retries() -> u32 {
    3
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path: `HNM_CONFIG_PATH`, else the platform
/// config directory.
pub fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV).filter(|p| !p.is_empty()) {
        return PathBuf::from(path);
    }
    ProjectDirs::from("net", "hnm", "hnm").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("hnm");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load and validate the config at the canonical path.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load and validate the config at `path`, with `HNM_` environment
/// overrides (`HNM_POLLER__LIVE=5`). A missing file yields the defaults.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("HNM_").split("__"));

    let config: Config = figment.extract()?;
    config.validate()?;
    debug!(path = %path.display(), devices = config.devices.len(), "configuration loaded");
    Ok(config)
}

/// Parse a TOML document without file or environment layers.
pub fn parse_config(toml_text: &str) -> Result<Config, ConfigError> {
    let config: Config = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::string(toml_text))
        .extract()?;
    config.validate()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write it to `path`.
pub fn save_config(path: &Path, cfg: &Config) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Validation ──────────────────────────────────────────────────────

impl Config {
    /// Check invariants figment cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poller.live == 0 {
            return Err(invalid("poller.live", "must be greater than zero"));
        }
        if self.poller.max_sessions == 0 {
            return Err(invalid("poller.max_sessions", "must be greater than zero"));
        }

        let mut names = HashSet::new();
        for (i, device) in self.devices.iter().enumerate() {
            if device.name.trim().is_empty() {
                return Err(invalid(&format!("devices[{i}].name"), "must not be empty"));
            }
            if !names.insert(device.name.as_str()) {
                return Err(invalid(
                    &format!("devices[{i}].name"),
                    &format!("duplicate device name '{}'", device.name),
                ));
            }
            if device.host.trim().is_empty() {
                return Err(invalid(&format!("devices[{i}].host"), "must not be empty"));
            }
            let version = device.snmp.version.to_ascii_lowercase();
            if version != "v2c" && version != "2c" {
                return Err(invalid(
                    &format!("devices[{i}].snmp.version"),
                    &format!("only v2c is supported, got '{}'", device.snmp.version),
                ));
            }
        }
        Ok(())
    }

    pub fn device(&self, name: &str) -> Option<&DeviceEntry> {
        self.devices.iter().find(|d| d.name == name)
    }

    /// Topology document path, resolved against `config_dir` when relative.
    pub fn topology_path(&self, config_dir: &Path) -> PathBuf {
        if self.paths.topology.is_absolute() {
            self.paths.topology.clone()
        } else {
            config_dir.join(&self.paths.topology)
        }
    }

    // ── Translation to core types ──

    /// Engine settings. `config_dir` anchors the topology path.
    pub fn poller_config(&self, config_dir: &Path) -> PollerConfig {
        PollerConfig {
            interval: Duration::from_secs(self.poller.live),
            discovery_interval: (self.poller.discovery > 0)
                .then(|| Duration::from_secs(self.poller.discovery)),
            max_sessions: self.poller.max_sessions,
            retention: self.poller.retention,
            topology_path: Some(self.topology_path(config_dir)),
        }
    }

    /// The fleet as core descriptors, with community strings resolved.
    pub fn device_descriptors(&self) -> Vec<DeviceDescriptor> {
        self.devices.iter().map(DeviceEntry::to_descriptor).collect()
    }

    /// A commented-out starter document for `hnm config init`.
    pub fn template() -> &'static str {
        TEMPLATE
    }
}

impl DeviceEntry {
    pub fn to_descriptor(&self) -> DeviceDescriptor {
        DeviceDescriptor {
            name: self.name.clone(),
            host: self.host.clone(),
            family: self.family,
            snmp: SnmpCredentials {
                community: resolve_community(self),
                port: self.snmp.port,
                timeout: Duration::from_secs(self.snmp.timeout.max(1)),
                retries: self.snmp.retries,
            },
        }
    }
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::Validation {
        field: field.into(),
        reason: reason.into(),
    }
}

// ── Credential resolution ───────────────────────────────────────────

/// Where a device's community string came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommunitySource {
    Env,
    Keyring,
    Plaintext,
    Default,
}

/// Resolve a device's community string: `community_env` → system keyring
/// (`hnm` / `<device>/community`) → plaintext → `public`.
pub fn resolve_community(device: &DeviceEntry) -> SecretString {
    resolve_community_with_source(device).0
}

pub fn resolve_community_with_source(device: &DeviceEntry) -> (SecretString, CommunitySource) {
    // 1. Env var named by the device
    if let Some(ref env_name) = device.snmp.community_env {
        if let Ok(val) = std::env::var(env_name) {
            return (SecretString::from(val), CommunitySource::Env);
        }
    }

    // 2. System keyring
    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, &format!("{}/community", device.name)) {
        if let Ok(secret) = entry.get_password() {
            return (SecretString::from(secret), CommunitySource::Keyring);
        }
    }

    // 3. Plaintext in config
    if let Some(ref community) = device.snmp.community {
        return (SecretString::from(community.clone()), CommunitySource::Plaintext);
    }

    (
        SecretString::from(DEFAULT_COMMUNITY.to_owned()),
        CommunitySource::Default,
    )
}

const TEMPLATE: &str = r#"# hnm configuration

[poller]
live = 10            # sampling interval, seconds
discovery = 0        # topology rediscovery interval, seconds (0 = on demand)
max_sessions = 16    # concurrent device sessions
retention = 100      # samples kept per interface in memory

[paths]
topology = "topology.yaml"

# [[devices]]
# name = "core"
# host = "192.168.88.1"
# type = "mikrotik"  # mikrotik | unifi | edgerouter | generic
# [devices.snmp]
# version = "v2c"
# community_env = "HNM_CORE_COMMUNITY"
# port = 161
# timeout = 2
# retries = 3
"#;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    use super::*;

    const SAMPLE: &str = r#"
[poller]
live = 5
discovery = 300

[[devices]]
name = "core"
host = "192.168.88.1"
type = "mikrotik"
[devices.snmp]
community = "s3cret"
port = 1161

[[devices]]
name = "ap"
host = "192.168.88.2"
type = "unifi"
"#;

    #[test]
    fn parses_sections_and_defaults() {
        let config = parse_config(SAMPLE).unwrap();
        assert_eq!(config.poller.live, 5);
        assert_eq!(config.poller.max_sessions, 16);
        assert_eq!(config.poller.retention, 100);
        assert_eq!(config.devices.len(), 2);
        assert_eq!(config.devices[0].family, DeviceFamily::MikroTik);
        assert_eq!(config.devices[1].snmp.port, 161);
        assert_eq!(config.devices[1].snmp.timeout, 2);
        assert_eq!(config.paths.topology, PathBuf::from("topology.yaml"));
    }

    #[test]
    fn translates_to_core_types() {
        let config = parse_config(SAMPLE).unwrap();
        let poller = config.poller_config(Path::new("/etc/hnm"));
        assert_eq!(poller.interval, Duration::from_secs(5));
        assert_eq!(poller.discovery_interval, Some(Duration::from_secs(300)));
        assert_eq!(poller.topology_path, Some(PathBuf::from("/etc/hnm/topology.yaml")));

        let device = config.devices[0].to_descriptor();
        assert_eq!(device.snmp.port, 1161);
        assert_eq!(device.snmp.retries, 3);
    }

    #[test]
    fn zero_discovery_means_on_demand() {
        let config = parse_config("[poller]\ndiscovery = 0\n").unwrap();
        assert_eq!(config.poller_config(Path::new(".")).discovery_interval, None);
    }

    #[test]
    fn absolute_topology_path_is_kept() {
        let config = parse_config("[paths]\ntopology = \"/var/lib/hnm/topo.yaml\"\n").unwrap();
        assert_eq!(
            config.topology_path(Path::new("/etc/hnm")),
            PathBuf::from("/var/lib/hnm/topo.yaml")
        );
    }

    #[test]
    fn rejects_zero_interval() {
        let err = parse_config("[poller]\nlive = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "poller.live"));
    }

    #[test]
    fn rejects_duplicate_names() {
        let doc = "[[devices]]\nname = \"a\"\nhost = \"h1\"\n[[devices]]\nname = \"a\"\nhost = \"h2\"\n";
        let err = parse_config(doc).unwrap_err();
        assert!(err.to_string().contains("duplicate device name 'a'"));
    }

    #[test]
    fn rejects_empty_host_and_v3() {
        assert!(parse_config("[[devices]]\nname = \"a\"\nhost = \"\"\n").is_err());
        let v3 = "[[devices]]\nname = \"a\"\nhost = \"h\"\n[devices.snmp]\nversion = \"v3\"\n";
        assert!(parse_config(v3).unwrap_err().to_string().contains("only v2c"));
        let v2 = "[[devices]]\nname = \"a\"\nhost = \"h\"\n[devices.snmp]\nversion = \"2c\"\n";
        assert!(parse_config(v2).is_ok());
    }

    #[test]
    fn rejects_unknown_family() {
        let doc = "[[devices]]\nname = \"a\"\nhost = \"h\"\ntype = \"cisco\"\n";
        assert!(matches!(parse_config(doc), Err(ConfigError::Figment(_))));
    }

    #[test]
    fn community_resolution_order() {
        let mut entry = parse_config(SAMPLE).unwrap().devices[0].clone();
        entry.name = "hnm-test-device-without-keyring-entry".into();

        let (secret, source) = resolve_community_with_source(&entry);
        assert_eq!(source, CommunitySource::Plaintext);
        assert_eq!(secret.expose_secret(), "s3cret");

        // an unset variable falls through to the next source
        entry.snmp.community_env = Some("HNM_TEST_UNSET_COMMUNITY_VARIABLE".into());
        let (_, source) = resolve_community_with_source(&entry);
        assert_eq!(source, CommunitySource::Plaintext);

        // any variable that is set wins over plaintext
        entry.snmp.community_env = Some("PATH".into());
        let (secret, source) = resolve_community_with_source(&entry);
        assert_eq!(source, CommunitySource::Env);
        assert_eq!(secret.expose_secret(), std::env::var("PATH").unwrap());

        entry.snmp.community_env = None;
        entry.snmp.community = None;
        let (secret, source) = resolve_community_with_source(&entry);
        assert_eq!(source, CommunitySource::Default);
        assert_eq!(secret.expose_secret(), "public");
    }

    #[test]
    fn template_parses() {
        let config = parse_config(Config::template()).unwrap();
        assert!(config.devices.is_empty());
        assert_eq!(config.poller.live, 10);
    }

    #[test]
    fn save_writes_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub").join("config.toml");
        let config = parse_config(SAMPLE).unwrap();
        save_config(&path, &config).unwrap();

        let reloaded = load_config_from(&path).unwrap();
        assert_eq!(reloaded.devices.len(), 2);
        assert_eq!(reloaded.devices[0].snmp.community.as_deref(), Some("s3cret"));
    }
}
