//! Command dispatch: bridges CLI args -> engine calls -> output formatting.

pub mod config_cmd;
pub mod discover;
pub mod poll;
pub mod run;
pub mod topology;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use hnm_config::{Config, DeviceEntry};
use hnm_core::{DeviceDescriptor, PollerConfig};
use hnm_snmp::{Connector, UdpConnector};

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Loaded configuration plus where it came from.
pub struct Context {
    pub config: Config,
    pub config_path: PathBuf,
}

impl Context {
    pub fn load(global: &GlobalOpts) -> Result<Self, CliError> {
        let config_path = resolve_config_path(global);
        let config = hnm_config::load_config_from(&config_path)?;
        Ok(Self {
            config,
            config_path,
        })
    }

    /// Directory relative paths in the config are anchored to.
    pub fn config_dir(&self) -> &Path {
        match self.config_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    pub fn poller_config(&self) -> PollerConfig {
        self.config.poller_config(self.config_dir())
    }

    pub fn topology_path(&self) -> PathBuf {
        self.config.topology_path(self.config_dir())
    }

    pub fn connector() -> Arc<dyn Connector> {
        Arc::new(UdpConnector)
    }

    /// Descriptors for `names`, or the whole fleet when `names` is empty.
    pub fn devices(&self, names: &[String]) -> Result<Vec<DeviceDescriptor>, CliError> {
        if self.config.devices.is_empty() {
            return Err(CliError::NoDevices {
                path: self.config_path.display().to_string(),
            });
        }
        if names.is_empty() {
            return Ok(self.config.device_descriptors());
        }

        // Resolve every name before touching credentials.
        let entries = names
            .iter()
            .map(|name| {
                self.config.device(name).ok_or_else(|| CliError::NotFound {
                    resource_type: "device".into(),
                    identifier: name.clone(),
                    list_command: "config show".into(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries.into_iter().map(DeviceEntry::to_descriptor).collect())
    }
}

/// `--config`, else `HNM_CONFIG_PATH`, else the platform config dir.
pub fn resolve_config_path(global: &GlobalOpts) -> PathBuf {
    global
        .config
        .clone()
        .unwrap_or_else(hnm_config::config_path)
}

/// Dispatch a config-bound command to its handler.
pub async fn dispatch(cmd: Command, ctx: &Context, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Run(args) => run::handle(ctx, args, global).await,
        Command::Poll(args) => poll::handle(ctx, args, global).await,
        Command::Discover(args) => discover::handle(ctx, args, global).await,
        Command::Topology(args) => topology::handle(ctx, args, global),
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => Err(CliError::Engine(
            "command must be handled before loading the fleet".into(),
        )),
    }
}
