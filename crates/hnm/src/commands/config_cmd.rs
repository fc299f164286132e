//! Config subcommand handlers.

use std::fmt::Write as _;

use hnm_config::{CommunitySource, Config, resolve_community_with_source};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::resolve_config_path;

const MASK: &str = "****";

// ── Helpers ─────────────────────────────────────────────────────────

/// Copy of `cfg` with plaintext community strings masked.
fn redacted(cfg: &Config) -> Config {
    let mut cfg = cfg.clone();
    for device in &mut cfg.devices {
        if device.snmp.community.is_some() {
            device.snmp.community = Some(MASK.into());
        }
    }
    cfg
}

fn source_label(source: CommunitySource) -> &'static str {
    match source {
        CommunitySource::Env => "environment",
        CommunitySource::Keyring => "keyring",
        CommunitySource::Plaintext => "config file",
        CommunitySource::Default => "default (public)",
    }
}

/// TOML view of the masked config, followed by where each device's
/// community string resolves from.
fn format_config(original: &Config, masked: &Config) -> String {
    let mut out = toml::to_string_pretty(masked)
        .unwrap_or_else(|e| format!("# cannot render config: {e}\n"));
    if !original.devices.is_empty() {
        let _ = writeln!(out);
        for device in &original.devices {
            let (_, source) = resolve_community_with_source(device);
            let _ = writeln!(out, "# {}: community from {}", device.name, source_label(source));
        }
    }
    out
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let path = resolve_config_path(global);

    match args.command {
        ConfigCommand::Path => {
            output::print_output(&path.display().to_string(), global.quiet);
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = hnm_config::load_config_from(&path)?;
            let masked = redacted(&cfg);
            let out = output::render_single(
                &global.output,
                &masked,
                |m| format_config(&cfg, m),
                |m| {
                    m.devices
                        .iter()
                        .map(|d| d.name.clone())
                        .collect::<Vec<_>>()
                        .join("\n")
                },
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Init { force } => {
            if path.exists() && !force {
                return Err(CliError::ConfigExists {
                    path: path.display().to_string(),
                });
            }
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, Config::template())?;
            if !global.quiet {
                eprintln!("Wrote {}", path.display());
            }
            Ok(())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn plaintext_communities_are_masked() {
        let cfg = hnm_config::parse_config(
            r#"
[[devices]]
name = "core"
host = "10.0.0.1"
[devices.snmp]
community = "s3cret"
"#,
        )
        .unwrap();
        let masked = redacted(&cfg);
        assert_eq!(masked.devices[0].snmp.community.as_deref(), Some(MASK));
        assert_eq!(cfg.devices[0].snmp.community.as_deref(), Some("s3cret"));

        let text = toml::to_string_pretty(&masked).unwrap();
        assert!(!text.contains("s3cret"));
    }

    #[test]
    fn absent_community_stays_absent() {
        let cfg = hnm_config::parse_config("[[devices]]\nname = \"ap\"\nhost = \"10.0.0.2\"\n")
            .unwrap();
        assert!(redacted(&cfg).devices[0].snmp.community.is_none());
    }
}
