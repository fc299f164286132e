//! Output formatting: table, JSON, YAML, plain.
//!
//! Renders data in the format selected by `--output`. Table uses `tabled`,
//! structured formats use serde, plain emits one identifier per line.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};

use hnm_core::OperStatus;

use crate::cli::{ColorMode, OutputFormat};

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: &ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

pub fn paint_status(status: OperStatus, color: bool) -> String {
    match (status, color) {
        (_, false) => status.to_string(),
        (OperStatus::Up, true) => status.green().to_string(),
        (OperStatus::Down, true) => status.red().to_string(),
    }
}

/// Human-readable bit rate: `0 bps`, `1.60 kbps`, `940.00 Mbps`.
pub fn format_bps(bps: f64) -> String {
    const UNITS: [&str; 4] = ["kbps", "Mbps", "Gbps", "Tbps"];
    if bps < 1000.0 {
        return format!("{bps:.0} bps");
    }
    let mut value = bps;
    let mut unit = UNITS[0];
    for candidate in UNITS {
        value /= 1000.0;
        unit = candidate;
        if value < 1000.0 {
            break;
        }
    }
    format!("{value:.2} {unit}")
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a list of serde-serializable items in the chosen format.
///
/// - `table`: maps each item to a `Tabled` row
/// - `json` / `json-compact` / `yaml`: serializes the original data
/// - `plain`: calls `id_fn` on each item, one per line
pub fn render_list<T, R>(
    format: &OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    id_fn: impl Fn(&T) -> String,
) -> String
where
    T: serde::Serialize,
    R: Tabled,
{
    match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            render_table(&rows)
        }
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => data.iter().map(&id_fn).collect::<Vec<_>>().join("\n"),
    }
}

/// Render a single item. Table output uses `detail_fn`'s pre-formatted text.
pub fn render_single<T>(
    format: &OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    id_fn: impl Fn(&T) -> String,
) -> String
where
    T: serde::Serialize,
{
    match format {
        OutputFormat::Table => detail_fn(data),
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => id_fn(data),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Format-specific renderers ────────────────────────────────────────

fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

fn render_json<T: serde::Serialize + ?Sized>(data: &T, compact: bool) -> String {
    let rendered = if compact {
        serde_json::to_string(data)
    } else {
        serde_json::to_string_pretty(data)
    };
    rendered.unwrap_or_else(|e| format!("{{\"error\": \"serialization failed: {e}\"}}"))
}

fn render_yaml<T: serde::Serialize + ?Sized>(data: &T) -> String {
    serde_yaml::to_string(data).unwrap_or_else(|e| format!("error: serialization failed: {e}"))
}

#[cfg(test)]
mod tests {
    use serde::Serialize;

    use super::*;

    #[derive(Serialize)]
    struct Item {
        name: &'static str,
    }

    #[derive(Tabled)]
    struct ItemRow {
        #[tabled(rename = "Name")]
        name: String,
    }

    fn items() -> Vec<Item> {
        vec![Item { name: "core" }, Item { name: "ap" }]
    }

    fn row(item: &Item) -> ItemRow {
        ItemRow {
            name: item.name.to_owned(),
        }
    }

    #[test]
    fn bit_rates_scale_to_units() {
        assert_eq!(format_bps(0.0), "0 bps");
        assert_eq!(format_bps(999.0), "999 bps");
        assert_eq!(format_bps(1600.0), "1.60 kbps");
        assert_eq!(format_bps(940_000_000.0), "940.00 Mbps");
        assert_eq!(format_bps(10_000_000_000.0), "10.00 Gbps");
    }

    #[test]
    fn plain_output_is_one_id_per_line() {
        let out = render_list(&OutputFormat::Plain, &items(), row, |i| i.name.to_owned());
        assert_eq!(out, "core\nap");
    }

    #[test]
    fn compact_json_is_single_line() {
        let out = render_list(&OutputFormat::JsonCompact, &items(), row, |i| {
            i.name.to_owned()
        });
        assert_eq!(out, r#"[{"name":"core"},{"name":"ap"}]"#);
    }

    #[test]
    fn table_has_header_and_rows() {
        let out = render_list(&OutputFormat::Table, &items(), row, |i| i.name.to_owned());
        assert!(out.contains("Name"));
        assert!(out.contains("core"));
        assert!(out.contains("ap"));
    }

    #[test]
    fn status_is_plain_without_color() {
        assert_eq!(paint_status(OperStatus::Up, false), "up");
        assert_ne!(paint_status(OperStatus::Down, true), "down");
    }
}
