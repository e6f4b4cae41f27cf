//! Artifact export: JSON manifest, forecast CSV, text and Markdown reports.
//!
//! A saved run is a directory containing:
//! - `manifest.json`: the full `ForecastOutcome`
//! - the forecast CSV (future rows only, default name `forecast.csv`)
//! - `report.txt`: one "Predicted" line per future date
//! - `report.md`: summary, forecast table and alerts
//!
//! Manifests carry a `schema_version`; newer versions are rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use demandcast_core::export::{to_csv_with_columns, to_markdown_report, to_report_text};

use crate::runner::{ForecastOutcome, SCHEMA_VERSION};

pub const MANIFEST_FILENAME: &str = "manifest.json";
pub const TEXT_REPORT_FILENAME: &str = "report.txt";
pub const MARKDOWN_REPORT_FILENAME: &str = "report.md";

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize a `ForecastOutcome` to pretty JSON.
pub fn export_json(outcome: &ForecastOutcome) -> Result<String> {
    serde_json::to_string_pretty(outcome).context("failed to serialize ForecastOutcome to JSON")
}

/// Deserialize a `ForecastOutcome` from JSON, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<ForecastOutcome> {
    let outcome: ForecastOutcome =
        serde_json::from_str(json).context("failed to deserialize ForecastOutcome from JSON")?;
    if outcome.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            outcome.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(outcome)
}

// ─── CSV / reports ──────────────────────────────────────────────────

/// Forecast CSV for the future rows. Bound columns are omitted when the
/// backend did not supply them.
pub fn export_forecast_csv(outcome: &ForecastOutcome) -> Result<String> {
    let table = &outcome.table;
    let data = to_csv_with_columns(table.future_rows(), table.csv_columns())
        .context("failed to write forecast CSV")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

pub fn export_text_report(outcome: &ForecastOutcome) -> Result<String> {
    let lines = to_report_text(outcome.future_rows()).context("failed to format text report")?;
    let mut text = lines.join("\n");
    text.push('\n');
    Ok(text)
}

pub fn export_markdown_report(outcome: &ForecastOutcome) -> Result<String> {
    to_markdown_report(&outcome.table, &outcome.alerts).context("failed to format Markdown report")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the full artifact set for one forecast.
///
/// Creates `forecast_{fingerprint prefix}_{timestamp}/` under `output_dir`
/// and returns its path.
pub fn save_artifacts(
    outcome: &ForecastOutcome,
    output_dir: &Path,
    csv_filename: &str,
) -> Result<PathBuf> {
    let prefix: String = outcome.dataset_fingerprint.chars().take(8).collect();
    let dirname = format!(
        "forecast_{}_{}",
        prefix,
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    );
    let run_dir = output_dir.join(dirname);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    // Render everything before writing so a format error leaves no partial files.
    let json = export_json(outcome)?;
    let csv = export_forecast_csv(outcome)?;
    let text = export_text_report(outcome)?;
    let md = export_markdown_report(outcome)?;

    for (name, content) in [
        (MANIFEST_FILENAME, &json),
        (csv_filename, &csv),
        (TEXT_REPORT_FILENAME, &text),
        (MARKDOWN_REPORT_FILENAME, &md),
    ] {
        let path = run_dir.join(name);
        std::fs::write(&path, content)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }

    tracing::info!(dir = %run_dir.display(), "forecast artifacts saved");
    Ok(run_dir)
}

/// Load a `ForecastOutcome` from an artifact directory's manifest.json.
pub fn load_artifacts(dir: &Path) -> Result<ForecastOutcome> {
    let manifest_path = dir.join(MANIFEST_FILENAME);
    let json = std::fs::read_to_string(&manifest_path)
        .with_context(|| format!("failed to read {}", manifest_path.display()))?;
    import_json(&json)
}
