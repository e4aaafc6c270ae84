//! Alert CSV export
//!
//! Columns: `id_panel,alertMessage,severityLevel,when`, one row per alert in
//! list order. `when` is RFC 3339 in UTC, with as many fractional digits
//! as the timestamp needs.

use std::io::Write;
use std::path::Path;

use chrono::SecondsFormat;
use serde::Serialize;
use tracing::info;

use crate::error::{AlertError, Result};
use crate::types::Alert;

/// Header row of the export
pub const EXPORT_HEADER: [&str; 4] = ["id_panel", "alertMessage", "severityLevel", "when"];

#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    id_panel: &'a str,
    #[serde(rename = "alertMessage")]
    alert_message: &'a str,
    #[serde(rename = "severityLevel")]
    severity_level: &'a str,
    when: String,
}

impl<'a> From<&'a Alert> for ExportRow<'a> {
    fn from(alert: &'a Alert) -> Self {
        Self {
            id_panel: &alert.panel_id,
            alert_message: &alert.message,
            severity_level: alert.severity.as_str(),
            when: alert.occurred_at.to_rfc3339_opts(SecondsFormat::AutoSi, true),
        }
    }
}

/// Write alerts as CSV; returns the number of data rows.
///
/// The header is written even when there are no alerts.
pub fn write_alerts_csv<W: Write>(writer: W, alerts: &[Alert]) -> Result<usize> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    wtr.write_record(EXPORT_HEADER)?;
    for alert in alerts {
        wtr.serialize(ExportRow::from(alert))?;
    }
    wtr.flush()?;
    Ok(alerts.len())
}

/// Export alerts to a CSV file, creating parent directories
pub fn export_alerts_file(path: impl AsRef<Path>, alerts: &[Alert]) -> Result<usize> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let file = std::fs::File::create(path)
        .map_err(|e| AlertError::Export(format!("{}: {}", path.display(), e)))?;
    let count = write_alerts_csv(file, alerts)?;
    info!("Exported {} alerts to {}", count, path.display());
    Ok(count)
}
