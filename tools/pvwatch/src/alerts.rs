//! Alert commands

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::*;
use pv_alerts::{export_alerts_file, AlertId, Monitor, StateStore};

use crate::output::print_alerts;

#[derive(Subcommand)]
pub enum AlertCommands {
    /// Show active alerts in generation order
    List {
        /// Only critical alerts
        #[arg(long)]
        critical: bool,
    },

    /// Dismiss one alert by id
    Dismiss {
        id: AlertId,
    },

    /// Export active alerts as CSV (stdout when no output file)
    Export {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

pub fn handle_command<S: StateStore>(cmd: AlertCommands, monitor: &mut Monitor<S>) -> Result<()> {
    match cmd {
        AlertCommands::List { critical } => {
            if critical {
                let alerts: Vec<_> = monitor
                    .alerts()
                    .iter()
                    .filter(|a| a.is_critical())
                    .cloned()
                    .collect();
                print_alerts(&alerts);
            } else {
                print_alerts(monitor.alerts());
            }
        },
        AlertCommands::Dismiss { id } => {
            if monitor.dismiss_alert(id)? {
                println!("{} alert {}", "Dismissed".bright_green(), id);
            } else {
                println!("{} alert {} is not active", "Skipped:".yellow(), id);
            }
        },
        AlertCommands::Export { output } => match output {
            Some(path) => {
                let count = export_alerts_file(&path, monitor.alerts())
                    .with_context(|| format!("Failed to export alerts to {}", path.display()))?;
                eprintln!(
                    "{} {} alerts to {}",
                    "Exported".bright_green(),
                    count,
                    path.display()
                );
            },
            None => {
                monitor.export_alerts(std::io::stdout().lock())?;
            },
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pv_alerts::{MemoryStore, MonitorSettings};

    const BATCH: &str = "id_panel,power,voltage,timestamp\nPV001,0,220,2024-06-01T08:00:00Z\n";

    #[test]
    fn test_dismiss_and_export() {
        let mut m = Monitor::open(MemoryStore::new(), MonitorSettings::default()).unwrap();
        m.submit_batch(BATCH).unwrap();
        let id = m.alerts()[0].id;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alerts.csv");
        handle_command(AlertCommands::Export { output: Some(path.clone()) }, &mut m).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap().lines().count(), 2);

        handle_command(AlertCommands::Dismiss { id }, &mut m).unwrap();
        handle_command(AlertCommands::Dismiss { id }, &mut m).unwrap();
        assert!(m.alerts().is_empty());
    }
}
