//! Reading commands

use anyhow::Result;
use clap::Subcommand;
use colored::*;
use pv_alerts::{Monitor, StateStore};
use pv_model::PanelStatus;

use crate::output::{print_readings, print_summary};

#[derive(Subcommand)]
pub enum ReadingCommands {
    /// Show the current batch
    List {
        /// Only readings with this status (normal, low, offline)
        #[arg(long)]
        status: Option<PanelStatus>,
    },

    /// Drop the current batch and its alerts
    Clear,
}

pub fn handle_command<S: StateStore>(cmd: ReadingCommands, monitor: &mut Monitor<S>) -> Result<()> {
    match cmd {
        ReadingCommands::List { status } => match status {
            Some(wanted) => {
                let readings: Vec<_> = monitor
                    .readings()
                    .iter()
                    .filter(|r| r.status == wanted)
                    .cloned()
                    .collect();
                print_readings(&readings);
            },
            None => {
                print_readings(monitor.readings());
                println!();
                print_summary(&monitor.summary());
            },
        },
        ReadingCommands::Clear => {
            let count = monitor.readings().len();
            monitor.clear_readings()?;
            println!("{} {} readings", "Cleared".bright_green(), count);
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pv_alerts::{MemoryStore, MonitorSettings};

    const BATCH: &str = "id_panel,power,voltage,timestamp\n\
                         PV001,0,220,2024-06-01T08:00:00Z\n\
                         PV002,500,230,2024-06-01T08:00:00Z\n";

    #[test]
    fn test_list_by_status_then_clear() {
        let mut m = Monitor::open(MemoryStore::new(), MonitorSettings::default()).unwrap();
        m.submit_batch(BATCH).unwrap();

        let list = ReadingCommands::List {
            status: Some(PanelStatus::Offline),
        };
        handle_command(list, &mut m).unwrap();
        assert_eq!(m.readings().len(), 2);

        handle_command(ReadingCommands::Clear, &mut m).unwrap();
        assert!(m.readings().is_empty());
        assert!(m.alerts().is_empty());
    }
}
