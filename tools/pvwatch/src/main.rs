//! pvwatch - Solar Panel Telemetry Monitor
//!
//! Analyzes telemetry batches, raises alerts from built-in checks and
//! user rules, and keeps the last batch, its alerts and the rule set in a
//! local state file between runs.

mod alerts;
mod input;
mod output;
mod readings;
mod rules;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use pv_alerts::{AlertError, AlertNotifier, JsonFileStore, Monitor, MonitorSettings, NullNotifier};
use pv_common::{init_logging, load_config, ThresholdConfig};
use tracing::{debug, warn};

use crate::output::{
    print_alerts, print_readings, print_report, print_rules, print_summary, TerminalNotifier,
};

#[derive(Parser)]
#[command(name = "pvwatch")]
#[command(about = "pvwatch - Solar Panel Telemetry Monitor")]
#[command(long_about = "pvwatch - Solar Panel Telemetry Monitor

Batch analysis:
  analyze     Analyze a CSV batch and raise alerts
  status      Show the current batch, alerts and rules at a glance

State management:
  alerts      List, dismiss and export alerts
  rules       Manage threshold rules
  readings    Inspect or clear the current batch

Examples:
  pvwatch analyze readings.csv                       # Analyze a file
  cat readings.csv | pvwatch analyze -               # Analyze stdin
  pvwatch rules add -m power -c lt -t 100 -M \"Low output\"
  pvwatch alerts export -o alerts.csv")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Configuration file (TOML, YAML or JSON)
    #[arg(long, global = true, env = "PVWATCH_CONFIG")]
    config: Option<PathBuf>,

    /// State file (default from configuration: pvwatch-state.json)
    #[arg(long, global = true)]
    state: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a batch of readings, replacing the current one
    Analyze {
        /// CSV file, or '-' for stdin
        source: String,

        /// Power threshold in watts for this batch
        #[arg(long)]
        power_threshold: Option<f64>,

        /// Voltage threshold in volts for this batch
        #[arg(long)]
        voltage_threshold: Option<f64>,

        /// Do not print the readings table
        #[arg(long)]
        brief: bool,

        /// Do not announce alerts as they are raised
        #[arg(long)]
        no_notify: bool,

        /// Ring the terminal bell for critical alerts
        #[arg(long)]
        bell: bool,
    },

    /// Manage alerts
    #[command(about = "List, dismiss and export alerts")]
    Alerts {
        #[command(subcommand)]
        command: alerts::AlertCommands,
    },

    /// Manage rules
    #[command(about = "Create, edit, delete, import and export threshold rules")]
    Rules {
        #[command(subcommand)]
        command: rules::RuleCommands,
    },

    /// Inspect the current batch
    #[command(about = "List or clear the current batch of readings")]
    Readings {
        #[command(subcommand)]
        command: readings::ReadingCommands,
    },

    /// Show a short overview of the stored state
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    let config = load_config(cli.config.as_deref()).context("Failed to load configuration")?;

    if let Err(e) = init_logging(&config.logging, "pvwatch", cli.verbose, !cli.no_color) {
        eprintln!("{} logging disabled: {}", "WARN".yellow(), e);
    }

    let state_path = cli
        .state
        .clone()
        .unwrap_or_else(|| config.storage.state_path.clone());
    debug!("Using state file {}", state_path.display());

    let mut monitor = Monitor::open(
        JsonFileStore::new(&state_path),
        MonitorSettings::from_config(&config),
    )
    .with_context(|| format!("Failed to open state {}", state_path.display()))?;

    match cli.command {
        Commands::Analyze {
            source,
            power_threshold,
            voltage_threshold,
            brief,
            no_notify,
            bell,
        } => {
            // the whole batch is in memory before analysis starts
            let text = input::read_batch(&source).await?;
            let thresholds = ThresholdConfig {
                power_threshold: power_threshold.unwrap_or(config.thresholds.power_threshold),
                voltage_threshold: voltage_threshold
                    .unwrap_or(config.thresholds.voltage_threshold),
            };
            let notifier: Box<dyn AlertNotifier> = if no_notify {
                Box::new(NullNotifier)
            } else {
                Box::new(TerminalNotifier::new(bell))
            };
            analyze(monitor.with_notifier(notifier), thresholds, &text, brief)?;
        },
        Commands::Alerts { command } => alerts::handle_command(command, &mut monitor)?,
        Commands::Rules { command } => rules::handle_command(command, &mut monitor)?,
        Commands::Readings { command } => readings::handle_command(command, &mut monitor)?,
        Commands::Status => status(&monitor),
    }

    Ok(())
}

fn analyze(
    mut monitor: Monitor<JsonFileStore>,
    thresholds: ThresholdConfig,
    text: &str,
    brief: bool,
) -> Result<()> {
    monitor.set_thresholds(thresholds)?;

    let report = match monitor.submit_batch(text) {
        Ok(report) => report,
        Err(AlertError::EmptyBatch) => {
            warn!("Nothing to analyze");
            anyhow::bail!("The batch is empty; nothing was changed");
        },
        Err(e) => return Err(e.into()),
    };

    if !brief {
        println!();
        print_readings(monitor.readings());
    }
    println!();
    print_report(&report);
    print_summary(&report.summary);
    println!();
    print_alerts(monitor.alerts());
    Ok(())
}

fn status(monitor: &Monitor<JsonFileStore>) {
    println!(
        "{} {}",
        "State file:".bright_cyan(),
        monitor.store().path().display()
    );
    let settings = monitor.settings();
    println!(
        "{} power {:.2}W, voltage {:.2}V",
        "Thresholds:".bright_cyan(),
        settings.thresholds.power_threshold,
        settings.thresholds.voltage_threshold
    );
    println!();
    print_summary(&monitor.summary());
    println!();
    print_alerts(monitor.alerts());
    println!();
    print_rules(monitor.rules());
}
