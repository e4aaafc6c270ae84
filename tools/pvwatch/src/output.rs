//! Terminal rendering for readings, alerts and rules

use std::io::Write;

use colored::*;
use pv_alerts::{Alert, AlertEvent, AlertNotifier, BatchReport};
use pv_model::{BatchSummary, PanelStatus, Reading, Severity};
use pv_rules::{Rule, RuleStore};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn status_label(status: PanelStatus) -> ColoredString {
    match status {
        PanelStatus::Normal => status.as_str().green(),
        PanelStatus::Low => status.as_str().yellow(),
        PanelStatus::Offline => status.as_str().red().bold(),
    }
}

pub fn severity_label(severity: Severity) -> ColoredString {
    match severity {
        Severity::Warning => "WARNING".yellow(),
        Severity::Critical => "CRITICAL".red().bold(),
    }
}

pub fn print_readings(readings: &[Reading]) {
    if readings.is_empty() {
        println!("{}", "No readings loaded".dimmed());
        return;
    }

    println!(
        "{:>6}  {:<12} {:>10} {:>10}  {:<8} {}",
        "ID".bold(),
        "PANEL".bold(),
        "POWER (W)".bold(),
        "VOLT (V)".bold(),
        "STATUS".bold(),
        "OBSERVED (UTC)".bold()
    );
    for r in readings {
        println!(
            "{:>6}  {:<12} {:>10.2} {:>10.2}  {:<8} {}",
            r.id,
            r.panel_id,
            r.power_out,
            r.voltage,
            status_label(r.status),
            r.observed_at.format(TIME_FORMAT)
        );
    }
}

pub fn print_summary(summary: &BatchSummary) {
    println!("{}", "Batch summary".bright_cyan());
    println!(
        "  Readings: {} across {} panels",
        summary.total_readings, summary.distinct_panels
    );
    println!(
        "  Status:   {} normal, {} low, {} offline ({:.1}% offline)",
        summary.normal_count.to_string().green(),
        summary.low_count.to_string().yellow(),
        summary.offline_count.to_string().red(),
        summary.offline_percent()
    );
    println!(
        "  Power:    {:.2}W total, {:.2}W mean online",
        summary.total_power, summary.mean_online_power
    );
    if summary.baseline.is_active() {
        println!(
            "  Baseline: mean {:.2}W, std dev {:.2}W, {} anomalies",
            summary.baseline.mean, summary.baseline.std_dev, summary.anomaly_count
        );
    }
}

pub fn print_report(report: &BatchReport) {
    println!(
        "{} {} readings accepted, {} rows dropped",
        "Analyzed:".bright_green(),
        report.accepted,
        report.dropped
    );
    if report.coerced_numbers > 0 || report.coerced_timestamps > 0 {
        println!(
            "{} {} numeric field(s) read as 0, {} timestamp(s) replaced by now",
            "Note:".yellow(),
            report.coerced_numbers,
            report.coerced_timestamps
        );
    }
}

pub fn print_alerts(alerts: &[Alert]) {
    if alerts.is_empty() {
        println!("{}", "No active alerts".green());
        return;
    }

    println!(
        "{} ({} critical)",
        format!("{} alerts", alerts.len()).bright_cyan(),
        alerts.iter().filter(|a| a.is_critical()).count()
    );
    for alert in alerts {
        println!(
            "  {}  {:<8} {}  {}",
            alert.id.to_string().dimmed(),
            severity_label(alert.severity),
            alert.occurred_at.format(TIME_FORMAT),
            alert.message
        );
    }
}

/// One-line description of a stored rule
pub fn rule_line(rule: &Rule) -> String {
    let mut line = format!(
        "#{:<4} {:<20} {:<8}",
        rule.id,
        rule.description(),
        rule.severity.as_str()
    );
    if let Some(msg) = rule.message.as_deref().filter(|m| !m.trim().is_empty()) {
        line.push_str(&format!(" \"{}\"", msg));
    }
    line
}

pub fn print_rules(store: &RuleStore) {
    if store.is_empty() {
        println!("{}", "No rules defined".dimmed());
        return;
    }

    println!(
        "{}",
        format!("{} rules (evaluated in this order)", store.len()).bright_cyan()
    );
    for rule in store.rules() {
        println!("  {}", rule_line(rule));
    }
}

/// Announces raised alerts on stderr; critical ones ring the terminal bell
pub struct TerminalNotifier {
    bell: bool,
}

impl TerminalNotifier {
    pub fn new(bell: bool) -> Self {
        Self { bell }
    }
}

impl AlertNotifier for TerminalNotifier {
    fn notify(&self, event: AlertEvent<'_>) {
        let mut err = std::io::stderr().lock();
        // best effort; a closed stderr must not fail the batch
        let _ = match event {
            AlertEvent::CriticalAlertRaised(alert) => {
                let bell = if self.bell { "\x07" } else { "" };
                writeln!(err, "{}{} {}", bell, "[!]".red().bold(), alert.message)
            },
            AlertEvent::WarningAlertRaised(alert) => {
                writeln!(err, "{} {}", "[*]".yellow(), alert.message)
            },
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pv_rules::{Condition, Metric};

    fn rule(message: Option<&str>) -> Rule {
        Rule {
            id: 3,
            metric: Metric::Voltage,
            condition: Condition::Gt,
            threshold: 250.0,
            severity: Severity::Critical,
            message: message.map(str::to_string),
        }
    }

    #[test]
    fn test_rule_line() {
        colored::control::set_override(false);
        let line = rule_line(&rule(Some("overvoltage")));
        assert!(line.starts_with("#3"));
        assert!(line.contains("voltage > 250"));
        assert!(line.contains("critical"));
        assert!(line.ends_with("\"overvoltage\""));

        assert!(!rule_line(&rule(None)).contains('"'));
    }

    #[test]
    fn test_labels_without_color() {
        colored::control::set_override(false);
        assert_eq!(status_label(PanelStatus::Offline).to_string(), "offline");
        assert_eq!(severity_label(Severity::Warning).to_string(), "WARNING");
    }
}
