//! Alert aggregation
//!
//! Turns one batch of classified readings into alerts. Per reading, the
//! checks run in a fixed order:
//!
//! 1. offline (critical), otherwise low power (warning)
//! 2. low voltage (warning)
//! 3. power anomaly against the batch baseline (warning)
//! 4. every user rule, in rule order, with the rule's severity
//!
//! The output is ordered by reading first, then by that check order.

use pv_common::{RuleConfig, ThresholdConfig};
use pv_model::{PanelStatus, PowerBaseline, Reading, Severity};
use pv_rules::{EqualityMode, Rule, RuleEvaluator};
use tracing::debug;
use uuid::Uuid;

use crate::types::{Alert, AlertSource};

/// Stateless alert builder for one set of thresholds
#[derive(Debug, Clone, Copy)]
pub struct AlertAggregator {
    voltage_threshold: f64,
    evaluator: RuleEvaluator,
}

impl AlertAggregator {
    pub fn new(voltage_threshold: f64, equality: EqualityMode) -> Self {
        Self {
            voltage_threshold,
            evaluator: RuleEvaluator::new(equality),
        }
    }

    pub fn from_config(thresholds: &ThresholdConfig, rules: &RuleConfig) -> Self {
        Self::new(
            thresholds.voltage_threshold,
            EqualityMode::from_tolerance(rules.eq_tolerance),
        )
    }

    pub fn voltage_threshold(&self) -> f64 {
        self.voltage_threshold
    }

    /// Build every alert for a batch
    pub fn aggregate(&self, readings: &[Reading], rules: &[Rule]) -> Vec<Alert> {
        let baseline = PowerBaseline::from_readings(readings);
        debug!(
            readings = readings.len(),
            rules = rules.len(),
            mean = baseline.mean,
            std_dev = baseline.std_dev,
            "Aggregating alerts"
        );

        let mut alerts = Vec::new();
        for reading in readings {
            self.collect_for(reading, &baseline, rules, &mut alerts);
        }
        alerts
    }

    fn collect_for(
        &self,
        reading: &Reading,
        baseline: &PowerBaseline,
        rules: &[Rule],
        out: &mut Vec<Alert>,
    ) {
        let panel = &reading.panel_id;

        match reading.status {
            PanelStatus::Offline => out.push(new_alert(
                reading,
                format!("{} offline - possible theft or disconnection", panel),
                Severity::Critical,
                AlertSource::Offline,
            )),
            PanelStatus::Low => out.push(new_alert(
                reading,
                format!("{} low power {:.2}W", panel, reading.power_out),
                Severity::Warning,
                AlertSource::LowPower,
            )),
            PanelStatus::Normal => {},
        }

        if reading.voltage < self.voltage_threshold {
            out.push(new_alert(
                reading,
                format!("{} low voltage {:.2}V", panel, reading.voltage),
                Severity::Warning,
                AlertSource::LowVoltage,
            ));
        }

        if baseline.is_anomalous(reading.power_out) {
            out.push(new_alert(
                reading,
                format!(
                    "{} power anomaly {:.2}W (batch mean {:.2}W)",
                    panel, reading.power_out, baseline.mean
                ),
                Severity::Warning,
                AlertSource::Anomaly,
            ));
        }

        for rule in self.evaluator.matching(rules, reading) {
            out.push(new_alert(
                reading,
                format!("{}: {}", panel, rule.alert_text()),
                rule.severity,
                AlertSource::Rule(rule.id),
            ));
        }
    }
}

impl Default for AlertAggregator {
    fn default() -> Self {
        Self::from_config(&ThresholdConfig::default(), &RuleConfig::default())
    }
}

fn new_alert(reading: &Reading, message: String, severity: Severity, source: AlertSource) -> Alert {
    Alert {
        id: Uuid::new_v4(),
        panel_id: reading.panel_id.clone(),
        reading_id: reading.id,
        message,
        severity,
        occurred_at: reading.observed_at,
        source,
    }
}
