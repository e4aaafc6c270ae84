//! Alert type definitions

use chrono::{DateTime, Utc};
use pv_model::{ReadingId, Severity};
use pv_rules::RuleId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Alert identifier
pub type AlertId = Uuid;

/// What produced an alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "rule_id", rename_all = "snake_case")]
pub enum AlertSource {
    /// Reading had no output
    Offline,
    /// Reading below the power threshold
    LowPower,
    /// Reading below the voltage threshold
    LowVoltage,
    /// Power more than two sigma from the batch mean
    Anomaly,
    /// User rule matched
    Rule(RuleId),
}

impl AlertSource {
    pub fn label(&self) -> String {
        match self {
            AlertSource::Offline => "offline".to_string(),
            AlertSource::LowPower => "low_power".to_string(),
            AlertSource::LowVoltage => "low_voltage".to_string(),
            AlertSource::Anomaly => "anomaly".to_string(),
            AlertSource::Rule(id) => format!("rule#{}", id),
        }
    }
}

/// Generated alert; never edited, only dismissed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    /// Unique identifier
    pub id: AlertId,
    /// Panel of the triggering reading
    pub panel_id: String,
    /// Triggering reading
    pub reading_id: ReadingId,
    /// Human-readable description
    pub message: String,
    pub severity: Severity,
    /// Copied from the triggering reading's observation time
    pub occurred_at: DateTime<Utc>,
    pub source: AlertSource,
}

impl Alert {
    pub fn is_critical(&self) -> bool {
        self.severity == Severity::Critical
    }

    /// Fields that identify an alert's content, ignoring its id
    pub fn content_key(&self) -> (&str, &str, Severity, DateTime<Utc>, AlertSource) {
        (
            &self.panel_id,
            &self.message,
            self.severity,
            self.occurred_at,
            self.source,
        )
    }
}
