//! Telemetry type definitions
//!
//! Core types shared by the whole pipeline:
//! - Reading: one classified panel measurement
//! - PanelStatus: health classification of a reading
//! - Severity: alert severity shared by rules and alerts
//! - RawRow: a string-keyed input row before parsing

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Raw input row: column name -> raw string value
pub type RawRow = HashMap<String, String>;

/// Reading identifier, monotonic within a controller
pub type ReadingId = u64;

// ============================================================================
// Column names
// ============================================================================

/// Panel identifier column
pub const COL_PANEL_ID: &str = "id_panel";
/// Power output column (watts)
pub const COL_POWER: &str = "power";
/// Voltage column (volts)
pub const COL_VOLTAGE: &str = "voltage";
/// Observation timestamp column
pub const COL_TIMESTAMP: &str = "timestamp";

/// Columns every accepted row must carry, non-empty
pub const REQUIRED_COLUMNS: [&str; 4] = [COL_PANEL_ID, COL_POWER, COL_VOLTAGE, COL_TIMESTAMP];

// ============================================================================
// Panel status
// ============================================================================

/// Health status of a single reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PanelStatus {
    /// Producing at or above the power threshold
    Normal,
    /// Producing, but below the power threshold
    Low,
    /// No output at all (possible theft or disconnection)
    Offline,
}

impl PanelStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PanelStatus::Normal => "normal",
            PanelStatus::Low => "low",
            PanelStatus::Offline => "offline",
        }
    }
}

impl fmt::Display for PanelStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PanelStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "normal" => Ok(Self::Normal),
            "low" => Ok(Self::Low),
            "offline" => Ok(Self::Offline),
            other => Err(format!("unknown status: {other}")),
        }
    }
}

// ============================================================================
// Severity
// ============================================================================

/// Alert severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "warning" | "warn" => Ok(Self::Warning),
            "critical" | "crit" => Ok(Self::Critical),
            other => Err(format!("unknown severity: {other}")),
        }
    }
}

// ============================================================================
// Reading
// ============================================================================

/// One classified panel measurement
///
/// Created once per accepted input row and never mutated afterwards; a new
/// batch replaces the whole set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Unique identifier
    pub id: ReadingId,
    /// Panel identifier (e.g. "PV001")
    pub panel_id: String,
    /// Power output in watts, never negative
    pub power_out: f64,
    /// Voltage in volts, never negative
    pub voltage: f64,
    /// Classified health status
    pub status: PanelStatus,
    /// When the measurement was taken
    pub observed_at: DateTime<Utc>,
}

impl Reading {
    /// Whether this reading contributes to the power baseline
    pub fn has_valid_power(&self) -> bool {
        self.power_out.is_finite() && self.power_out > 0.0
    }
}
