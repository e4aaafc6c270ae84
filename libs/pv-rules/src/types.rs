//! Rule type definitions
//!
//! - Rule: a stored threshold rule
//! - Metric / Condition: closed enums selecting what to compare and how
//! - RuleDraft: raw form fields for a rule being created or edited
//! - EqualityMode: how the `eq` condition compares floats

use crate::error::{Result, RuleError};
use pv_model::{Reading, Severity};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Rule identifier, stable across edits
pub type RuleId = u64;

// ============================================================================
// Metric
// ============================================================================

/// Reading field a rule compares against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Power,
    Voltage,
}

impl Metric {
    /// Select the comparison value from a reading
    pub fn value_of(&self, reading: &Reading) -> f64 {
        match self {
            Metric::Power => reading.power_out,
            Metric::Voltage => reading.voltage,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Power => "power",
            Metric::Voltage => "voltage",
        }
    }

    /// Unit suffix used in messages
    pub fn unit(&self) -> &'static str {
        match self {
            Metric::Power => "W",
            Metric::Voltage => "V",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "power" | "power_out" | "poweroutput" => Ok(Self::Power),
            "voltage" | "volt" => Ok(Self::Voltage),
            other => Err(format!("unknown metric: {other}")),
        }
    }
}

// ============================================================================
// Condition
// ============================================================================

/// Comparison applied between the selected value and the threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Condition {
    #[serde(alias = "<")]
    Lt,
    #[serde(alias = ">")]
    Gt,
    #[serde(alias = "=", alias = "==")]
    Eq,
}

impl Condition {
    /// Evaluate `value <op> threshold`
    pub fn evaluate(&self, value: f64, threshold: f64, equality: EqualityMode) -> bool {
        match self {
            Condition::Lt => value < threshold,
            Condition::Gt => value > threshold,
            Condition::Eq => equality.equals(value, threshold),
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Condition::Lt => "<",
            Condition::Gt => ">",
            Condition::Eq => "=",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Condition::Lt => "lt",
            Condition::Gt => "gt",
            Condition::Eq => "eq",
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Condition {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lt" | "<" | "less_than" => Ok(Self::Lt),
            "gt" | ">" | "greater_than" => Ok(Self::Gt),
            "eq" | "=" | "==" | "equal" => Ok(Self::Eq),
            other => Err(format!("unknown condition: {other}")),
        }
    }
}

// ============================================================================
// Equality mode
// ============================================================================

/// How `eq` compares two floats
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum EqualityMode {
    /// Literal `==`
    #[default]
    Exact,
    /// `|a - b| <= tolerance`
    Tolerance(f64),
}

impl EqualityMode {
    /// Build from an optional configured tolerance
    pub fn from_tolerance(tolerance: Option<f64>) -> Self {
        match tolerance {
            Some(t) if t.is_finite() && t > 0.0 => EqualityMode::Tolerance(t),
            _ => EqualityMode::Exact,
        }
    }

    #[allow(clippy::float_cmp)]
    pub fn equals(&self, a: f64, b: f64) -> bool {
        match self {
            EqualityMode::Exact => a == b,
            EqualityMode::Tolerance(t) => (a - b).abs() <= *t,
        }
    }
}

// ============================================================================
// Rule
// ============================================================================

/// User-defined threshold rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// Unique identifier, preserved by updates
    #[serde(default)]
    pub id: RuleId,
    pub metric: Metric,
    pub condition: Condition,
    pub threshold: f64,
    pub severity: Severity,
    /// Operator-supplied alert text; the generated description is used when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Rule {
    /// Generated description, e.g. `power < 100`
    pub fn description(&self) -> String {
        format!(
            "{} {} {}",
            self.metric,
            self.condition.symbol(),
            self.threshold
        )
    }

    /// Alert text for a match: the message, or the description when blank
    pub fn alert_text(&self) -> String {
        match self.message.as_deref().map(str::trim) {
            Some(msg) if !msg.is_empty() => msg.to_string(),
            _ => self.description(),
        }
    }

    /// Whether the reading satisfies this rule
    pub fn matches(&self, reading: &Reading, equality: EqualityMode) -> bool {
        self.condition
            .evaluate(self.metric.value_of(reading), self.threshold, equality)
    }
}

// ============================================================================
// Draft
// ============================================================================

/// Form fields of a rule in edit; `threshold` is kept as typed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleDraft {
    pub metric: Metric,
    pub condition: Condition,
    pub threshold: String,
    pub severity: Severity,
    pub message: String,
}

impl Default for RuleDraft {
    fn default() -> Self {
        Self {
            metric: Metric::Power,
            condition: Condition::Lt,
            threshold: String::new(),
            severity: Severity::Warning,
            message: String::new(),
        }
    }
}

impl RuleDraft {
    /// Pre-populate a draft from a stored rule
    pub fn from_rule(rule: &Rule) -> Self {
        Self {
            metric: rule.metric,
            condition: rule.condition,
            threshold: rule.threshold.to_string(),
            severity: rule.severity,
            message: rule.message.clone().unwrap_or_default(),
        }
    }

    /// Check the draft and produce the rule body under `id`
    pub fn validate(&self, id: RuleId) -> Result<Rule> {
        let threshold = self
            .threshold
            .trim()
            .parse::<f64>()
            .map_err(|_| RuleError::validation("threshold", "must be a number"))?;
        if !threshold.is_finite() {
            return Err(RuleError::validation("threshold", "must be a finite number"));
        }

        let message = self.message.trim();
        if message.is_empty() {
            return Err(RuleError::validation("message", "must not be empty"));
        }

        Ok(Rule {
            id,
            metric: self.metric,
            condition: self.condition,
            threshold,
            severity: self.severity,
            message: Some(message.to_string()),
        })
    }
}
