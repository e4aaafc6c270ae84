//! Batch Power Statistics
//!
//! Mean and population standard deviation of the batch's producing readings,
//! used for two-sigma anomaly scoring. Zero and non-finite outputs are left
//! out of the baseline so offline panels do not drag the mean down.

use crate::types::Reading;
use serde::{Deserialize, Serialize};

/// Deviation multiplier for the anomaly test
pub const ANOMALY_SIGMA: f64 = 2.0;

/// Power baseline of one batch
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PowerBaseline {
    /// Mean power of the valid subset (0 when empty)
    pub mean: f64,
    /// Population standard deviation of the valid subset (0 when empty)
    pub std_dev: f64,
    /// Number of readings in the valid subset
    pub sample_count: usize,
}

impl PowerBaseline {
    /// Compute the baseline from a batch of readings
    pub fn from_readings(readings: &[Reading]) -> Self {
        let values: Vec<f64> = readings
            .iter()
            .filter(|r| r.has_valid_power())
            .map(|r| r.power_out)
            .collect();
        Self::from_values(&values)
    }

    /// Compute the baseline from raw power values, applying the same filter
    pub fn from_values(values: &[f64]) -> Self {
        let valid: Vec<f64> = values
            .iter()
            .copied()
            .filter(|v| v.is_finite() && *v > 0.0)
            .collect();

        if valid.is_empty() {
            return Self::default();
        }

        let count = valid.len() as f64;
        let mean = valid.iter().sum::<f64>() / count;
        let variance = valid.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count;

        Self {
            mean,
            std_dev: variance.sqrt(),
            sample_count: valid.len(),
        }
    }

    /// Whether anomaly detection can run for this batch at all
    pub fn is_active(&self) -> bool {
        self.std_dev > 0.0
    }

    /// Two-sigma test: `|power - mean| > 2 * stdDev`, only when stdDev > 0
    pub fn is_anomalous(&self, power_out: f64) -> bool {
        self.is_active() && (power_out - self.mean).abs() > ANOMALY_SIGMA * self.std_dev
    }

    /// Count the anomalous readings of a batch
    pub fn count_anomalies(&self, readings: &[Reading]) -> usize {
        readings
            .iter()
            .filter(|r| self.is_anomalous(r.power_out))
            .count()
    }
}
