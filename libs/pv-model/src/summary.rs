//! Batch summary counters for dashboards

use crate::statistics::PowerBaseline;
use crate::types::{PanelStatus, Reading};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Aggregate view of one batch of readings
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total_readings: usize,
    pub distinct_panels: usize,
    pub normal_count: usize,
    pub low_count: usize,
    pub offline_count: usize,
    /// Sum of power over readings that are not offline
    pub total_power: f64,
    /// Mean power over readings that are not offline
    pub mean_online_power: f64,
    pub baseline: PowerBaseline,
    pub anomaly_count: usize,
}

impl BatchSummary {
    pub fn from_readings(readings: &[Reading]) -> Self {
        let mut summary = Self {
            total_readings: readings.len(),
            ..Self::default()
        };

        let mut panels = HashSet::new();
        for reading in readings {
            panels.insert(reading.panel_id.as_str());
            match reading.status {
                PanelStatus::Normal => summary.normal_count += 1,
                PanelStatus::Low => summary.low_count += 1,
                PanelStatus::Offline => summary.offline_count += 1,
            }
            if reading.status != PanelStatus::Offline {
                summary.total_power += reading.power_out;
            }
        }
        summary.distinct_panels = panels.len();

        let online = summary.normal_count + summary.low_count;
        if online > 0 {
            summary.mean_online_power = summary.total_power / online as f64;
        }

        summary.baseline = PowerBaseline::from_readings(readings);
        summary.anomaly_count = summary.baseline.count_anomalies(readings);
        summary
    }

    /// Share of readings that are offline, in percent
    pub fn offline_percent(&self) -> f64 {
        if self.total_readings == 0 {
            0.0
        } else {
            self.offline_count as f64 * 100.0 / self.total_readings as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::classify;
    use chrono::Utc;

    fn reading(id: u64, panel: &str, power: f64) -> Reading {
        Reading {
            id,
            panel_id: panel.to_string(),
            power_out: power,
            voltage: 230.0,
            status: classify(power, 50.0),
            observed_at: Utc::now(),
        }
    }

    #[test]
    fn test_empty_summary() {
        let summary = BatchSummary::from_readings(&[]);
        assert_eq!(summary.total_readings, 0);
        assert_eq!(summary.offline_percent(), 0.0);
        assert_eq!(summary.mean_online_power, 0.0);
    }

    #[test]
    fn test_counts_by_status() {
        let readings = vec![
            reading(1, "PV001", 0.0),
            reading(2, "PV001", 30.0),
            reading(3, "PV002", 500.0),
            reading(4, "PV003", 70.0),
        ];
        let summary = BatchSummary::from_readings(&readings);

        assert_eq!(summary.total_readings, 4);
        assert_eq!(summary.distinct_panels, 3);
        assert_eq!(summary.offline_count, 1);
        assert_eq!(summary.low_count, 1);
        assert_eq!(summary.normal_count, 2);
        assert_eq!(summary.total_power, 600.0);
        assert_eq!(summary.mean_online_power, 200.0);
        assert_eq!(summary.offline_percent(), 25.0);
        assert_eq!(summary.baseline.sample_count, 3);
    }
}
