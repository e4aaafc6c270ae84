//! Panel health classification

use crate::types::PanelStatus;

/// Classify a power reading against the batch-wide power threshold.
///
/// `NaN` and exactly zero are `Offline`; anything else below the threshold is
/// `Low`. A reading equal to the threshold is `Normal`.
pub fn classify(power_out: f64, power_threshold: f64) -> PanelStatus {
    if power_out.is_nan() || power_out == 0.0 {
        PanelStatus::Offline
    } else if power_out < power_threshold {
        PanelStatus::Low
    } else {
        PanelStatus::Normal
    }
}
