//! Monitor controller
//!
//! Owns the three live collections (readings, alerts, rules) and is the only
//! writer of them. Every successful mutation is followed by a snapshot write
//! through the [`StateStore`]. The batch pipeline itself is pure; the
//! controller just sequences parse, aggregate, notify and persist.

use std::io::Write;

use pv_common::{PvConfig, RuleConfig, ThresholdConfig};
use pv_model::{parse_rows, read_table, BatchSummary, ParseContext, Reading, ReadingId};
use pv_rules::{EditTarget, Rule, RuleDraft, RuleId, RuleStore};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::aggregator::AlertAggregator;
use crate::error::{AlertError, Result};
use crate::export::write_alerts_csv;
use crate::notifier::{notify_all, AlertNotifier, NullNotifier};
use crate::storage::{AppState, StateStore};
use crate::types::{Alert, AlertId};

/// Process-wide settings applied to each new batch
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MonitorSettings {
    pub thresholds: ThresholdConfig,
    pub rules: RuleConfig,
    /// Fixed field delimiter; `None` detects it per batch
    pub delimiter: Option<u8>,
}

impl MonitorSettings {
    pub fn from_config(config: &PvConfig) -> Self {
        Self {
            thresholds: config.thresholds,
            rules: config.rules,
            delimiter: config.delimiter_byte(),
        }
    }
}

/// Outcome of one batch submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    /// Readings produced
    pub accepted: usize,
    /// Rows dropped for missing required fields
    pub dropped: usize,
    /// Numeric fields coerced to 0
    pub coerced_numbers: usize,
    /// Timestamps replaced by the processing time
    pub coerced_timestamps: usize,
    pub alert_count: usize,
    pub critical_count: usize,
    pub warning_count: usize,
    pub summary: BatchSummary,
}

/// Application controller over a state store
pub struct Monitor<S: StateStore> {
    readings: Vec<Reading>,
    alerts: Vec<Alert>,
    rules: RuleStore,
    settings: MonitorSettings,
    next_reading_id: ReadingId,
    store: S,
    notifier: Box<dyn AlertNotifier>,
}

impl<S: StateStore> Monitor<S> {
    /// Open the controller, restoring the last snapshot if the store has one.
    ///
    /// A snapshot whose ids leave no room for new ones is refused.
    pub fn open(store: S, settings: MonitorSettings) -> Result<Self> {
        let state = store.load()?.unwrap_or_default();
        let max_reading_id = state.readings.iter().map(|r| r.id).max().unwrap_or(0);
        let next_reading_id = max_reading_id.checked_add(1).ok_or_else(|| {
            AlertError::storage(format!("reading ids exhausted at {}", max_reading_id))
        })?;
        let rules = RuleStore::from_rules(state.rules)?;

        debug!(
            readings = state.readings.len(),
            alerts = state.alerts.len(),
            rules = rules.len(),
            "Monitor opened"
        );

        Ok(Self {
            readings: state.readings,
            alerts: state.alerts,
            rules,
            settings,
            next_reading_id,
            store,
            notifier: Box::new(NullNotifier),
        })
    }

    /// Replace the alert sink
    pub fn with_notifier(mut self, notifier: Box<dyn AlertNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn readings(&self) -> &[Reading] {
        &self.readings
    }

    pub fn alerts(&self) -> &[Alert] {
        &self.alerts
    }

    pub fn rules(&self) -> &RuleStore {
        &self.rules
    }

    pub fn settings(&self) -> &MonitorSettings {
        &self.settings
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Summary of the live readings
    pub fn summary(&self) -> BatchSummary {
        BatchSummary::from_readings(&self.readings)
    }

    /// Owned copy of the persisted collections
    pub fn snapshot(&self) -> AppState {
        AppState::new(
            self.readings.clone(),
            self.alerts.clone(),
            self.rules.rules().to_vec(),
        )
    }

    fn persist(&mut self) -> Result<()> {
        let state = self.snapshot();
        self.store.save(&state)
    }

    // ------------------------------------------------------------------
    // Batch pipeline
    // ------------------------------------------------------------------

    /// Analyze a complete batch.
    ///
    /// Empty or whitespace-only text is rejected before parsing and leaves
    /// state untouched. Otherwise readings and alerts are replaced
    /// wholesale, even when no row survives parsing; previously dismissed
    /// alerts are gone.
    pub fn submit_batch(&mut self, text: &str) -> Result<BatchReport> {
        if text.trim().is_empty() {
            warn!("Rejected empty batch");
            return Err(AlertError::EmptyBatch);
        }

        let rows = read_table(text, self.settings.delimiter)?;
        // every row may become a reading
        if self.next_reading_id.checked_add(rows.len() as ReadingId).is_none() {
            return Err(AlertError::storage("reading ids exhausted"));
        }

        let ctx = ParseContext::new(self.settings.thresholds.power_threshold, self.next_reading_id);
        let parsed = parse_rows(&rows, &ctx);

        let aggregator =
            AlertAggregator::from_config(&self.settings.thresholds, &self.settings.rules);
        let alerts = aggregator.aggregate(&parsed.readings, self.rules.rules());

        self.next_reading_id += parsed.readings.len() as ReadingId;
        self.readings = parsed.readings;
        self.alerts = alerts;

        notify_all(self.notifier.as_ref(), &self.alerts);

        let critical_count = self.alerts.iter().filter(|a| a.is_critical()).count();
        let report = BatchReport {
            accepted: self.readings.len(),
            dropped: parsed.dropped,
            coerced_numbers: parsed.coerced_numbers,
            coerced_timestamps: parsed.coerced_timestamps,
            alert_count: self.alerts.len(),
            critical_count,
            warning_count: self.alerts.len() - critical_count,
            summary: self.summary(),
        };

        info!(
            "Batch analyzed: {} readings ({} dropped), {} alerts ({} critical)",
            report.accepted, report.dropped, report.alert_count, report.critical_count
        );

        self.persist()?;
        Ok(report)
    }

    /// Change thresholds for subsequent batches; current readings keep
    /// their classification
    pub fn set_thresholds(&mut self, thresholds: ThresholdConfig) -> Result<()> {
        for (name, value) in [
            ("power_threshold", thresholds.power_threshold),
            ("voltage_threshold", thresholds.voltage_threshold),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(AlertError::InvalidSetting(format!(
                    "{} must be a finite, non-negative number (got {})",
                    name, value
                )));
            }
        }

        self.settings.thresholds = thresholds;
        debug!(
            power = thresholds.power_threshold,
            voltage = thresholds.voltage_threshold,
            "Thresholds updated"
        );
        Ok(())
    }

    // ------------------------------------------------------------------
    // Alerts and readings
    // ------------------------------------------------------------------

    /// Remove one alert from the live list; `false` if it was not there
    pub fn dismiss_alert(&mut self, id: AlertId) -> Result<bool> {
        let Some(pos) = self.alerts.iter().position(|a| a.id == id) else {
            debug!("Alert {} not present, nothing to dismiss", id);
            return Ok(false);
        };

        let alert = self.alerts.remove(pos);
        debug!("Dismissed alert {} ({})", alert.id, alert.message);
        self.persist()?;
        Ok(true)
    }

    /// Drop the current batch together with the alerts derived from it
    pub fn clear_readings(&mut self) -> Result<()> {
        info!(
            "Clearing {} readings and {} alerts",
            self.readings.len(),
            self.alerts.len()
        );
        self.readings.clear();
        self.alerts.clear();
        self.persist()
    }

    /// Write the live alerts as CSV; returns the row count
    pub fn export_alerts<W: Write>(&self, writer: W) -> Result<usize> {
        write_alerts_csv(writer, &self.alerts)
    }

    // ------------------------------------------------------------------
    // Rules
    // ------------------------------------------------------------------

    pub fn start_create(&mut self) -> RuleDraft {
        self.rules.start_create().clone()
    }

    /// `None` when the rule does not exist; the edit state is unchanged then
    pub fn start_edit(&mut self, id: RuleId) -> Option<RuleDraft> {
        self.rules.start_edit(id).cloned()
    }

    pub fn cancel_edit(&mut self) {
        self.rules.cancel();
    }

    pub fn edit_target(&self) -> Option<EditTarget> {
        self.rules.edit_target()
    }

    /// Validate and store the draft; the edit is kept when validation fails
    pub fn save_rule(&mut self, draft: RuleDraft) -> Result<RuleId> {
        let id = self.rules.save(draft)?;
        self.persist()?;
        Ok(id)
    }

    /// Delete a rule; `false` when it did not exist
    pub fn delete_rule(&mut self, id: RuleId) -> Result<bool> {
        if !self.rules.delete(id) {
            return Ok(false);
        }
        self.persist()?;
        Ok(true)
    }

    pub fn clear_rules(&mut self) -> Result<()> {
        self.rules.clear();
        self.persist()
    }

    /// Append rules from an external source under fresh ids
    pub fn import_rules(&mut self, rules: Vec<Rule>) -> Result<Vec<RuleId>> {
        let ids = self.rules.append_all(rules)?;
        if !ids.is_empty() {
            self.persist()?;
        }
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use pv_model::{PanelStatus, Severity};
    use pv_rules::{Condition, Metric};

    const BATCH: &str = "id_panel,power,voltage,timestamp\n\
        PV001,0,220,2024-06-01T08:00:00Z\n\
        PV001,30,220,2024-06-01T09:00:00Z\n\
        PV001,500,150,2024-06-01T10:00:00Z\n";

    fn monitor() -> Monitor<MemoryStore> {
        Monitor::open(MemoryStore::new(), MonitorSettings::default()).unwrap()
    }

    fn draft(threshold: &str, message: &str) -> RuleDraft {
        RuleDraft {
            metric: Metric::Power,
            condition: Condition::Lt,
            threshold: threshold.to_string(),
            severity: Severity::Critical,
            message: message.to_string(),
        }
    }

    #[test]
    fn test_submit_batch() {
        let mut m = monitor();
        let report = m.submit_batch(BATCH).unwrap();

        assert_eq!(report.accepted, 3);
        assert_eq!(report.alert_count, 3);
        assert_eq!(report.critical_count, 1);
        assert_eq!(report.warning_count, 2);

        let statuses: Vec<_> = m.readings().iter().map(|r| r.status).collect();
        assert_eq!(
            statuses,
            vec![PanelStatus::Offline, PanelStatus::Low, PanelStatus::Normal]
        );
        assert_eq!(m.store().save_count(), 1);
    }

    #[test]
    fn test_empty_batch_leaves_state() {
        let mut m = monitor();
        m.submit_batch(BATCH).unwrap();

        let err = m.submit_batch("  \n\t ").unwrap_err();
        assert!(matches!(err, AlertError::EmptyBatch));
        assert_eq!(m.readings().len(), 3);
        assert_eq!(m.alerts().len(), 3);
        assert_eq!(m.store().save_count(), 1);
    }

    #[test]
    fn test_headerless_batch_replaces_state() {
        let mut m = monitor();
        m.submit_batch(BATCH).unwrap();

        let report = m
            .submit_batch("PV001,0,220,2024-06-01T08:00:00Z\nPV002,10,220,2024-06-01T08:00:00Z\n")
            .unwrap();
        assert_eq!(report.accepted, 0);
        assert_eq!(report.dropped, 1);
        assert!(m.readings().is_empty());
        assert!(m.alerts().is_empty());
        assert_eq!(m.store().save_count(), 2);
    }

    #[test]
    fn test_reading_ids_keep_increasing() {
        let mut m = monitor();
        m.submit_batch(BATCH).unwrap();
        m.submit_batch(BATCH).unwrap();

        let ids: Vec<_> = m.readings().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![4, 5, 6]);
    }

    #[test]
    fn test_dismiss_is_idempotent() {
        let mut m = monitor();
        m.submit_batch(BATCH).unwrap();
        let id = m.alerts()[1].id;

        assert!(m.dismiss_alert(id).unwrap());
        assert!(!m.dismiss_alert(id).unwrap());
        assert_eq!(m.alerts().len(), 2);
        assert_eq!(m.readings().len(), 3);
    }

    #[test]
    fn test_rule_takes_effect_on_next_batch() {
        let mut m = monitor();
        m.submit_batch(BATCH).unwrap();

        m.start_create();
        let id = m.save_rule(draft("100", "under 100W")).unwrap();
        assert_eq!(m.alerts().len(), 3);

        m.submit_batch(BATCH).unwrap();
        let rule_alerts: Vec<_> = m
            .alerts()
            .iter()
            .filter(|a| a.source == crate::types::AlertSource::Rule(id))
            .collect();
        // 0W and 30W match, 500W does not
        assert_eq!(rule_alerts.len(), 2);
        assert_eq!(rule_alerts[0].message, "PV001: under 100W");

        // deleting keeps already generated alerts
        assert!(m.delete_rule(id).unwrap());
        assert_eq!(m.alerts().len(), 5);
        assert!(!m.delete_rule(id).unwrap());
    }

    #[test]
    fn test_invalid_draft_keeps_edit() {
        let mut m = monitor();
        m.start_create();

        let err = m.save_rule(draft("abc", "x")).unwrap_err();
        assert!(err.is_rejection());
        assert_eq!(m.edit_target(), Some(EditTarget::New));
        assert!(m.rules().is_empty());
        assert_eq!(m.store().save_count(), 0);
    }

    #[test]
    fn test_start_edit_unknown_is_noop() {
        let mut m = monitor();
        assert!(m.start_edit(42).is_none());
        assert_eq!(m.edit_target(), None);
    }

    #[test]
    fn test_clear_readings_drops_alerts() {
        let mut m = monitor();
        m.submit_batch(BATCH).unwrap();
        m.clear_readings().unwrap();

        assert!(m.readings().is_empty());
        assert!(m.alerts().is_empty());
        assert_eq!(m.summary().total_readings, 0);
    }

    #[test]
    fn test_reopen_restores_state() {
        let mut m = monitor();
        m.start_create();
        m.save_rule(draft("100", "under 100W")).unwrap();
        m.submit_batch(BATCH).unwrap();

        let saved = m.snapshot();
        let reopened =
            Monitor::open(MemoryStore::with_state(saved.clone()), MonitorSettings::default())
                .unwrap();
        assert_eq!(reopened.snapshot(), saved);
        assert_eq!(reopened.next_reading_id, 4);
    }

    #[test]
    fn test_open_with_exhausted_ids_fails() {
        let mut m = monitor();
        m.start_create();
        m.save_rule(draft("100", "under 100W")).unwrap();
        m.submit_batch(BATCH).unwrap();

        let mut state = m.snapshot();
        state.readings[2].id = ReadingId::MAX;
        let err = Monitor::open(MemoryStore::with_state(state.clone()), MonitorSettings::default())
            .err()
            .unwrap();
        assert!(matches!(err, AlertError::Storage(_)));

        state.readings[2].id = 3;
        state.rules[0].id = RuleId::MAX;
        let err = Monitor::open(MemoryStore::with_state(state), MonitorSettings::default())
            .err()
            .unwrap();
        assert!(matches!(
            err,
            AlertError::Rule(pv_rules::RuleError::IdsExhausted(RuleId::MAX))
        ));
    }

    #[test]
    fn test_batch_past_last_reading_id_is_refused() {
        let mut m = monitor();
        m.submit_batch(BATCH).unwrap();

        let mut state = m.snapshot();
        state.readings[2].id = ReadingId::MAX - 1;
        let mut m = Monitor::open(MemoryStore::with_state(state), MonitorSettings::default())
            .unwrap();

        let err = m.submit_batch(BATCH).unwrap_err();
        assert!(matches!(err, AlertError::Storage(_)));
        assert_eq!(m.readings().len(), 3);
        assert_eq!(m.store().save_count(), 0);
    }

    #[test]
    fn test_set_thresholds() {
        let mut m = monitor();
        assert!(m
            .set_thresholds(ThresholdConfig {
                power_threshold: f64::NAN,
                voltage_threshold: 200.0,
            })
            .is_err());

        m.set_thresholds(ThresholdConfig {
            power_threshold: 20.0,
            voltage_threshold: 100.0,
        })
        .unwrap();
        m.submit_batch(BATCH).unwrap();

        // only the offline alert remains: 30W is above 20, 150V above 100
        assert_eq!(m.alerts().len(), 1);
        assert!(m.alerts()[0].is_critical());
    }

    #[test]
    fn test_export_alerts() {
        let mut m = monitor();
        m.submit_batch(BATCH).unwrap();

        let mut buf = Vec::new();
        assert_eq!(m.export_alerts(&mut buf).unwrap(), 3);
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("PV001,PV001 low power 30.00W,warning,2024-06-01T09:00:00Z"));
    }
}
