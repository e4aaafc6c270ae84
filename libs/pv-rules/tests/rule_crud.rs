//! Integration tests for Rule store operations
//!
//! Covers the create/edit/delete flow, rule file import/export and
//! evaluation against readings.

#![allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable

use chrono::Utc;
use pv_model::{classify, Reading, Severity};
use pv_rules::{
    load_rules_file, save_rules_file, Condition, EditTarget, Metric, Rule, RuleDraft, RuleError,
    RuleEvaluator, RuleStore,
};
use tempfile::TempDir;

fn draft(metric: Metric, condition: Condition, threshold: &str, severity: Severity) -> RuleDraft {
    RuleDraft {
        metric,
        condition,
        threshold: threshold.to_string(),
        severity,
        message: format!("{metric} {condition} {threshold}"),
    }
}

fn reading(power: f64, voltage: f64) -> Reading {
    Reading {
        id: 1,
        panel_id: "PV001".to_string(),
        power_out: power,
        voltage,
        status: classify(power, 50.0),
        observed_at: Utc::now(),
    }
}

#[test]
fn test_form_flow_end_to_end() {
    let mut store = RuleStore::new();

    // create
    store.start_create();
    let critical = store
        .save(draft(Metric::Power, Condition::Lt, "100", Severity::Critical))
        .unwrap();

    // rejected edit keeps the operator's input
    store.start_edit(critical).unwrap();
    let mut bad = draft(Metric::Power, Condition::Lt, "", Severity::Critical);
    bad.message = "still typing".to_string();
    let err = store.save(bad.clone()).unwrap_err();
    assert!(matches!(err, RuleError::Validation { .. }));
    assert_eq!(store.edit_target(), Some(EditTarget::Existing(critical)));
    assert_eq!(store.draft(), Some(&bad));

    // fix and save: same id, same slot
    let saved = store
        .save(draft(Metric::Power, Condition::Lt, "80", Severity::Critical))
        .unwrap();
    assert_eq!(saved, critical);
    assert_eq!(store.rules()[0].threshold, 80.0);

    // delete twice
    assert!(store.delete(critical));
    assert!(!store.delete(critical));
    assert!(store.is_empty());
}

#[test]
fn test_rule_matching_contract() {
    let mut store = RuleStore::new();
    store
        .save(draft(Metric::Power, Condition::Lt, "100", Severity::Critical))
        .unwrap();

    let evaluator = RuleEvaluator::default();
    assert_eq!(evaluator.matching(store.rules(), &reading(50.0, 230.0)).len(), 1);
    assert!(evaluator.matching(store.rules(), &reading(150.0, 230.0)).is_empty());
}

#[test]
fn test_rules_file_round_trip_yaml_and_json() {
    let dir = TempDir::new().unwrap();
    let mut store = RuleStore::new();
    store
        .save(draft(Metric::Power, Condition::Lt, "100", Severity::Critical))
        .unwrap();
    store
        .save(draft(Metric::Voltage, Condition::Gt, "250.5", Severity::Warning))
        .unwrap();

    for name in ["rules.yaml", "nested/rules.json"] {
        let path = dir.path().join(name);
        save_rules_file(&path, store.rules()).unwrap();
        let loaded = load_rules_file(&path).unwrap();
        assert_eq!(loaded, store.rules());
    }
}

#[test]
fn test_import_hand_written_yaml() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("import.yml");
    std::fs::write(
        &path,
        r#"
- metric: power
  condition: "<"
  threshold: 20
  severity: critical
- metric: voltage
  condition: gt
  threshold: 260
  severity: warning
  message: Overvoltage on string
"#,
    )
    .unwrap();

    let imported: Vec<Rule> = load_rules_file(&path).unwrap();
    assert_eq!(imported.len(), 2);
    assert_eq!(imported[0].condition, Condition::Lt);
    assert_eq!(imported[0].alert_text(), "power < 20");

    let mut store = RuleStore::new();
    let ids = store.append_all(imported).unwrap();
    assert_eq!(ids, vec![1, 2]);
    assert_eq!(store.get(2).unwrap().alert_text(), "Overvoltage on string");
}

#[test]
fn test_unsupported_rule_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("rules.csv");
    std::fs::write(&path, "x").unwrap();
    assert!(matches!(
        load_rules_file(&path),
        Err(RuleError::UnsupportedFormat(_))
    ));
}
