//! Integration tests for batch parsing and classification
//!
//! Feeds realistic tabular text through the full parser path.

#![allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable

use chrono::{TimeZone, Utc};
use pv_model::{parse_text, BatchSummary, PanelStatus, ParseContext, PowerBaseline};

fn ctx(first_id: u64) -> ParseContext {
    ParseContext::new(50.0, first_id).with_now(Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap())
}

#[test]
fn classifies_reference_batch() {
    let text = "\
id_panel,power,voltage,timestamp
PV001,0,220,2024-06-01T08:00:00Z
PV001,30,220,2024-06-01T09:00:00Z
PV001,500,150,2024-06-01T10:00:00Z
";
    let batch = parse_text(text, None, &ctx(1)).unwrap();
    let statuses: Vec<PanelStatus> = batch.readings.iter().map(|r| r.status).collect();

    assert_eq!(
        statuses,
        vec![PanelStatus::Offline, PanelStatus::Low, PanelStatus::Normal]
    );
    assert_eq!(
        batch.readings[2].observed_at,
        Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap()
    );

    // 500W sits exactly one sigma from the mean of {30, 500}
    let baseline = PowerBaseline::from_readings(&batch.readings);
    assert_eq!(baseline.sample_count, 2);
    assert!(!baseline.is_anomalous(500.0));
}

#[test]
fn valid_row_count_is_preserved() {
    let mut text = String::from("id_panel,power,voltage,timestamp\n");
    for i in 0..25 {
        text.push_str(&format!("PV{:03},{},230,2024-06-01T08:{:02}:00Z\n", i, 100 + i, i));
        // interleave malformed rows
        text.push_str(&format!("PV{:03},,230,2024-06-01T08:{:02}:00Z\n", i, i));
    }

    let batch = parse_text(&text, None, &ctx(100)).unwrap();

    assert_eq!(batch.readings.len(), 25);
    assert_eq!(batch.dropped, 25);
    let ids: Vec<u64> = batch.readings.iter().map(|r| r.id).collect();
    assert_eq!(ids, (100..125).collect::<Vec<_>>());
    assert!(batch
        .readings
        .iter()
        .enumerate()
        .all(|(i, r)| r.panel_id == format!("PV{:03}", i)));
}

#[test]
fn tab_separated_with_extra_columns() {
    let text = "site\tid_panel\tpower\tvoltage\ttimestamp\tnote\n\
                north\tPV010\t75.5\t231.2\t2024-06-01 07:15:00\tclean\n\
                north\tPV011\t12\t229\tgarbage\t\n";
    let c = ctx(1);
    let batch = parse_text(text, None, &c).unwrap();

    assert_eq!(batch.readings.len(), 2);
    assert_eq!(batch.readings[0].power_out, 75.5);
    assert_eq!(batch.readings[0].voltage, 231.2);
    assert_eq!(batch.readings[1].status, PanelStatus::Low);
    assert_eq!(batch.readings[1].observed_at, c.now);
    assert_eq!(batch.coerced_timestamps, 1);
}

#[test]
fn summary_over_parsed_batch() {
    let text = "\
id_panel,power,voltage,timestamp
A,0,0,2024-06-01T08:00:00Z
B,40,210,2024-06-01T08:00:00Z
C,400,230,2024-06-01T08:00:00Z
C,420,231,2024-06-01T08:05:00Z
";
    let batch = parse_text(text, None, &ctx(1)).unwrap();
    let summary = BatchSummary::from_readings(&batch.readings);

    assert_eq!(summary.distinct_panels, 3);
    assert_eq!(summary.offline_count, 1);
    assert_eq!(summary.low_count, 1);
    assert_eq!(summary.normal_count, 2);
    assert_eq!(summary.anomaly_count, 0);
}
