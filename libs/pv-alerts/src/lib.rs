//! PV Alerts - Alert Pipeline Library
//!
//! Sits on top of `pv-model` and `pv-rules`:
//! - `aggregator`: built-in checks plus rule matches, per reading, in a fixed order
//! - `notifier`: one event per generated alert, critical or warning
//! - `export`: alert list as CSV
//! - `storage`: application state snapshot and its stores
//! - `monitor`: the controller owning readings, alerts and rules
//!
//! # Example
//!
//! ```
//! use pv_alerts::{MemoryStore, Monitor, MonitorSettings};
//!
//! let mut monitor = Monitor::open(MemoryStore::new(), MonitorSettings::default()).unwrap();
//! let report = monitor
//!     .submit_batch("id_panel,power,voltage,timestamp\nPV001,0,220,2024-06-01T08:00:00Z\n")
//!     .unwrap();
//! assert_eq!(report.critical_count, 1);
//! ```

pub mod aggregator;
pub mod error;
pub mod export;
pub mod monitor;
pub mod notifier;
pub mod storage;
pub mod types;

pub use aggregator::AlertAggregator;
pub use error::{AlertError, Result};
pub use export::{export_alerts_file, write_alerts_csv, EXPORT_HEADER};
pub use monitor::{BatchReport, Monitor, MonitorSettings};
pub use notifier::{notify_all, AlertEvent, AlertNotifier, NullNotifier, TracingNotifier};
pub use storage::{AppState, JsonFileStore, MemoryStore, StateStore, STATE_VERSION};
pub use types::{Alert, AlertId, AlertSource};
