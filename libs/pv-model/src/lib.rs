//! PV Model Library
//!
//! Pure telemetry logic for solar panel monitoring, with no storage or
//! presentation dependencies.
//!
//! # Modules
//!
//! - `parser`: tabular text to raw rows, raw rows to classified readings
//! - `classifier`: reading health status from the power threshold
//! - `statistics`: batch power baseline and two-sigma anomaly test
//! - `summary`: per-batch counters for dashboards
//!
//! # Example
//!
//! ```
//! use pv_model::{parse_text, ParseContext, PanelStatus};
//!
//! let text = "id_panel,power,voltage,timestamp\nPV001,0,220,2024-06-01T08:00:00Z\n";
//! let batch = parse_text(text, None, &ParseContext::new(50.0, 1)).unwrap();
//! assert_eq!(batch.readings[0].status, PanelStatus::Offline);
//! ```

pub mod classifier;
pub mod error;
pub mod parser;
pub mod statistics;
pub mod summary;
pub mod types;

// Re-exports for convenience
pub use classifier::classify;
pub use error::{ModelError, Result};
pub use parser::{
    detect_delimiter, parse_number, parse_rows, parse_text, parse_timestamp, read_table,
    ParseContext, ParsedBatch,
};
pub use statistics::{PowerBaseline, ANOMALY_SIGMA};
pub use summary::BatchSummary;
pub use types::{PanelStatus, RawRow, Reading, ReadingId, Severity, REQUIRED_COLUMNS};
