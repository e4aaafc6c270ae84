//! Record Parser
//!
//! Two stages:
//! 1. [`read_table`] turns delimiter-separated text with a header row into
//!    string-keyed [`RawRow`]s.
//! 2. [`parse_rows`] turns raw rows into classified [`Reading`]s.
//!
//! Rows missing any required field are dropped silently (logged at debug).
//! Bad numbers become 0 and bad timestamps become the processing time.

use crate::classifier::classify;
use crate::error::{ModelError, Result};
use crate::types::{
    RawRow, Reading, ReadingId, COL_PANEL_ID, COL_POWER, COL_TIMESTAMP, COL_VOLTAGE,
    REQUIRED_COLUMNS,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use tracing::{debug, warn};

/// Delimiters tried by auto-detection, in preference order
const CANDIDATE_DELIMITERS: [u8; 4] = [b',', b';', b'\t', b'|'];

/// Zone-less date-time layouts, read as UTC
const NAIVE_DATETIME_FORMATS: [&str; 6] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

/// Epoch values above this are taken as milliseconds
const EPOCH_MILLIS_CUTOFF: i64 = 100_000_000_000;

/// Per-batch parsing context
#[derive(Debug, Clone, Copy)]
pub struct ParseContext {
    /// Batch-wide power threshold used for classification
    pub power_threshold: f64,
    /// Processing time, substituted for unparseable timestamps
    pub now: DateTime<Utc>,
    /// Id assigned to the first accepted row
    pub first_id: ReadingId,
}

impl ParseContext {
    pub fn new(power_threshold: f64, first_id: ReadingId) -> Self {
        Self {
            power_threshold,
            now: Utc::now(),
            first_id,
        }
    }

    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }
}

/// Outcome of parsing one batch
#[derive(Debug, Clone, Default)]
pub struct ParsedBatch {
    /// Accepted readings in input order
    pub readings: Vec<Reading>,
    /// Rows dropped for missing required fields
    pub dropped: usize,
    /// Numeric fields coerced to 0
    pub coerced_numbers: usize,
    /// Timestamps replaced by the processing time
    pub coerced_timestamps: usize,
}

// ============================================================================
// Stage 1: tabular text -> raw rows
// ============================================================================

/// Guess the delimiter from the header line.
///
/// Picks the candidate occurring most often in the first non-empty line,
/// falling back to a comma.
pub fn detect_delimiter(text: &str) -> u8 {
    let header = text.lines().find(|l| !l.trim().is_empty()).unwrap_or("");

    let mut best = (b',', 0usize);
    for candidate in CANDIDATE_DELIMITERS {
        let count = header.bytes().filter(|b| *b == candidate).count();
        if count > best.1 {
            best = (candidate, count);
        }
    }
    best.0
}

/// Read delimiter-separated text with a header row into raw rows.
///
/// `delimiter` of `None` auto-detects. Header names and values are trimmed.
/// Rows with fewer fields than the header simply lack those columns.
pub fn read_table(text: &str, delimiter: Option<u8>) -> Result<Vec<RawRow>> {
    if text.trim().is_empty() {
        return Err(ModelError::EmptyBatch);
    }

    let delimiter = delimiter.unwrap_or_else(|| detect_delimiter(text));
    if !delimiter.is_ascii() || delimiter == b'"' || delimiter == b'\n' {
        return Err(ModelError::invalid_format(format!(
            "unsupported delimiter {:?}",
            delimiter as char
        )));
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();

    if let Some(missing) = REQUIRED_COLUMNS
        .iter()
        .find(|col| !headers.iter().any(|h| h == *col))
    {
        warn!(
            "Header lacks column '{}'; every row will be dropped for it",
            missing
        );
    }

    let mut rows = Vec::new();
    for (line_num, record) in reader.records().enumerate() {
        match record {
            Ok(record) => {
                let row: RawRow = headers
                    .iter()
                    .zip(record.iter())
                    .map(|(h, v)| (h.clone(), v.to_string()))
                    .collect();
                rows.push(row);
            },
            Err(e) => {
                warn!("Skipping unreadable line {}: {}", line_num + 2, e);
            },
        }
    }

    Ok(rows)
}

// ============================================================================
// Stage 2: raw rows -> readings
// ============================================================================

/// Parse raw rows into classified readings, preserving input order
pub fn parse_rows(rows: &[RawRow], ctx: &ParseContext) -> ParsedBatch {
    let mut batch = ParsedBatch::default();
    let mut next_id = ctx.first_id;

    for (index, row) in rows.iter().enumerate() {
        let Some(fields) = required_fields(row) else {
            debug!("Dropping row {}: missing required field", index + 1);
            batch.dropped += 1;
            continue;
        };

        let (power_out, power_ok) = parse_number(fields.power);
        let (voltage, voltage_ok) = parse_number(fields.voltage);
        batch.coerced_numbers += usize::from(!power_ok) + usize::from(!voltage_ok);

        let observed_at = match parse_timestamp(fields.timestamp) {
            Some(ts) => ts,
            None => {
                debug!(
                    "Row {}: unparseable timestamp '{}', using processing time",
                    index + 1,
                    fields.timestamp
                );
                batch.coerced_timestamps += 1;
                ctx.now
            },
        };

        batch.readings.push(Reading {
            id: next_id,
            panel_id: fields.panel_id.to_string(),
            power_out,
            voltage,
            status: classify(power_out, ctx.power_threshold),
            observed_at,
        });
        next_id += 1;
    }

    if batch.coerced_numbers > 0 {
        warn!(
            "{} numeric field(s) could not be parsed and were read as 0",
            batch.coerced_numbers
        );
    }

    batch
}

/// Convenience: read tabular text and parse it in one step
pub fn parse_text(text: &str, delimiter: Option<u8>, ctx: &ParseContext) -> Result<ParsedBatch> {
    let rows = read_table(text, delimiter)?;
    Ok(parse_rows(&rows, ctx))
}

struct RequiredFields<'a> {
    panel_id: &'a str,
    power: &'a str,
    voltage: &'a str,
    timestamp: &'a str,
}

fn required_fields(row: &RawRow) -> Option<RequiredFields<'_>> {
    let get = |col: &str| {
        row.get(col)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    };

    Some(RequiredFields {
        panel_id: get(COL_PANEL_ID)?,
        power: get(COL_POWER)?,
        voltage: get(COL_VOLTAGE)?,
        timestamp: get(COL_TIMESTAMP)?,
    })
}

/// Parse a measurement, coercing anything that is not a finite non-negative
/// number to 0. Returns the value and whether it parsed cleanly.
pub fn parse_number(raw: &str) -> (f64, bool) {
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => (v, true),
        _ => (0.0, false),
    }
}

/// Parse a timestamp in any of the accepted layouts
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }

    if let Ok(ts) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Some(ts.with_timezone(&Utc));
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|n| Utc.from_utc_datetime(&n));
    }

    if let Ok(epoch) = raw.parse::<i64>() {
        return if epoch.abs() >= EPOCH_MILLIS_CUTOFF {
            DateTime::from_timestamp_millis(epoch)
        } else {
            DateTime::from_timestamp(epoch, 0)
        };
    }

    None
}
