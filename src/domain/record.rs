// Raw meter rows and their validated form
use std::collections::HashMap;

use thiserror::Error;

use super::time_of_day::TimeOfDay;

/// One CSV row as loaded: column name to raw cell text. Discarded after
/// validation unless the row is classified invalid.
pub type RawRecord = HashMap<String, String>;

/// Which columns the pipeline reads from a raw row. Resolved once from
/// configuration; the exported column names vary between meter firmware
/// revisions (`"30"` vs `"30.0"`, `hora` vs `hora_str`), so nothing here is
/// hardcoded downstream.
#[derive(Debug, Clone)]
pub struct MeasurementSpec {
    pub time_column: String,
    pub date_column: Option<String>,
    pub date_format: String,
    pub value_columns: Vec<String>,
}

impl MeasurementSpec {
    pub fn new(
        time_column: String,
        date_column: Option<String>,
        date_format: String,
        mut value_columns: Vec<String>,
    ) -> Self {
        // Sorted and deduped so per-row checks run in a deterministic order.
        value_columns.sort();
        value_columns.dedup();
        Self {
            time_column,
            date_column,
            date_format,
            value_columns,
        }
    }
}

/// A row that passed validation: a wall-clock time plus one finite value per
/// required column. `time_label` keeps the original (trimmed) time text so
/// identity bucketing can reproduce it unchanged.
#[derive(Debug, Clone)]
pub struct ValidatedRow {
    pub time: TimeOfDay,
    pub time_label: String,
    pub values: HashMap<String, f64>,
}

/// A rejected row, kept for diagnostics only. Never enters aggregation.
#[derive(Debug, Clone)]
pub struct InvalidRecord {
    pub index: usize,
    pub record: RawRecord,
    pub reason: RowIssue,
}

/// Why a single row was rejected. Recovered locally: the row is excluded and
/// processing continues.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowIssue {
    #[error("time value is missing or not a valid HH:MM:SS")]
    MissingOrMalformedTime,
    #[error("column `{0}` is missing or not a finite number")]
    InvalidNumericValue(String),
}

/// Errors that abort the whole request rather than a single row.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("required columns missing from input: {}", .0.join(", "))]
    MissingRequiredColumns(Vec<String>),
}
