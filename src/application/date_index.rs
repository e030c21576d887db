// Date index - partitions raw rows per calendar day
use std::collections::HashMap;

use chrono::{Duration, NaiveDate};

use crate::domain::record::RawRecord;

/// Raw rows partitioned by their date column, for the date picker and for
/// previous-period overlays. Exports without a date column fall into a
/// single undated partition.
pub struct DateIndex {
    dates: Vec<NaiveDate>,
    partitions: HashMap<NaiveDate, Vec<RawRecord>>,
    undated: Vec<RawRecord>,
    format: String,
}

impl DateIndex {
    pub fn build(records: Vec<RawRecord>, date_column: Option<&str>, format: &str) -> Self {
        let Some(date_column) = date_column else {
            return Self {
                dates: Vec::new(),
                partitions: HashMap::new(),
                undated: records,
                format: format.to_string(),
            };
        };

        let mut partitions: HashMap<NaiveDate, Vec<RawRecord>> = HashMap::new();
        let mut unparseable = 0usize;
        for record in records {
            let date = record
                .get(date_column)
                .and_then(|text| NaiveDate::parse_from_str(text.trim(), format).ok());
            match date {
                Some(date) => partitions.entry(date).or_default().push(record),
                None => unparseable += 1,
            }
        }
        if unparseable > 0 {
            tracing::warn!(
                "skipped {} rows with missing or unparseable `{}` values",
                unparseable,
                date_column
            );
        }

        let mut dates: Vec<NaiveDate> = partitions.keys().copied().collect();
        dates.sort();

        Self {
            dates,
            partitions,
            undated: Vec::new(),
            format: format.to_string(),
        }
    }

    /// Unique dates in chronological order.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// The default selection: the most recent day with data.
    pub fn latest(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    /// Rows for one day; `None` selects the undated partition.
    pub fn partition(&self, date: Option<NaiveDate>) -> &[RawRecord] {
        match date {
            Some(date) => self
                .partitions
                .get(&date)
                .map(Vec::as_slice)
                .unwrap_or(&[]),
            None => &self.undated,
        }
    }

    /// Rows for the day `offset_days` before `date` (the previous-week
    /// comparison overlay uses 7).
    pub fn partition_offset(&self, date: NaiveDate, offset_days: i64) -> &[RawRecord] {
        self.partition(Some(date - Duration::days(offset_days)))
    }

    pub fn parse_date(&self, text: &str) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(text.trim(), &self.format).ok()
    }

    pub fn format_date(&self, date: NaiveDate) -> String {
        date.format(&self.format).to_string()
    }
}
