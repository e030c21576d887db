// Aggregation pipeline - validate, bucket, aggregate, assemble
//
// One synchronous pass over already-loaded rows. Pure with respect to its
// inputs: the same rows and granularity always produce the same series.
use std::collections::HashMap;

use crate::domain::granularity::Granularity;
use crate::domain::record::{
    InvalidRecord, MeasurementSpec, PipelineError, RawRecord, RowIssue, ValidatedRow,
};
use crate::domain::series::{FieldStats, Series, SeriesBucket};
use crate::domain::time_of_day::TimeOfDay;

/// Bucket key for a time the bucketer could not handle. Dropped during
/// assembly; not expected to occur on validated input.
pub const INVALID_BUCKET_KEY: &str = "invalid";

/// Outcome of validating one batch of rows. Valid and invalid rows partition
/// the input: every row lands in exactly one of the two lists.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub valid: Vec<ValidatedRow>,
    pub invalid: Vec<InvalidRecord>,
}

impl ValidationReport {
    pub fn total(&self) -> usize {
        self.valid.len() + self.invalid.len()
    }
}

/// Check the row shape against the spec before any per-row work. A column the
/// configuration requires but the export lacks is a configuration error,
/// fatal to the whole chart, not a per-row one.
pub fn ensure_required_columns(
    records: &[RawRecord],
    spec: &MeasurementSpec,
) -> Result<(), PipelineError> {
    let Some(first) = records.first() else {
        return Ok(());
    };

    let mut missing = Vec::new();
    if !first.contains_key(&spec.time_column) {
        missing.push(spec.time_column.clone());
    }
    if let Some(date_column) = &spec.date_column {
        if !first.contains_key(date_column) {
            missing.push(date_column.clone());
        }
    }
    for column in &spec.value_columns {
        if !first.contains_key(column) {
            missing.push(column.clone());
        }
    }

    if missing.is_empty() {
        Ok(())
    } else {
        Err(PipelineError::MissingRequiredColumns(missing))
    }
}

/// Classify every row as valid or invalid. Never fails on malformed input;
/// a row is rejected whole on its first failing check and processing moves
/// on. Input order is preserved on both sides of the partition.
pub fn validate(records: &[RawRecord], spec: &MeasurementSpec) -> ValidationReport {
    let mut report = ValidationReport::default();

    for (index, record) in records.iter().enumerate() {
        match validate_record(record, spec) {
            Ok(row) => report.valid.push(row),
            Err(reason) => report.invalid.push(InvalidRecord {
                index,
                record: record.clone(),
                reason,
            }),
        }
    }

    if !report.invalid.is_empty() {
        tracing::warn!(
            "excluded {} of {} rows during validation",
            report.invalid.len(),
            report.total()
        );
        for entry in &report.invalid {
            tracing::debug!(row = entry.index, record = ?entry.record, "rejected: {}", entry.reason);
        }
    }

    report
}

fn validate_record(record: &RawRecord, spec: &MeasurementSpec) -> Result<ValidatedRow, RowIssue> {
    let time_label = record
        .get(&spec.time_column)
        .map(|text| text.trim())
        .filter(|text| !text.is_empty())
        .ok_or(RowIssue::MissingOrMalformedTime)?;
    let time = TimeOfDay::parse(time_label).ok_or(RowIssue::MissingOrMalformedTime)?;

    let mut values = HashMap::with_capacity(spec.value_columns.len());
    for column in &spec.value_columns {
        let value = record
            .get(column)
            .and_then(|text| text.trim().parse::<f64>().ok())
            .filter(|value| value.is_finite())
            .ok_or_else(|| RowIssue::InvalidNumericValue(column.clone()))?;
        values.insert(column.clone(), value);
    }

    Ok(ValidatedRow {
        time,
        time_label: time_label.to_string(),
        values,
    })
}

/// Map a validated row to its bucket key at the given granularity.
///
/// Flooring is plain integer arithmetic on the hour/minute/second triple; no
/// calendar dates and no timezone are ever involved, so a value with no date
/// component cannot pick up daylight-saving artifacts. Seconds-level flooring
/// never carries into minutes.
pub fn bucket_key(row: &ValidatedRow, granularity: Granularity) -> String {
    let time = row.time;
    match granularity {
        // Identity bucketing: every distinct original timestamp is its own
        // bucket, reproduced verbatim.
        Granularity::None => row.time_label.clone(),
        Granularity::Seconds(width) => match floor_to(time.second, width) {
            Some(second) => format!("{:02}:{:02}:{:02}", time.hour, time.minute, second),
            None => INVALID_BUCKET_KEY.to_string(),
        },
        Granularity::Minutes(width) => match floor_to(time.minute, width) {
            Some(minute) => format!("{:02}:{:02}:00", time.hour, minute),
            None => INVALID_BUCKET_KEY.to_string(),
        },
        Granularity::Hours(width) => match floor_to(time.hour, width) {
            Some(hour) => format!("{hour:02}:00:00"),
            None => INVALID_BUCKET_KEY.to_string(),
        },
    }
}

fn floor_to(value: u8, width: u32) -> Option<u8> {
    if width == 0 {
        return None;
    }
    let floored = (u32::from(value) / width) * width;
    u8::try_from(floored).ok()
}

struct FieldAccumulator {
    sum: f64,
    min: f64,
    max: f64,
}

struct BucketAccumulator {
    key: String,
    count: usize,
    fields: HashMap<String, FieldAccumulator>,
}

impl BucketAccumulator {
    fn new(key: String) -> Self {
        Self {
            key,
            count: 0,
            fields: HashMap::new(),
        }
    }

    fn push(&mut self, row: &ValidatedRow) {
        self.count += 1;
        for (column, &value) in &row.values {
            self.fields
                .entry(column.clone())
                .and_modify(|acc| {
                    acc.sum += value;
                    acc.min = acc.min.min(value);
                    acc.max = acc.max.max(value);
                })
                .or_insert(FieldAccumulator {
                    sum: value,
                    min: value,
                    max: value,
                });
        }
    }

    fn finish(self, granularity: Granularity) -> SeriesBucket {
        let count = self.count.max(1);
        let fields = self
            .fields
            .into_iter()
            .map(|(column, acc)| {
                // True max/min over the raw values in the bucket. Under
                // identity bucketing the bucket holds one row, so the
                // extremes are degenerate and reported as absent.
                let stats = if granularity == Granularity::None {
                    FieldStats {
                        mean: acc.sum / count as f64,
                        max: None,
                        min: None,
                    }
                } else {
                    FieldStats {
                        mean: acc.sum / count as f64,
                        max: Some(acc.max),
                        min: Some(acc.min),
                    }
                };
                (column, stats)
            })
            .collect();

        SeriesBucket {
            key: self.key,
            count: self.count,
            fields,
        }
    }
}

/// Group rows by bucket key and reduce each group to per-column statistics.
/// A row is assigned to exactly one bucket for all of its columns. Buckets
/// come out in first-seen order; the statistics themselves do not depend on
/// row arrival order.
pub fn aggregate(rows: &[ValidatedRow], granularity: Granularity) -> Vec<SeriesBucket> {
    let mut slots: HashMap<String, usize> = HashMap::new();
    let mut buckets: Vec<BucketAccumulator> = Vec::new();

    for row in rows {
        let key = bucket_key(row, granularity);
        let slot = *slots.entry(key.clone()).or_insert_with(|| {
            buckets.push(BucketAccumulator::new(key));
            buckets.len() - 1
        });
        buckets[slot].push(row);
    }

    buckets
        .into_iter()
        .map(|bucket| bucket.finish(granularity))
        .collect()
}

/// Order buckets chronologically into a plot-ready series.
///
/// Keys are parsed back to their numeric triple and sorted on that, since a
/// lexicographic sort would put `10:00:00` before `9:00:00`. Keys that do not
/// parse (the defensive `invalid` bucket) are dropped. The sort is stable, so
/// duplicate triples keep their insertion order.
pub fn assemble(buckets: Vec<SeriesBucket>) -> Series {
    let mut keyed: Vec<(TimeOfDay, SeriesBucket)> = Vec::with_capacity(buckets.len());
    let mut dropped = 0usize;

    for bucket in buckets {
        match TimeOfDay::parse(&bucket.key) {
            Some(time) => keyed.push((time, bucket)),
            None => dropped += 1,
        }
    }
    if dropped > 0 {
        tracing::warn!("dropped {} buckets with unparseable keys", dropped);
    }

    keyed.sort_by_key(|(time, _)| *time);
    Series::new(keyed.into_iter().map(|(_, bucket)| bucket).collect())
}

/// The whole pipeline after validation: bucket, aggregate, order.
pub fn compute_series(rows: &[ValidatedRow], granularity: Granularity) -> Series {
    assemble(aggregate(rows, granularity))
}
