// Aggregated series and chart domain models
use std::collections::HashMap;

/// Per-bucket statistics for one measurement column. `max`/`min` are `None`
/// under identity bucketing, where every bucket holds exactly one row and the
/// extremes would just repeat the mean.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldStats {
    pub mean: f64,
    pub max: Option<f64>,
    pub min: Option<f64>,
}

/// One time bucket with its aggregate statistics per measurement column.
#[derive(Debug, Clone)]
pub struct SeriesBucket {
    pub key: String,
    pub count: usize,
    pub fields: HashMap<String, FieldStats>,
}

/// Chronologically ordered bucket sequence, ready for plotting. Immutable
/// once assembled; iterate it as many times as needed.
#[derive(Debug, Clone, Default)]
pub struct Series {
    buckets: Vec<SeriesBucket>,
}

impl Series {
    pub fn new(buckets: Vec<SeriesBucket>) -> Self {
        Self { buckets }
    }

    pub fn buckets(&self) -> &[SeriesBucket] {
        &self.buckets
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SeriesBucket> {
        self.buckets.iter()
    }
}

/// One plotted point: the bucket label plus the statistics for a single
/// measurement column. `count` is how many samples the bucket aggregates,
/// for tooltips.
#[derive(Debug, Clone)]
pub struct ChartPoint {
    pub label: String,
    pub mean: f64,
    pub max: Option<f64>,
    pub min: Option<f64>,
    pub count: usize,
}

impl ChartPoint {
    pub fn new(label: String, mean: f64, max: Option<f64>, min: Option<f64>, count: usize) -> Self {
        Self {
            label,
            mean,
            max,
            min,
            count,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SeriesData {
    pub id: String,
    pub name: String,
    pub color: Option<String>,
    pub points: Vec<ChartPoint>,
}

impl SeriesData {
    pub fn new(id: String, name: String, color: Option<String>, points: Vec<ChartPoint>) -> Self {
        Self {
            id,
            name,
            color,
            points,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChartKind {
    Line,
    MultiLine,
}

#[derive(Debug, Clone)]
pub struct ChartData {
    pub id: String,
    pub title: String,
    pub unit: Option<String>,
    pub kind: ChartKind,
    pub y_min: Option<f64>,
    pub y_max: Option<f64>,
    pub fraction_digits: Option<i32>,
    pub tick_stride: usize,
    pub series: Vec<SeriesData>,
    pub overlays: Vec<SeriesData>,
}

/// Load diagnostics shown next to the charts: how much data arrived, how much
/// survived validation, and how fresh it is.
#[derive(Debug, Clone, Default)]
pub struct IngestSummary {
    pub rows_total: usize,
    pub rows_valid: usize,
    pub rows_invalid: usize,
    pub first_date: Option<String>,
    pub last_date: Option<String>,
    pub last_sample: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Dashboard {
    pub title: String,
    pub date: Option<String>,
    pub interval: usize,
    pub granularity: String,
    pub charts: Vec<ChartData>,
    pub summary: IngestSummary,
}
