use serde::Deserialize;

use crate::domain::record::MeasurementSpec;

#[derive(Debug, Deserialize, Clone)]
pub struct IngestConfig {
    pub source: SourceConfig,
    pub columns: ColumnsConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

/// Where the CSV export lives and how it is delimited. Exactly one of
/// `path`/`url` is expected; meter exports use `;` more often than `,`.
#[derive(Debug, Deserialize, Clone)]
pub struct SourceConfig {
    pub path: Option<String>,
    pub url: Option<String>,
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
}

impl SourceConfig {
    pub fn delimiter_byte(&self) -> u8 {
        self.delimiter.bytes().next().unwrap_or(b';')
    }
}

fn default_delimiter() -> String {
    ";".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ColumnsConfig {
    pub time: String,
    pub date: Option<String>,
    #[serde(default = "default_date_format")]
    pub date_format: String,
}

fn default_date_format() -> String {
    "%d/%m/%Y".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct PipelineConfig {
    #[serde(default = "default_interval")]
    pub default_interval: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            default_interval: default_interval(),
        }
    }
}

fn default_interval() -> usize {
    // Index into the interval table: five-minute buckets.
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChartsConfig {
    #[serde(default)]
    pub charts: Vec<ChartConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChartConfig {
    pub id: String,
    pub title: String,
    pub unit: Option<String>,
    #[serde(default = "default_kind")]
    pub kind: String,
    pub y_min: Option<f64>,
    pub y_max: Option<f64>,
    pub fraction_digits: Option<i32>,
    #[serde(default)]
    pub series: Vec<SeriesConfig>,
    #[serde(default)]
    pub overlays: Vec<OverlayConfig>,
}

fn default_kind() -> String {
    "line".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct SeriesConfig {
    pub id: String,
    pub name: String,
    pub color: Option<String>,
    pub column: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OverlayConfig {
    pub id: String,
    pub name: String,
    pub color: Option<String>,
    pub column: String,
    #[serde(default = "default_offset_days")]
    pub offset_days: i64,
}

fn default_offset_days() -> i64 {
    7
}

pub fn load_ingest_config() -> anyhow::Result<IngestConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/ingest"))
        .build()?;

    Ok(settings.try_deserialize()?)
}

pub fn load_charts_config() -> anyhow::Result<ChartsConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/charts"))
        .build()?;

    Ok(settings.try_deserialize()?)
}

/// Resolve the measurement spec once from configuration: the time and date
/// columns plus the union of every column any chart or overlay reads.
pub fn measurement_spec(columns: &ColumnsConfig, charts: &ChartsConfig) -> MeasurementSpec {
    let value_columns = charts
        .charts
        .iter()
        .flat_map(|chart| {
            chart
                .series
                .iter()
                .map(|series| series.column.clone())
                .chain(chart.overlays.iter().map(|overlay| overlay.column.clone()))
        })
        .collect();

    MeasurementSpec::new(
        columns.time.clone(),
        columns.date.clone(),
        columns.date_format.clone(),
        value_columns,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measurement_spec_unions_chart_columns() {
        let charts: ChartsConfig = toml::from_str(
            r#"
            [[charts]]
            id = "power"
            title = "Power"
            [[charts.series]]
            id = "total"
            name = "Total"
            column = "30"
            [[charts.series]]
            id = "phase_r"
            name = "Phase R"
            column = "27"
            [[charts.overlays]]
            id = "prev"
            name = "Previous week"
            column = "30"

            [[charts]]
            id = "pf"
            title = "Power factor"
            [[charts.series]]
            id = "pf_r"
            name = "PF R"
            column = "63"
            "#,
        )
        .unwrap();
        let columns = ColumnsConfig {
            time: "hora".to_string(),
            date: Some("timestamp1".to_string()),
            date_format: default_date_format(),
        };

        let spec = measurement_spec(&columns, &charts);
        assert_eq!(spec.time_column, "hora");
        assert_eq!(spec.value_columns, vec!["27", "30", "63"]);
    }

    #[test]
    fn test_ingest_config_defaults() {
        let config: IngestConfig = toml::from_str(
            r#"
            [source]
            path = "data/power.csv"

            [columns]
            time = "hora"
            "#,
        )
        .unwrap();

        assert_eq!(config.source.delimiter_byte(), b';');
        assert_eq!(config.columns.date_format, "%d/%m/%Y");
        assert_eq!(config.pipeline.default_interval, 5);
    }

    #[test]
    fn test_overlay_offset_defaults_to_a_week() {
        let charts: ChartsConfig = toml::from_str(
            r#"
            [[charts]]
            id = "power"
            title = "Power"
            [[charts.overlays]]
            id = "prev"
            name = "Previous week"
            column = "30"
            "#,
        )
        .unwrap();
        assert_eq!(charts.charts[0].overlays[0].offset_days, 7);
        assert_eq!(charts.charts[0].kind, "line");
    }
}
