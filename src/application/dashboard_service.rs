// Dashboard service - Use case for building plot-ready dashboards
use std::sync::Arc;

use anyhow::Context;
use chrono::NaiveDate;

use crate::application::date_index::DateIndex;
use crate::application::pipeline::{compute_series, ensure_required_columns, validate};
use crate::application::record_source::RecordSource;
use crate::domain::granularity::{tick_stride, Granularity};
use crate::domain::record::MeasurementSpec;
use crate::domain::series::{
    ChartData, ChartKind, ChartPoint, Dashboard, IngestSummary, Series, SeriesData,
};
use crate::infrastructure::config::ChartsConfig;

#[derive(Clone)]
pub struct DashboardService {
    source: Arc<dyn RecordSource>,
    spec: MeasurementSpec,
    charts_config: ChartsConfig,
    default_interval: usize,
}

impl DashboardService {
    pub fn new(
        source: Arc<dyn RecordSource>,
        spec: MeasurementSpec,
        charts_config: ChartsConfig,
        default_interval: usize,
    ) -> Self {
        Self {
            source,
            spec,
            charts_config,
            default_interval,
        }
    }

    /// Dates available in the export, chronologically, for the date picker.
    pub async fn list_dates(&self) -> anyhow::Result<Vec<String>> {
        let records = self.source.load_records().await?;
        let index = DateIndex::build(
            records,
            self.spec.date_column.as_deref(),
            &self.spec.date_format,
        );
        Ok(index
            .dates()
            .iter()
            .map(|date| index.format_date(*date))
            .collect())
    }

    /// Build the dashboard for one selected day and bucket interval. With no
    /// date given, the most recent day with data is shown. A day with no
    /// rows yields a dashboard with zero charts, which the renderer shows as
    /// "no data", not an error.
    pub async fn get_dashboard(
        &self,
        date: Option<&str>,
        interval: Option<usize>,
    ) -> anyhow::Result<Dashboard> {
        let records = self.source.load_records().await?;
        ensure_required_columns(&records, &self.spec)?;
        let rows_total = records.len();

        let index = DateIndex::build(
            records,
            self.spec.date_column.as_deref(),
            &self.spec.date_format,
        );
        let selected = match date {
            Some(text) => Some(
                index
                    .parse_date(text)
                    .with_context(|| format!("unrecognized date `{text}`"))?,
            ),
            None => index.latest(),
        };

        let interval = Granularity::clamp_index(interval.unwrap_or(self.default_interval));
        let granularity = Granularity::from_index(interval).unwrap_or(Granularity::None);

        let report = validate(index.partition(selected), &self.spec);
        let series = compute_series(&report.valid, granularity);
        if series.is_empty() {
            tracing::debug!("no valid rows for the selection");
        } else {
            tracing::debug!(
                "computed {} buckets at {} from {} valid rows",
                series.len(),
                granularity,
                report.valid.len()
            );
        }

        let charts = self.build_charts(&series, granularity, selected, &index);

        let summary = IngestSummary {
            rows_total,
            rows_valid: report.valid.len(),
            rows_invalid: report.invalid.len(),
            first_date: index.dates().first().map(|date| index.format_date(*date)),
            last_date: index.dates().last().map(|date| index.format_date(*date)),
            last_sample: report.valid.last().map(|row| row.time_label.clone()),
        };

        let date_label = selected.map(|date| index.format_date(date));
        let title = match &date_label {
            Some(day) => format!("Power metering ({day})"),
            None => "Power metering".to_string(),
        };

        Ok(Dashboard {
            title,
            date: date_label,
            interval,
            granularity: granularity.to_string(),
            charts,
            summary,
        })
    }

    /// One chart by id, or `None` when the id is unknown or the chart has no
    /// data for the selection.
    pub async fn get_chart(
        &self,
        chart_id: &str,
        date: Option<&str>,
        interval: Option<usize>,
    ) -> anyhow::Result<Option<ChartData>> {
        let dashboard = self.get_dashboard(date, interval).await?;
        Ok(dashboard
            .charts
            .into_iter()
            .find(|chart| chart.id == chart_id))
    }

    fn build_charts(
        &self,
        series: &Series,
        granularity: Granularity,
        selected: Option<NaiveDate>,
        index: &DateIndex,
    ) -> Vec<ChartData> {
        let stride = tick_stride(granularity, series.len());
        let mut charts = Vec::new();

        for chart_config in &self.charts_config.charts {
            let mut series_list = Vec::new();
            for series_config in &chart_config.series {
                let points = column_points(series, &series_config.column);
                if !points.is_empty() {
                    series_list.push(SeriesData::new(
                        series_config.id.clone(),
                        series_config.name.clone(),
                        series_config.color.clone(),
                        points,
                    ));
                }
            }

            // Only add the chart if it has at least one series with data
            if series_list.is_empty() {
                continue;
            }

            let mut overlays = Vec::new();
            if let Some(selected) = selected {
                for overlay_config in &chart_config.overlays {
                    let rows = index.partition_offset(selected, overlay_config.offset_days);
                    if rows.is_empty() {
                        continue;
                    }
                    let overlay_report = validate(rows, &self.spec);
                    let overlay_series = compute_series(&overlay_report.valid, granularity);
                    let points = column_points(&overlay_series, &overlay_config.column);
                    if !points.is_empty() {
                        overlays.push(SeriesData::new(
                            overlay_config.id.clone(),
                            overlay_config.name.clone(),
                            overlay_config.color.clone(),
                            points,
                        ));
                    }
                }
            }

            let kind = match chart_config.kind.as_str() {
                "multiLine" => ChartKind::MultiLine,
                _ => ChartKind::Line,
            };

            charts.push(ChartData {
                id: chart_config.id.clone(),
                title: chart_config.title.clone(),
                unit: chart_config.unit.clone(),
                kind,
                y_min: chart_config.y_min,
                y_max: chart_config.y_max,
                fraction_digits: chart_config.fraction_digits,
                tick_stride: stride,
                series: series_list,
                overlays,
            });
        }

        charts
    }
}

fn column_points(series: &Series, column: &str) -> Vec<ChartPoint> {
    series
        .iter()
        .filter_map(|bucket| {
            bucket.fields.get(column).map(|stats| {
                ChartPoint::new(
                    bucket.key.clone(),
                    stats.mean,
                    stats.max,
                    stats.min,
                    bucket.count,
                )
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::record::RawRecord;
    use crate::infrastructure::config::{ChartConfig, OverlayConfig, SeriesConfig};
    use async_trait::async_trait;

    struct InMemorySource {
        records: Vec<RawRecord>,
    }

    #[async_trait]
    impl RecordSource for InMemorySource {
        async fn load_records(&self) -> anyhow::Result<Vec<RawRecord>> {
            Ok(self.records.clone())
        }
    }

    fn record(date: &str, time: &str, total: &str, phase: &str) -> RawRecord {
        RawRecord::from([
            ("timestamp1".to_string(), date.to_string()),
            ("hora".to_string(), time.to_string()),
            ("30".to_string(), total.to_string()),
            ("27".to_string(), phase.to_string()),
        ])
    }

    fn test_spec() -> MeasurementSpec {
        MeasurementSpec::new(
            "hora".to_string(),
            Some("timestamp1".to_string()),
            "%d/%m/%Y".to_string(),
            vec!["30".to_string(), "27".to_string()],
        )
    }

    fn test_charts() -> ChartsConfig {
        ChartsConfig {
            charts: vec![ChartConfig {
                id: "power".to_string(),
                title: "Power by phase".to_string(),
                unit: Some("kW".to_string()),
                kind: "multiLine".to_string(),
                y_min: None,
                y_max: None,
                fraction_digits: Some(2),
                series: vec![
                    SeriesConfig {
                        id: "total".to_string(),
                        name: "Total power".to_string(),
                        color: Some("#FF5722".to_string()),
                        column: "30".to_string(),
                    },
                    SeriesConfig {
                        id: "phase_r".to_string(),
                        name: "Phase R".to_string(),
                        color: Some("#4285F4".to_string()),
                        column: "27".to_string(),
                    },
                ],
                overlays: vec![OverlayConfig {
                    id: "total_prev_week".to_string(),
                    name: "Total power, previous week".to_string(),
                    color: None,
                    column: "30".to_string(),
                    offset_days: 7,
                }],
            }],
        }
    }

    fn service(records: Vec<RawRecord>) -> DashboardService {
        DashboardService::new(
            Arc::new(InMemorySource { records }),
            test_spec(),
            test_charts(),
            5,
        )
    }

    #[tokio::test]
    async fn test_dashboard_defaults_to_latest_date() {
        let service = service(vec![
            record("01/01/2025", "10:01:00", "10", "3"),
            record("02/01/2025", "10:01:00", "20", "6"),
            record("02/01/2025", "10:02:00", "40", "8"),
        ]);

        let dashboard = service.get_dashboard(None, None).await.unwrap();
        assert_eq!(dashboard.date.as_deref(), Some("02/01/2025"));
        assert_eq!(dashboard.granularity, "5m");
        assert_eq!(dashboard.charts.len(), 1);

        let chart = &dashboard.charts[0];
        assert_eq!(chart.kind, ChartKind::MultiLine);
        assert_eq!(chart.series.len(), 2);
        let total = &chart.series[0];
        assert_eq!(total.points.len(), 1);
        assert_eq!(total.points[0].label, "10:00:00");
        assert_eq!(total.points[0].mean, 30.0);
        assert_eq!(total.points[0].max, Some(40.0));
        assert_eq!(total.points[0].min, Some(20.0));
    }

    #[tokio::test]
    async fn test_dashboard_summary_counts_rows() {
        let service = service(vec![
            record("02/01/2025", "10:01:00", "20", "6"),
            record("02/01/2025", "bad-time", "20", "6"),
        ]);

        let dashboard = service.get_dashboard(None, None).await.unwrap();
        assert_eq!(dashboard.summary.rows_total, 2);
        assert_eq!(dashboard.summary.rows_valid, 1);
        assert_eq!(dashboard.summary.rows_invalid, 1);
        assert_eq!(dashboard.summary.last_sample.as_deref(), Some("10:01:00"));
    }

    #[tokio::test]
    async fn test_overlay_uses_previous_week_partition() {
        let service = service(vec![
            record("01/01/2025", "10:01:00", "11", "1"),
            record("08/01/2025", "10:01:00", "22", "2"),
        ]);

        let dashboard = service
            .get_dashboard(Some("08/01/2025"), None)
            .await
            .unwrap();
        let chart = &dashboard.charts[0];
        assert_eq!(chart.overlays.len(), 1);
        assert_eq!(chart.overlays[0].points[0].mean, 11.0);
    }

    #[tokio::test]
    async fn test_overlay_omitted_without_previous_data() {
        let service = service(vec![record("08/01/2025", "10:01:00", "22", "2")]);
        let dashboard = service
            .get_dashboard(Some("08/01/2025"), None)
            .await
            .unwrap();
        assert!(dashboard.charts[0].overlays.is_empty());
    }

    #[tokio::test]
    async fn test_day_without_data_is_empty_dashboard() {
        let service = service(vec![record("02/01/2025", "10:01:00", "20", "6")]);
        let dashboard = service
            .get_dashboard(Some("09/01/2025"), None)
            .await
            .unwrap();
        assert!(dashboard.charts.is_empty());
        assert_eq!(dashboard.summary.rows_total, 1);
    }

    #[tokio::test]
    async fn test_empty_source_is_empty_dashboard() {
        let service = service(Vec::new());
        let dashboard = service.get_dashboard(None, None).await.unwrap();
        assert!(dashboard.charts.is_empty());
        assert_eq!(dashboard.summary.rows_total, 0);
    }

    #[tokio::test]
    async fn test_missing_required_column_is_fatal() {
        let records = vec![RawRecord::from([
            ("timestamp1".to_string(), "02/01/2025".to_string()),
            ("hora".to_string(), "10:00:00".to_string()),
            ("30".to_string(), "1".to_string()),
        ])];
        let service = service(records);
        let err = service.get_dashboard(None, None).await.unwrap_err();
        assert!(err.to_string().contains("27"));
    }

    #[tokio::test]
    async fn test_interval_index_is_clamped() {
        let service = service(vec![record("02/01/2025", "10:01:00", "20", "6")]);
        let dashboard = service.get_dashboard(None, Some(99)).await.unwrap();
        assert_eq!(dashboard.interval, 8);
        assert_eq!(dashboard.granularity, "1h");
    }

    #[tokio::test]
    async fn test_get_chart_by_id() {
        let service = service(vec![record("02/01/2025", "10:01:00", "20", "6")]);
        let chart = service.get_chart("power", None, None).await.unwrap();
        assert!(chart.is_some());
        let missing = service.get_chart("nope", None, None).await.unwrap();
        assert!(missing.is_none());
    }
}
