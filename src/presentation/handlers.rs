// HTTP request handlers
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::domain::series::{
    ChartData, ChartKind, ChartPoint, Dashboard, IngestSummary, SeriesData,
};
use crate::presentation::app_state::AppState;

#[derive(Deserialize)]
pub struct SelectionQuery {
    pub date: Option<String>,
    pub interval: Option<usize>,
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// List the dates available in the export
pub async fn list_dates(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.dashboard_service.list_dates().await {
        Ok(dates) => Json(dates).into_response(),
        Err(e) => {
            tracing::error!("Error listing dates: {e:#}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Full dashboard for a selected date and bucket interval
pub async fn get_dashboard(
    Query(query): Query<SelectionQuery>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    match state
        .dashboard_service
        .get_dashboard(query.date.as_deref(), query.interval)
        .await
    {
        Ok(dashboard) => Json(DashboardResponse::from(dashboard)).into_response(),
        Err(e) => {
            tracing::error!("Error building dashboard: {e:#}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// One chart by id for a selected date and bucket interval
pub async fn get_chart(
    Path(id): Path<String>,
    Query(query): Query<SelectionQuery>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    match state
        .dashboard_service
        .get_chart(&id, query.date.as_deref(), query.interval)
        .await
    {
        Ok(Some(chart)) => Json(ChartResponse::from(chart)).into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            tracing::error!("Error building chart {id}: {e:#}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

// Wire DTOs. The browser renderer consumes these as camelCase JSON; keeping
// them here leaves the domain models serialization-free.

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub title: String,
    pub date: Option<String>,
    pub interval: usize,
    pub granularity: String,
    pub charts: Vec<ChartResponse>,
    pub summary: SummaryResponse,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartResponse {
    pub id: String,
    pub title: String,
    pub unit: Option<String>,
    pub kind: String,
    pub y_min: Option<f64>,
    pub y_max: Option<f64>,
    pub fraction_digits: Option<i32>,
    pub tick_stride: usize,
    pub series: Vec<SeriesResponse>,
    pub overlays: Vec<SeriesResponse>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesResponse {
    pub id: String,
    pub name: String,
    pub color: Option<String>,
    pub points: Vec<PointResponse>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PointResponse {
    pub label: String,
    pub mean: f64,
    pub max: Option<f64>,
    pub min: Option<f64>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryResponse {
    pub rows_total: usize,
    pub rows_valid: usize,
    pub rows_invalid: usize,
    pub first_date: Option<String>,
    pub last_date: Option<String>,
    pub last_sample: Option<String>,
}

impl From<Dashboard> for DashboardResponse {
    fn from(dashboard: Dashboard) -> Self {
        Self {
            title: dashboard.title,
            date: dashboard.date,
            interval: dashboard.interval,
            granularity: dashboard.granularity,
            charts: dashboard.charts.into_iter().map(ChartResponse::from).collect(),
            summary: SummaryResponse::from(dashboard.summary),
        }
    }
}

impl From<ChartData> for ChartResponse {
    fn from(chart: ChartData) -> Self {
        let kind = match chart.kind {
            ChartKind::Line => "line",
            ChartKind::MultiLine => "multiLine",
        };
        Self {
            id: chart.id,
            title: chart.title,
            unit: chart.unit,
            kind: kind.to_string(),
            y_min: chart.y_min,
            y_max: chart.y_max,
            fraction_digits: chart.fraction_digits,
            tick_stride: chart.tick_stride,
            series: chart.series.into_iter().map(SeriesResponse::from).collect(),
            overlays: chart.overlays.into_iter().map(SeriesResponse::from).collect(),
        }
    }
}

impl From<SeriesData> for SeriesResponse {
    fn from(series: SeriesData) -> Self {
        Self {
            id: series.id,
            name: series.name,
            color: series.color,
            points: series.points.into_iter().map(PointResponse::from).collect(),
        }
    }
}

impl From<ChartPoint> for PointResponse {
    fn from(point: ChartPoint) -> Self {
        Self {
            label: point.label,
            mean: point.mean,
            max: point.max,
            min: point.min,
            count: point.count,
        }
    }
}

impl From<IngestSummary> for SummaryResponse {
    fn from(summary: IngestSummary) -> Self {
        Self {
            rows_total: summary.rows_total,
            rows_valid: summary.rows_valid,
            rows_invalid: summary.rows_invalid,
            first_date: summary.first_date,
            last_date: summary.last_date,
            last_sample: summary.last_sample,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chart_response_serializes_camel_case() {
        let chart = ChartData {
            id: "power".to_string(),
            title: "Power".to_string(),
            unit: Some("kW".to_string()),
            kind: ChartKind::MultiLine,
            y_min: None,
            y_max: Some(1.1),
            fraction_digits: Some(2),
            tick_stride: 4,
            series: vec![SeriesData::new(
                "total".to_string(),
                "Total".to_string(),
                None,
                vec![ChartPoint::new(
                    "10:00:00".to_string(),
                    2.0,
                    Some(3.0),
                    Some(1.0),
                    3,
                )],
            )],
            overlays: Vec::new(),
        };

        let value = serde_json::to_value(ChartResponse::from(chart)).unwrap();
        assert_eq!(value["kind"], "multiLine");
        assert_eq!(value["tickStride"], 4);
        assert_eq!(value["yMax"], 1.1);
        assert_eq!(value["series"][0]["points"][0]["label"], "10:00:00");
        assert_eq!(value["series"][0]["points"][0]["max"], 3.0);
        assert_eq!(value["series"][0]["points"][0]["count"], 3);
    }
}
