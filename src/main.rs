// Main entry point - Dependency injection and server setup
mod domain;
mod application;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc};

use axum::{routing::get, Router};
use tower_http::{compression::CompressionLayer, trace::TraceLayer};

use crate::application::dashboard_service::DashboardService;
use crate::infrastructure::config::{load_charts_config, load_ingest_config, measurement_spec};
use crate::infrastructure::csv_source::CsvRecordSource;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{get_chart, get_dashboard, health_check, list_dates};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Load configuration
    let ingest_config = load_ingest_config()?;
    let charts_config = load_charts_config()?;
    let spec = measurement_spec(&ingest_config.columns, &charts_config);

    // Create the record source (infrastructure layer)
    let source = Arc::new(CsvRecordSource::from_config(&ingest_config.source)?);

    // Create the service (application layer)
    let dashboard_service = DashboardService::new(
        source,
        spec,
        charts_config,
        ingest_config.pipeline.default_interval,
    );

    // Create application state
    let state = Arc::new(AppState { dashboard_service });

    // Build router (presentation layer)
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/dates", get(list_dates))
        .route("/dashboard", get(get_dashboard))
        .route("/charts/:id", get(get_chart))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr: SocketAddr = "0.0.0.0:8080".parse().unwrap();
    println!("Starting power-telemetry service on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
