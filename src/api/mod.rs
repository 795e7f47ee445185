//! Read-only REST API over a completed pipeline run.
//!
//! Provides three GET endpoints:
//! - `/state`: config, scaling, backtest metrics and the latest sample
//! - `/trace`: the input trace with optional index-range filtering
//! - `/forecast`: the rolling forecast in watts

mod handlers;
mod types;

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tracing::info;

use crate::config::PipelineConfig;
use crate::pipeline::PipelineReport;
use crate::sim::types::PowerSample;

pub use types::{ErrorResponse, ForecastRecord, StateResponse, TraceQuery, TraceRecord};

/// Immutable application state shared across all request handlers.
///
/// Built once after the pipeline run and wrapped in `Arc`; handlers only
/// read it, so no locks are needed.
pub struct AppState {
    /// Configuration used for the run.
    pub config: PipelineConfig,
    /// Input trace, generated or loaded.
    pub trace: Vec<PowerSample>,
    /// Backtest and forecast results.
    pub report: PipelineReport,
}

/// Builds the axum router with all API routes.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/state", get(handlers::get_state))
        .route("/trace", get(handlers::get_trace))
        .route("/forecast", get(handlers::get_forecast))
        .with_state(state)
}

/// Binds to `addr` and serves the API until the process exits.
///
/// # Errors
///
/// Returns an `io::Error` if the listener cannot bind or the server fails.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "API server listening");
    axum::serve(listener, router(state)).await
}
