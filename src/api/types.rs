//! API response and query types.
//!
//! Power fields use the `power_W` column name of the CSV tables.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::PipelineConfig;
use crate::metrics::BacktestReport;
use crate::scaler::ScaleParams;
use crate::sim::types::PowerSample;

/// Combined state response.
#[derive(Debug, Serialize)]
pub struct StateResponse {
    /// Configuration used for the run.
    pub config: PipelineConfig,
    /// Number of samples in the input trace.
    pub trace_len: usize,
    /// Min/max used for scaling.
    pub scale: ScaleParams,
    /// Held-out accuracy of the predictor in scaled space.
    pub backtest: BacktestReport,
    /// Last sample of the trace, if any.
    pub latest_sample: Option<TraceRecord>,
}

/// One trace sample with its position in the trace.
#[derive(Debug, Serialize)]
pub struct TraceRecord {
    pub index: usize,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "power_W")]
    pub power_w: f64,
}

impl TraceRecord {
    pub fn new(index: usize, sample: &PowerSample) -> Self {
        Self {
            index,
            timestamp: sample.timestamp,
            power_w: sample.power_w,
        }
    }
}

/// One forecast value; `step` counts from 1.
#[derive(Debug, Serialize)]
pub struct ForecastRecord {
    pub step: usize,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "power_W")]
    pub power_w: f64,
}

/// Optional index range for the trace endpoint.
#[derive(Debug, Deserialize)]
pub struct TraceQuery {
    /// First sample index (inclusive).
    pub from: Option<usize>,
    /// Last sample index (inclusive).
    pub to: Option<usize>,
}

/// Error response body for 400-class errors.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
}
