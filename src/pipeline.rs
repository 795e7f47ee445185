//! End-to-end runner: trace → scale → windows → backtest → rolling forecast.

use std::fmt;

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::forecast::RollingForecast;
use crate::metrics::{BacktestReport, backtest};
use crate::predictor::{Predictor, TimeoutPredictor};
use crate::scaler::{ScaleParams, ScaledSeries};
use crate::sim::generator::ApplianceTraceGenerator;
use crate::sim::types::{PowerSample, power_values};
use crate::window::{build_windows, train_test_split};

/// A forecast mapped back to watts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastOutput {
    /// Forecast readings in watts, one per step ahead.
    pub values_w: Vec<f64>,
    /// Timestamp of each value, continuing the input's sample step.
    pub timestamps: Vec<DateTime<Utc>>,
    /// Scaling used for the history and inverted for the output.
    pub params: ScaleParams,
}

impl ForecastOutput {
    pub fn len(&self) -> usize {
        self.values_w.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values_w.is_empty()
    }

    /// The forecast as power samples.
    pub fn samples(&self) -> Vec<PowerSample> {
        self.timestamps
            .iter()
            .zip(&self.values_w)
            .map(|(ts, w)| PowerSample::new(*ts, *w))
            .collect()
    }
}

/// Summary of one pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    /// Number of samples in the input trace.
    pub trace_len: usize,
    /// Window pairs used for training.
    pub train_windows: usize,
    /// Held-out window pairs scored by the backtest.
    pub test_windows: usize,
    /// Scaled-space accuracy over the held-out windows.
    pub backtest: BacktestReport,
    /// Rolling forecast from the end of the trace.
    pub forecast: ForecastOutput,
}

impl fmt::Display for PipelineReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Pipeline Report ===")?;
        writeln!(f, "Trace samples:    {}", self.trace_len)?;
        writeln!(
            f,
            "Scale range:      [{:.2}, {:.2}] W",
            self.forecast.params.min, self.forecast.params.max
        )?;
        writeln!(
            f,
            "Windows:          {} train / {} test",
            self.train_windows, self.test_windows
        )?;
        writeln!(f)?;
        writeln!(f, "{}", self.backtest)?;
        writeln!(f)?;
        writeln!(f, "--- Rolling Forecast ({} steps) ---", self.forecast.len())?;
        for (i, s) in self.forecast.samples().iter().enumerate() {
            writeln!(f, "{:>4} | {s}", i + 1)?;
        }
        Ok(())
    }
}

/// Generates the synthetic trace described by the `[trace]` and
/// `[appliances]` sections.
pub fn generate_trace(config: &PipelineConfig) -> Result<Vec<PowerSample>, PipelineError> {
    ApplianceTraceGenerator::new(config.trace_config(), config.appliances.clone()).generate()
}

/// Runs the pipeline with the baseline predictor named in the config,
/// wrapped in a timeout when `forecast.timeout_ms` is set.
///
/// # Errors
///
/// The first config validation error as `InvalidConfig`, plus anything
/// [`run_with_predictor`] returns.
pub fn run(
    config: &PipelineConfig,
    trace: &[PowerSample],
) -> Result<PipelineReport, PipelineError> {
    if let Some(e) = config.validate().into_iter().next() {
        return Err(PipelineError::invalid_config(e.field, e.message));
    }

    let base = config.predictor_kind().build(config.window.output_len);
    match config.predictor_timeout() {
        Some(timeout) => run_with_predictor(config, trace, &TimeoutPredictor::new(base, timeout)),
        None => run_with_predictor(config, trace, &base),
    }
}

/// Runs the pipeline on `trace` with a caller-supplied predictor.
///
/// The scaler is fitted over the whole trace. Window pairs are split
/// chronologically and the predictor is scored on the held-out tail; the
/// rolling forecast then starts from the last `input_len` scaled values.
///
/// # Errors
///
/// `InsufficientData` when the trace is shorter than `L + H + 1`; predictor
/// failures after `forecast.max_retries` retries; contract violations.
pub fn run_with_predictor<P: Predictor + ?Sized>(
    config: &PipelineConfig,
    trace: &[PowerSample],
    predictor: &P,
) -> Result<PipelineReport, PipelineError> {
    let w = &config.window;
    let f = &config.forecast;

    let scaled = ScaledSeries::fit_transform(&power_values(trace))?;
    let pairs = build_windows(&scaled.values, w.input_len, w.output_len)?;
    let (train, test) = train_test_split(&pairs, w.train_fraction)?;
    info!(
        samples = trace.len(),
        min_w = scaled.params.min,
        max_w = scaled.params.max,
        train = train.len(),
        test = test.len(),
        "prepared window dataset"
    );

    let report = backtest(predictor, test)?;
    info!(
        predictor = predictor.name(),
        mse = report.overall.mse,
        "backtest on held-out windows"
    );

    let session = RollingForecast::new(&scaled.values, w.input_len, w.output_len, f.steps_ahead)?;
    let scaled_forecast = session
        .run_with_retries(predictor, f.max_retries)
        .inspect_err(|aborted| {
            warn!(
                produced = aborted.partial.len(),
                steps_ahead = aborted.steps_ahead,
                error = %aborted.source,
                "rolling forecast aborted"
            );
        })?;

    let forecast = ForecastOutput {
        values_w: scaled.params.inverse(&scaled_forecast),
        timestamps: continue_timestamps(trace, f.steps_ahead)?,
        params: scaled.params,
    };
    info!(
        steps_ahead = forecast.len(),
        predictor = predictor.name(),
        "rolling forecast complete"
    );

    Ok(PipelineReport {
        trace_len: trace.len(),
        train_windows: train.len(),
        test_windows: test.len(),
        backtest: report,
        forecast,
    })
}

/// Extends the trace's last timestamp by its final sample step.
///
/// # Errors
///
/// `InvalidData` naming the last row when a forecast timestamp would fall
/// outside the representable range.
fn continue_timestamps(
    trace: &[PowerSample],
    steps: usize,
) -> Result<Vec<DateTime<Utc>>, PipelineError> {
    let (mut ts, step) = match trace {
        [.., prev, last] => (last.timestamp, last.timestamp - prev.timestamp),
        [only] => (only.timestamp, TimeDelta::seconds(1)),
        [] => return Ok(Vec::new()),
    };

    let mut out = Vec::with_capacity(steps);
    for k in 1..=steps {
        ts = ts
            .checked_add_signed(step)
            .ok_or_else(|| PipelineError::InvalidData {
                row: trace.len(),
                reason: format!("forecast step {k} after {ts} is out of range"),
            })?;
        out.push(ts);
    }
    Ok(out)
}
