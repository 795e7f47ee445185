//! Forecast accuracy metrics and window backtests.

use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::error::PipelineError;
use crate::predictor::Predictor;
use crate::window::WindowPair;

/// Aggregate accuracy of a set of predictions.
///
/// Computed post-hoc from paired actual/predicted values, in whatever units
/// the inputs use.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ForecastMetrics {
    /// Mean squared error.
    pub mse: f64,
    /// Root-mean-square error.
    pub rmse: f64,
    /// Mean absolute error.
    pub mae: f64,
    /// Largest absolute error.
    pub max_abs_error: f64,
    /// Number of compared values.
    pub count: usize,
}

impl ForecastMetrics {
    /// Compares `predicted` against `actual` element-wise.
    ///
    /// Only the overlapping prefix is compared. Empty input yields all-zero
    /// metrics with `count == 0`.
    pub fn from_pairs(actual: &[f64], predicted: &[f64]) -> Self {
        let mut acc = Accumulator::default();
        for (a, p) in actual.iter().zip(predicted) {
            acc.push(p - a);
        }
        acc.finish()
    }
}

impl fmt::Display for ForecastMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Forecast Accuracy ---")?;
        writeln!(f, "Values compared:  {}", self.count)?;
        writeln!(f, "MSE:              {:.6}", self.mse)?;
        writeln!(f, "RMSE:             {:.6}", self.rmse)?;
        writeln!(f, "MAE:              {:.6}", self.mae)?;
        write!(f, "Max abs error:    {:.6}", self.max_abs_error)
    }
}

#[derive(Debug, Default)]
struct Accumulator {
    sq_sum: f64,
    abs_sum: f64,
    max_abs: f64,
    count: usize,
}

impl Accumulator {
    fn push(&mut self, err: f64) {
        self.sq_sum += err * err;
        self.abs_sum += err.abs();
        self.max_abs = self.max_abs.max(err.abs());
        self.count += 1;
    }

    fn finish(&self) -> ForecastMetrics {
        if self.count == 0 {
            return ForecastMetrics {
                mse: 0.0,
                rmse: 0.0,
                mae: 0.0,
                max_abs_error: 0.0,
                count: 0,
            };
        }
        let n = self.count as f64;
        let mse = self.sq_sum / n;
        ForecastMetrics {
            mse,
            rmse: mse.sqrt(),
            mae: self.abs_sum / n,
            max_abs_error: self.max_abs,
            count: self.count,
        }
    }
}

/// Absolute error at each lead time (1-based lead = index + 1).
pub fn lead_time_errors(actual: &[f64], predicted: &[f64]) -> Vec<f64> {
    actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (p - a).abs())
        .collect()
}

/// Result of evaluating a predictor on held-out windows.
#[derive(Debug, Clone, Serialize)]
pub struct BacktestReport {
    /// Name of the evaluated predictor.
    pub predictor: String,
    /// Number of windows evaluated.
    pub windows: usize,
    /// Metrics over every predicted value of every window.
    pub overall: ForecastMetrics,
    /// Mean absolute error per lead time within one predictor call.
    pub lead_mae: Vec<f64>,
}

impl fmt::Display for BacktestReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Backtest of {} over {} windows",
            self.predictor, self.windows
        )?;
        writeln!(f, "{}", self.overall)?;
        let leads: Vec<String> = self.lead_mae.iter().map(|e| format!("{e:.4}")).collect();
        write!(f, "MAE by lead:      [{}]", leads.join(", "))
    }
}

/// Runs the predictor once per window pair and scores it against the
/// pair's target, all in scaled space.
///
/// # Errors
///
/// `InsufficientData` if `pairs` is empty; predictor failures and
/// `PredictorContractViolation` when an answer's length differs from the
/// target's.
pub fn backtest<P: Predictor + ?Sized>(
    predictor: &P,
    pairs: &[WindowPair<'_>],
) -> Result<BacktestReport, PipelineError> {
    let Some(first) = pairs.first() else {
        return Err(PipelineError::InsufficientData {
            required: 1,
            actual: 0,
        });
    };
    let output_len = first.target.len();

    let mut overall = Accumulator::default();
    let mut lead_sums = vec![0.0; output_len];

    for pair in pairs {
        let predicted = predictor.predict(pair.input, pair.input.len())?;
        if predicted.len() != pair.target.len() {
            return Err(PipelineError::PredictorContractViolation {
                reason: format!(
                    "{} returned {} values for window at offset {}, expected {}",
                    predictor.name(),
                    predicted.len(),
                    pair.offset,
                    pair.target.len()
                ),
            });
        }
        if let Some(idx) = predicted.iter().position(|v| !v.is_finite()) {
            return Err(PipelineError::PredictorContractViolation {
                reason: format!(
                    "{} returned a non-finite value at {idx} for window at offset {}",
                    predictor.name(),
                    pair.offset
                ),
            });
        }
        for (lead, (a, p)) in pair.target.iter().zip(&predicted).enumerate() {
            overall.push(p - a);
            lead_sums[lead] += (p - a).abs();
        }
    }

    let n = pairs.len() as f64;
    let report = BacktestReport {
        predictor: predictor.name().to_string(),
        windows: pairs.len(),
        overall: overall.finish(),
        lead_mae: lead_sums.into_iter().map(|s| s / n).collect(),
    };
    debug!(
        predictor = %report.predictor,
        windows = report.windows,
        mse = report.overall.mse,
        "backtest complete"
    );
    Ok(report)
}
