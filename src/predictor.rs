//! The predictor capability and a few statistical baselines.
//!
//! The pipeline only ever sees a predictor through [`Predictor`]: one input
//! window of `L` scaled values in, `H` scaled values out. Trained models live
//! outside this crate and plug in by implementing the trait; the baselines
//! here make the pipeline runnable without one.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use thiserror::Error;
use tracing::warn;

use crate::error::PipelineError;

/// Runtime failures a predictor may report.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PredictorError {
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("{0}")]
    Failure(String),
}

impl From<PredictorError> for PipelineError {
    fn from(err: PredictorError) -> Self {
        match err {
            PredictorError::Timeout(timeout) => PipelineError::PredictorTimeout { timeout },
            PredictorError::Failure(msg) => PipelineError::PredictorFailure(msg),
        }
    }
}

/// Maps one input window to one output window, both in scaled space.
///
/// Implementations must behave as pure functions from the pipeline's point
/// of view. Calls may be expensive. To share one predictor between
/// concurrent forecasts it must also be `Sync`; the forecast engine does not
/// check this beyond the type system.
pub trait Predictor {
    /// Predicts the next `H` values following `window`.
    ///
    /// `window` holds exactly `input_len` values, oldest first.
    fn predict(&self, window: &[f64], input_len: usize) -> Result<Vec<f64>, PredictorError>;

    /// Short identifier used in logs and reports.
    fn name(&self) -> &str {
        "predictor"
    }
}

impl<P: Predictor + ?Sized> Predictor for &P {
    fn predict(&self, window: &[f64], input_len: usize) -> Result<Vec<f64>, PredictorError> {
        (**self).predict(window, input_len)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

impl<P: Predictor + ?Sized> Predictor for Box<P> {
    fn predict(&self, window: &[f64], input_len: usize) -> Result<Vec<f64>, PredictorError> {
        (**self).predict(window, input_len)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

impl<P: Predictor + ?Sized> Predictor for Arc<P> {
    fn predict(&self, window: &[f64], input_len: usize) -> Result<Vec<f64>, PredictorError> {
        (**self).predict(window, input_len)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

fn last_value(window: &[f64]) -> Result<f64, PredictorError> {
    window
        .last()
        .copied()
        .ok_or_else(|| PredictorError::Failure("empty input window".to_string()))
}

/// Repeats the most recent value `H` times.
#[derive(Debug, Clone, Copy)]
pub struct PersistencePredictor {
    pub output_len: usize,
}

impl PersistencePredictor {
    pub fn new(output_len: usize) -> Self {
        Self { output_len }
    }
}

impl Predictor for PersistencePredictor {
    fn predict(&self, window: &[f64], _input_len: usize) -> Result<Vec<f64>, PredictorError> {
        Ok(vec![last_value(window)?; self.output_len])
    }

    fn name(&self) -> &str {
        "persistence"
    }
}

/// Extends the straight line through the first and last window values.
#[derive(Debug, Clone, Copy)]
pub struct DriftPredictor {
    pub output_len: usize,
}

impl DriftPredictor {
    pub fn new(output_len: usize) -> Self {
        Self { output_len }
    }
}

impl Predictor for DriftPredictor {
    fn predict(&self, window: &[f64], _input_len: usize) -> Result<Vec<f64>, PredictorError> {
        let last = last_value(window)?;
        let slope = if window.len() > 1 {
            (last - window[0]) / (window.len() - 1) as f64
        } else {
            0.0
        };
        Ok((1..=self.output_len)
            .map(|k| last + slope * k as f64)
            .collect())
    }

    fn name(&self) -> &str {
        "drift"
    }
}

/// Replays the tail of the window: the last `H` values when the window is
/// long enough, otherwise the whole window repeated and truncated to `H`.
#[derive(Debug, Clone, Copy)]
pub struct RepeatPredictor {
    pub output_len: usize,
}

impl RepeatPredictor {
    pub fn new(output_len: usize) -> Self {
        Self { output_len }
    }
}

impl Predictor for RepeatPredictor {
    fn predict(&self, window: &[f64], _input_len: usize) -> Result<Vec<f64>, PredictorError> {
        if window.is_empty() {
            return Err(PredictorError::Failure("empty input window".to_string()));
        }
        if window.len() >= self.output_len {
            return Ok(window[window.len() - self.output_len..].to_vec());
        }
        Ok(window.iter().copied().cycle().take(self.output_len).collect())
    }

    fn name(&self) -> &str {
        "repeat"
    }
}

/// Bounds the latency of an inner predictor.
///
/// Each call runs on a fresh worker thread. If no answer arrives within
/// `timeout` the call fails with [`PredictorError::Timeout`]; the worker is
/// detached and its late result discarded.
#[derive(Debug)]
pub struct TimeoutPredictor<P> {
    inner: Arc<P>,
    timeout: Duration,
}

impl<P> TimeoutPredictor<P> {
    pub fn new(inner: P, timeout: Duration) -> Self {
        Self {
            inner: Arc::new(inner),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl<P: Predictor + Send + Sync + 'static> Predictor for TimeoutPredictor<P> {
    fn predict(&self, window: &[f64], input_len: usize) -> Result<Vec<f64>, PredictorError> {
        let (tx, rx) = mpsc::channel();
        let inner = Arc::clone(&self.inner);
        let window = window.to_vec();

        thread::Builder::new()
            .name("predictor".to_string())
            .spawn(move || {
                // The receiver is gone when the caller already timed out.
                let _ = tx.send(inner.predict(&window, input_len));
            })
            .map_err(|e| PredictorError::Failure(format!("cannot spawn predictor worker: {e}")))?;

        match rx.recv_timeout(self.timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => {
                warn!(
                    predictor = self.inner.name(),
                    timeout_ms = self.timeout.as_millis() as u64,
                    "predictor call timed out"
                );
                Err(PredictorError::Timeout(self.timeout))
            }
            Err(RecvTimeoutError::Disconnected) => Err(PredictorError::Failure(
                "predictor worker exited without a result".to_string(),
            )),
        }
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

/// Built-in baseline selector used by config and CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredictorKind {
    Persistence,
    Drift,
    Repeat,
}

impl PredictorKind {
    /// Accepted names.
    pub const NAMES: &[&str] = &["persistence", "drift", "repeat"];

    /// Builds the baseline for the given output horizon.
    pub fn build(self, output_len: usize) -> Box<dyn Predictor + Send + Sync> {
        match self {
            Self::Persistence => Box::new(PersistencePredictor::new(output_len)),
            Self::Drift => Box::new(DriftPredictor::new(output_len)),
            Self::Repeat => Box::new(RepeatPredictor::new(output_len)),
        }
    }
}

impl FromStr for PredictorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "persistence" => Ok(Self::Persistence),
            "drift" => Ok(Self::Drift),
            "repeat" => Ok(Self::Repeat),
            other => Err(format!(
                "unknown predictor \"{other}\", available: {}",
                Self::NAMES.join(", ")
            )),
        }
    }
}

impl fmt::Display for PredictorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Persistence => "persistence",
            Self::Drift => "drift",
            Self::Repeat => "repeat",
        };
        f.write_str(name)
    }
}
