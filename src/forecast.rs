//! Autoregressive rolling forecasts beyond a predictor's native horizon.
//!
//! A predictor answers `H` values for a window of `L`. To forecast further
//! ahead, each answer is appended to the output and also pushed into the
//! input window, so later calls see partly model-generated inputs. Errors
//! therefore compound with lead time.

use std::collections::VecDeque;

use thiserror::Error;
use tracing::{debug, warn};

use crate::error::PipelineError;
use crate::predictor::Predictor;

/// A rolling forecast stopped before producing every requested value.
///
/// `partial` holds the values accumulated before the failing step (at most
/// `steps_ahead`), for diagnostics.
#[derive(Debug, Error)]
#[error("rolling forecast aborted after {} of {steps_ahead} values: {source}", .partial.len())]
pub struct ForecastAborted {
    pub source: PipelineError,
    pub partial: Vec<f64>,
    pub steps_ahead: usize,
}

/// State of one rolling forecast.
///
/// Owns its sliding buffer, so independent sessions never share state and
/// can run in parallel against one `Sync` predictor. A failed
/// [`step`](Self::step) leaves the buffer and output untouched, which makes
/// retrying that single step safe.
///
/// # Examples
///
/// ```
/// use power_forecast::forecast::RollingForecast;
/// use power_forecast::predictor::PersistencePredictor;
///
/// let history = [0.2, 0.4, 0.6];
/// let mut session = RollingForecast::new(&history, 3, 2, 5).unwrap();
/// let predictor = PersistencePredictor::new(2);
/// while !session.is_complete() {
///     session.step(&predictor).unwrap();
/// }
/// assert_eq!(session.finish(), vec![0.6; 5]);
/// ```
#[derive(Debug, Clone)]
pub struct RollingForecast {
    buffer: VecDeque<f64>,
    output: Vec<f64>,
    input_len: usize,
    output_len: usize,
    steps_ahead: usize,
    calls: usize,
}

impl RollingForecast {
    /// Seeds the buffer with the last `input_len` values of `history`.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` if any of `input_len`, `output_len`, `steps_ahead`
    /// is 0, or `history` holds fewer than `input_len` values.
    pub fn new(
        history: &[f64],
        input_len: usize,
        output_len: usize,
        steps_ahead: usize,
    ) -> Result<Self, PipelineError> {
        if input_len == 0 {
            return Err(PipelineError::invalid_config("input_len", "must be > 0"));
        }
        if output_len == 0 {
            return Err(PipelineError::invalid_config("output_len", "must be > 0"));
        }
        if steps_ahead == 0 {
            return Err(PipelineError::invalid_config("steps_ahead", "must be > 0"));
        }
        if history.len() < input_len {
            return Err(PipelineError::invalid_config(
                "history",
                format!(
                    "need at least {input_len} values to seed the window, got {}",
                    history.len()
                ),
            ));
        }

        let buffer: VecDeque<f64> = history[history.len() - input_len..].iter().copied().collect();
        let calls = steps_ahead.div_ceil(output_len);
        Ok(Self {
            buffer,
            output: Vec::with_capacity(calls * output_len),
            input_len,
            output_len,
            steps_ahead,
            calls: 0,
        })
    }

    /// Current input window, oldest first.
    pub fn window(&self) -> Vec<f64> {
        self.buffer.iter().copied().collect()
    }

    /// Values produced so far, possibly more than `steps_ahead` after the
    /// last step.
    pub fn produced(&self) -> &[f64] {
        &self.output
    }

    /// Number of successful predictor calls.
    pub fn calls(&self) -> usize {
        self.calls
    }

    /// `ceil(steps_ahead / H)`.
    pub fn total_calls(&self) -> usize {
        self.steps_ahead.div_ceil(self.output_len)
    }

    pub fn is_complete(&self) -> bool {
        self.output.len() >= self.steps_ahead
    }

    /// Performs one predictor call and feeds its answer back.
    ///
    /// The answer must be exactly `H` finite values. When `H > L` only the
    /// newest `L` values stay in the window.
    ///
    /// # Errors
    ///
    /// `PredictorContractViolation` for a malformed answer,
    /// `PredictorTimeout`/`PredictorFailure` when the predictor fails,
    /// `InvalidConfig` if the session is already complete. On error the
    /// session is unchanged.
    pub fn step<P: Predictor + ?Sized>(&mut self, predictor: &P) -> Result<(), PipelineError> {
        if self.is_complete() {
            return Err(PipelineError::invalid_config(
                "steps_ahead",
                "forecast already complete",
            ));
        }

        let window = self.buffer.make_contiguous();
        let chunk = predictor.predict(window, self.input_len)?;

        if chunk.len() != self.output_len {
            return Err(PipelineError::PredictorContractViolation {
                reason: format!(
                    "{} returned {} values, expected {}",
                    predictor.name(),
                    chunk.len(),
                    self.output_len
                ),
            });
        }
        if let Some(idx) = chunk.iter().position(|v| !v.is_finite()) {
            return Err(PipelineError::PredictorContractViolation {
                reason: format!("{} returned a non-finite value at {idx}", predictor.name()),
            });
        }

        self.output.extend_from_slice(&chunk);
        self.buffer.extend(chunk);
        while self.buffer.len() > self.input_len {
            self.buffer.pop_front();
        }
        self.calls += 1;
        Ok(())
    }

    /// Truncates the output to `steps_ahead` values.
    pub fn finish(mut self) -> Vec<f64> {
        self.output.truncate(self.steps_ahead);
        self.output
    }

    fn abort(mut self, source: PipelineError) -> ForecastAborted {
        self.output.truncate(self.steps_ahead);
        ForecastAborted {
            source,
            partial: self.output,
            steps_ahead: self.steps_ahead,
        }
    }

    /// Steps until complete, aborting on the first error.
    pub fn run<P: Predictor + ?Sized>(self, predictor: &P) -> Result<Vec<f64>, ForecastAborted> {
        self.run_with_retries(predictor, 0)
    }

    /// Steps until complete, retrying a transiently failing step up to
    /// `max_retries` times before aborting.
    ///
    /// Contract violations abort immediately.
    pub fn run_with_retries<P: Predictor + ?Sized>(
        mut self,
        predictor: &P,
        max_retries: usize,
    ) -> Result<Vec<f64>, ForecastAborted> {
        while !self.is_complete() {
            let mut attempt = 0;
            loop {
                match self.step(predictor) {
                    Ok(()) => break,
                    Err(e) if e.is_transient() && attempt < max_retries => {
                        attempt += 1;
                        warn!(
                            predictor = predictor.name(),
                            call = self.calls + 1,
                            attempt,
                            error = %e,
                            "retrying predictor call"
                        );
                    }
                    Err(e) => return Err(self.abort(e)),
                }
            }
        }

        debug!(
            predictor = predictor.name(),
            calls = self.calls,
            steps_ahead = self.steps_ahead,
            "rolling forecast complete"
        );
        Ok(self.finish())
    }
}

/// Forecasts `steps_ahead` scaled values from the tail of `history`.
///
/// Results stay in scaled space; invert them with the same
/// [`ScaleParams`](crate::scaler::ScaleParams) that scaled `history`.
///
/// # Errors
///
/// Setup errors (see [`RollingForecast::new`]) come back with an empty
/// `partial`; failures mid-loop carry the values produced so far.
pub fn forecast<P: Predictor + ?Sized>(
    history: &[f64],
    predictor: &P,
    input_len: usize,
    output_len: usize,
    steps_ahead: usize,
) -> Result<Vec<f64>, ForecastAborted> {
    RollingForecast::new(history, input_len, output_len, steps_ahead)
        .map_err(|source| ForecastAborted {
            source,
            partial: Vec::new(),
            steps_ahead,
        })?
        .run(predictor)
}
