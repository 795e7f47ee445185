//! Error taxonomy shared by every pipeline component.

use std::time::Duration;

use thiserror::Error;

use crate::forecast::ForecastAborted;

/// Errors raised by the trace generator, scaler, window builder and
/// rolling forecast engine.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A horizon, range or profile parameter is out of bounds. Caller error.
    #[error("invalid config '{name}': {reason}")]
    InvalidConfig { name: String, reason: String },

    /// The corpus is shorter than the requested windows.
    #[error("insufficient data: need at least {required} values, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    /// The predictor returned an output of the wrong shape or with
    /// non-finite values.
    #[error("predictor contract violation: {reason}")]
    PredictorContractViolation { reason: String },

    /// The predictor did not answer within its latency budget.
    #[error("predictor timed out after {timeout:?}")]
    PredictorTimeout { timeout: Duration },

    /// The predictor reported a failure of its own.
    #[error("predictor failed: {0}")]
    PredictorFailure(String),

    /// A corpus row could not be accepted as a `PowerSample`.
    #[error("invalid data at row {row}: {reason}")]
    InvalidData { row: usize, reason: String },

    /// A rolling forecast stopped early; carries the values produced so far.
    #[error(transparent)]
    ForecastAborted(Box<ForecastAborted>),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl From<ForecastAborted> for PipelineError {
    fn from(aborted: ForecastAborted) -> Self {
        Self::ForecastAborted(Box::new(aborted))
    }
}

impl PipelineError {
    /// Shorthand for [`PipelineError::InvalidConfig`].
    pub fn invalid_config(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Returns `true` for failures where retrying the same predictor call
    /// may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::PredictorTimeout { .. } | Self::PredictorFailure(_)
        )
    }
}
