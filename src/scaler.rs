//! Min-max normalization between physical units and scaled space.

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// The `(min, max)` pair produced by fitting a corpus.
///
/// Every transform and inverse takes this value explicitly. Fit once per
/// corpus and reuse the same pair for all data describing that series;
/// mixing pairs silently corrupts forecasts.
///
/// A constant corpus (`min == max`) transforms to all zeros and inverts
/// back to `min`.
///
/// # Examples
///
/// ```
/// use power_forecast::scaler::ScaleParams;
///
/// let params = ScaleParams::fit(&[0.0, 500.0, 1000.0]).unwrap();
/// assert_eq!(params.transform(&[250.0]), vec![0.25]);
/// assert_eq!(params.inverse(&[0.25]), vec![250.0]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaleParams {
    pub min: f64,
    pub max: f64,
}

impl ScaleParams {
    /// Fits the pair over the full corpus.
    ///
    /// # Errors
    ///
    /// `InsufficientData` for an empty slice; `InvalidConfig` if any value
    /// is NaN or infinite.
    pub fn fit(samples: &[f64]) -> Result<Self, PipelineError> {
        if samples.is_empty() {
            return Err(PipelineError::InsufficientData {
                required: 1,
                actual: 0,
            });
        }
        if let Some(idx) = samples.iter().position(|v| !v.is_finite()) {
            return Err(PipelineError::invalid_config(
                "samples",
                format!("non-finite value at index {idx}"),
            ));
        }

        let (min, max) = samples
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });
        Ok(Self { min, max })
    }

    /// `max - min`.
    pub fn range(&self) -> f64 {
        self.max - self.min
    }

    /// Scales one value. Values outside `[min, max]` map outside `[0, 1]`.
    pub fn transform_value(&self, x: f64) -> f64 {
        let range = self.range();
        if range == 0.0 {
            return 0.0;
        }
        (x - self.min) / range
    }

    /// Maps one scaled value back to physical units.
    pub fn inverse_value(&self, s: f64) -> f64 {
        s * self.range() + self.min
    }

    pub fn transform(&self, samples: &[f64]) -> Vec<f64> {
        samples.iter().map(|&x| self.transform_value(x)).collect()
    }

    pub fn inverse(&self, scaled: &[f64]) -> Vec<f64> {
        scaled.iter().map(|&s| self.inverse_value(s)).collect()
    }
}

/// A scaled series bundled with the parameters that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaledSeries {
    pub values: Vec<f64>,
    pub params: ScaleParams,
}

impl ScaledSeries {
    /// Fits on `samples` and transforms them in one pass.
    pub fn fit_transform(samples: &[f64]) -> Result<Self, PipelineError> {
        let params = ScaleParams::fit(samples)?;
        Ok(Self {
            values: params.transform(samples),
            params,
        })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Physical-unit values of the whole series.
    pub fn inverse(&self) -> Vec<f64> {
        self.params.inverse(&self.values)
    }
}
