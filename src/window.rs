//! Supervised window pairs for training and backtesting.

use crate::error::PipelineError;

/// One `(input, target)` pair borrowed from a scaled series.
///
/// `target` starts at the element right after the last element of `input`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowPair<'a> {
    /// Index of `input[0]` in the source series.
    pub offset: usize,
    /// `L` consecutive values.
    pub input: &'a [f64],
    /// The `H` values that follow `input`.
    pub target: &'a [f64],
}

/// Slices a scaled series into window pairs.
///
/// Produces `len - L - H` pairs in ascending offset order; pair `i` has
/// `input = scaled[i..i+L]` and `target = scaled[i+L..i+L+H]`. The final
/// possible pair (ending exactly at the last element) is not emitted.
///
/// # Errors
///
/// `InvalidConfig` if either horizon is 0; `InsufficientData` if the series
/// is shorter than `L + H + 1`, so a successful build always yields at least
/// one pair.
///
/// # Examples
///
/// ```
/// use power_forecast::window::build_windows;
///
/// let series = [0.0, 0.1, 0.2, 0.3, 0.4, 0.5];
/// let pairs = build_windows(&series, 3, 2).unwrap();
/// assert_eq!(pairs.len(), 1);
/// assert_eq!(pairs[0].input, &[0.0, 0.1, 0.2]);
/// assert_eq!(pairs[0].target, &[0.3, 0.4]);
/// ```
pub fn build_windows(
    scaled: &[f64],
    input_len: usize,
    output_len: usize,
) -> Result<Vec<WindowPair<'_>>, PipelineError> {
    if input_len == 0 {
        return Err(PipelineError::invalid_config("input_len", "must be > 0"));
    }
    if output_len == 0 {
        return Err(PipelineError::invalid_config("output_len", "must be > 0"));
    }
    let span = input_len + output_len;
    if scaled.len() < span + 1 {
        return Err(PipelineError::InsufficientData {
            required: span + 1,
            actual: scaled.len(),
        });
    }

    let pairs = (0..scaled.len() - span)
        .map(|i| WindowPair {
            offset: i,
            input: &scaled[i..i + input_len],
            target: &scaled[i + input_len..i + span],
        })
        .collect();
    Ok(pairs)
}

/// Splits pairs chronologically: the first `floor(len × train_fraction)`
/// go to training, the rest to testing.
///
/// # Errors
///
/// `InvalidConfig` unless `0 < train_fraction < 1`.
pub fn train_test_split<'p, 'a>(
    pairs: &'p [WindowPair<'a>],
    train_fraction: f64,
) -> Result<(&'p [WindowPair<'a>], &'p [WindowPair<'a>]), PipelineError> {
    if !(train_fraction > 0.0 && train_fraction < 1.0) {
        return Err(PipelineError::invalid_config(
            "train_fraction",
            format!("must be in (0, 1), got {train_fraction}"),
        ));
    }
    let split = (pairs.len() as f64 * train_fraction).floor() as usize;
    Ok(pairs.split_at(split))
}
