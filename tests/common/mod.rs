//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use chrono::{DateTime, Utc};
use power_forecast::config::PipelineConfig;
use power_forecast::predictor::{Predictor, PredictorError};

/// Fixed start instant so traces compare equal across runs.
pub fn epoch() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH
}

/// Heater preset (Off/Heater, 5-tick cadence, no noise) with a fixed start.
pub fn heater_config() -> PipelineConfig {
    let mut config = PipelineConfig::heater();
    config.trace.start = Some(epoch());
    config
}

/// Household preset shortened to `duration` ticks, seeded, fixed start.
pub fn household_config(duration: usize, seed: u64) -> PipelineConfig {
    let mut config = PipelineConfig::household();
    config.trace.duration = duration;
    config.trace.seed = Some(seed);
    config.trace.start = Some(epoch());
    config
}

/// Answers `H` copies of the last input value plus a constant bias.
pub struct BiasedPredictor {
    pub output_len: usize,
    pub bias: f64,
}

impl Predictor for BiasedPredictor {
    fn predict(&self, window: &[f64], _input_len: usize) -> Result<Vec<f64>, PredictorError> {
        let last = window.last().copied().unwrap_or_default();
        Ok(vec![last + self.bias; self.output_len])
    }

    fn name(&self) -> &str {
        "biased"
    }
}

/// Sleeps for `delay` on its first call only, then answers persistence.
pub struct SlowFirstCall {
    pub output_len: usize,
    pub delay: Duration,
    pub calls: AtomicUsize,
}

impl SlowFirstCall {
    pub fn new(output_len: usize, delay: Duration) -> Self {
        Self {
            output_len,
            delay,
            calls: AtomicUsize::new(0),
        }
    }
}

impl Predictor for SlowFirstCall {
    fn predict(&self, window: &[f64], _input_len: usize) -> Result<Vec<f64>, PredictorError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            thread::sleep(self.delay);
        }
        let last = window.last().copied().unwrap_or_default();
        Ok(vec![last; self.output_len])
    }
}
