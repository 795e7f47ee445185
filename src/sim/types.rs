//! Core trace types: power samples and generator configuration.

use std::fmt;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::devices::SwitchRule;

/// One metered reading.
///
/// Serialized with the column names of the corpus table
/// (`timestamp`, `power_W`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerSample {
    /// Instant of the reading.
    pub timestamp: DateTime<Utc>,
    /// Metered power in watts (non-negative).
    #[serde(rename = "power_W")]
    pub power_w: f64,
}

impl PowerSample {
    pub fn new(timestamp: DateTime<Utc>, power_w: f64) -> Self {
        Self { timestamp, power_w }
    }
}

impl fmt::Display for PowerSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | {:>8.2} W",
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.power_w
        )
    }
}

/// Extracts the power column of a trace.
pub fn power_values(samples: &[PowerSample]) -> Vec<f64> {
    samples.iter().map(|s| s.power_w).collect()
}

/// Parameters of one synthetic trace.
///
/// # Examples
///
/// ```
/// use power_forecast::sim::types::TraceConfig;
///
/// let cfg = TraceConfig::new(3600, (10, 120), 0.15).with_seed(42);
/// assert_eq!(cfg.duration, 3600);
/// assert_eq!(cfg.step.num_seconds(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct TraceConfig {
    /// Number of ticks (samples) to emit.
    pub duration: usize,
    /// Inclusive `(min, max)` switch interval in ticks.
    pub switch_interval_range: (usize, usize),
    /// Noise standard deviation as a fraction of the active rating.
    pub noise_fraction: f64,
    /// Seed for reproducible traces; `None` draws from the OS.
    pub seed: Option<u64>,
    /// Switch test applied each tick.
    pub switch_rule: SwitchRule,
    /// Timestamp of the first sample.
    pub start: DateTime<Utc>,
    /// Fixed spacing between samples.
    pub step: TimeDelta,
}

impl TraceConfig {
    /// Creates a config starting now, one sample per second, unseeded,
    /// with the modulo switch rule.
    pub fn new(
        duration: usize,
        switch_interval_range: (usize, usize),
        noise_fraction: f64,
    ) -> Self {
        Self {
            duration,
            switch_interval_range,
            noise_fraction,
            seed: None,
            switch_rule: SwitchRule::default(),
            start: Utc::now(),
            step: TimeDelta::seconds(1),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_rule(mut self, rule: SwitchRule) -> Self {
        self.switch_rule = rule;
        self
    }

    pub fn with_start(mut self, start: DateTime<Utc>) -> Self {
        self.start = start;
        self
    }

    pub fn with_step(mut self, step: TimeDelta) -> Self {
        self.step = step;
        self
    }
}
