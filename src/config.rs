//! TOML-based pipeline configuration and preset definitions.

use std::fs;
use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::devices::{ApplianceProfiles, SwitchRule};
use crate::predictor::PredictorKind;
use crate::sim::types::TraceConfig;

/// Top-level pipeline configuration parsed from TOML.
///
/// Every section has defaults matching the `household` preset. Load from
/// TOML with [`PipelineConfig::from_toml_file`] or use
/// [`PipelineConfig::household`] for the built-in default.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    /// Synthetic trace parameters.
    #[serde(default)]
    pub trace: TraceSection,
    /// Appliance name → rated watts.
    #[serde(default = "ApplianceProfiles::household")]
    pub appliances: ApplianceProfiles,
    /// Window horizons and train/test split.
    #[serde(default)]
    pub window: WindowSection,
    /// Rolling forecast parameters.
    #[serde(default)]
    pub forecast: ForecastSection,
}

/// Synthetic trace parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TraceSection {
    /// Number of samples to generate (must be > 0).
    pub duration: usize,
    /// Shortest switch interval in ticks (must be >= 1).
    pub switch_interval_min: usize,
    /// Longest switch interval in ticks.
    pub switch_interval_max: usize,
    /// Noise standard deviation as a fraction of the active rating.
    pub noise_fraction: f64,
    /// Random seed; omit for a fresh trace every run.
    pub seed: Option<u64>,
    /// Switch rule: `"modulo"` or `"countdown"`.
    pub switch_rule: String,
    /// Seconds between samples (must be > 0).
    pub step_secs: u32,
    /// Timestamp of the first sample; defaults to the current time.
    pub start: Option<DateTime<Utc>>,
}

impl Default for TraceSection {
    fn default() -> Self {
        Self {
            duration: 3600,
            switch_interval_min: 10,
            switch_interval_max: 120,
            noise_fraction: 0.15,
            seed: Some(42),
            switch_rule: "modulo".to_string(),
            step_secs: 1,
            start: None,
        }
    }
}

/// Window horizons and train/test split.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WindowSection {
    /// Input horizon `L` (must be > 0).
    pub input_len: usize,
    /// Output horizon `H` (must be > 0).
    pub output_len: usize,
    /// Fraction of window pairs used for training, in (0, 1).
    pub train_fraction: f64,
}

impl Default for WindowSection {
    fn default() -> Self {
        Self {
            input_len: 60,
            output_len: 10,
            train_fraction: 0.8,
        }
    }
}

/// Rolling forecast parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ForecastSection {
    /// Number of values to forecast (must be > 0).
    pub steps_ahead: usize,
    /// Baseline predictor: `"persistence"`, `"drift"` or `"repeat"`.
    pub predictor: String,
    /// Per-call predictor budget in milliseconds; omit for no limit.
    pub timeout_ms: Option<u64>,
    /// Retries for a transiently failing predictor call.
    pub max_retries: usize,
}

impl Default for ForecastSection {
    fn default() -> Self {
        Self {
            steps_ahead: 100,
            predictor: "persistence".to_string(),
            timeout_ms: None,
            max_retries: 0,
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Error)]
#[error("config error: {field} - {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"window.input_len"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl PipelineConfig {
    /// The reference household: one hour at 1 Hz, seven appliances.
    pub fn household() -> Self {
        Self {
            trace: TraceSection::default(),
            appliances: ApplianceProfiles::household(),
            window: WindowSection::default(),
            forecast: ForecastSection::default(),
        }
    }

    /// A noiseless heater switching on a fixed 5-tick cadence.
    pub fn heater() -> Self {
        Self {
            trace: TraceSection {
                duration: 600,
                switch_interval_min: 5,
                switch_interval_max: 5,
                noise_fraction: 0.0,
                ..TraceSection::default()
            },
            appliances: ApplianceProfiles::new()
                .with("Off", 0.0)
                .with("Heater", 1000.0),
            window: WindowSection {
                input_len: 20,
                output_len: 5,
                ..WindowSection::default()
            },
            forecast: ForecastSection {
                steps_ahead: 25,
                predictor: "repeat".to_string(),
                ..ForecastSection::default()
            },
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["household", "heater"];

    /// Loads a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "household" => Ok(Self::household()),
            "heater" => Ok(Self::heater()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a config from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("config", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a config from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if the configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        let t = &self.trace;
        if t.duration == 0 {
            errors.push(ConfigError::new("trace.duration", "must be > 0"));
        }
        if t.switch_interval_min == 0 {
            errors.push(ConfigError::new("trace.switch_interval_min", "must be >= 1"));
        }
        if t.switch_interval_min > t.switch_interval_max {
            errors.push(ConfigError::new(
                "trace.switch_interval_min",
                "must be <= trace.switch_interval_max",
            ));
        }
        if !t.noise_fraction.is_finite() || t.noise_fraction < 0.0 {
            errors.push(ConfigError::new("trace.noise_fraction", "must be finite and >= 0"));
        }
        if let Err(e) = t.switch_rule.parse::<SwitchRule>() {
            errors.push(ConfigError::new("trace.switch_rule", e));
        }
        if t.step_secs == 0 {
            errors.push(ConfigError::new("trace.step_secs", "must be > 0"));
        } else if t.duration > 0 {
            let start = t.start.unwrap_or_else(Utc::now);
            let end = i64::try_from(t.duration - 1)
                .ok()
                .and_then(|n| n.checked_mul(i64::from(t.step_secs)))
                .and_then(TimeDelta::try_seconds)
                .and_then(|span| start.checked_add_signed(span));
            if end.is_none() {
                errors.push(ConfigError::new(
                    "trace.step_secs",
                    "last sample timestamp is out of range for this duration",
                ));
            }
        }

        if let Err(e) = self.appliances.validate() {
            errors.push(ConfigError::new("appliances", e.to_string()));
        }

        let w = &self.window;
        if w.input_len == 0 {
            errors.push(ConfigError::new("window.input_len", "must be > 0"));
        }
        if w.output_len == 0 {
            errors.push(ConfigError::new("window.output_len", "must be > 0"));
        }
        if !(w.train_fraction > 0.0 && w.train_fraction < 1.0) {
            errors.push(ConfigError::new("window.train_fraction", "must be in (0, 1)"));
        }
        if t.duration > 0 && t.duration < w.input_len + w.output_len + 1 {
            errors.push(ConfigError::new(
                "trace.duration",
                "must be > window.input_len + window.output_len",
            ));
        }

        let f = &self.forecast;
        if f.steps_ahead == 0 {
            errors.push(ConfigError::new("forecast.steps_ahead", "must be > 0"));
        }
        if let Err(e) = f.predictor.parse::<PredictorKind>() {
            errors.push(ConfigError::new("forecast.predictor", e));
        }
        if f.timeout_ms == Some(0) {
            errors.push(ConfigError::new("forecast.timeout_ms", "must be > 0 when set"));
        }

        errors
    }

    /// Builds the generator parameters from the `[trace]` section.
    ///
    /// Unknown switch rules fall back to the default; call
    /// [`validate`](Self::validate) first to reject them.
    pub fn trace_config(&self) -> TraceConfig {
        let t = &self.trace;
        let mut cfg = TraceConfig::new(
            t.duration,
            (t.switch_interval_min, t.switch_interval_max),
            t.noise_fraction,
        )
        .with_rule(t.switch_rule.parse().unwrap_or_default())
        .with_step(TimeDelta::seconds(i64::from(t.step_secs)));
        cfg.seed = t.seed;
        if let Some(start) = t.start {
            cfg = cfg.with_start(start);
        }
        cfg
    }

    /// Selected baseline predictor, falling back to persistence.
    pub fn predictor_kind(&self) -> PredictorKind {
        self.forecast
            .predictor
            .parse()
            .unwrap_or(PredictorKind::Persistence)
    }

    /// Per-call predictor budget, if any.
    pub fn predictor_timeout(&self) -> Option<Duration> {
        self.forecast.timeout_ms.map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn household_preset_valid() {
        let cfg = PipelineConfig::household();
        let errors = cfg.validate();
        assert!(errors.is_empty(), "household should be valid: {errors:?}");
    }

    #[test]
    fn from_preset_unknown() {
        let err = PipelineConfig::from_preset("nonexistent");
        assert!(err.is_err());
        let e = err.unwrap_err();
        assert!(e.message.contains("unknown preset"));
    }

    #[test]
    fn all_presets_are_valid() {
        for name in PipelineConfig::PRESETS {
            let cfg = PipelineConfig::from_preset(name);
            assert!(cfg.is_ok(), "preset \"{name}\" should load");
            let errors = cfg.as_ref().map(|c| c.validate()).unwrap_or_default();
            assert!(
                errors.is_empty(),
                "preset \"{name}\" should be valid: {errors:?}"
            );
        }
    }

    #[test]
    fn valid_toml_parses() {
        let toml = r#"
[trace]
duration = 1800
switch_interval_min = 5
switch_interval_max = 30
noise_fraction = 0.1
seed = 7
switch_rule = "countdown"
step_secs = 2
start = "2024-03-01T12:00:00Z"

[appliances]
"LED Bulb" = 9.0
Kettle = 2200.0
Off = 0.0

[window]
input_len = 30
output_len = 5
train_fraction = 0.75

[forecast]
steps_ahead = 40
predictor = "drift"
timeout_ms = 250
max_retries = 2
"#;
        let cfg = PipelineConfig::from_toml_str(toml);
        assert!(cfg.is_ok(), "valid TOML should parse: {:?}", cfg.err());
        let cfg = cfg.ok();
        let cfg = cfg.as_ref();
        assert_eq!(cfg.map(|c| c.trace.duration), Some(1800));
        assert_eq!(cfg.and_then(|c| c.appliances.rated_w("Kettle")), Some(2200.0));
        assert_eq!(cfg.map(|c| c.predictor_kind()), Some(PredictorKind::Drift));
        assert_eq!(
            cfg.and_then(|c| c.predictor_timeout()),
            Some(Duration::from_millis(250))
        );
        assert!(cfg.map(|c| c.validate().is_empty()).unwrap_or(false));

        let trace = cfg.map(|c| c.trace_config());
        assert_eq!(
            trace.as_ref().map(|t| t.switch_rule),
            Some(SwitchRule::Countdown)
        );
        assert_eq!(trace.as_ref().map(|t| t.step.num_seconds()), Some(2));
        assert_eq!(trace.as_ref().and_then(|t| t.seed), Some(7));
    }

    #[test]
    fn invalid_toml_unknown_field() {
        let toml = r#"
[window]
input_len = 24
bogus_field = true
"#;
        assert!(PipelineConfig::from_toml_str(toml).is_err());
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let toml = r#"
[trace]
seed = 99
"#;
        let cfg = PipelineConfig::from_toml_str(toml).ok();
        assert_eq!(cfg.as_ref().and_then(|c| c.trace.seed), Some(99));
        assert_eq!(cfg.as_ref().map(|c| c.trace.duration), Some(3600));
        assert_eq!(cfg.as_ref().map(|c| c.appliances.len()), Some(7));
        assert_eq!(cfg.as_ref().map(|c| c.window.input_len), Some(60));
    }

    #[test]
    fn validation_catches_inverted_interval() {
        let mut cfg = PipelineConfig::household();
        cfg.trace.switch_interval_min = 200;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "trace.switch_interval_min"));
    }

    #[test]
    fn validation_catches_bad_switch_rule() {
        let mut cfg = PipelineConfig::household();
        cfg.trace.switch_rule = "sometimes".to_string();
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "trace.switch_rule"));
    }

    #[test]
    fn validation_catches_bad_predictor() {
        let mut cfg = PipelineConfig::household();
        cfg.forecast.predictor = "lstm".to_string();
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "forecast.predictor"));
    }

    #[test]
    fn validation_catches_missing_off_profile() {
        let mut cfg = PipelineConfig::household();
        cfg.appliances = ApplianceProfiles::new().with("Fan", 60.0);
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "appliances"));
    }

    #[test]
    fn validation_catches_trace_too_short_for_windows() {
        let mut cfg = PipelineConfig::household();
        cfg.trace.duration = 70;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "trace.duration"));
    }

    #[test]
    fn validation_catches_trace_past_time_range() {
        let mut cfg = PipelineConfig::household();
        cfg.trace.step_secs = u32::MAX;
        cfg.trace.duration = 3000;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "trace.step_secs"));
    }

    #[test]
    fn validation_catches_zero_horizons() {
        let mut cfg = PipelineConfig::household();
        cfg.window.output_len = 0;
        cfg.forecast.steps_ahead = 0;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "window.output_len"));
        assert!(errors.iter().any(|e| e.field == "forecast.steps_ahead"));
    }
}
