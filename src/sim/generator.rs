//! Synthetic household power trace generation.

use chrono::TimeDelta;
use tracing::debug;

use crate::devices::{ApplianceProfiles, ApplianceSwitcher, Device, TickContext};
use crate::error::PipelineError;

use super::types::{PowerSample, TraceConfig};

/// Produces synthetic power traces from an appliance profile table.
///
/// Holds only immutable configuration; every call to
/// [`generate`](Self::generate) builds its own switching state, so one
/// generator can serve concurrent callers.
#[derive(Debug, Clone)]
pub struct ApplianceTraceGenerator {
    config: TraceConfig,
    profiles: ApplianceProfiles,
}

impl ApplianceTraceGenerator {
    pub fn new(config: TraceConfig, profiles: ApplianceProfiles) -> Self {
        Self { config, profiles }
    }

    pub fn config(&self) -> &TraceConfig {
        &self.config
    }

    pub fn profiles(&self) -> &ApplianceProfiles {
        &self.profiles
    }

    /// Emits `duration` samples with strictly increasing timestamps.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if `duration` is 0, the sample step is not
    /// positive, the last timestamp falls outside the representable range,
    /// or the switcher parameters are invalid (see [`ApplianceSwitcher::new`]).
    pub fn generate(&self) -> Result<Vec<PowerSample>, PipelineError> {
        let cfg = &self.config;
        if cfg.duration == 0 {
            return Err(PipelineError::invalid_config("duration", "must be > 0"));
        }
        if cfg.step <= TimeDelta::zero() {
            return Err(PipelineError::invalid_config("step", "must be positive"));
        }

        let mut outlet = ApplianceSwitcher::new(
            &self.profiles,
            cfg.switch_interval_range,
            cfg.noise_fraction,
            cfg.switch_rule,
            cfg.seed,
        )?;

        let mut samples = Vec::with_capacity(cfg.duration);
        let mut timestamp = cfg.start;
        for tick in 0..cfg.duration {
            if tick > 0 {
                timestamp = timestamp.checked_add_signed(cfg.step).ok_or_else(|| {
                    PipelineError::invalid_config(
                        "step",
                        format!("timestamp of sample {tick} is out of range"),
                    )
                })?;
            }
            let power_w = outlet.power_w(&TickContext::new(tick));
            samples.push(PowerSample::new(timestamp, power_w));
        }

        debug!(
            device = outlet.device_type(),
            samples = samples.len(),
            last_appliance = outlet.active_appliance(),
            switches = outlet.switch_count(),
            rule = ?cfg.switch_rule,
            "generated synthetic trace"
        );
        Ok(samples)
    }
}

/// Convenience wrapper for a one-off trace.
pub fn generate(
    config: &TraceConfig,
    profiles: &ApplianceProfiles,
) -> Result<Vec<PowerSample>, PipelineError> {
    ApplianceTraceGenerator::new(config.clone(), profiles.clone()).generate()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::SwitchRule;
    use chrono::{DateTime, Utc};

    fn heater() -> ApplianceProfiles {
        ApplianceProfiles::new().with("Off", 0.0).with("Heater", 1000.0)
    }

    #[test]
    fn emits_requested_length_with_fixed_step() {
        let cfg = TraceConfig::new(120, (10, 30), 0.15)
            .with_seed(42)
            .with_start(DateTime::<Utc>::UNIX_EPOCH);
        let trace = generate(&cfg, &ApplianceProfiles::household()).unwrap();
        assert_eq!(trace.len(), 120);
        assert_eq!(trace[0].timestamp, DateTime::<Utc>::UNIX_EPOCH);
        for pair in trace.windows(2) {
            assert_eq!(pair[1].timestamp - pair[0].timestamp, TimeDelta::seconds(1));
        }
    }

    #[test]
    fn heater_trace_is_blockwise_constant() {
        for rule in [SwitchRule::Modulo, SwitchRule::Countdown] {
            let cfg = TraceConfig::new(100, (5, 5), 0.0).with_seed(17).with_rule(rule);
            let trace = generate(&cfg, &heater()).unwrap();
            for s in &trace {
                assert!(s.power_w == 0.0 || s.power_w == 1000.0);
            }
            for block in trace.chunks(5) {
                assert!(block.iter().all(|s| s.power_w == block[0].power_w));
            }
        }
    }

    #[test]
    fn readings_are_rounded_to_centiwatts() {
        let cfg = TraceConfig::new(300, (10, 20), 0.15).with_seed(3);
        let trace = generate(&cfg, &ApplianceProfiles::household()).unwrap();
        for s in &trace {
            let cents = s.power_w * 100.0;
            assert!((cents - cents.round()).abs() < 1e-6, "{} not rounded", s.power_w);
        }
    }

    #[test]
    fn zero_duration_is_invalid() {
        let cfg = TraceConfig::new(0, (5, 5), 0.0);
        let err = generate(&cfg, &heater());
        assert!(matches!(err, Err(PipelineError::InvalidConfig { .. })));
    }

    #[test]
    fn empty_profiles_are_invalid() {
        let cfg = TraceConfig::new(10, (5, 5), 0.0);
        let err = generate(&cfg, &ApplianceProfiles::new());
        assert!(matches!(err, Err(PipelineError::InvalidConfig { .. })));
    }

    #[test]
    fn step_past_time_range_is_invalid() {
        let cfg = TraceConfig::new(3_000, (5, 5), 0.0)
            .with_start(DateTime::<Utc>::UNIX_EPOCH)
            .with_step(TimeDelta::seconds(i64::from(u32::MAX)));
        let err = generate(&cfg, &heater());
        assert!(matches!(err, Err(PipelineError::InvalidConfig { .. })));
    }

    #[test]
    fn last_sample_may_sit_at_the_range_edge() {
        let cfg = TraceConfig::new(2, (5, 5), 0.0)
            .with_start(DateTime::<Utc>::MAX_UTC - TimeDelta::seconds(1));
        let trace = generate(&cfg, &heater()).unwrap();
        assert_eq!(trace[1].timestamp, DateTime::<Utc>::MAX_UTC);
    }

    #[test]
    fn non_positive_step_is_invalid() {
        let cfg = TraceConfig::new(10, (5, 5), 0.0).with_step(TimeDelta::zero());
        assert!(generate(&cfg, &heater()).is_err());
    }
}
