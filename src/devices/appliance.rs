use std::str::FromStr;

use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};

use super::profile::ApplianceProfiles;
use super::types::{Device, TickContext, gaussian_noise};
use crate::error::PipelineError;

/// When the switcher re-draws its active appliance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwitchRule {
    /// Switch whenever the tick index is divisible by the current interval.
    ///
    /// Tick 0 always switches. Dwell lengths are not exact: after a long
    /// interval is drawn, the next switch waits for the next multiple of it,
    /// and after a short one a switch can fire sooner than a full interval.
    #[default]
    Modulo,
    /// Switch when an explicit dwell countdown reaches zero.
    Countdown,
}

impl FromStr for SwitchRule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "modulo" => Ok(Self::Modulo),
            "countdown" => Ok(Self::Countdown),
            other => Err(format!(
                "must be \"modulo\" or \"countdown\", got \"{other}\""
            )),
        }
    }
}

/// Mutable state of one switching run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplianceState {
    /// Index of the active appliance in name order.
    pub active: usize,
    /// Interval drawn at the most recent switch, in ticks.
    pub interval: usize,
    /// Ticks left before a countdown switch fires.
    pub remaining_dwell: usize,
}

/// A single metered outlet that flips between appliances at random.
///
/// At each switch a new appliance is drawn uniformly from the profile table
/// (possibly the same one again) and a new interval is drawn uniformly from
/// `interval_range`. Each reading is the active appliance's rating plus
/// Gaussian noise with standard deviation `noise_fraction × rating`, clamped
/// at 0 and rounded to centiwatts.
///
/// # Examples
///
/// ```
/// use power_forecast::devices::{
///     ApplianceProfiles, ApplianceSwitcher, Device, SwitchRule, TickContext,
/// };
///
/// let profiles = ApplianceProfiles::new().with("Off", 0.0).with("Heater", 1000.0);
/// let mut outlet =
///     ApplianceSwitcher::new(&profiles, (5, 5), 0.0, SwitchRule::Modulo, Some(3)).unwrap();
/// let w = outlet.power_w(&TickContext::new(0));
/// assert!(w == 0.0 || w == 1000.0);
/// ```
#[derive(Debug, Clone)]
pub struct ApplianceSwitcher {
    names: Vec<String>,
    ratings_w: Vec<f64>,
    interval_range: (usize, usize),
    noise_fraction: f64,
    rule: SwitchRule,
    state: ApplianceState,
    switches: usize,
    rng: StdRng,
}

impl ApplianceSwitcher {
    /// Creates a switcher and draws its initial appliance and interval.
    ///
    /// # Arguments
    ///
    /// * `profiles` - Appliance rating table
    /// * `interval_range` - Inclusive `(min, max)` dwell interval in ticks
    /// * `noise_fraction` - Noise standard deviation relative to the rating
    /// * `rule` - Switch test to apply each tick
    /// * `seed` - Seed for reproducible runs; `None` draws from the OS
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` for an invalid profile table, `min == 0`,
    /// `min > max`, or a negative/non-finite noise fraction.
    pub fn new(
        profiles: &ApplianceProfiles,
        interval_range: (usize, usize),
        noise_fraction: f64,
        rule: SwitchRule,
        seed: Option<u64>,
    ) -> Result<Self, PipelineError> {
        profiles.validate()?;

        let (min_i, max_i) = interval_range;
        if min_i == 0 {
            return Err(PipelineError::invalid_config(
                "switch_interval_range",
                "minimum interval must be >= 1",
            ));
        }
        if min_i > max_i {
            return Err(PipelineError::invalid_config(
                "switch_interval_range",
                format!("minimum {min_i} exceeds maximum {max_i}"),
            ));
        }
        if !noise_fraction.is_finite() || noise_fraction < 0.0 {
            return Err(PipelineError::invalid_config(
                "noise_fraction",
                format!("must be finite and >= 0, got {noise_fraction}"),
            ));
        }

        let (names, ratings_w): (Vec<String>, Vec<f64>) = profiles
            .iter()
            .map(|(name, w)| (name.to_string(), w))
            .unzip();

        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let active = rng.random_range(0..names.len());
        let interval = rng.random_range(min_i..=max_i);

        Ok(Self {
            names,
            ratings_w,
            interval_range,
            noise_fraction,
            rule,
            state: ApplianceState {
                active,
                interval,
                remaining_dwell: interval,
            },
            switches: 0,
            rng,
        })
    }

    /// Current state machine snapshot.
    pub fn state(&self) -> &ApplianceState {
        &self.state
    }

    /// Name of the active appliance.
    pub fn active_appliance(&self) -> &str {
        &self.names[self.state.active]
    }

    /// Number of switches performed so far (including re-draws that picked
    /// the same appliance).
    pub fn switch_count(&self) -> usize {
        self.switches
    }

    fn switch_due(&self, tick: usize) -> bool {
        match self.rule {
            SwitchRule::Modulo => tick % self.state.interval == 0,
            SwitchRule::Countdown => self.state.remaining_dwell == 0,
        }
    }

    fn switch(&mut self) {
        let (min_i, max_i) = self.interval_range;
        self.state.active = self.rng.random_range(0..self.names.len());
        self.state.interval = self.rng.random_range(min_i..=max_i);
        self.state.remaining_dwell = self.state.interval;
        self.switches += 1;
    }
}

impl Device for ApplianceSwitcher {
    fn power_w(&mut self, context: &TickContext) -> f64 {
        if self.switch_due(context.tick) {
            self.switch();
        }

        let rated_w = self.ratings_w[self.state.active];
        let noise = gaussian_noise(&mut self.rng, self.noise_fraction * rated_w);
        self.state.remaining_dwell = self.state.remaining_dwell.saturating_sub(1);

        let w = (rated_w + noise).max(0.0);
        (w * 100.0).round() / 100.0
    }

    fn device_type(&self) -> &'static str {
        "ApplianceSwitcher"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heater() -> ApplianceProfiles {
        ApplianceProfiles::new().with("Off", 0.0).with("Heater", 1000.0)
    }

    fn switch_ticks(outlet: &mut ApplianceSwitcher, ticks: usize) -> Vec<usize> {
        let mut out = Vec::new();
        for t in 0..ticks {
            let before = outlet.switch_count();
            outlet.power_w(&TickContext::new(t));
            if outlet.switch_count() > before {
                out.push(t);
            }
        }
        out
    }

    #[test]
    fn deterministic_for_same_seed() {
        let profiles = ApplianceProfiles::household();
        let mut a = ApplianceSwitcher::new(&profiles, (10, 120), 0.15, SwitchRule::Modulo, Some(42))
            .unwrap();
        let mut b = ApplianceSwitcher::new(&profiles, (10, 120), 0.15, SwitchRule::Modulo, Some(42))
            .unwrap();
        for t in 0..500 {
            let ctx = TickContext::new(t);
            assert_eq!(a.power_w(&ctx), b.power_w(&ctx));
        }
    }

    #[test]
    fn initial_state_starts_full_dwell() {
        let outlet =
            ApplianceSwitcher::new(&heater(), (3, 9), 0.0, SwitchRule::Countdown, Some(2)).unwrap();
        let state = outlet.state();
        assert!((3..=9).contains(&state.interval));
        assert_eq!(state.remaining_dwell, state.interval);
        assert!(["Heater", "Off"].contains(&outlet.active_appliance()));
        assert_eq!(outlet.switch_count(), 0);
    }

    #[test]
    fn modulo_rule_switches_on_fixed_interval() {
        let mut outlet =
            ApplianceSwitcher::new(&heater(), (5, 5), 0.0, SwitchRule::Modulo, Some(1)).unwrap();
        let ticks = switch_ticks(&mut outlet, 31);
        assert_eq!(ticks, vec![0, 5, 10, 15, 20, 25, 30]);
    }

    #[test]
    fn countdown_rule_switches_on_fixed_interval() {
        let mut outlet =
            ApplianceSwitcher::new(&heater(), (5, 5), 0.0, SwitchRule::Countdown, Some(1)).unwrap();
        let ticks = switch_ticks(&mut outlet, 31);
        assert_eq!(ticks, vec![5, 10, 15, 20, 25, 30]);
    }

    #[test]
    fn countdown_dwell_always_within_range() {
        let mut outlet =
            ApplianceSwitcher::new(&heater(), (3, 9), 0.0, SwitchRule::Countdown, Some(11))
                .unwrap();
        let ticks = switch_ticks(&mut outlet, 2_000);
        assert!(ticks.len() > 10);
        for gap in ticks.windows(2).map(|w| w[1] - w[0]) {
            assert!((3..=9).contains(&gap), "gap {gap} outside range");
        }
    }

    #[test]
    fn modulo_rule_can_fire_off_schedule() {
        // Once a short interval is drawn, ticks divisible by it fire early.
        let mut outlet =
            ApplianceSwitcher::new(&heater(), (2, 7), 0.0, SwitchRule::Modulo, Some(5)).unwrap();
        let ticks = switch_ticks(&mut outlet, 5_000);
        let gaps: Vec<usize> = ticks.windows(2).map(|w| w[1] - w[0]).collect();
        assert!(gaps.iter().any(|g| *g == 1), "expected at least one early switch");
    }

    #[test]
    fn noiseless_readings_equal_ratings() {
        let mut outlet =
            ApplianceSwitcher::new(&heater(), (1, 4), 0.0, SwitchRule::Modulo, Some(9)).unwrap();
        for t in 0..200 {
            let w = outlet.power_w(&TickContext::new(t));
            assert!(w == 0.0 || w == 1000.0, "unexpected reading {w}");
        }
    }

    #[test]
    fn noisy_readings_are_never_negative() {
        let profiles = ApplianceProfiles::new().with("Off", 0.0).with("Fan", 60.0);
        let mut outlet =
            ApplianceSwitcher::new(&profiles, (1, 3), 5.0, SwitchRule::Modulo, Some(4)).unwrap();
        for t in 0..1_000 {
            assert!(outlet.power_w(&TickContext::new(t)) >= 0.0);
        }
    }

    #[test]
    fn rejects_inverted_interval_range() {
        let err = ApplianceSwitcher::new(&heater(), (9, 3), 0.0, SwitchRule::Modulo, None);
        assert!(matches!(err, Err(PipelineError::InvalidConfig { .. })));
    }

    #[test]
    fn rejects_zero_interval() {
        let err = ApplianceSwitcher::new(&heater(), (0, 3), 0.0, SwitchRule::Modulo, None);
        assert!(matches!(err, Err(PipelineError::InvalidConfig { .. })));
    }

    #[test]
    fn switch_rule_parses_names() {
        assert_eq!("modulo".parse::<SwitchRule>(), Ok(SwitchRule::Modulo));
        assert_eq!("countdown".parse::<SwitchRule>(), Ok(SwitchRule::Countdown));
        assert!("random".parse::<SwitchRule>().is_err());
    }

    #[test]
    fn rejects_negative_noise() {
        let err = ApplianceSwitcher::new(&heater(), (1, 3), -0.1, SwitchRule::Modulo, None);
        assert!(matches!(err, Err(PipelineError::InvalidConfig { .. })));
    }
}
