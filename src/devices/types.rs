//! Common types and traits for simulated household devices.

use rand::{Rng, rngs::StdRng};

/// Contextual information passed to devices on every tick.
///
/// # Fields
/// * `tick` - Zero-based tick index since the start of the trace
#[derive(Debug, Clone, Copy)]
pub struct TickContext {
    pub tick: usize,
}

impl TickContext {
    /// Creates a context for the given tick.
    pub fn new(tick: usize) -> Self {
        Self { tick }
    }
}

/// A household device whose metered draw is sampled once per tick.
///
/// Devices are stateful: each call advances their internal state machine,
/// so ticks must be presented in ascending order exactly once.
pub trait Device {
    /// Returns the metered power draw in watts at this tick (never negative).
    fn power_w(&mut self, context: &TickContext) -> f64;

    /// Returns a human-readable type name for the device.
    fn device_type(&self) -> &'static str;
}

/// Gaussian noise with mean 0 via the Box-Muller transform.
///
/// Returns 0 when `std_dev` is not positive, without consuming randomness.
pub fn gaussian_noise(rng: &mut StdRng, std_dev: f64) -> f64 {
    if std_dev <= 0.0 {
        return 0.0;
    }

    let u1: f64 = rng.random::<f64>().clamp(1e-12, 1.0);
    let u2: f64 = rng.random::<f64>();
    let z0 = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
    z0 * std_dev
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn zero_std_dev_is_silent() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(gaussian_noise(&mut rng, 0.0), 0.0);
        assert_eq!(gaussian_noise(&mut rng, -3.0), 0.0);
    }

    #[test]
    fn sample_moments_are_close_to_target() {
        let mut rng = StdRng::seed_from_u64(7);
        let n = 20_000;
        let draws: Vec<f64> = (0..n).map(|_| gaussian_noise(&mut rng, 2.0)).collect();
        let mean = draws.iter().sum::<f64>() / n as f64;
        let var = draws.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n as f64;
        assert!(mean.abs() < 0.1, "mean drifted: {mean}");
        assert!((var.sqrt() - 2.0).abs() < 0.1, "std dev off: {}", var.sqrt());
    }
}
