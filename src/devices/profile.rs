//! Appliance rating tables.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// Mapping from unique appliance name to rated power in watts.
///
/// Exactly one entry must be rated at 0 W; it is the designated "off"
/// profile. Entries iterate in name order, which keeps seeded draws
/// reproducible regardless of how the table was written.
///
/// # Examples
///
/// ```
/// use power_forecast::devices::ApplianceProfiles;
///
/// let profiles = ApplianceProfiles::new()
///     .with("Off", 0.0)
///     .with("Heater", 1000.0);
/// assert_eq!(profiles.off_profile(), Some("Off"));
/// assert!(profiles.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplianceProfiles(BTreeMap<String, f64>);

impl ApplianceProfiles {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, rated_w: f64) -> Self {
        self.insert(name, rated_w);
        self
    }

    /// Inserts or replaces an appliance, returning the previous rating.
    pub fn insert(&mut self, name: impl Into<String>, rated_w: f64) -> Option<f64> {
        self.0.insert(name.into(), rated_w)
    }

    /// The reference household: small electronics, a fan, a TV, a heater
    /// and the off state.
    pub fn household() -> Self {
        Self::new()
            .with("LED Bulb", 9.0)
            .with("Charger", 20.0)
            .with("Fan", 60.0)
            .with("Laptop", 65.0)
            .with("TV", 120.0)
            .with("Heater", 1000.0)
            .with("Off", 0.0)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Rated power of the named appliance.
    pub fn rated_w(&self, name: &str) -> Option<f64> {
        self.0.get(name).copied()
    }

    /// Iterates `(name, rated_w)` in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(name, w)| (name.as_str(), *w))
    }

    /// Name of the zero-rated profile, if there is exactly one.
    pub fn off_profile(&self) -> Option<&str> {
        let mut off = self.iter().filter(|(_, w)| *w == 0.0).map(|(name, _)| name);
        match (off.next(), off.next()) {
            (Some(name), None) => Some(name),
            _ => None,
        }
    }

    /// Checks the table invariants.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the table is empty, a rating is negative or
    /// non-finite, or there is not exactly one zero-rated off profile.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.is_empty() {
            return Err(PipelineError::invalid_config(
                "profiles",
                "at least one appliance is required",
            ));
        }
        for (name, w) in self.iter() {
            if !w.is_finite() || w < 0.0 {
                return Err(PipelineError::invalid_config(
                    format!("profiles.{name}"),
                    format!("rated power must be finite and >= 0, got {w}"),
                ));
            }
        }
        let zero_rated = self.iter().filter(|(_, w)| *w == 0.0).count();
        if zero_rated != 1 {
            return Err(PipelineError::invalid_config(
                "profiles",
                format!("expected exactly one 0 W off profile, found {zero_rated}"),
            ));
        }
        Ok(())
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for ApplianceProfiles {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}
